//! Dense layers and the log-spaced feed-forward stacks used by every
//! subnetwork of the ansatz.

use nalgebra::{DMatrix, DVector};
use rand::RngCore;
use rand_distr::{Distribution, Normal};

/// Shifted softplus ln(½ + ½eˣ).
///
/// Smooth everywhere, ssp(0) = 0, asymptotically linear for large x and
/// bounded below by −ln 2.
pub fn ssp(x: f64) -> f64 {
    if x > 30.0 {
        // softplus(x) ≈ x to double precision here
        x - std::f64::consts::LN_2
    } else {
        x.exp().ln_1p() - std::f64::consts::LN_2
    }
}

/// Logistic sigmoid.
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Activations available to the feed-forward stacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Shifted softplus
    Ssp,
    /// Hyperbolic tangent
    Tanh,
}

impl Activation {
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Ssp => ssp(x),
            Activation::Tanh => x.tanh(),
        }
    }
}

/// Flat access to learnable parameters in a fixed traversal order.
///
/// `write_params` and `read_params` must visit parameters in the same order
/// so that an external optimizer can round-trip the flat vector.
pub trait Parameterized {
    fn num_params(&self) -> usize;

    /// Append all parameters to `out`.
    fn write_params(&self, out: &mut Vec<f64>);

    /// Consume values from `src` in traversal order.
    fn read_params(&mut self, src: &mut ParamReader);
}

/// Cursor over a flat parameter slice.
pub struct ParamReader<'a> {
    values: &'a [f64],
    pos: usize,
}

impl<'a> ParamReader<'a> {
    pub fn new(values: &'a [f64]) -> Self {
        Self { values, pos: 0 }
    }

    /// Next value; callers verify the total length up front.
    pub fn next(&mut self) -> f64 {
        let v = self.values[self.pos];
        self.pos += 1;
        v
    }

    pub fn consumed(&self) -> usize {
        self.pos
    }
}

/// Dense layer `y = W·x (+ b)`.
#[derive(Debug, Clone)]
pub struct Linear {
    weight: DMatrix<f64>,
    bias: Option<DVector<f64>>,
}

impl Linear {
    /// Normal(0, 1/√fan_in) weights, zero bias.
    pub fn new(in_dim: usize, out_dim: usize, bias: bool, rng: &mut dyn RngCore) -> Self {
        let dist = Normal::new(0.0, (1.0 / in_dim as f64).sqrt()).unwrap();
        let weight = DMatrix::from_fn(out_dim, in_dim, |_, _| dist.sample(rng));
        let bias = bias.then(|| DVector::zeros(out_dim));
        Self { weight, bias }
    }

    pub fn in_dim(&self) -> usize {
        self.weight.ncols()
    }

    pub fn out_dim(&self) -> usize {
        self.weight.nrows()
    }

    pub fn forward(&self, x: &DVector<f64>) -> DVector<f64> {
        let mut y = &self.weight * x;
        if let Some(b) = &self.bias {
            y += b;
        }
        y
    }
}

impl Parameterized for Linear {
    fn num_params(&self) -> usize {
        self.weight.len() + self.bias.as_ref().map_or(0, |b| b.len())
    }

    fn write_params(&self, out: &mut Vec<f64>) {
        out.extend(self.weight.iter());
        if let Some(b) = &self.bias {
            out.extend(b.iter());
        }
    }

    fn read_params(&mut self, src: &mut ParamReader) {
        for w in self.weight.iter_mut() {
            *w = src.next();
        }
        if let Some(b) = &mut self.bias {
            for v in b.iter_mut() {
                *v = src.next();
            }
        }
    }
}

/// Feed-forward stack whose layer widths interpolate geometrically between
/// the input and output dimensions.
///
/// The activation sits between layers; the final layer is linear and its bias
/// can be dropped where the surrounding computation would cancel it anyway.
#[derive(Debug, Clone)]
pub struct LogDnn {
    layers: Vec<Linear>,
    activation: Activation,
}

impl LogDnn {
    pub fn new(
        in_dim: usize,
        out_dim: usize,
        activation: Activation,
        n_layers: usize,
        last_bias: bool,
        rng: &mut dyn RngCore,
    ) -> Self {
        let dims = log_spaced_dims(in_dim, out_dim, n_layers);
        let layers = dims
            .windows(2)
            .enumerate()
            .map(|(k, w)| Linear::new(w[0], w[1], last_bias || k + 1 < n_layers, rng))
            .collect();
        Self { layers, activation }
    }

    pub fn in_dim(&self) -> usize {
        self.layers[0].in_dim()
    }

    pub fn out_dim(&self) -> usize {
        self.layers[self.layers.len() - 1].out_dim()
    }

    pub fn forward(&self, x: &DVector<f64>) -> DVector<f64> {
        let last = self.layers.len() - 1;
        let mut h = x.clone();
        for (k, layer) in self.layers.iter().enumerate() {
            h = layer.forward(&h);
            if k < last {
                h.apply(|v| *v = self.activation.apply(*v));
            }
        }
        h
    }
}

impl Parameterized for LogDnn {
    fn num_params(&self) -> usize {
        self.layers.iter().map(Parameterized::num_params).sum()
    }

    fn write_params(&self, out: &mut Vec<f64>) {
        for layer in &self.layers {
            layer.write_params(out);
        }
    }

    fn read_params(&mut self, src: &mut ParamReader) {
        for layer in &mut self.layers {
            layer.read_params(src);
        }
    }
}

/// Geometrically interpolated widths from `in_dim` to `out_dim` across
/// `n_layers` layers.
fn log_spaced_dims(in_dim: usize, out_dim: usize, n_layers: usize) -> Vec<usize> {
    (0..=n_layers)
        .map(|k| {
            let q = k as f64 / n_layers as f64;
            ((in_dim as f64).powf(1.0 - q) * (out_dim as f64).powf(q)).round() as usize
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_ssp_values() {
        assert_relative_eq!(ssp(0.0), 0.0, epsilon = 1e-15);
        assert_relative_eq!(ssp(100.0), 100.0 - std::f64::consts::LN_2, epsilon = 1e-12);
        assert!(ssp(-100.0) > -std::f64::consts::LN_2 - 1e-12);
        // monotone
        assert!(ssp(1.0) > ssp(0.5));
    }

    #[test]
    fn test_log_spaced_dims() {
        assert_eq!(log_spaced_dims(128, 1, 3), vec![128, 25, 5, 1]);
        assert_eq!(log_spaced_dims(7, 10, 2), vec![7, 8, 10]);
    }

    #[test]
    fn test_linear_forward_and_params() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut layer = Linear::new(4, 3, true, &mut rng);
        assert_eq!(layer.num_params(), 4 * 3 + 3);

        let flat = {
            let mut out = Vec::new();
            layer.write_params(&mut out);
            out
        };
        let perturbed: Vec<f64> = flat.iter().map(|v| v + 0.5).collect();
        layer.read_params(&mut ParamReader::new(&perturbed));
        let mut back = Vec::new();
        layer.write_params(&mut back);
        assert_eq!(back, perturbed);
    }

    #[test]
    fn test_log_dnn_shapes() {
        let mut rng = StdRng::seed_from_u64(11);
        let net = LogDnn::new(32, 64, Activation::Ssp, 2, false, &mut rng);
        assert_eq!(net.in_dim(), 32);
        assert_eq!(net.out_dim(), 64);
        let y = net.forward(&DVector::from_element(32, 0.1));
        assert_eq!(y.len(), 64);
        assert!(y.iter().all(|v| v.is_finite()));
    }
}
