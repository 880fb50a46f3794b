//! Exact antisymmetrization over a same-spin electron group.

use anyhow::{ensure, Result};
use nalgebra::{DMatrix, DVector, Vector3};
use rand::RngCore;

use super::layers::{sigmoid, Activation, LogDnn, ParamReader, Parameterized};
use crate::trace::Trace;

/// Width of the pair feature vector: two centroid-relative coordinates plus
/// the pair distance.
pub const PAIR_FEATURE_DIM: usize = 7;

/// Antisymmetric pair-product ansatz over one spin group.
///
/// Each unordered pair {i, j} contributes the factor
/// `σ(G(z_ij − z_ji)) − ½`, where `z` is a shared network over the pair
/// feature `[r_i − c, r_j − c, d_ij]` (`c` the group centroid) and
/// `G(u) = net(u) − net(−u)` is exactly odd. The group value is the product
/// of the pair factors.
///
/// Invariants, each unit-tested below:
/// - swapping any two group members negates the value;
/// - the value vanishes when two members coincide;
/// - |value| is invariant under any relabeling;
/// - the combining operation is a plain product, so aggregation order is
///   immaterial.
///
/// The last layers of both networks carry no bias; it would cancel in
/// `z_ij − z_ji` and `net(u) − net(−u)`.
pub struct LaughlinAnsatz {
    pair_net: LogDnn,
    odd_net: LogDnn,
}

impl LaughlinAnsatz {
    pub fn new(latent_dim: usize, rng: &mut dyn RngCore) -> Self {
        Self {
            pair_net: LogDnn::new(PAIR_FEATURE_DIM, latent_dim, Activation::Ssp, 2, false, rng),
            odd_net: LogDnn::new(latent_dim, 1, Activation::Ssp, 2, false, rng),
        }
    }

    /// Wrap externally built pair and final networks, verifying their shapes
    /// line up.
    pub fn with_nets(pair_net: LogDnn, odd_net: LogDnn) -> Result<Self> {
        ensure!(
            pair_net.in_dim() == PAIR_FEATURE_DIM,
            "pair network must take {} inputs, takes {}",
            PAIR_FEATURE_DIM,
            pair_net.in_dim()
        );
        ensure!(
            odd_net.in_dim() == pair_net.out_dim(),
            "final network input {} does not match pair latent {}",
            odd_net.in_dim(),
            pair_net.out_dim()
        );
        ensure!(odd_net.out_dim() == 1, "final network must end in one scalar");
        Ok(Self { pair_net, odd_net })
    }

    fn pair_latent(
        &self,
        ri: &Vector3<f64>,
        rj: &Vector3<f64>,
        centroid: &Vector3<f64>,
        dij: f64,
    ) -> DVector<f64> {
        let a = ri - centroid;
        let b = rj - centroid;
        let feat = DVector::from_column_slice(&[a.x, a.y, a.z, b.x, b.y, b.z, dij]);
        self.pair_net.forward(&feat)
    }

    /// Odd pair factor in (−½, ½); exactly zero for coincident arguments.
    pub(crate) fn pair_factor(
        &self,
        ri: &Vector3<f64>,
        rj: &Vector3<f64>,
        centroid: &Vector3<f64>,
        dij: f64,
    ) -> f64 {
        let u = self.pair_latent(ri, rj, centroid, dij) - self.pair_latent(rj, ri, centroid, dij);
        let g = self.odd_net.forward(&u)[0] - self.odd_net.forward(&(-&u))[0];
        sigmoid(g) - 0.5
    }

    /// Group scalar; `dists` is the intra-group distance matrix.
    pub fn forward(&self, rs: &[Vector3<f64>], dists: &DMatrix<f64>, trace: &mut dyn Trace) -> f64 {
        assert_eq!(rs.len(), dists.nrows(), "distance block does not match group");
        let c = centroid(rs);
        let mut value = 1.0;
        for i in 0..rs.len() {
            for j in (i + 1)..rs.len() {
                value *= self.pair_factor(&rs[i], &rs[j], &c, dists[(i, j)]);
            }
        }
        trace.scalar("value", value);
        value
    }
}

impl Parameterized for LaughlinAnsatz {
    fn num_params(&self) -> usize {
        self.pair_net.num_params() + self.odd_net.num_params()
    }

    fn write_params(&self, out: &mut Vec<f64>) {
        self.pair_net.write_params(out);
        self.odd_net.write_params(out);
    }

    fn read_params(&mut self, src: &mut ParamReader) {
        self.pair_net.read_params(src);
        self.odd_net.read_params(src);
    }
}

fn centroid(rs: &[Vector3<f64>]) -> Vector3<f64> {
    rs.iter().fold(Vector3::zeros(), |acc, r| acc + r) / rs.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::pairwise_distance;
    use crate::trace::NullTrace;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn group() -> Vec<Vector3<f64>> {
        vec![
            Vector3::new(0.4, -0.2, 0.9),
            Vector3::new(-0.5, 0.7, 0.1),
            Vector3::new(0.8, 0.3, -0.6),
        ]
    }

    fn eval(anti: &LaughlinAnsatz, rs: &[Vector3<f64>]) -> f64 {
        anti.forward(rs, &pairwise_distance(rs, rs), &mut NullTrace)
    }

    #[test]
    fn test_transposition_negates_value() {
        let mut rng = StdRng::seed_from_u64(17);
        let anti = LaughlinAnsatz::new(4, &mut rng);
        let rs = group();
        let base = eval(&anti, &rs);
        assert!(base.abs() > 0.0);

        for (i, j) in [(0, 1), (0, 2), (1, 2)] {
            let mut swapped = rs.clone();
            swapped.swap(i, j);
            assert_relative_eq!(eval(&anti, &swapped), -base, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_even_permutation_preserves_value() {
        let mut rng = StdRng::seed_from_u64(19);
        let anti = LaughlinAnsatz::new(4, &mut rng);
        let rs = group();
        let cycled = vec![rs[1], rs[2], rs[0]];
        assert_relative_eq!(eval(&anti, &cycled), eval(&anti, &rs), epsilon = 1e-12);
    }

    #[test]
    fn test_coincident_members_give_zero() {
        let mut rng = StdRng::seed_from_u64(23);
        let anti = LaughlinAnsatz::new(4, &mut rng);
        let mut rs = group();
        rs[2] = rs[0];
        assert_eq!(eval(&anti, &rs), 0.0);
    }

    #[test]
    fn test_pair_factor_is_odd_and_bounded() {
        let mut rng = StdRng::seed_from_u64(29);
        let anti = LaughlinAnsatz::new(4, &mut rng);
        let a = Vector3::new(0.3, 0.5, -0.2);
        let b = Vector3::new(-0.6, 0.1, 0.8);
        let c = (a + b) / 2.0;
        let d = (a - b).norm();
        let fwd = anti.pair_factor(&a, &b, &c, d);
        let rev = anti.pair_factor(&b, &a, &c, d);
        assert_relative_eq!(rev, -fwd, epsilon = 1e-14);
        assert!(fwd.abs() < 0.5);
        assert_eq!(anti.pair_factor(&a, &a, &c, 0.0), 0.0);
    }

    #[test]
    fn test_aggregation_order_is_immaterial() {
        let mut rng = StdRng::seed_from_u64(31);
        let anti = LaughlinAnsatz::new(4, &mut rng);
        let rs = group();
        let dists = pairwise_distance(&rs, &rs);
        let c = centroid(&rs);

        // same factors multiplied in reverse order
        let mut pairs = Vec::new();
        for i in 0..rs.len() {
            for j in (i + 1)..rs.len() {
                pairs.push(anti.pair_factor(&rs[i], &rs[j], &c, dists[(i, j)]));
            }
        }
        let reversed: f64 = pairs.iter().rev().product();
        assert_relative_eq!(eval(&anti, &rs), reversed, epsilon = 1e-15);
    }
}
