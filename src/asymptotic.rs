//! Closed-form asymptotic correction factors.
//!
//! These factors pin the amplitude to its known analytic behavior at the
//! coalescence points and in the far field, leaving the networks free to
//! learn the mid-range correlation structure.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::nn::{ParamReader, Parameterized};

/// Ionization-decay envelope.
///
/// Per electron the factor is `Σ_m exp(−(Z_m·r + I·α·r²)/(1 + α·r))` over the
/// nuclei; the product runs over electrons. Near a nucleus the exponent
/// approaches `−Z_m·r`, the nuclear-cusp slope; far from every nucleus the
/// factor decays as `exp(−I·r)` with the learnable ionization potential `I`.
/// Strictly positive and smooth everywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NuclearAsymptotic {
    charges: Vec<f64>,
    /// Learnable ionization potential: far-field decay rate.
    pub ion_pot: f64,
    /// Fixed crossover rate between the cusp and decay regimes.
    pub alpha: f64,
}

impl NuclearAsymptotic {
    pub fn new(charges: Vec<f64>, ion_pot: f64, alpha: f64) -> Self {
        Self {
            charges,
            ion_pot,
            alpha,
        }
    }

    /// `dists_nuc[(i, m)]`: distance of electron i to nucleus m.
    pub fn forward(&self, dists_nuc: &DMatrix<f64>) -> f64 {
        assert_eq!(
            dists_nuc.ncols(),
            self.charges.len(),
            "distance matrix does not match nucleus count"
        );
        (0..dists_nuc.nrows())
            .map(|i| {
                self.charges
                    .iter()
                    .enumerate()
                    .map(|(m, &z)| {
                        let r = dists_nuc[(i, m)];
                        (-(z * r + self.ion_pot * self.alpha * r * r) / (1.0 + self.alpha * r))
                            .exp()
                    })
                    .sum::<f64>()
            })
            .product()
    }
}

impl Parameterized for NuclearAsymptotic {
    fn num_params(&self) -> usize {
        1
    }

    fn write_params(&self, out: &mut Vec<f64>) {
        out.push(self.ion_pot);
    }

    fn read_params(&mut self, src: &mut ParamReader) {
        self.ion_pot = src.next();
    }
}

/// Electron-electron cusp factor `exp(−Σ_p c/(α(1 + α·d_p)))`.
///
/// The log-derivative at coalescence equals the learnable coefficient `c`,
/// which is what the cusp condition prescribes. One instance serves the
/// same-spin pairs (both spin groups concatenated), another the full
/// up-vs-down block; either is omitted entirely when its coefficient is not
/// configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectronicAsymptotic {
    /// Learnable cusp coefficient.
    pub cusp: f64,
    pub alpha: f64,
}

impl ElectronicAsymptotic {
    pub fn new(cusp: f64, alpha: f64) -> Self {
        Self { cusp, alpha }
    }

    pub fn forward(&self, dists: &[f64]) -> f64 {
        (-dists
            .iter()
            .map(|&d| self.cusp / (self.alpha * (1.0 + self.alpha * d)))
            .sum::<f64>())
        .exp()
    }
}

impl Parameterized for ElectronicAsymptotic {
    fn num_params(&self) -> usize {
        1
    }

    fn write_params(&self, out: &mut Vec<f64>) {
        out.push(self.cusp);
    }

    fn read_params(&mut self, src: &mut ParamReader) {
        self.cusp = src.next();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_nuclear_positive_and_finite() {
        let asymp = NuclearAsymptotic::new(vec![1.0, 3.0], 0.5, 1.0);
        for r in [0.0, 0.3, 2.0, 40.0] {
            let d = DMatrix::from_element(2, 2, r);
            let v = asymp.forward(&d);
            assert!(v > 0.0 && v.is_finite());
        }
    }

    #[test]
    fn test_nuclear_far_field_decay_rate() {
        let ion_pot = 0.5;
        let asymp = NuclearAsymptotic::new(vec![1.0], ion_pot, 1.0);
        let value = |r: f64| asymp.forward(&DMatrix::from_element(1, 1, r)).ln();
        let slope = (value(45.0) - value(30.0)) / 15.0;
        assert_relative_eq!(slope, -ion_pot, max_relative = 0.01);
    }

    #[test]
    fn test_nuclear_unit_at_coalescence() {
        // a single electron sitting on the only nucleus contributes 1
        let asymp = NuclearAsymptotic::new(vec![4.0], 0.7, 1.0);
        assert_relative_eq!(
            asymp.forward(&DMatrix::from_element(1, 1, 0.0)),
            1.0,
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_electronic_cusp_log_slope() {
        let cusp = 0.25;
        let asymp = ElectronicAsymptotic::new(cusp, 1.0);
        let h = 1e-6;
        let slope = (asymp.forward(&[h]).ln() - asymp.forward(&[0.0]).ln()) / h;
        assert_relative_eq!(slope, cusp, max_relative = 1e-4);
    }

    #[test]
    fn test_electronic_saturates_at_large_separation() {
        let asymp = ElectronicAsymptotic::new(0.5, 1.0);
        assert_relative_eq!(asymp.forward(&[1e6]), 1.0, epsilon = 1e-5);
        // empty pair list (single-electron group) is the identity factor
        assert_eq!(asymp.forward(&[]), 1.0);
    }
}
