//! Wavefunction evaluation trait with numerical-derivative defaults.

use nalgebra::Vector3;
use rand::RngCore;

/// Many-electron wavefunction: one real amplitude per configuration.
///
/// Analytic coordinate derivatives are the business of an external
/// differentiation engine; the central-difference defaults below serve
/// property tests and local-energy spot checks.
pub trait Wavefunction {
    /// Number of electrons a configuration must contain.
    fn num_particles(&self) -> usize;

    /// Draw a starting configuration.
    fn initialize(&self, rng: &mut dyn RngCore) -> Vec<Vector3<f64>>;

    /// Evaluate the amplitude at positions `r`.
    fn evaluate(&self, r: &[Vector3<f64>]) -> f64;

    /// Numerical gradients using central difference.
    fn numerical_derivative(&self, r: &[Vector3<f64>], h: f64) -> Vec<Vector3<f64>> {
        let mut grad = vec![Vector3::zeros(); r.len()];
        for i in 0..r.len() {
            for axis in 0..3 {
                let mut r_fwd = r.to_vec();
                let mut r_bwd = r.to_vec();
                r_fwd[i][axis] += h;
                r_bwd[i][axis] -= h;
                grad[i][axis] = (self.evaluate(&r_fwd) - self.evaluate(&r_bwd)) / (2.0 * h);
            }
        }
        grad
    }

    /// Numerical Laplacians using central difference.
    fn numerical_laplacian(&self, r: &[Vector3<f64>], h: f64) -> Vec<f64> {
        let psi = self.evaluate(r);
        let mut laplacian = vec![0.0; r.len()];
        for i in 0..r.len() {
            for axis in 0..3 {
                let mut r_fwd = r.to_vec();
                let mut r_bwd = r.to_vec();
                r_fwd[i][axis] += h;
                r_bwd[i][axis] -= h;
                laplacian[i] +=
                    (self.evaluate(&r_fwd) - 2.0 * psi + self.evaluate(&r_bwd)) / (h * h);
            }
        }
        laplacian
    }
}
