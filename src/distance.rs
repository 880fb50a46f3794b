//! Pairwise distances and the smooth radial basis expansion.

use nalgebra::{DMatrix, DVector, Vector3};
use serde::{Deserialize, Serialize};

/// Guard added to the squared norm before the square root so that the
/// derivative stays finite when two particles coincide.
const NORM_GUARD: f64 = 1e-32;

/// Euclidean distance with a stabilized square root.
pub fn stable_distance(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    ((a - b).norm_squared() + NORM_GUARD).sqrt()
}

/// All pairwise distances between two coordinate sets: `D[(i, j)] = |a_i − b_j|`.
pub fn pairwise_distance(a: &[Vector3<f64>], b: &[Vector3<f64>]) -> DMatrix<f64> {
    DMatrix::from_fn(a.len(), b.len(), |i, j| stable_distance(&a[i], &b[j]))
}

/// Strict upper triangle of a square distance matrix, flattened row-major.
pub fn upper_triangle(dists: &DMatrix<f64>) -> Vec<f64> {
    let n = dists.nrows();
    let mut out = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            out.push(dists[(i, j)]);
        }
    }
    out
}

/// Gaussian radial basis over `[0, cutoff]`.
///
/// Centers are quadratically spaced, `mu_k = cutoff·q_k²`, so coverage is
/// densest near the origin where the amplitude varies fastest, and widths
/// `sigma_k = (1 + cutoff·q_k)/7` grow with the center. Features are
/// infinitely differentiable, lie in `(0, 1]` and vanish well beyond the
/// cutoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceBasis {
    mus: Vec<f64>,
    sigmas_sq: Vec<f64>,
}

impl DistanceBasis {
    pub fn new(basis_dim: usize, cutoff: f64) -> Self {
        let delta = 0.5 / basis_dim as f64;
        let steps = (basis_dim.saturating_sub(1)).max(1) as f64;
        let (mus, sigmas_sq) = (0..basis_dim)
            .map(|k| {
                let q = delta + (1.0 - 2.0 * delta) * k as f64 / steps;
                let sigma = (1.0 + cutoff * q) / 7.0;
                (cutoff * q * q, sigma * sigma)
            })
            .unzip();
        Self { mus, sigmas_sq }
    }

    /// Dimension of the feature vector.
    pub fn dim(&self) -> usize {
        self.mus.len()
    }

    /// Expand one distance into its feature vector.
    pub fn expand(&self, dist: f64) -> DVector<f64> {
        DVector::from_iterator(
            self.mus.len(),
            self.mus.iter().zip(&self.sigmas_sq).map(|(&mu, &s2)| {
                let dr = dist - mu;
                (-dr * dr / s2).exp()
            }),
        )
    }

    /// Expand every entry of a distance matrix into a row-major feature table.
    pub fn expand_matrix(&self, dists: &DMatrix<f64>) -> Vec<Vec<DVector<f64>>> {
        (0..dists.nrows())
            .map(|i| {
                (0..dists.ncols())
                    .map(|j| self.expand(dists[(i, j)]))
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pairwise_distance_symmetric_zero_diagonal() {
        let rs = vec![
            Vector3::new(0.1, -0.3, 0.8),
            Vector3::new(1.2, 0.4, -0.5),
            Vector3::new(-0.7, 0.0, 0.2),
        ];
        let d = pairwise_distance(&rs, &rs);
        for i in 0..3 {
            assert!(d[(i, i)] < 1e-15);
            for j in 0..3 {
                assert_relative_eq!(d[(i, j)], d[(j, i)], epsilon = 1e-14);
            }
        }
        assert_relative_eq!(d[(0, 1)], (rs[0] - rs[1]).norm(), epsilon = 1e-12);
    }

    #[test]
    fn test_stable_distance_finite_at_coincidence() {
        let r = Vector3::new(0.3, 0.3, 0.3);
        let d = stable_distance(&r, &r);
        assert!(d.is_finite());
        assert!(d < 1e-15);
    }

    #[test]
    fn test_upper_triangle_order() {
        let d = DMatrix::from_row_slice(3, 3, &[0.0, 1.0, 2.0, 1.0, 0.0, 3.0, 2.0, 3.0, 0.0]);
        assert_eq!(upper_triangle(&d), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_basis_dim_and_bounds() {
        let basis = DistanceBasis::new(32, 10.0);
        assert_eq!(basis.dim(), 32);
        for d in [0.0, 0.5, 3.0, 9.0] {
            let feat = basis.expand(d);
            assert_eq!(feat.len(), 32);
            assert!(feat.iter().all(|&v| v > 0.0 && v <= 1.0));
        }
    }

    #[test]
    fn test_basis_vanishes_past_cutoff() {
        let basis = DistanceBasis::new(32, 10.0);
        let feat = basis.expand(30.0);
        assert!(feat.iter().all(|&v| v < 1e-30));
    }

    #[test]
    fn test_basis_single_function() {
        let basis = DistanceBasis::new(1, 5.0);
        assert_eq!(basis.dim(), 1);
        assert!(basis.expand(1.0)[0].is_finite());
    }
}
