//! Message-passing embedding network over interparticle distance features,
//! and the exchange-symmetric orbital head that turns embeddings into the
//! Jastrow log-amplitude.

use anyhow::{ensure, Result};
use nalgebra::{DMatrix, DVector};
use rand::RngCore;
use rand_distr::{Distribution, Normal};

use super::layers::{Activation, LogDnn, ParamReader, Parameterized};
use crate::distance::DistanceBasis;
use crate::trace::Trace;

/// Distance-basis features for every particle pair, split into the
/// electron-electron block and the electron-nucleus block.
pub struct PairFeatures {
    /// `elec[i][j]`: features of |r_i − r_j| (diagonal present but skipped)
    pub elec: Vec<Vec<DVector<f64>>>,
    /// `nuc[i][m]`: features of |r_i − R_m|
    pub nuc: Vec<Vec<DVector<f64>>>,
}

impl PairFeatures {
    /// Expand both distance matrices through the basis.
    pub fn expand(
        basis: &DistanceBasis,
        dists_elec: &DMatrix<f64>,
        dists_nuc: &DMatrix<f64>,
    ) -> Self {
        Self {
            elec: basis.expand_matrix(dists_elec),
            nuc: basis.expand_matrix(dists_nuc),
        }
    }
}

/// One message-passing round.
///
/// `w_same`, `w_anti` and `w_nuc` turn pair features into kernel-space
/// filters for the three interaction channels; `h` projects embeddings into
/// kernel space and `g` maps the aggregated message back onto the embedding
/// for a residual update.
pub struct Interaction {
    pub w_same: LogDnn,
    pub w_anti: LogDnn,
    pub w_nuc: LogDnn,
    pub h: LogDnn,
    pub g: LogDnn,
}

impl Interaction {
    pub fn new(
        basis_dim: usize,
        kernel_dim: usize,
        embedding_dim: usize,
        rng: &mut dyn RngCore,
    ) -> Self {
        Self {
            w_same: LogDnn::new(basis_dim, kernel_dim, Activation::Ssp, 2, true, rng),
            w_anti: LogDnn::new(basis_dim, kernel_dim, Activation::Ssp, 2, true, rng),
            w_nuc: LogDnn::new(basis_dim, kernel_dim, Activation::Ssp, 2, true, rng),
            h: LogDnn::new(embedding_dim, kernel_dim, Activation::Ssp, 2, true, rng),
            g: LogDnn::new(kernel_dim, embedding_dim, Activation::Ssp, 2, true, rng),
        }
    }
}

impl Parameterized for Interaction {
    fn num_params(&self) -> usize {
        [&self.w_same, &self.w_anti, &self.w_nuc, &self.h, &self.g]
            .iter()
            .map(|n| n.num_params())
            .sum()
    }

    fn write_params(&self, out: &mut Vec<f64>) {
        for net in [&self.w_same, &self.w_anti, &self.w_nuc, &self.h, &self.g] {
            net.write_params(out);
        }
    }

    fn read_params(&mut self, src: &mut ParamReader) {
        for net in [
            &mut self.w_same,
            &mut self.w_anti,
            &mut self.w_nuc,
            &mut self.h,
            &mut self.g,
        ] {
            net.read_params(src);
        }
    }
}

/// Iterative message-passing embedding network.
///
/// Electrons of one spin share a single learnable initial embedding, so a
/// permutation within a spin group permutes the output embeddings and touches
/// nothing else; opposite-spin and nuclear neighbors enter through their own
/// kernel channels. Only pairwise distance features are consumed, never
/// absolute coordinates, so the embeddings are invariant to rigid motions of
/// the whole system.
pub struct ElectronicSchnet {
    n_up: usize,
    n_down: usize,
    kernel_dim: usize,
    embed_up: DVector<f64>,
    embed_down: DVector<f64>,
    embed_nuc: Vec<DVector<f64>>,
    interactions: Vec<Interaction>,
}

impl ElectronicSchnet {
    /// Build with the default interaction blocks.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        n_up: usize,
        n_down: usize,
        n_nuclei: usize,
        n_interactions: usize,
        basis_dim: usize,
        kernel_dim: usize,
        embedding_dim: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Self> {
        let interactions = (0..n_interactions)
            .map(|_| Interaction::new(basis_dim, kernel_dim, embedding_dim, rng))
            .collect();
        Self::with_interactions(
            n_up,
            n_down,
            n_nuclei,
            basis_dim,
            kernel_dim,
            embedding_dim,
            interactions,
            rng,
        )
    }

    /// Build from externally constructed interaction blocks, verifying that
    /// their dimensions are mutually consistent.
    #[allow(clippy::too_many_arguments)]
    pub fn with_interactions(
        n_up: usize,
        n_down: usize,
        n_nuclei: usize,
        basis_dim: usize,
        kernel_dim: usize,
        embedding_dim: usize,
        interactions: Vec<Interaction>,
        rng: &mut dyn RngCore,
    ) -> Result<Self> {
        ensure!(n_up + n_down >= 1, "embedding network needs electrons");
        ensure!(n_nuclei >= 1, "embedding network needs nuclei");
        ensure!(!interactions.is_empty(), "at least one interaction round");
        for inter in &interactions {
            for w in [&inter.w_same, &inter.w_anti, &inter.w_nuc] {
                ensure!(
                    w.in_dim() == basis_dim && w.out_dim() == kernel_dim,
                    "distance kernel must map basis_dim {} to kernel_dim {}",
                    basis_dim,
                    kernel_dim
                );
            }
            ensure!(
                inter.h.in_dim() == embedding_dim && inter.h.out_dim() == kernel_dim,
                "embedding projection must map embedding_dim {} to kernel_dim {}",
                embedding_dim,
                kernel_dim
            );
            ensure!(
                inter.g.in_dim() == kernel_dim && inter.g.out_dim() == embedding_dim,
                "update network must map kernel_dim {} to embedding_dim {}",
                kernel_dim,
                embedding_dim
            );
        }

        let dist = Normal::new(0.0, 1.0).unwrap();
        let mut randn = |dim: usize| DVector::from_fn(dim, |_, _| dist.sample(rng));
        let embed_up = randn(embedding_dim);
        let embed_down = randn(embedding_dim);
        let embed_nuc = (0..n_nuclei).map(|_| randn(kernel_dim)).collect();

        Ok(Self {
            n_up,
            n_down,
            kernel_dim,
            embed_up,
            embed_down,
            embed_nuc,
            interactions,
        })
    }

    pub fn embedding_dim(&self) -> usize {
        self.embed_up.len()
    }

    /// One embedding per electron, up block first.
    ///
    /// `feats.elec` must be (n_up+n_down)² and `feats.nuc` must have one row
    /// per electron and one column per nucleus.
    pub fn forward(&self, feats: &PairFeatures, trace: &mut dyn Trace) -> Vec<DVector<f64>> {
        let n = self.n_up + self.n_down;
        assert_eq!(feats.elec.len(), n, "electron feature table has wrong size");
        assert_eq!(feats.nuc.len(), n, "nuclear feature table has wrong size");

        let mut xs: Vec<DVector<f64>> = (0..n)
            .map(|i| {
                if i < self.n_up {
                    self.embed_up.clone()
                } else {
                    self.embed_down.clone()
                }
            })
            .collect();

        for (round, inter) in self.interactions.iter().enumerate() {
            let hs: Vec<DVector<f64>> = xs.iter().map(|x| inter.h.forward(x)).collect();
            let mut next = xs.clone();
            for i in 0..n {
                let mut z = DVector::zeros(self.kernel_dim);
                for j in 0..n {
                    if j == i {
                        continue;
                    }
                    let same = (i < self.n_up) == (j < self.n_up);
                    let w = if same { &inter.w_same } else { &inter.w_anti };
                    z += w.forward(&feats.elec[i][j]).component_mul(&hs[j]);
                }
                for (m, y) in self.embed_nuc.iter().enumerate() {
                    z += inter.w_nuc.forward(&feats.nuc[i][m]).component_mul(y);
                }
                next[i] += inter.g.forward(&z);
            }
            xs = next;
            if trace.active() {
                trace.enter(&format!("interaction_{round}"));
                for (i, x) in xs.iter().enumerate() {
                    trace.vector(&format!("embedding_{i}"), x);
                }
                trace.leave();
            }
        }
        xs
    }
}

impl Parameterized for ElectronicSchnet {
    fn num_params(&self) -> usize {
        2 * self.embed_up.len()
            + self.embed_nuc.iter().map(DVector::len).sum::<usize>()
            + self
                .interactions
                .iter()
                .map(Parameterized::num_params)
                .sum::<usize>()
    }

    fn write_params(&self, out: &mut Vec<f64>) {
        out.extend(self.embed_up.iter());
        out.extend(self.embed_down.iter());
        for y in &self.embed_nuc {
            out.extend(y.iter());
        }
        for inter in &self.interactions {
            inter.write_params(out);
        }
    }

    fn read_params(&mut self, src: &mut ParamReader) {
        for v in self.embed_up.iter_mut() {
            *v = src.next();
        }
        for v in self.embed_down.iter_mut() {
            *v = src.next();
        }
        for y in &mut self.embed_nuc {
            for v in y.iter_mut() {
                *v = src.next();
            }
        }
        for inter in &mut self.interactions {
            inter.read_params(src);
        }
    }
}

/// Exchange-symmetric Jastrow head.
///
/// A shared network maps each electron embedding to a scalar; the sum over
/// electrons is the Jastrow log-amplitude contribution, invariant under any
/// relabeling by construction.
pub struct OrbitalHead {
    net: LogDnn,
}

impl OrbitalHead {
    pub fn new(embedding_dim: usize, n_layers: usize, rng: &mut dyn RngCore) -> Self {
        Self {
            net: LogDnn::new(embedding_dim, 1, Activation::Ssp, n_layers, true, rng),
        }
    }

    /// Wrap an externally built network; it must produce a single scalar.
    pub fn with_net(net: LogDnn) -> Result<Self> {
        ensure!(net.out_dim() == 1, "orbital head must end in one scalar");
        Ok(Self { net })
    }

    pub fn in_dim(&self) -> usize {
        self.net.in_dim()
    }

    pub fn forward(&self, embeddings: &[DVector<f64>]) -> f64 {
        embeddings.iter().map(|x| self.net.forward(x)[0]).sum()
    }
}

impl Parameterized for OrbitalHead {
    fn num_params(&self) -> usize {
        self.net.num_params()
    }

    fn write_params(&self, out: &mut Vec<f64>) {
        self.net.write_params(out);
    }

    fn read_params(&mut self, src: &mut ParamReader) {
        self.net.read_params(src);
    }
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

    fn embeddings_for(
        net: &ElectronicSchnet,
        basis: &DistanceBasis,
        rs: &[Vector3<f64>],
        nuclei: &[Vector3<f64>],
    ) -> Vec<DVector<f64>> {
        let feats = PairFeatures::expand(
            basis,
            &pairwise_distance(rs, rs),
            &pairwise_distance(rs, nuclei),
        );
        net.forward(&feats, &mut NullTrace)
    }

    #[test]
    fn test_same_spin_permutation_equivariance() {
        let mut rng = StdRng::seed_from_u64(3);
        let net = ElectronicSchnet::new(2, 1, 1, 2, 8, 8, 16, &mut rng).unwrap();
        let basis = DistanceBasis::new(8, 10.0);
        let nuclei = vec![Vector3::zeros()];
        let rs = vec![
            Vector3::new(0.3, 0.1, -0.4),
            Vector3::new(-0.8, 0.5, 0.2),
            Vector3::new(0.6, -0.9, 0.1),
        ];
        let swapped = vec![rs[1], rs[0], rs[2]];

        let xs = embeddings_for(&net, &basis, &rs, &nuclei);
        let ys = embeddings_for(&net, &basis, &swapped, &nuclei);

        for k in 0..16 {
            assert_relative_eq!(ys[0][k], xs[1][k], epsilon = 1e-12);
            assert_relative_eq!(ys[1][k], xs[0][k], epsilon = 1e-12);
            assert_relative_eq!(ys[2][k], xs[2][k], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rigid_motion_leaves_embeddings_unchanged() {
        let mut rng = StdRng::seed_from_u64(5);
        let net = ElectronicSchnet::new(1, 1, 2, 2, 8, 8, 16, &mut rng).unwrap();
        let basis = DistanceBasis::new(8, 10.0);
        let nuclei = vec![Vector3::zeros(), Vector3::new(1.0, 0.0, 0.0)];
        let rs = vec![Vector3::new(0.2, 0.4, -0.1), Vector3::new(0.9, -0.3, 0.6)];

        let shift = Vector3::new(2.0, -1.5, 0.7);
        let rs2: Vec<_> = rs.iter().map(|r| r + shift).collect();
        let nuclei2: Vec<_> = nuclei.iter().map(|p| p + shift).collect();

        let xs = embeddings_for(&net, &basis, &rs, &nuclei);
        let ys = embeddings_for(&net, &basis, &rs2, &nuclei2);
        for (x, y) in xs.iter().zip(&ys) {
            for k in 0..x.len() {
                assert_relative_eq!(x[k], y[k], epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_orbital_head_is_permutation_invariant() {
        let mut rng = StdRng::seed_from_u64(9);
        let head = OrbitalHead::new(6, 2, &mut rng);
        let a = DVector::from_fn(6, |i, _| 0.1 * i as f64);
        let b = DVector::from_fn(6, |i, _| -0.2 * i as f64 + 0.3);
        let fwd = head.forward(&[a.clone(), b.clone()]);
        let rev = head.forward(&[b, a]);
        assert_relative_eq!(fwd, rev, epsilon = 1e-14);
    }
}
