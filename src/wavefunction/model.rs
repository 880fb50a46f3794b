//! Top-level neural wavefunction ansatz.
//!
//! `NeuralWfn` wires the distance basis, the message-passing embedding
//! network, the orbital head, the per-spin antisymmetrizers and the
//! asymptotic factors into one amplitude:
//!
//! Ψ(r) = A↑(r) · A↓(r) · exp(J(r)) · N(r) · C_same(r) · C_anti(r)

use anyhow::{ensure, Result};
use log::debug;
use nalgebra::{DMatrix, Vector3};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use super::traits::Wavefunction;
use crate::asymptotic::{ElectronicAsymptotic, NuclearAsymptotic};
use crate::distance::{pairwise_distance, upper_triangle, DistanceBasis};
use crate::geometry::Geometry;
use crate::nn::{
    Activation, ElectronicSchnet, Interaction, LaughlinAnsatz, LogDnn, OrbitalHead, PairFeatures,
    ParamReader, Parameterized, PAIR_FEATURE_DIM,
};
use crate::trace::{NullTrace, Trace};

/// Hyperparameters of the ansatz.
///
/// The defaults give a mid-sized network suitable for small molecules.
/// `cusp_same` / `cusp_anti`
/// toggle the corresponding electronic asymptotic factor: leaving one unset
/// omits that factor entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WfnConfig {
    /// Radial basis size
    pub basis_dim: usize,
    /// Radial basis cutoff (Bohr)
    pub cutoff: f64,
    /// Width of the message kernels
    pub kernel_dim: usize,
    /// Width of the electron embeddings
    pub embedding_dim: usize,
    /// Width of the antisymmetrizer pair latent
    pub latent_dim: usize,
    /// Message-passing rounds
    pub n_interactions: usize,
    /// Depth of the orbital head
    pub n_orbital_layers: usize,
    /// Initial ionization potential
    pub ion_pot: f64,
    /// Crossover rate shared by the asymptotic factors
    pub alpha: f64,
    /// Initial same-spin cusp coefficient
    pub cusp_same: Option<f64>,
    /// Initial opposite-spin cusp coefficient
    pub cusp_anti: Option<f64>,
}

impl Default for WfnConfig {
    fn default() -> Self {
        Self {
            basis_dim: 32,
            cutoff: 10.0,
            kernel_dim: 64,
            embedding_dim: 128,
            latent_dim: 10,
            n_interactions: 3,
            n_orbital_layers: 3,
            ion_pot: 0.5,
            alpha: 1.0,
            cusp_same: None,
            cusp_anti: None,
        }
    }
}

impl WfnConfig {
    fn validate(&self) -> Result<()> {
        ensure!(self.basis_dim >= 1, "basis_dim must be at least 1");
        ensure!(self.cutoff > 0.0, "cutoff must be positive");
        ensure!(self.kernel_dim >= 1, "kernel_dim must be at least 1");
        ensure!(self.embedding_dim >= 1, "embedding_dim must be at least 1");
        ensure!(self.latent_dim >= 1, "latent_dim must be at least 1");
        ensure!(self.n_interactions >= 1, "n_interactions must be at least 1");
        ensure!(
            self.n_orbital_layers >= 1,
            "n_orbital_layers must be at least 1"
        );
        ensure!(self.ion_pot > 0.0, "ion_pot must be positive");
        ensure!(self.alpha > 0.0, "alpha must be positive");
        Ok(())
    }
}

/// Optional builders for the substitutable subnetworks.
///
/// A `None` field selects the built-in architecture. Builders receive the
/// relevant dimensions and the construction RNG, so swapping an architecture
/// never touches the orchestration code.
#[derive(Default)]
pub struct NetFactories {
    /// (basis_dim, kernel_dim, embedding_dim) → one message-passing round
    pub interaction: Option<Box<dyn Fn(usize, usize, usize, &mut dyn RngCore) -> Interaction>>,
    /// embedding_dim → orbital head network (must end in one scalar)
    pub orbital: Option<Box<dyn Fn(usize, &mut dyn RngCore) -> LogDnn>>,
    /// latent_dim → pair network (7 inputs)
    pub pair: Option<Box<dyn Fn(usize, &mut dyn RngCore) -> LogDnn>>,
    /// latent_dim → odd final network (one scalar)
    pub odd: Option<Box<dyn Fn(usize, &mut dyn RngCore) -> LogDnn>>,
}

/// Neural wavefunction ansatz over a fixed nuclear geometry.
///
/// Construction validates the configuration; the forward pass is a pure
/// function of the configuration batch and the current parameters. Parameters
/// are mutated only through `set_params`, by an external optimizer.
pub struct NeuralWfn {
    geometry: Geometry,
    n_up: usize,
    n_down: usize,
    basis: DistanceBasis,
    schnet: ElectronicSchnet,
    orbital: OrbitalHead,
    anti_up: Option<LaughlinAnsatz>,
    anti_down: Option<LaughlinAnsatz>,
    asymp_nuc: NuclearAsymptotic,
    asymp_same: Option<ElectronicAsymptotic>,
    asymp_anti: Option<ElectronicAsymptotic>,
}

impl NeuralWfn {
    /// Build with thread-local randomness and the built-in subnetworks.
    pub fn new(geometry: Geometry, n_up: usize, n_down: usize, config: &WfnConfig) -> Result<Self> {
        Self::build(
            geometry,
            n_up,
            n_down,
            config,
            NetFactories::default(),
            &mut rand::thread_rng(),
        )
    }

    /// Deterministic construction: same seed, same weights.
    pub fn seeded(
        geometry: Geometry,
        n_up: usize,
        n_down: usize,
        config: &WfnConfig,
        seed: u64,
    ) -> Result<Self> {
        Self::build(
            geometry,
            n_up,
            n_down,
            config,
            NetFactories::default(),
            &mut StdRng::seed_from_u64(seed),
        )
    }

    /// Full-control construction with subnetwork factories.
    pub fn build(
        geometry: Geometry,
        n_up: usize,
        n_down: usize,
        config: &WfnConfig,
        factories: NetFactories,
        rng: &mut dyn RngCore,
    ) -> Result<Self> {
        config.validate()?;
        ensure!(n_up + n_down >= 1, "model needs at least one electron");

        let basis = DistanceBasis::new(config.basis_dim, config.cutoff);

        let interactions = (0..config.n_interactions)
            .map(|_| match &factories.interaction {
                Some(build) => build(config.basis_dim, config.kernel_dim, config.embedding_dim, rng),
                None => Interaction::new(config.basis_dim, config.kernel_dim, config.embedding_dim, rng),
            })
            .collect();
        let schnet = ElectronicSchnet::with_interactions(
            n_up,
            n_down,
            geometry.len(),
            config.basis_dim,
            config.kernel_dim,
            config.embedding_dim,
            interactions,
            rng,
        )?;

        let orbital_net = match &factories.orbital {
            Some(build) => build(config.embedding_dim, rng),
            None => LogDnn::new(
                config.embedding_dim,
                1,
                Activation::Ssp,
                config.n_orbital_layers,
                true,
                rng,
            ),
        };
        ensure!(
            orbital_net.in_dim() == config.embedding_dim,
            "orbital head input {} does not match embedding_dim {}",
            orbital_net.in_dim(),
            config.embedding_dim
        );
        let orbital = OrbitalHead::with_net(orbital_net)?;

        let make_anti = |rng: &mut dyn RngCore| -> Result<LaughlinAnsatz> {
            let pair_net = match &factories.pair {
                Some(build) => build(config.latent_dim, rng),
                None => LogDnn::new(
                    PAIR_FEATURE_DIM,
                    config.latent_dim,
                    Activation::Ssp,
                    2,
                    false,
                    rng,
                ),
            };
            let odd_net = match &factories.odd {
                Some(build) => build(config.latent_dim, rng),
                None => LogDnn::new(config.latent_dim, 1, Activation::Ssp, 2, false, rng),
            };
            LaughlinAnsatz::with_nets(pair_net, odd_net)
        };
        let anti_up = if n_up > 1 { Some(make_anti(rng)?) } else { None };
        let anti_down = if n_down > 1 { Some(make_anti(rng)?) } else { None };

        let asymp_nuc =
            NuclearAsymptotic::new(geometry.charges().to_vec(), config.ion_pot, config.alpha);
        let asymp_same = config
            .cusp_same
            .map(|c| ElectronicAsymptotic::new(c, config.alpha));
        let asymp_anti = config
            .cusp_anti
            .map(|c| ElectronicAsymptotic::new(c, config.alpha));

        let model = Self {
            geometry,
            n_up,
            n_down,
            basis,
            schnet,
            orbital,
            anti_up,
            anti_down,
            asymp_nuc,
            asymp_same,
            asymp_anti,
        };
        debug!(
            "built neural wavefunction: {} nuclei, {}↑ {}↓ electrons, {} parameters",
            model.geometry.len(),
            model.n_up,
            model.n_down,
            model.num_params()
        );
        Ok(model)
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn n_up(&self) -> usize {
        self.n_up
    }

    pub fn n_down(&self) -> usize {
        self.n_down
    }

    /// Which spin groups carry an antisymmetrization factor (groups of fewer
    /// than two electrons do not).
    pub fn has_antisymmetry(&self) -> [bool; 2] {
        [self.anti_up.is_some(), self.anti_down.is_some()]
    }

    /// Physical scalar parameters by name, for external logging or
    /// regularization.
    pub fn tracked_parameters(&self) -> Vec<(&'static str, f64)> {
        let mut params = vec![("ion_pot", self.asymp_nuc.ion_pot)];
        if let Some(a) = &self.asymp_same {
            params.push(("cusp_same", a.cusp));
        }
        if let Some(a) = &self.asymp_anti {
            params.push(("cusp_anti", a.cusp));
        }
        params
    }

    /// Amplitude of one configuration.
    pub fn amplitude(&self, rs: &[Vector3<f64>]) -> f64 {
        self.amplitude_traced(rs, &mut NullTrace)
    }

    /// One amplitude per sample; samples are independent.
    pub fn amplitudes(&self, batch: &[Vec<Vector3<f64>>]) -> Vec<f64> {
        batch.iter().map(|rs| self.amplitude(rs)).collect()
    }

    /// Amplitude of one configuration, recording intermediates into `trace`.
    pub fn amplitude_traced(&self, rs: &[Vector3<f64>], trace: &mut dyn Trace) -> f64 {
        assert_eq!(
            rs.len(),
            self.n_up + self.n_down,
            "configuration has {} electrons, model expects {}",
            rs.len(),
            self.n_up + self.n_down
        );

        let dists_elec = pairwise_distance(rs, rs);
        let dists_nuc = pairwise_distance(rs, self.geometry.positions());
        let up_block = dists_elec.view((0, 0), (self.n_up, self.n_up)).into_owned();
        let down_block = dists_elec
            .view((self.n_up, self.n_up), (self.n_down, self.n_down))
            .into_owned();

        let feats = PairFeatures::expand(&self.basis, &dists_elec, &dists_nuc);
        trace.enter("schnet");
        let xs = self.schnet.forward(&feats, trace);
        trace.leave();

        let jastrow = self.orbital.forward(&xs);
        trace.scalar("jastrow", jastrow);

        let (up, down) = rs.split_at(self.n_up);
        let mut anti = [1.0, 1.0];
        let groups = [
            ("anti_up", &self.anti_up, up, &up_block),
            ("anti_down", &self.anti_down, down, &down_block),
        ];
        for (k, (label, net, group, block)) in groups.into_iter().enumerate() {
            if let Some(net) = net {
                trace.enter(label);
                anti[k] = net.forward(group, block, trace);
                trace.leave();
            }
        }

        let asymp_nuc = self.asymp_nuc.forward(&dists_nuc);
        trace.scalar("asymp_nuc", asymp_nuc);

        let asymp_same = match &self.asymp_same {
            Some(a) => {
                let mut same_dists = upper_triangle(&up_block);
                same_dists.extend(upper_triangle(&down_block));
                a.forward(&same_dists)
            }
            None => 1.0,
        };
        trace.scalar("asymp_same", asymp_same);

        let asymp_anti = match &self.asymp_anti {
            Some(a) => a.forward(&self.cross_spin_distances(&dists_elec)),
            None => 1.0,
        };
        trace.scalar("asymp_anti", asymp_anti);

        anti[0] * anti[1] * jastrow.exp() * asymp_nuc * asymp_same * asymp_anti
    }

    /// Up-vs-down distance block, flattened row-major.
    fn cross_spin_distances(&self, dists_elec: &DMatrix<f64>) -> Vec<f64> {
        let mut cross = Vec::with_capacity(self.n_up * self.n_down);
        for i in 0..self.n_up {
            for j in 0..self.n_down {
                cross.push(dists_elec[(i, self.n_up + j)]);
            }
        }
        cross
    }

    /// Total number of learnable parameters: network weights, embeddings and
    /// physical scalars.
    pub fn num_params(&self) -> usize {
        let mut n = self.schnet.num_params() + self.orbital.num_params();
        for anti in [&self.anti_up, &self.anti_down].into_iter().flatten() {
            n += anti.num_params();
        }
        n += self.asymp_nuc.num_params();
        for asymp in [&self.asymp_same, &self.asymp_anti].into_iter().flatten() {
            n += asymp.num_params();
        }
        n
    }

    /// Flat view of every learnable parameter, in a fixed traversal order.
    pub fn get_params(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.num_params());
        self.schnet.write_params(&mut out);
        self.orbital.write_params(&mut out);
        for anti in [&self.anti_up, &self.anti_down].into_iter().flatten() {
            anti.write_params(&mut out);
        }
        self.asymp_nuc.write_params(&mut out);
        for asymp in [&self.asymp_same, &self.asymp_anti].into_iter().flatten() {
            asymp.write_params(&mut out);
        }
        out
    }

    /// Overwrite every learnable parameter from a flat vector produced by
    /// (or shaped like) `get_params`. Panics on a length mismatch: that is
    /// an optimizer bug, not a recoverable condition.
    pub fn set_params(&mut self, params: &[f64]) {
        assert_eq!(
            params.len(),
            self.num_params(),
            "parameter vector has {} entries, model has {}",
            params.len(),
            self.num_params()
        );
        let mut src = ParamReader::new(params);
        self.schnet.read_params(&mut src);
        self.orbital.read_params(&mut src);
        for anti in [&mut self.anti_up, &mut self.anti_down]
            .into_iter()
            .flatten()
        {
            anti.read_params(&mut src);
        }
        self.asymp_nuc.read_params(&mut src);
        for asymp in [&mut self.asymp_same, &mut self.asymp_anti]
            .into_iter()
            .flatten()
        {
            asymp.read_params(&mut src);
        }
        debug_assert_eq!(src.consumed(), params.len());
    }
}

impl Wavefunction for NeuralWfn {
    fn num_particles(&self) -> usize {
        self.n_up + self.n_down
    }

    fn initialize(&self, rng: &mut dyn RngCore) -> Vec<Vector3<f64>> {
        let dist = Normal::new(0.0, 1.0).unwrap();
        (0..self.num_particles())
            .map(|i| {
                let nucleus = self.geometry.positions()[i % self.geometry.len()];
                nucleus + Vector3::from_distribution(&dist, rng)
            })
            .collect()
    }

    fn evaluate(&self, r: &[Vector3<f64>]) -> f64 {
        self.amplitude(r)
    }
}
