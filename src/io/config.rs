//! YAML model specifications.

use anyhow::{Context, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::geometry::Geometry;
use crate::wavefunction::{NeuralWfn, WfnConfig};

/// On-disk description of a model: nuclear framework, spin partition and
/// hyperparameters.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ModelSpec {
    pub nuclei: Vec<NucleusSpec>,
    pub n_up: usize,
    pub n_down: usize,
    #[serde(default)]
    pub config: WfnConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NucleusSpec {
    pub position: [f64; 3],
    pub charge: f64,
}

impl ModelSpec {
    pub fn geometry(&self) -> Result<Geometry> {
        Geometry::new(
            self.nuclei.iter().map(|n| Vector3::from(n.position)).collect(),
            self.nuclei.iter().map(|n| n.charge).collect(),
        )
    }

    /// Build the model described by this spec (thread-rng weight init).
    pub fn build(&self) -> Result<NeuralWfn> {
        NeuralWfn::new(self.geometry()?, self.n_up, self.n_down, &self.config)
    }
}

/// Read a model spec from a YAML file.
pub fn read_model_spec(path: &str) -> Result<ModelSpec> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("cannot open model spec {path}"))?;
    let reader = std::io::BufReader::new(file);
    serde_yaml::from_reader(reader).with_context(|| format!("cannot parse model spec {path}"))
}

// example of a model spec file
// nuclei:
//   - position: [0.0, 0.0, 0.0]
//     charge: 1.0
//   - position: [1.4, 0.0, 0.0]
//     charge: 1.0
// n_up: 1
// n_down: 1
// config:
//   n_interactions: 3
//   cusp_anti: 0.5
