//! Nuclear geometry: positions and charges, fixed for the lifetime of a model.

use anyhow::{ensure, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Fixed nuclear framework of a molecule.
///
/// Positions are in Bohr, charges in units of e. The geometry is validated
/// once at construction and immutable afterwards; the wavefunction model
/// holds it for its whole lifetime.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Geometry {
    positions: Vec<Vector3<f64>>,
    charges: Vec<f64>,
}

impl Geometry {
    /// Create a geometry, checking that positions and charges line up.
    pub fn new(positions: Vec<Vector3<f64>>, charges: Vec<f64>) -> Result<Self> {
        ensure!(!positions.is_empty(), "geometry needs at least one nucleus");
        ensure!(
            positions.len() == charges.len(),
            "geometry has {} positions but {} charges",
            positions.len(),
            charges.len()
        );
        ensure!(
            charges.iter().all(|&z| z > 0.0),
            "nuclear charges must be positive"
        );
        Ok(Self { positions, charges })
    }

    /// Number of nuclei.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vector3<f64>] {
        &self.positions
    }

    pub fn charges(&self) -> &[f64] {
        &self.charges
    }

    /// The same framework shifted rigidly by `shift`.
    pub fn translated(&self, shift: &Vector3<f64>) -> Self {
        Self {
            positions: self.positions.iter().map(|p| p + shift).collect(),
            charges: self.charges.clone(),
        }
    }
}
