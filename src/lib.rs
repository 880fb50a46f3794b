//! Neural wavefunction ansatz for electronic-structure quantum Monte Carlo.
//!
//! Given electron coordinates and a fixed nuclear geometry, the model
//! produces a real amplitude that is antisymmetric under same-spin exchange,
//! carries the electron-electron and electron-nucleus cusp corrections, and
//! decays with the correct ionization rate far from the nuclei. Sampling and
//! parameter optimization live outside this crate; the model exposes a flat
//! parameter vector and numerical-derivative helpers for them.

pub mod asymptotic;
pub mod distance;
pub mod geometry;
pub mod io;
pub mod nn;
pub mod trace;
pub mod wavefunction;

// Re-export commonly used types at crate root
pub use asymptotic::{ElectronicAsymptotic, NuclearAsymptotic};
pub use distance::{pairwise_distance, DistanceBasis};
pub use geometry::Geometry;
pub use io::{read_model_spec, ModelSpec, NucleusSpec};
pub use nn::{ElectronicSchnet, Interaction, LaughlinAnsatz, LogDnn, OrbitalHead};
pub use trace::{NullTrace, Trace, TraceLog};
pub use wavefunction::{NetFactories, NeuralWfn, Wavefunction, WfnConfig};
