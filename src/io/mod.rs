//! IO module - model specifications on disk.

mod config;

pub use config::{read_model_spec, ModelSpec, NucleusSpec};
