//! LiH Traced Forward Example
//!
//! Builds a four-electron lithium hydride model (two electrons per spin, so
//! both antisymmetrizers are active) and dumps every intermediate recorded
//! during a single traced forward pass.
//!
//! Usage:
//!   cargo run --example lih_trace --release -- [OPTIONS]
//!
//! Options:
//!   -s, --seed <N>      Weight-initialization seed [default: 7]

use clap::Parser;
use nalgebra::Vector3;
use neural_qmc::trace::Recorded;
use neural_qmc::{Geometry, NeuralWfn, TraceLog, Wavefunction, WfnConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// LiH traced forward pass
#[derive(Parser, Debug)]
#[command(version, about = "Traced forward pass for LiH")]
struct Args {
    /// Weight-initialization seed
    #[arg(short, long, default_value_t = 7)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    // LiH at the experimental bond length, 3.015 Bohr
    let geometry = Geometry::new(
        vec![Vector3::zeros(), Vector3::new(3.015, 0.0, 0.0)],
        vec![3.0, 1.0],
    )?;
    let config = WfnConfig {
        cusp_same: Some(0.25),
        cusp_anti: Some(0.5),
        ..WfnConfig::default()
    };
    let model = NeuralWfn::seeded(geometry, 2, 2, &config, args.seed)?;

    println!("LiH Neural Wavefunction, traced forward pass");
    println!("============================================");
    println!("Antisymmetrizers: {:?}", model.has_antisymmetry());
    println!();

    let mut rng = StdRng::seed_from_u64(args.seed);
    let rs = model.initialize(&mut rng);
    let mut log = TraceLog::new();
    let amp = model.amplitude_traced(&rs, &mut log);

    for (key, value) in log.entries() {
        match value {
            Recorded::Scalar(x) => println!("{key:<40} {x:+.6e}"),
            Recorded::Vector(v) => println!("{key:<40} [{} values]", v.len()),
        }
    }
    println!();
    println!("amplitude = {amp:+.6e}");

    Ok(())
}
