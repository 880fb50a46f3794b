//! H₂ Amplitude Scan Example
//!
//! Builds a neural wavefunction for the hydrogen molecule (one electron per
//! spin) and scans the amplitude while one electron walks along the bond
//! axis, showing the nuclear cusps and the ionization decay.
//!
//! Usage:
//!   cargo run --example h2_amplitudes --release -- [OPTIONS]
//!
//! Options:
//!   -b, --bond <R>      Bond length in Bohr [default: 1.4]
//!   -s, --seed <N>      Weight-initialization seed [default: 42]

use clap::Parser;
use nalgebra::Vector3;
use neural_qmc::{Geometry, NeuralWfn, WfnConfig};

/// H₂ amplitude scan
#[derive(Parser, Debug)]
#[command(version, about = "Amplitude scan for the H2 molecule")]
struct Args {
    /// Bond length in Bohr
    #[arg(short, long, default_value_t = 1.4)]
    bond: f64,

    /// Weight-initialization seed
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let geometry = Geometry::new(
        vec![Vector3::zeros(), Vector3::new(args.bond, 0.0, 0.0)],
        vec![1.0, 1.0],
    )?;
    let config = WfnConfig {
        cusp_anti: Some(0.5),
        ..WfnConfig::default()
    };
    let model = NeuralWfn::seeded(geometry, 1, 1, &config, args.seed)?;

    println!("H2 Neural Wavefunction");
    println!("======================");
    println!("Bond length: {:.2} Bohr", args.bond);
    println!("Parameters:  {}", model.num_params());
    for (name, value) in model.tracked_parameters() {
        println!("  {name} = {value:.4}");
    }
    println!();

    // one electron fixed off-axis, the other walking along the bond
    let fixed = Vector3::new(args.bond / 2.0, 0.8, 0.0);
    println!("{:>8}  {:>14}", "x (Bohr)", "amplitude");
    let mut x = -2.0;
    while x <= args.bond + 6.0 {
        let walker = Vector3::new(x, 0.0, 0.0);
        let amp = model.amplitude(&[walker, fixed]);
        println!("{x:>8.2}  {amp:>14.6e}");
        x += 0.25;
    }

    Ok(())
}
