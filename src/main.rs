use clap::Parser;
use neural_qmc::trace::Recorded;
use neural_qmc::{read_model_spec, NeuralWfn, TraceLog, Wavefunction};

#[derive(Parser, Debug)]
#[command(version, about = "Evaluate a neural wavefunction on random electron configurations")]
struct Args {
    /// Model spec (YAML)
    #[arg(short, long, default_value = "model.yml")]
    config: String,

    /// Number of configurations to evaluate
    #[arg(short, long, default_value_t = 4)]
    batch: usize,

    /// Weight-initialization seed (thread randomness when omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Dump traced intermediates for the first configuration
    #[arg(short, long)]
    trace: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let spec = read_model_spec(&args.config)?;
    let model = match args.seed {
        Some(seed) => NeuralWfn::seeded(spec.geometry()?, spec.n_up, spec.n_down, &spec.config, seed)?,
        None => spec.build()?,
    };

    println!("Neural Wavefunction Evaluation");
    println!("------------------------------");
    println!("Nuclei:    {}", model.geometry().len());
    println!("Electrons: {}↑ {}↓", model.n_up(), model.n_down());
    println!("Parameters: {}", model.num_params());
    for (name, value) in model.tracked_parameters() {
        println!("  {name} = {value:.4}");
    }
    println!();

    let mut rng = rand::thread_rng();
    let batch: Vec<_> = (0..args.batch).map(|_| model.initialize(&mut rng)).collect();
    let amps = model.amplitudes(&batch);
    println!("Amplitudes:");
    for (k, amp) in amps.iter().enumerate() {
        println!("  sample {k}: {amp:+.6e}");
    }

    if let (true, Some(first)) = (args.trace, batch.first()) {
        let mut log = TraceLog::new();
        model.amplitude_traced(first, &mut log);
        println!("\nTraced intermediates (sample 0):");
        for (key, value) in log.entries() {
            match value {
                Recorded::Scalar(x) => println!("  {key} = {x:+.6e}"),
                Recorded::Vector(v) => println!("  {key} = [{} values]", v.len()),
            }
        }
    }

    Ok(())
}
