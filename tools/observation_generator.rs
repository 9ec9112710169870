//! Observation Generator
//!
//! Writes random observation vectors as JSON lines, for feeding the
//! `policy-model-loader` binary by hand.

use anyhow::Result;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::{self, Write};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "observation-generator", about = "Generate random observation vectors")]
struct Args {
    /// Observation dimensionality (the model's input width)
    #[arg(long)]
    dim: usize,

    /// Number of observations to generate
    #[arg(long, default_value_t = 10)]
    count: usize,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Half-width of the uniform range values are drawn from
    #[arg(long, default_value_t = 1.0)]
    scale: f32,
}

/// Observation generator for manual testing
struct ObservationGenerator {
    rng: StdRng,
    dim: usize,
    scale: f32,
}

impl ObservationGenerator {
    fn new(dim: usize, scale: f32, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, dim, scale }
    }

    /// Generate one observation with values uniform in `[-scale, scale)`
    fn generate(&mut self) -> Vec<f32> {
        let scale = self.scale;
        (0..self.dim)
            .map(|_| self.rng.gen_range(-scale..scale))
            .collect()
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("observation_generator=info".parse()?),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    anyhow::ensure!(args.scale > 0.0, "--scale must be positive");

    let mut generator = ObservationGenerator::new(args.dim, args.scale, args.seed);
    let mut stdout = io::stdout().lock();

    for _ in 0..args.count {
        writeln!(stdout, "{}", serde_json::to_string(&generator.generate())?)?;
    }
    stdout.flush()?;

    info!(count = args.count, dim = args.dim, "Generated observations");
    Ok(())
}
