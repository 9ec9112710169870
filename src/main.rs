//! Policy Model Loader - Main Entry Point
//!
//! Loads the configured policy network and runs inference on observation
//! vectors read as JSON lines, writing one JSON output vector per line.

use anyhow::{Context, Result};
use clap::Parser;
use policy_model_loader::config::{AppConfig, LoggingConfig};
use policy_model_loader::models::ModelState;
use policy_model_loader::{ModelLoader, OrtRuntime};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "policy-model-loader", version, about)]
struct Args {
    /// Configuration file [default: config/config.toml, if present]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Model file, overriding `model.path` from the configuration
    #[arg(long)]
    model: Option<String>,

    /// Observation file (JSON array per line); reads stdin when omitted
    #[arg(long)]
    input: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load_or_default(args.config.as_deref())?;
    if let Some(model) = args.model {
        config.model.path = model;
    }

    init_tracing(&config.logging)?;
    info!("Starting Policy Model Loader");

    let runtime = OrtRuntime::new(&config.model)?;
    let mut loader = ModelLoader::new(runtime);
    if !loader.load_model(&config.model.path) {
        anyhow::bail!("Could not load model from {}", config.model.path);
    }
    if let ModelState::Loaded(model) = loader.state() {
        info!(
            input = %model.graph.input_name(),
            output = %model.graph.output_name(),
            "Serving model"
        );
    }

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };
    let mut stdout = io::stdout().lock();

    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read observation")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let observation: Vec<f32> = match serde_json::from_str(line) {
            Ok(observation) => observation,
            Err(e) => {
                warn!(line = index + 1, error = %e, "Failed to parse observation");
                continue;
            }
        };

        // Forward-pass failures are logged by the loader
        if let Ok(output) = loader.inference(&observation) {
            writeln!(stdout, "{}", serde_json::to_string(&output)?)?;
        } else {
            debug!(line = index + 1, "Skipping observation after failed inference");
        }
    }
    stdout.flush()?;

    info!("Input exhausted, shutting down");
    loader.metrics().log_summary();

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log level")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    match logging.format.as_str() {
        "json" => builder.json().init(),
        _ => builder.init(),
    }

    Ok(())
}
