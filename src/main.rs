//! Temperature / iteration-count scans of the 2D Ising model
//! (see `SimConfig` for all run parameters).

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_pcg::Pcg64;
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::Registry;

use ising_scan::{
    iteration_sweep, parallel_temperature_sweep, temperature_sweep, CsvSink, Experiment,
    Generator, InitialState, IsingSimulation, SimConfig,
};

/// Metropolis Monte Carlo scans of the 2D Ising model
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file (defaults are used without one)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Lattice side length n (overrides config file)
    #[arg(long)]
    dimension: Option<usize>,

    /// Total sweeps per temperature (overrides config file)
    #[arg(long)]
    mc_iterations: Option<usize>,

    /// Equilibration sweeps (overrides config file)
    #[arg(long)]
    stable_iterations: Option<usize>,

    /// Interaction strength J (overrides config file)
    #[arg(long)]
    coupling: Option<f64>,

    #[arg(long)]
    seed: Option<u64>,

    /// Start from all spins up
    #[arg(long)]
    ordered: bool,

    /// Random number generator: chacha or pcg
    #[arg(long, value_parser = parse_generator)]
    generator: Option<Generator>,

    /// One independent lattice per temperature, run in parallel
    #[arg(long)]
    parallel: bool,

    /// Directory for the CSV tables
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Suffix for the CSV file names
    #[arg(long)]
    postfix: Option<String>,

    /// Write the log to this file instead of stdout
    #[arg(long)]
    log: Option<PathBuf>,
}

fn parse_generator(s: &str) -> std::result::Result<Generator, String> {
    Generator::try_from(s)
}

fn setup_logging(log: Option<&PathBuf>) -> Result<()> {
    match log {
        Some(path) => {
            let file = File::create(path)
                .wrap_err_with(|| format!("could not create log file {}", path.display()))?;
            let file_layer = layer().with_writer(Mutex::new(file)).with_ansi(false);
            Registry::default()
                .with(LevelFilter::INFO)
                .with(file_layer)
                .init();
        }
        None => {
            let stdout_layer = layer().with_writer(std::io::stdout).with_ansi(true);
            Registry::default()
                .with(LevelFilter::INFO)
                .with(stdout_layer)
                .init();
        }
    }
    Ok(())
}

fn apply_overrides(config: &mut SimConfig, args: &Args) {
    let model = &mut config.model;
    if let Some(n) = args.dimension {
        model.dimension = n;
    }
    if let Some(mc) = args.mc_iterations {
        model.mc_iterations = mc;
    }
    if let Some(stable) = args.stable_iterations {
        model.stable_iterations = stable;
    }
    if let Some(j) = args.coupling {
        model.coupling = j;
    }
    if let Some(seed) = args.seed {
        model.seed = seed;
    }
    if args.ordered {
        model.initial = InitialState::Ordered;
    }
    if let Some(generator) = args.generator {
        model.generator = generator;
    }

    if args.parallel {
        match &mut config.experiment {
            Experiment::TemperatureSweep(params) => params.parallel = true,
            Experiment::IterationSweep(_) => {
                warn!("--parallel ignored: iteration sweeps carry one lattice through every MC value")
            }
        }
    }

    if let Some(dir) = &args.output_dir {
        config.output.directory = dir.clone();
    }
    if let Some(postfix) = &args.postfix {
        config.output.postfix = Some(postfix.clone());
    }
}

fn progress_bar() -> Result<ProgressBar> {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template(" {bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}] {msg}")
            .wrap_err("invalid progress bar template")?,
    );
    Ok(bar)
}

fn run<R>(config: &SimConfig) -> Result<()>
where
    R: RngCore + SeedableRng + Send,
{
    let mut sink = CsvSink::new(&config.output.directory, config.output.postfix.clone())
        .wrap_err_with(|| {
            format!("could not prepare output directory {}", config.output.directory.display())
        })?;
    let bar = progress_bar()?;

    let outcome = match &config.experiment {
        Experiment::TemperatureSweep(params) if params.parallel => {
            parallel_temperature_sweep::<R, _>(&config.model, &params.range(), params.mode, &mut sink, &bar)
        }
        Experiment::TemperatureSweep(params) => IsingSimulation::<R>::from_params(&config.model)
            .and_then(|mut sim| temperature_sweep(&mut sim, &params.range(), params.mode, &mut sink, &bar)),
        Experiment::IterationSweep(range) => IsingSimulation::<R>::from_params(&config.model)
            .and_then(|mut sim| iteration_sweep(&mut sim, range, &mut sink, &bar)),
    };
    bar.finish();
    outcome.wrap_err("simulation failed")
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    setup_logging(args.log.as_ref())?;

    let mut config = match &args.config {
        Some(path) => {
            info!("Reading configuration from: {}", path.display());
            SimConfig::from_path(path)
                .wrap_err_with(|| format!("unable to load configuration {}", path.display()))?
        }
        None => SimConfig::default(),
    };
    apply_overrides(&mut config, &args);
    config.validate().wrap_err("invalid configuration")?;
    info!("Configuration:\n{}", config.to_yaml()?);

    let start = Instant::now();
    match config.model.generator {
        Generator::ChaCha => run::<ChaCha20Rng>(&config)?,
        Generator::Pcg => run::<Pcg64>(&config)?,
    }
    info!(
        seconds = start.elapsed().as_secs_f64(),
        directory = %config.output.directory.display(),
        "scan complete"
    );
    Ok(())
}
