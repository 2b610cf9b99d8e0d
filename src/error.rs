//! Error type shared by the simulation library.

use thiserror::Error;

/// Everything that can go wrong outside the numerical inner loop.
///
/// The Monte Carlo update itself cannot fail; these variants cover invalid
/// run parameters, configuration parsing and the output sinks.
#[derive(Error, Debug)]
pub enum SimError {
    /// The lattice must hold at least one site.
    #[error("lattice dimension must be >= 1, got {0}")]
    ZeroDimension(usize),

    /// Sampling needs at least one sweep after equilibration.
    #[error(
        "sampling window is empty: total_iterations ({total}) must exceed \
         stable_iterations ({stable})"
    )]
    SamplingWindow { total: usize, stable: usize },

    /// Temperatures enter the Boltzmann factor as a divisor.
    #[error("temperature must be positive and finite, got {0}")]
    Temperature(f64),

    #[error("invalid temperature range {start}..={end} with step {step}: {reason}")]
    TemperatureRange {
        start: f64,
        end: f64,
        step: f64,
        reason: &'static str,
    },

    #[error("invalid iteration range {start}..{end} with step {step}: {reason}")]
    IterationRange {
        start: usize,
        end: usize,
        step: usize,
        reason: &'static str,
    },

    #[error("exact enumeration supports 1 <= n <= {max}, got {n}")]
    Enumeration { n: usize, max: usize },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("could not parse configuration: {0}")]
    Parse(#[from] serde_yml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimError {
    pub fn config(message: impl Into<String>) -> Self {
        SimError::Config(message.into())
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
