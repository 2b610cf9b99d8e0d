//! Run configuration
//!
//! A run is described by a YAML file with three blocks:
//!
//! ```yaml
//! model:
//!   dimension: 20
//!   mc_iterations: 100000
//!   stable_iterations: 5000
//!   coupling: 1.0
//!   seed: 1337
//!   initial: random        # or: ordered
//!   generator: chacha      # or: pcg
//! experiment:
//!   kind: temperature_sweep
//!   start: 2.0
//!   end: 2.6
//!   step: 0.05
//!   mode: sampling         # or: convergence
//!   parallel: false
//! output:
//!   directory: data_files
//!   postfix: L20
//! ```
//!
//! Every field has a default, so an empty file is a valid configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::experiment::{IterationRange, SweepMode, TemperatureRange};
use crate::lattice::InitialState;
use crate::sweep::DEFAULT_STABLE_ITERATIONS;

/// Random number generator behind a simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Generator {
    /// `rand_chacha::ChaCha20Rng`
    #[default]
    ChaCha,
    /// `rand_pcg::Pcg64`
    Pcg,
}

impl TryFrom<&str> for Generator {
    type Error = String;
    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        match s {
            "chacha" => Ok(Self::ChaCha),
            "pcg" => Ok(Self::Pcg),
            _ => Err(format!("unknown generator '{s}', expected 'chacha' or 'pcg'")),
        }
    }
}

/// Lattice and Monte Carlo parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelParams {
    pub dimension: usize,
    /// Total sweeps per temperature, equilibration included.
    pub mc_iterations: usize,
    /// Sweeps discarded before sampling.
    pub stable_iterations: usize,
    /// Interaction strength `J`.
    pub coupling: f64,
    pub seed: u64,
    pub initial: InitialState,
    pub generator: Generator,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            dimension: 20,
            mc_iterations: 100_000,
            stable_iterations: DEFAULT_STABLE_ITERATIONS,
            coupling: 1.0,
            seed: 1337,
            initial: InitialState::Random,
            generator: Generator::ChaCha,
        }
    }
}

impl ModelParams {
    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(SimError::ZeroDimension(self.dimension));
        }
        if !self.coupling.is_finite() {
            return Err(SimError::config(format!(
                "coupling must be finite, got {}",
                self.coupling
            )));
        }
        Ok(())
    }

    /// Sampling needs at least one sweep past equilibration.
    pub fn check_sampling_window(&self, total_iterations: usize) -> Result<()> {
        if total_iterations > self.stable_iterations {
            Ok(())
        } else {
            Err(SimError::SamplingWindow {
                total: total_iterations,
                stable: self.stable_iterations,
            })
        }
    }
}

/// Temperature sweep block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureSweepParams {
    pub start: f64,
    pub end: f64,
    pub step: f64,
    #[serde(default)]
    pub mode: SweepMode,
    /// Run every temperature on its own lattice in parallel.
    #[serde(default)]
    pub parallel: bool,
}

impl TemperatureSweepParams {
    pub fn range(&self) -> TemperatureRange {
        TemperatureRange::new(self.start, self.end, self.step)
    }
}

/// Which driver to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Experiment {
    TemperatureSweep(TemperatureSweepParams),
    IterationSweep(IterationRange),
}

impl Default for Experiment {
    fn default() -> Self {
        Experiment::TemperatureSweep(TemperatureSweepParams {
            start: 2.0,
            end: 2.6,
            step: 0.05,
            mode: SweepMode::Sampling,
            parallel: false,
        })
    }
}

/// Where the CSV tables go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputParams {
    pub directory: PathBuf,
    /// Appended to every file name as `_<postfix>`.
    pub postfix: Option<String>,
}

impl Default for OutputParams {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("data_files"),
            postfix: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    pub model: ModelParams,
    pub experiment: Experiment,
    pub output: OutputParams,
}

impl SimConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        // empty document means all defaults
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yml::to_string(self)?)
    }

    /// Check everything the drivers would otherwise reject mid-run.
    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;
        match &self.experiment {
            Experiment::TemperatureSweep(params) => {
                params.range().validate()?;
                if params.mode == SweepMode::Sampling {
                    self.model.check_sampling_window(self.model.mc_iterations)?;
                }
            }
            Experiment::IterationSweep(range) => {
                range.validate()?;
                self.model.check_sampling_window(range.start)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_parses_from_str() {
        assert_eq!(Generator::try_from("pcg"), Ok(Generator::Pcg));
        assert_eq!(Generator::try_from("chacha"), Ok(Generator::ChaCha));
        assert!(Generator::try_from("mt19937").is_err());
    }

    #[test]
    fn default_config_is_valid() {
        SimConfig::default().validate().unwrap();
    }
}
