//! Metropolis Monte Carlo for the two-dimensional Ising model on a periodic
//! `n × n` lattice.
//!
//! [`IsingSimulation`] runs equilibration and sampling at one temperature;
//! the drivers in [`experiment`] sweep temperature or iteration count and
//! hand their results to a [`RecordSink`].

pub mod acceptance;
pub mod analysis;
pub mod config;
pub mod error;
pub mod experiment;
pub mod lattice;
pub mod metropolis;
pub mod observables;
pub mod output;
pub mod sweep;
pub mod utils;

pub use acceptance::AcceptanceTable;
pub use config::{Experiment, Generator, ModelParams, OutputParams, SimConfig};
pub use error::{Result, SimError};
pub use experiment::{
    iteration_sweep, parallel_temperature_sweep, temperature_sweep, IterationRange, RunHeader,
    RunKind, SweepMode, TemperatureRange,
};
pub use lattice::{InitialState, PeriodicLattice, Spin};
pub use metropolis::{FlipOutcome, MetropolisEngine};
pub use observables::{Accumulators, Averages, ConvergenceTrace};
pub use output::{CsvSink, MemorySink, RecordSink};
pub use sweep::{IsingSimulation, SampleRecord};
