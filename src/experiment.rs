//! Temperature and iteration-count sweeps.
//!
//! The drivers validate their whole parameter range before the first sweep,
//! rebuild the acceptance table once per temperature and hand every result
//! to a [`RecordSink`]. They never touch files themselves.

use indicatif::ProgressBar;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ModelParams;
use crate::error::{Result, SimError};
use crate::lattice::InitialState;
use crate::observables::ConvergenceTrace;
use crate::output::RecordSink;
use crate::sweep::{check_temperature, IsingSimulation, SampleRecord};
use crate::utils::stream_seed;

/// Fixed temperature of an iteration sweep.
pub const ITERATION_SWEEP_TEMPERATURE: f64 = 1.0;

/// What a temperature sweep produces per temperature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SweepMode {
    /// Equilibrate, then average over the sampling phase.
    #[default]
    Sampling,
    /// Raw totals after every sweep, no equilibration.
    Convergence,
}

/// `start..=end` in steps of `step`.
///
/// The number of points is fixed up front as `round((end - start) / step) + 1`
/// and point `i` is `start + i * step`, so no step error accumulates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRange {
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

impl TemperatureRange {
    pub fn new(start: f64, end: f64, step: f64) -> Self {
        Self { start, end, step }
    }

    /// A single temperature.
    pub fn single(temperature: f64) -> Self {
        Self::new(temperature, temperature, 1.0)
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |reason| SimError::TemperatureRange {
            start: self.start,
            end: self.end,
            step: self.step,
            reason,
        };
        if !(self.start.is_finite() && self.end.is_finite() && self.step.is_finite()) {
            return Err(fail("bounds and step must be finite"));
        }
        if self.step <= 0.0 {
            return Err(fail("step must be positive"));
        }
        if self.end < self.start {
            return Err(fail("end must not be below start"));
        }
        check_temperature(self.start).map_err(|_| fail("temperatures must be positive"))
    }

    /// Number of temperatures; call after [`validate`](Self::validate).
    pub fn len(&self) -> usize {
        ((self.end - self.start) / self.step).round() as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn temperatures(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len()).map(move |i| self.start + i as f64 * self.step)
    }
}

/// `start..end` (end exclusive) in steps of `step` Monte Carlo sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationRange {
    pub start: usize,
    pub end: usize,
    pub step: usize,
}

impl IterationRange {
    pub fn new(start: usize, end: usize, step: usize) -> Self {
        Self { start, end, step }
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |reason| SimError::IterationRange {
            start: self.start,
            end: self.end,
            step: self.step,
            reason,
        };
        if self.step == 0 {
            return Err(fail("step must be positive"));
        }
        if self.end <= self.start {
            return Err(fail("range is empty"));
        }
        Ok(())
    }

    pub fn values(&self) -> impl Iterator<Item = usize> {
        (self.start..self.end).step_by(self.step.max(1))
    }

    pub fn len(&self) -> usize {
        self.values().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Kind of table a run fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunKind {
    /// One sampling record per temperature.
    TemperatureSweep,
    /// One energy and one magnetization series per temperature.
    Convergence,
    /// One sampling record per iteration count.
    IterationSweep,
}

/// Parameters that hold for every record of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunHeader {
    pub kind: RunKind,
    pub dimension: usize,
    pub mc_iterations: usize,
    pub stable_iterations: usize,
    pub coupling: f64,
    pub seed: u64,
    pub initial: InitialState,
}

impl RunHeader {
    fn from_params(kind: RunKind, params: &ModelParams) -> Self {
        Self {
            kind,
            dimension: params.dimension,
            mc_iterations: params.mc_iterations,
            stable_iterations: params.stable_iterations,
            coupling: params.coupling,
            seed: params.seed,
            initial: params.initial,
        }
    }

    fn from_simulation<R: RngCore + SeedableRng>(kind: RunKind, sim: &IsingSimulation<R>) -> Self {
        Self {
            kind,
            dimension: sim.dimension(),
            mc_iterations: sim.mc_iterations(),
            stable_iterations: sim.stable_iterations(),
            coupling: sim.coupling(),
            seed: sim.engine().seed(),
            initial: sim.initial_state(),
        }
    }
}

fn run_kind(mode: SweepMode) -> RunKind {
    match mode {
        SweepMode::Sampling => RunKind::TemperatureSweep,
        SweepMode::Convergence => RunKind::Convergence,
    }
}

/// Sweep the temperature on one lattice, carried over between temperatures.
pub fn temperature_sweep<R, S>(
    sim: &mut IsingSimulation<R>,
    range: &TemperatureRange,
    mode: SweepMode,
    sink: &mut S,
    progress: &ProgressBar,
) -> Result<()>
where
    R: RngCore + SeedableRng,
    S: RecordSink + ?Sized,
{
    range.validate()?;
    let total = sim.mc_iterations();
    if mode == SweepMode::Sampling && total <= sim.stable_iterations() {
        return Err(SimError::SamplingWindow {
            total,
            stable: sim.stable_iterations(),
        });
    }

    sink.begin(&RunHeader::from_simulation(run_kind(mode), sim))?;
    progress.set_length(range.len() as u64);

    for temperature in range.temperatures() {
        sim.set_temperature(temperature)?;
        info!(temperature, end = range.end, step = range.step, "temperature");

        match mode {
            SweepMode::Sampling => {
                let record = sim.run_stable(total)?;
                sink.record(&record)?;
            }
            SweepMode::Convergence => {
                let trace = sim.run_recording(total);
                sink.trace(&trace)?;
            }
        }
        progress.inc(1);
    }

    sink.finish()
}

/// Vary the number of sweeps at [`ITERATION_SWEEP_TEMPERATURE`].
///
/// Each `MC` value runs equilibration + sampling with `total = MC`; the
/// lattice carries over from one value to the next.
pub fn iteration_sweep<R, S>(
    sim: &mut IsingSimulation<R>,
    range: &IterationRange,
    sink: &mut S,
    progress: &ProgressBar,
) -> Result<()>
where
    R: RngCore + SeedableRng,
    S: RecordSink + ?Sized,
{
    range.validate()?;
    // the smallest count decides whether every window is non-empty
    if range.start <= sim.stable_iterations() {
        return Err(SimError::SamplingWindow {
            total: range.start,
            stable: sim.stable_iterations(),
        });
    }

    sim.set_temperature(ITERATION_SWEEP_TEMPERATURE)?;
    sink.begin(&RunHeader::from_simulation(RunKind::IterationSweep, sim))?;
    progress.set_length(range.len() as u64);

    for mc in range.values() {
        info!(mc_iterations = mc, end = range.end, step = range.step, "iteration count");
        let record = sim.run_stable(mc)?;
        sink.record(&record)?;
        progress.inc(1);
    }

    sink.finish()
}

enum Outcome {
    Record(SampleRecord),
    Trace(ConvergenceTrace),
}

/// Temperature sweep with one fresh lattice per temperature, run on the
/// rayon pool.
///
/// Temperature `i` gets its own generator seeded with
/// `stream_seed(params.seed, i)`; results reach the sink in temperature order.
pub fn parallel_temperature_sweep<R, S>(
    params: &ModelParams,
    range: &TemperatureRange,
    mode: SweepMode,
    sink: &mut S,
    progress: &ProgressBar,
) -> Result<()>
where
    R: RngCore + SeedableRng + Send,
    S: RecordSink + ?Sized,
{
    params.validate()?;
    range.validate()?;
    if mode == SweepMode::Sampling {
        params.check_sampling_window(params.mc_iterations)?;
    }

    sink.begin(&RunHeader::from_params(run_kind(mode), params))?;
    progress.set_length(range.len() as u64);

    let temperatures: Vec<f64> = range.temperatures().collect();
    let outcomes = temperatures
        .par_iter()
        .enumerate()
        .map(|(idx, &temperature)| -> Result<Outcome> {
            let stream = ModelParams {
                seed: stream_seed(params.seed, idx),
                ..params.clone()
            };
            let mut sim = IsingSimulation::<R>::from_params(&stream)?;
            sim.set_temperature(temperature)?;

            let outcome = match mode {
                SweepMode::Sampling => Outcome::Record(sim.run_stable(params.mc_iterations)?),
                SweepMode::Convergence => Outcome::Trace(sim.run_recording(params.mc_iterations)),
            };
            info!(temperature, stream = idx, "temperature done");
            progress.inc(1);
            Ok(outcome)
        })
        .collect::<Result<Vec<_>>>()?;

    for outcome in &outcomes {
        match outcome {
            Outcome::Record(record) => sink.record(record)?,
            Outcome::Trace(trace) => sink.trace(trace)?,
        }
    }
    sink.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_has_no_accumulated_step_error() {
        let range = TemperatureRange::new(1.0, 2.0, 0.1);
        let temps: Vec<f64> = range.temperatures().collect();
        assert_eq!(temps.len(), 11);
        assert!((temps[10] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn iteration_values_exclude_end() {
        let range = IterationRange::new(100, 400, 100);
        assert_eq!(range.values().collect::<Vec<_>>(), vec![100, 200, 300]);
    }
}
