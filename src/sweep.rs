//! Equilibration and sampling at a fixed temperature.
//!
//! [`IsingSimulation`] owns one [`MetropolisEngine`] and the acceptance table
//! for the current temperature and coupling. Temperature and coupling can
//! only change through [`IsingSimulation::set_temperature`] and
//! [`IsingSimulation::set_coupling`], which rebuild the table, so every
//! sweep runs against a table that matches the model.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::Serialize;
use tracing::debug;

use crate::acceptance::AcceptanceTable;
use crate::config::ModelParams;
use crate::error::{Result, SimError};
use crate::lattice::{InitialState, PeriodicLattice};
use crate::metropolis::MetropolisEngine;
use crate::observables::{Accumulators, Averages, ConvergenceTrace};

/// Sweeps discarded before sampling unless configured otherwise.
pub const DEFAULT_STABLE_ITERATIONS: usize = 5000;

/// Temperature a fresh simulation starts at.
pub const DEFAULT_TEMPERATURE: f64 = 1.0;

/// Result of one equilibration + sampling run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SampleRecord {
    pub temperature: f64,
    /// Total sweeps of the run, equilibration included.
    pub mc_iterations: usize,
    /// Sweeps that were averaged, `mc_iterations - stable_iterations`.
    pub samples: usize,
    pub dimension: usize,
    pub averages: Averages,
    /// Accepted / attempted flips over the sampling phase.
    pub acceptance: f64,
}

impl SampleRecord {
    pub fn heat_capacity(&self) -> f64 {
        self.averages.heat_capacity(self.temperature, self.dimension)
    }

    pub fn susceptibility(&self) -> f64 {
        self.averages.susceptibility(self.temperature, self.dimension)
    }
}

/// Reject temperatures the Boltzmann factor cannot use.
pub fn check_temperature(temperature: f64) -> Result<()> {
    if temperature.is_finite() && temperature > 0.0 {
        Ok(())
    } else {
        Err(SimError::Temperature(temperature))
    }
}

/// Sweep controller for one lattice.
#[derive(Debug, Clone)]
pub struct IsingSimulation<R = ChaCha20Rng> {
    engine: MetropolisEngine<R>,
    table: AcceptanceTable,
    mc_iterations: usize,
    stable_iterations: usize,
}

impl<R: RngCore + SeedableRng> IsingSimulation<R> {
    /// Random initial lattice, `J = 1`, default equilibration length.
    pub fn new(n: usize, mc_iterations: usize, seed: u64) -> Result<Self> {
        Self::from_params(&ModelParams {
            dimension: n,
            mc_iterations,
            seed,
            ..ModelParams::default()
        })
    }

    pub fn from_params(params: &ModelParams) -> Result<Self> {
        if params.dimension == 0 {
            return Err(SimError::ZeroDimension(params.dimension));
        }
        let engine = MetropolisEngine::new(
            params.dimension,
            params.coupling,
            params.seed,
            params.initial,
        );
        Ok(Self {
            engine,
            table: AcceptanceTable::new(DEFAULT_TEMPERATURE, params.coupling),
            mc_iterations: params.mc_iterations,
            stable_iterations: params.stable_iterations,
        })
    }

    // ---------------------------------------------------------------
    // Configuration
    // ---------------------------------------------------------------

    /// Rebuild the acceptance table for `temperature`.
    pub fn set_temperature(&mut self, temperature: f64) -> Result<()> {
        check_temperature(temperature)?;
        self.table.rebuild(temperature, self.engine.coupling());
        debug!(temperature, coupling = self.engine.coupling(), "acceptance table rebuilt");
        Ok(())
    }

    /// Change `J`, recompute the totals and rebuild the table.
    pub fn set_coupling(&mut self, coupling: f64) {
        self.engine.set_coupling(coupling);
        self.table.rebuild(self.table.temperature(), coupling);
    }

    pub fn set_mc_iterations(&mut self, mc_iterations: usize) {
        self.mc_iterations = mc_iterations;
    }

    pub fn set_stable_iterations(&mut self, stable_iterations: usize) {
        self.stable_iterations = stable_iterations;
    }

    /// Resize the lattice, refilled with the current initial state.
    pub fn set_dimension(&mut self, n: usize) -> Result<()> {
        if n == 0 {
            return Err(SimError::ZeroDimension(n));
        }
        self.engine.set_dimension(n);
        Ok(())
    }

    /// All spins up; later dimension changes stay ordered.
    pub fn set_ordered_spins(&mut self) {
        self.engine.set_ordered_spins();
    }

    pub fn randomize_spins(&mut self) {
        self.engine.randomize_spins();
    }

    /// Reset dimension, iteration count, coupling and seed together.
    ///
    /// The lattice is rebuilt from the new seed with the current initial
    /// state; the temperature is kept.
    pub fn reconfigure(
        &mut self,
        n: usize,
        mc_iterations: usize,
        coupling: f64,
        seed: u64,
    ) -> Result<()> {
        if n == 0 {
            return Err(SimError::ZeroDimension(n));
        }
        self.engine.reconfigure(n, coupling, seed);
        self.table.rebuild(self.table.temperature(), coupling);
        self.mc_iterations = mc_iterations;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Runs
    // ---------------------------------------------------------------

    /// `min(stable_iterations, total_iterations)` sweeps, nothing recorded.
    pub fn run_to_stability(&mut self, total_iterations: usize) {
        let sweeps = self.stable_iterations.min(total_iterations);
        for _ in 0..sweeps {
            self.engine.sweep(&self.table);
        }
    }

    /// The remaining `total_iterations - stable_iterations` sweeps, averaged.
    ///
    /// Fails before running anything when the window is empty.
    pub fn run_sampling(&mut self, total_iterations: usize) -> Result<SampleRecord> {
        let window = self.sampling_window(total_iterations)?;

        let mut acc = Accumulators::new();
        let accepted_before = self.engine.accepted_flips();
        for _ in 0..window {
            self.engine.sweep(&self.table);
            acc.push(self.engine.total_energy(), self.engine.total_magnetization());
        }
        let accepted = self.engine.accepted_flips() - accepted_before;
        let attempted = (window * self.engine.lattice().sites()) as f64;

        Ok(SampleRecord {
            temperature: self.table.temperature(),
            mc_iterations: total_iterations,
            samples: window,
            dimension: self.engine.dimension(),
            averages: acc.averages(window),
            acceptance: accepted as f64 / attempted,
        })
    }

    /// Equilibrate, then sample; the window is checked before any sweep.
    pub fn run_stable(&mut self, total_iterations: usize) -> Result<SampleRecord> {
        self.sampling_window(total_iterations)?;
        self.run_to_stability(total_iterations);
        self.run_sampling(total_iterations)
    }

    /// `total_iterations` sweeps, keeping the raw totals after each one.
    pub fn run_recording(&mut self, total_iterations: usize) -> ConvergenceTrace {
        let mut trace = ConvergenceTrace::with_capacity(self.table.temperature(), total_iterations);
        for _ in 0..total_iterations {
            self.engine.sweep(&self.table);
            trace.push(self.engine.total_energy(), self.engine.total_magnetization());
        }
        trace
    }

    fn sampling_window(&self, total_iterations: usize) -> Result<usize> {
        if total_iterations > self.stable_iterations {
            Ok(total_iterations - self.stable_iterations)
        } else {
            Err(SimError::SamplingWindow {
                total: total_iterations,
                stable: self.stable_iterations,
            })
        }
    }

    // ---------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------

    pub fn engine(&self) -> &MetropolisEngine<R> {
        &self.engine
    }

    pub fn lattice(&self) -> &PeriodicLattice {
        self.engine.lattice()
    }

    pub fn table(&self) -> &AcceptanceTable {
        &self.table
    }

    pub fn temperature(&self) -> f64 {
        self.table.temperature()
    }

    pub fn coupling(&self) -> f64 {
        self.engine.coupling()
    }

    pub fn dimension(&self) -> usize {
        self.engine.dimension()
    }

    pub fn initial_state(&self) -> InitialState {
        self.engine.initial_state()
    }

    pub fn mc_iterations(&self) -> usize {
        self.mc_iterations
    }

    pub fn stable_iterations(&self) -> usize {
        self.stable_iterations
    }

    pub fn total_energy(&self) -> f64 {
        self.engine.total_energy()
    }

    pub fn total_magnetization(&self) -> f64 {
        self.engine.total_magnetization()
    }

    pub fn accepted_flips(&self) -> u64 {
        self.engine.accepted_flips()
    }
}
