//! Single-spin-flip Metropolis update with O(1) energy bookkeeping.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::acceptance::AcceptanceTable;
use crate::lattice::{InitialState, PeriodicLattice};
use crate::utils::RandomSource;

/// Returned by [`MetropolisEngine::trial_flip`]; the deltas are zero when rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlipOutcome {
    pub accepted: bool,
    pub delta_energy: f64,
    pub delta_magnetization: f64,
}

impl FlipOutcome {
    const REJECTED: Self = Self {
        accepted: false,
        delta_energy: 0.0,
        delta_magnetization: 0.0,
    };
}

/// Full summation of `(energy, magnetization)` over a lattice.
pub fn total_energy_and_magnetization(lattice: &PeriodicLattice, coupling: f64) -> (f64, f64) {
    (lattice.energy(coupling), lattice.magnetization())
}

/// Owns the lattice, the random stream and the running totals.
///
/// `total_energy` and `total_magnetization` are updated by the accepted
/// flips only and agree with [`total_energy_and_magnetization`] at all times
/// for `n >= 2`.
#[derive(Debug, Clone)]
pub struct MetropolisEngine<R = ChaCha20Rng> {
    lattice: PeriodicLattice,
    source: RandomSource<R>,
    initial: InitialState,
    coupling: f64,
    total_energy: f64,
    total_magnetization: f64,
    accepted: u64,
}

impl<R: RngCore + SeedableRng> MetropolisEngine<R> {
    pub fn new(n: usize, coupling: f64, seed: u64, initial: InitialState) -> Self {
        let mut source = RandomSource::new(n, seed);
        let mut lattice = PeriodicLattice::ordered(n);
        lattice.fill(initial, &mut source);

        let mut engine = Self {
            lattice,
            source,
            initial,
            coupling,
            total_energy: 0.0,
            total_magnetization: 0.0,
            accepted: 0,
        };
        engine.resync();
        engine
    }

    /// Recompute the running totals from the lattice.
    fn resync(&mut self) {
        let (energy, magnetization) = total_energy_and_magnetization(&self.lattice, self.coupling);
        self.total_energy = energy;
        self.total_magnetization = magnetization;
    }

    /// One Metropolis trial at a uniformly drawn site.
    ///
    /// Draw order is row, column, then the acceptance value, whatever `ΔE` is.
    #[inline]
    pub fn trial_flip(&mut self, table: &AcceptanceTable) -> FlipOutcome {
        debug_assert_eq!(table.coupling(), self.coupling, "acceptance table is stale");

        let row = self.source.next_row_or_col();
        let col = self.source.next_row_or_col();
        let spin = self.lattice.at(row, col);

        // ΔE / J = 2 s Σ neighbours, one of {-8, -4, 0, 4, 8}
        let delta = 2 * spin as i32 * self.lattice.neighbor_sum(row, col);
        let threshold = self.source.next_unit_interval();

        if threshold <= table.factor(delta) {
            self.lattice.flip(row, col);
            let delta_energy = self.coupling * delta as f64;
            let delta_magnetization = -2.0 * spin as f64;
            self.total_energy += delta_energy;
            self.total_magnetization += delta_magnetization;
            self.accepted += 1;
            FlipOutcome {
                accepted: true,
                delta_energy,
                delta_magnetization,
            }
        } else {
            FlipOutcome::REJECTED
        }
    }

    /// `n²` trial flips at randomly chosen sites (with replacement).
    /// Returns the number of accepted flips.
    pub fn sweep(&mut self, table: &AcceptanceTable) -> u64 {
        let before = self.accepted;
        for _ in 0..self.lattice.sites() {
            self.trial_flip(table);
        }
        self.accepted - before
    }

    #[inline(always)]
    pub fn total_energy(&self) -> f64 {
        self.total_energy
    }

    #[inline(always)]
    pub fn total_magnetization(&self) -> f64 {
        self.total_magnetization
    }

    /// Accepted flips since construction or the last reconfiguration.
    pub fn accepted_flips(&self) -> u64 {
        self.accepted
    }

    pub fn lattice(&self) -> &PeriodicLattice {
        &self.lattice
    }

    pub fn dimension(&self) -> usize {
        self.lattice.dimension()
    }

    pub fn coupling(&self) -> f64 {
        self.coupling
    }

    pub fn initial_state(&self) -> InitialState {
        self.initial
    }

    pub fn seed(&self) -> u64 {
        self.source.seed()
    }

    /// From-scratch `(energy, magnetization)` of the current lattice.
    pub fn recompute(&self) -> (f64, f64) {
        total_energy_and_magnetization(&self.lattice, self.coupling)
    }

    pub fn set_coupling(&mut self, coupling: f64) {
        self.coupling = coupling;
        self.resync();
    }

    /// New dimension, refilled according to the current initial state from
    /// the running stream.
    pub fn set_dimension(&mut self, n: usize) {
        self.lattice.resize(n);
        self.source.set_dimension(n);
        self.lattice.fill(self.initial, &mut self.source);
        self.resync();
    }

    pub fn set_ordered_spins(&mut self) {
        self.initial = InitialState::Ordered;
        self.lattice.ordered_fill();
        self.resync();
    }

    /// Redraw every spin from the running stream.
    pub fn randomize_spins(&mut self) {
        self.initial = InitialState::Random;
        self.lattice.randomize(&mut self.source);
        self.resync();
    }

    /// Reset dimension, coupling and seed together; the lattice is rebuilt
    /// from the new stream and the accepted-flip counter restarts.
    pub fn reconfigure(&mut self, n: usize, coupling: f64, seed: u64) {
        *self = Self::new(n, coupling, seed, self.initial);
    }
}
