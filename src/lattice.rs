//! Square spin lattice with toroidal wraparound.

use std::fmt;

use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::utils::RandomSource;

pub type Spin = i8;

/// How a lattice is filled at construction and on reconfiguration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitialState {
    /// Independent uniform `±1` spins.
    #[default]
    Random,
    /// Every spin `+1`.
    Ordered,
}

/// `n × n` grid of `±1` spins stored row-major.
///
/// Signed accessors wrap both indices modulo `n`, so row `-1` is row `n-1`
/// and row `n` is row `0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodicLattice {
    n: usize,
    spins: Vec<Spin>,
}

impl PeriodicLattice {
    /// All spins up.
    pub fn ordered(n: usize) -> Self {
        Self { n, spins: vec![1; n * n] }
    }

    /// Independent uniform `±1` spins drawn from `source`, row by row.
    pub fn random<R: RngCore + SeedableRng>(n: usize, source: &mut RandomSource<R>) -> Self {
        let mut lattice = Self::ordered(n);
        lattice.randomize(source);
        lattice
    }

    #[inline(always)]
    pub fn dimension(&self) -> usize {
        self.n
    }

    /// Number of sites, `n²`.
    #[inline(always)]
    pub fn sites(&self) -> usize {
        self.spins.len()
    }

    #[inline(always)]
    fn wrap(&self, i: isize) -> usize {
        i.rem_euclid(self.n as isize) as usize
    }

    pub fn get(&self, row: isize, col: isize) -> Spin {
        self.spins[self.wrap(row) * self.n + self.wrap(col)]
    }

    pub fn set(&mut self, row: isize, col: isize, spin: Spin) {
        debug_assert!(spin == 1 || spin == -1, "spin must be ±1, got {spin}");
        let idx = self.wrap(row) * self.n + self.wrap(col);
        self.spins[idx] = spin;
    }

    /// Spin at an in-range site.
    #[inline(always)]
    pub fn at(&self, row: usize, col: usize) -> Spin {
        self.spins[row * self.n + col]
    }

    /// Reverse the spin at an in-range site.
    #[inline(always)]
    pub fn flip(&mut self, row: usize, col: usize) {
        self.spins[row * self.n + col] *= -1;
    }

    /// Sum of the four periodic nearest neighbours of an in-range site.
    ///
    /// For `n = 1` every neighbour is the site itself and the sum is `4s`.
    #[inline(always)]
    pub fn neighbor_sum(&self, row: usize, col: usize) -> i32 {
        let n = self.n;
        let up = if row == 0 { n - 1 } else { row - 1 };
        let down = if row + 1 == n { 0 } else { row + 1 };
        let left = if col == 0 { n - 1 } else { col - 1 };
        let right = if col + 1 == n { 0 } else { col + 1 };

        self.at(up, col) as i32
            + self.at(down, col) as i32
            + self.at(row, left) as i32
            + self.at(row, right) as i32
    }

    pub fn randomize<R: RngCore + SeedableRng>(&mut self, source: &mut RandomSource<R>) {
        for spin in &mut self.spins {
            *spin = source.next_spin();
        }
    }

    pub fn ordered_fill(&mut self) {
        self.spins.fill(1);
    }

    /// Fill according to `initial`, drawing from `source` when random.
    pub fn fill<R: RngCore + SeedableRng>(
        &mut self,
        initial: InitialState,
        source: &mut RandomSource<R>,
    ) {
        match initial {
            InitialState::Random => self.randomize(source),
            InitialState::Ordered => self.ordered_fill(),
        }
    }

    /// Change the dimension; the new lattice is ordered.
    pub fn resize(&mut self, n: usize) {
        self.n = n;
        self.spins = vec![1; n * n];
    }

    pub fn iter(&self) -> impl Iterator<Item = Spin> + '_ {
        self.spins.iter().copied()
    }

    /// Σ s over all sites.
    pub fn magnetization(&self) -> f64 {
        self.spins.iter().map(|&s| s as f64).sum()
    }

    /// `-J Σ s·(s_right + s_below)`, each bond counted once.
    pub fn energy(&self, coupling: f64) -> f64 {
        let n = self.n as isize;
        let mut energy = 0.0;
        for i in 0..n {
            for j in 0..n {
                let s = self.get(i, j) as f64;
                let right = self.get(i, j + 1) as f64;
                let below = self.get(i + 1, j) as f64;
                energy -= coupling * s * (right + below);
            }
        }
        energy
    }
}

impl fmt::Display for PeriodicLattice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.spins.chunks(self.n.max(1)) {
            for &spin in row {
                write!(f, "{}", if spin == 1 { "↑" } else { "↓" })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
