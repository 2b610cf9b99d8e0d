// observables.rs - Sampling accumulators and thermodynamic averages

use serde::Serialize;

/// Running sums over the sampling phase.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Accumulators {
    pub energy: f64,
    pub energy_squared: f64,
    pub magnetization: f64,
    pub magnetization_abs: f64,
    pub magnetization_squared: f64,
    samples: usize,
}

impl Accumulators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one post-sweep measurement of the totals.
    #[inline]
    pub fn push(&mut self, energy: f64, magnetization: f64) {
        self.energy += energy;
        self.energy_squared += energy * energy;
        self.magnetization += magnetization;
        self.magnetization_abs += magnetization.abs();
        self.magnetization_squared += magnetization * magnetization;
        self.samples += 1;
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Divide every sum by `divisor`.
    ///
    /// The divisor is passed in rather than taken from the push count: the
    /// sampling window fixes it before the first sweep runs.
    pub fn averages(&self, divisor: usize) -> Averages {
        let d = divisor as f64;
        Averages {
            energy: self.energy / d,
            energy_squared: self.energy_squared / d,
            magnetization: self.magnetization / d,
            magnetization_squared: self.magnetization_squared / d,
            magnetization_abs: self.magnetization_abs / d,
        }
    }
}

/// `⟨E⟩, ⟨E²⟩, ⟨M⟩, ⟨M²⟩, ⟨|M|⟩` of the whole lattice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Averages {
    pub energy: f64,
    pub energy_squared: f64,
    pub magnetization: f64,
    pub magnetization_squared: f64,
    pub magnetization_abs: f64,
}

impl Averages {
    /// Specific heat per spin, `(⟨E²⟩ - ⟨E⟩²) / (T² n²)`.
    pub fn heat_capacity(&self, temperature: f64, n: usize) -> f64 {
        let variance = self.energy_squared - self.energy * self.energy;
        variance / (temperature * temperature * (n * n) as f64)
    }

    /// Susceptibility per spin from `|M|`, `(⟨M²⟩ - ⟨|M|⟩²) / (T n²)`.
    pub fn susceptibility(&self, temperature: f64, n: usize) -> f64 {
        let variance = self.magnetization_squared - self.magnetization_abs * self.magnetization_abs;
        variance / (temperature * (n * n) as f64)
    }

    pub fn energy_per_spin(&self, n: usize) -> f64 {
        self.energy / (n * n) as f64
    }

    pub fn abs_magnetization_per_spin(&self, n: usize) -> f64 {
        self.magnetization_abs / (n * n) as f64
    }
}

/// Raw totals after every sweep at one temperature.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvergenceTrace {
    pub temperature: f64,
    pub energy: Vec<f64>,
    pub magnetization: Vec<f64>,
}

impl ConvergenceTrace {
    pub fn with_capacity(temperature: f64, sweeps: usize) -> Self {
        Self {
            temperature,
            energy: Vec::with_capacity(sweeps),
            magnetization: Vec::with_capacity(sweeps),
        }
    }

    pub fn push(&mut self, energy: f64, magnetization: f64) {
        self.energy.push(energy);
        self.magnetization.push(magnetization);
    }

    pub fn len(&self) -> usize {
        self.energy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.energy.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_divide_by_the_given_window() {
        let mut acc = Accumulators::new();
        acc.push(-8.0, 4.0);
        acc.push(0.0, -2.0);
        let avg = acc.averages(2);
        assert_eq!(avg.energy, -4.0);
        assert_eq!(avg.energy_squared, 32.0);
        assert_eq!(avg.magnetization, 1.0);
        assert_eq!(avg.magnetization_abs, 3.0);
        assert_eq!(avg.magnetization_squared, 10.0);
        assert_eq!(acc.samples(), 2);
    }

    #[test]
    fn frozen_system_has_no_fluctuations() {
        let avg = Averages {
            energy: -32.0,
            energy_squared: 1024.0,
            magnetization: 16.0,
            magnetization_squared: 256.0,
            magnetization_abs: 16.0,
        };
        assert_eq!(avg.heat_capacity(1.0, 4), 0.0);
        assert_eq!(avg.susceptibility(1.0, 4), 0.0);
        assert_eq!(avg.energy_per_spin(4), -2.0);
        assert_eq!(avg.abs_magnetization_per_spin(4), 1.0);
    }
}
