//! Precomputed Boltzmann factors for single-spin flips.

/// Number of distinct local energy changes on the square lattice.
const SLOTS: usize = 5;

/// Boltzmann factors `exp(-ΔE·J/T)` for `ΔE ∈ {-8, -4, 0, 4, 8}` in units of `J`.
///
/// Slot `(ΔE + 8) / 4` holds the factor for `ΔE`. The table remembers the
/// temperature and coupling it was built for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptanceTable {
    factors: [f64; SLOTS],
    temperature: f64,
    coupling: f64,
}

impl AcceptanceTable {
    pub fn new(temperature: f64, coupling: f64) -> Self {
        let mut table = Self {
            factors: [1.0; SLOTS],
            temperature,
            coupling,
        };
        table.rebuild(temperature, coupling);
        table
    }

    pub fn rebuild(&mut self, temperature: f64, coupling: f64) {
        debug_assert!(temperature > 0.0, "temperature must be positive");
        self.temperature = temperature;
        self.coupling = coupling;
        for (slot, factor) in self.factors.iter_mut().enumerate() {
            let delta = Self::delta_of_slot(slot) as f64;
            *factor = (-delta * coupling / temperature).exp();
        }
        // ΔE = 0 always accepts
        self.factors[Self::slot(0)] = 1.0;
    }

    /// Slot for a local energy change `delta` (units of `J`).
    #[inline(always)]
    fn slot(delta: i32) -> usize {
        debug_assert!(
            matches!(delta, -8 | -4 | 0 | 4 | 8),
            "ΔE/J = {delta} is not a square-lattice energy change"
        );
        ((delta + 8) / 4) as usize
    }

    #[inline(always)]
    fn delta_of_slot(slot: usize) -> i32 {
        slot as i32 * 4 - 8
    }

    /// Acceptance threshold for a local energy change `delta` (units of `J`).
    #[inline(always)]
    pub fn factor(&self, delta: i32) -> f64 {
        self.factors[Self::slot(delta)]
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn coupling(&self) -> f64 {
        self.coupling
    }

    /// `(ΔE, factor)` pairs in ascending `ΔE`.
    pub fn entries(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.factors
            .iter()
            .enumerate()
            .map(|(slot, &f)| (Self::delta_of_slot(slot), f))
    }
}
