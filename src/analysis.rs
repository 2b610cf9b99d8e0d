//! Reference values and peak finding for sweep results

use crate::error::{Result, SimError};
use crate::lattice::PeriodicLattice;
use crate::observables::Averages;
use crate::sweep::{check_temperature, SampleRecord};

/// Largest lattice [`exact_averages`] will enumerate (`2^16` states).
pub const MAX_EXACT_DIMENSION: usize = 4;

/// Onsager's critical temperature of the infinite square lattice,
/// `T_c = 2J / ln(1 + √2) ≈ 2.269` for `J = 1`.
pub fn critical_temperature() -> f64 {
    2.0 / (1.0 + 2.0_f64.sqrt()).ln()
}

/// Energy per site of the fully ordered state, `-2J` for `n >= 2`.
pub fn ground_state_energy_per_site(coupling: f64) -> f64 {
    -2.0 * coupling.abs()
}

/// Closed-form canonical averages of the `2 × 2` periodic lattice.
///
/// With `K = J / T` the 16 states fall into `E = -8J` (2 states, `|M| = 4`),
/// `E = 0` (12 states, 8 of them with `|M| = 2`) and `E = +8J`
/// (2 checkerboards, `M = 0`).
pub fn exact_2x2(temperature: f64, coupling: f64) -> Averages {
    let k = coupling / temperature;
    let up = (8.0 * k).exp();
    let down = (-8.0 * k).exp();
    let z = 2.0 * up + 2.0 * down + 12.0;
    Averages {
        energy: 16.0 * coupling * (down - up) / z,
        energy_squared: 64.0 * coupling * coupling * (2.0 * up + 2.0 * down) / z,
        magnetization: 0.0,
        magnetization_squared: (32.0 * up + 32.0) / z,
        magnetization_abs: (8.0 * up + 16.0) / z,
    }
}

/// Canonical averages by summing over every spin configuration.
pub fn exact_averages(n: usize, temperature: f64, coupling: f64) -> Result<Averages> {
    if n == 0 || n > MAX_EXACT_DIMENSION {
        return Err(SimError::Enumeration { n, max: MAX_EXACT_DIMENSION });
    }
    check_temperature(temperature)?;

    let sites = n * n;
    // no configuration lies below this, so every weight is at most 1
    let floor = ground_state_energy_per_site(coupling) * sites as f64;

    let mut lattice = PeriodicLattice::ordered(n);
    let mut z = 0.0;
    let mut sums = Averages::default();
    for state in 0u32..(1 << sites) {
        for site in 0..sites {
            let spin = if state >> site & 1 == 1 { -1 } else { 1 };
            lattice.set((site / n) as isize, (site % n) as isize, spin);
        }
        let e = lattice.energy(coupling);
        let m = lattice.magnetization();
        let w = (-(e - floor) / temperature).exp();
        z += w;
        sums.energy += w * e;
        sums.energy_squared += w * e * e;
        sums.magnetization += w * m;
        sums.magnetization_squared += w * m * m;
        sums.magnetization_abs += w * m.abs();
    }

    Ok(Averages {
        energy: sums.energy / z,
        energy_squared: sums.energy_squared / z,
        magnetization: sums.magnetization / z,
        magnetization_squared: sums.magnetization_squared / z,
        magnetization_abs: sums.magnetization_abs / z,
    })
}

/// Record with the largest specific heat, ignoring NaN.
pub fn heat_capacity_peak(records: &[SampleRecord]) -> Option<&SampleRecord> {
    peak_by(records, SampleRecord::heat_capacity)
}

/// Record with the largest susceptibility, ignoring NaN.
pub fn susceptibility_peak(records: &[SampleRecord]) -> Option<&SampleRecord> {
    peak_by(records, SampleRecord::susceptibility)
}

fn peak_by(records: &[SampleRecord], key: fn(&SampleRecord) -> f64) -> Option<&SampleRecord> {
    records
        .iter()
        .filter(|r| !key(r).is_nan())
        .max_by(|a, b| key(a).total_cmp(&key(b)))
}
