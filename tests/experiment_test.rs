//! Temperature and iteration-count drivers.

use ising_scan::utils::stream_seed;
use ising_scan::{
    iteration_sweep, parallel_temperature_sweep, temperature_sweep, IsingSimulation,
    IterationRange, MemorySink, ModelParams, RunKind, SimError, SweepMode, TemperatureRange,
};

use approx::assert_relative_eq;
use indicatif::ProgressBar;
use rand_chacha::ChaCha20Rng;

fn params(dimension: usize, mc_iterations: usize, stable_iterations: usize) -> ModelParams {
    ModelParams {
        dimension,
        mc_iterations,
        stable_iterations,
        seed: 31,
        ..ModelParams::default()
    }
}

fn simulation(p: &ModelParams) -> IsingSimulation<ChaCha20Rng> {
    IsingSimulation::from_params(p).unwrap()
}

#[test]
fn test_temperature_grid_point_count() {
    let range = TemperatureRange::new(1.0, 2.0, 0.1);
    assert_eq!(range.len(), 11);
    let temps: Vec<f64> = range.temperatures().collect();
    assert_relative_eq!(temps[10], 2.0, epsilon = 1e-12);
    assert_relative_eq!(temps[3], 1.3, epsilon = 1e-12);

    assert_eq!(TemperatureRange::new(2.0, 2.6, 0.05).len(), 13);
    assert_eq!(TemperatureRange::single(1.5).len(), 1);
}

#[test]
fn test_sampling_sweep_emits_one_record_per_temperature() {
    let mut sim = simulation(&params(4, 300, 100));
    let mut sink = MemorySink::new();
    let bar = ProgressBar::hidden();

    temperature_sweep(
        &mut sim,
        &TemperatureRange::new(1.5, 2.5, 0.5),
        SweepMode::Sampling,
        &mut sink,
        &bar,
    )
    .unwrap();

    let temps: Vec<f64> = sink.records.iter().map(|r| r.temperature).collect();
    assert_eq!(temps, vec![1.5, 2.0, 2.5]);
    assert!(sink.records.iter().all(|r| r.samples == 200));
    assert_eq!(sink.headers.len(), 1);
    assert_eq!(sink.headers[0].kind, RunKind::TemperatureSweep);
    assert_eq!(sink.headers[0].dimension, 4);
    assert_eq!(sink.finished, 1);
    assert_eq!(bar.position(), 3);
    // the sweep leaves the table at the last temperature
    assert_eq!(sim.temperature(), 2.5);
}

#[test]
fn test_invalid_temperature_ranges_emit_nothing() {
    let bad = [
        TemperatureRange::new(1.0, 2.0, 0.0),
        TemperatureRange::new(1.0, 2.0, -0.1),
        TemperatureRange::new(2.0, 1.0, 0.1),
        TemperatureRange::new(0.0, 1.0, 0.1),
        TemperatureRange::new(-1.0, 1.0, 0.5),
        TemperatureRange::new(1.0, f64::INFINITY, 0.1),
    ];
    for range in &bad {
        let mut sim = simulation(&params(3, 50, 10));
        let mut sink = MemorySink::new();
        let err = temperature_sweep(&mut sim, range, SweepMode::Sampling, &mut sink, &ProgressBar::hidden())
            .unwrap_err();
        assert!(matches!(err, SimError::TemperatureRange { .. }), "{range:?}: {err}");
        assert!(sink.headers.is_empty() && sink.records.is_empty());
        assert_eq!(sim.accepted_flips(), 0);
    }
}

#[test]
fn test_sampling_sweep_needs_a_window() {
    let mut sim = simulation(&params(3, 10, 10));
    let mut sink = MemorySink::new();
    let err = temperature_sweep(
        &mut sim,
        &TemperatureRange::new(1.0, 2.0, 0.5),
        SweepMode::Sampling,
        &mut sink,
        &ProgressBar::hidden(),
    )
    .unwrap_err();

    assert!(matches!(err, SimError::SamplingWindow { total: 10, stable: 10 }));
    assert!(sink.headers.is_empty() && sink.records.is_empty());
    assert_eq!(sim.accepted_flips(), 0);
}

#[test]
fn test_convergence_mode_records_every_sweep() {
    // no equilibration window is needed to record raw totals
    let mut sim = simulation(&params(3, 30, 5_000));
    let mut sink = MemorySink::new();

    temperature_sweep(
        &mut sim,
        &TemperatureRange::new(1.0, 1.5, 0.25),
        SweepMode::Convergence,
        &mut sink,
        &ProgressBar::hidden(),
    )
    .unwrap();

    assert!(sink.records.is_empty());
    assert_eq!(sink.headers[0].kind, RunKind::Convergence);
    let temps: Vec<f64> = sink.traces.iter().map(|t| t.temperature).collect();
    assert_eq!(temps, vec![1.0, 1.25, 1.5]);
    assert!(sink.traces.iter().all(|t| t.len() == 30));
}

#[test]
fn test_iteration_sweep_labels_records_by_mc() {
    let mut sim = simulation(&params(3, 0, 10));
    sim.set_temperature(4.0).unwrap();
    let mut sink = MemorySink::new();

    iteration_sweep(&mut sim, &IterationRange::new(20, 50, 10), &mut sink, &ProgressBar::hidden())
        .unwrap();

    assert_eq!(sink.headers[0].kind, RunKind::IterationSweep);
    let mc: Vec<usize> = sink.records.iter().map(|r| r.mc_iterations).collect();
    let samples: Vec<usize> = sink.records.iter().map(|r| r.samples).collect();
    assert_eq!(mc, vec![20, 30, 40]);
    assert_eq!(samples, vec![10, 20, 30]);
    assert!(sink.records.iter().all(|r| r.temperature == 1.0));
}

#[test]
fn test_invalid_iteration_ranges_emit_nothing() {
    let cases = [
        IterationRange::new(20, 50, 0),
        IterationRange::new(50, 50, 10),
        IterationRange::new(60, 50, 10),
        // first value leaves no sampling window
        IterationRange::new(10, 50, 10),
    ];
    for range in &cases {
        let mut sim = simulation(&params(3, 0, 10));
        let mut sink = MemorySink::new();
        assert!(iteration_sweep(&mut sim, range, &mut sink, &ProgressBar::hidden()).is_err());
        assert!(sink.headers.is_empty() && sink.records.is_empty());
        assert_eq!(sim.accepted_flips(), 0);
    }
}

#[test]
fn test_parallel_sweep_is_ordered_and_reproducible() {
    let p = params(4, 200, 50);
    let range = TemperatureRange::new(1.5, 3.0, 0.5);

    let run = || {
        let mut sink = MemorySink::new();
        parallel_temperature_sweep::<ChaCha20Rng, _>(&p, &range, SweepMode::Sampling, &mut sink, &ProgressBar::hidden())
            .unwrap();
        sink
    };
    let first = run();
    let second = run();

    let temps: Vec<f64> = first.records.iter().map(|r| r.temperature).collect();
    assert_eq!(temps, vec![1.5, 2.0, 2.5, 3.0]);
    assert_eq!(first.records, second.records);
    assert_eq!(first.finished, 1);

    // temperature i runs on its own stream
    let mut sim = simulation(&ModelParams {
        seed: stream_seed(p.seed, 2),
        ..p.clone()
    });
    sim.set_temperature(2.5).unwrap();
    assert_eq!(sim.run_stable(200).unwrap(), first.records[2]);
}

#[test]
fn test_parallel_convergence_traces() {
    let p = params(3, 12, 5_000);
    let mut sink = MemorySink::new();
    parallel_temperature_sweep::<ChaCha20Rng, _>(
        &p,
        &TemperatureRange::new(2.0, 2.2, 0.1),
        SweepMode::Convergence,
        &mut sink,
        &ProgressBar::hidden(),
    )
    .unwrap();

    assert_eq!(sink.traces.len(), 3);
    assert!(sink.traces.iter().all(|t| t.len() == 12));
    assert_relative_eq!(sink.traces[1].temperature, 2.1, epsilon = 1e-12);
}

#[test]
fn test_parallel_sweep_validates_before_running() {
    let mut sink = MemorySink::new();
    let err = parallel_temperature_sweep::<ChaCha20Rng, _>(
        &params(0, 100, 10),
        &TemperatureRange::new(1.0, 2.0, 0.5),
        SweepMode::Sampling,
        &mut sink,
        &ProgressBar::hidden(),
    )
    .unwrap_err();
    assert!(matches!(err, SimError::ZeroDimension(0)));
    assert!(sink.headers.is_empty());
}
