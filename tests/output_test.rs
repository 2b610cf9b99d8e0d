use std::fs;
use std::path::Path;

use ising_scan::{
    iteration_sweep, temperature_sweep, CsvSink, IsingSimulation, IterationRange, ModelParams,
    SweepMode, TemperatureRange,
};

use indicatif::ProgressBar;
use rand_chacha::ChaCha20Rng;

fn simulation(mc_iterations: usize, stable_iterations: usize) -> IsingSimulation<ChaCha20Rng> {
    IsingSimulation::from_params(&ModelParams {
        dimension: 3,
        mc_iterations,
        stable_iterations,
        seed: 5,
        ..ModelParams::default()
    })
    .unwrap()
}

fn lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_owned)
        .collect()
}

fn sampling_run(dir: &Path, postfix: Option<String>) {
    let mut sim = simulation(40, 10);
    let mut sink = CsvSink::new(dir, postfix).unwrap();
    temperature_sweep(
        &mut sim,
        &TemperatureRange::new(2.0, 2.2, 0.1),
        SweepMode::Sampling,
        &mut sink,
        &ProgressBar::hidden(),
    )
    .unwrap();
}

#[test]
fn test_header_written_once_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    sampling_run(dir.path(), None);
    sampling_run(dir.path(), None);

    let rows = lines(&dir.path().join("ising_data.csv"));
    assert_eq!(rows.len(), 1 + 2 * 3);
    assert_eq!(
        rows[0],
        "T,<E>,<E^2>,<M>,<M^2>,<|M|>,samples,acceptance,n,mc_iterations"
    );
    assert_eq!(rows.iter().filter(|r| r.starts_with("T,")).count(), 1);

    let first: Vec<&str> = rows[1].split(',').collect();
    assert_eq!(first.len(), 10);
    assert_eq!(first[0], "2");
    assert_eq!(first[6], "30");
    assert_eq!(first[8], "3");
    assert_eq!(first[9], "40");
}

#[test]
fn test_postfix_selects_separate_files() {
    let dir = tempfile::tempdir().unwrap();
    sampling_run(dir.path(), Some("L3".to_string()));

    assert!(dir.path().join("ising_data_L3.csv").exists());
    assert!(!dir.path().join("ising_data.csv").exists());
}

#[test]
fn test_convergence_tables() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested").join("out");
    let mut sim = simulation(8, 5_000);
    let mut sink = CsvSink::new(&out, None).unwrap();

    temperature_sweep(
        &mut sim,
        &TemperatureRange::new(1.0, 2.0, 1.0),
        SweepMode::Convergence,
        &mut sink,
        &ProgressBar::hidden(),
    )
    .unwrap();

    for name in ["energy_convergence.csv", "magnetization_convergence.csv"] {
        let rows = lines(&out.join(name));
        assert_eq!(rows.len(), 3, "{name}");
        assert!(rows[0].starts_with("T,sweep_1,"));
        assert_eq!(rows[1].split(',').count(), 1 + 8);
        assert!(rows[2].starts_with("2,"));
    }
    assert!(!out.join("ising_data.csv").exists());
}

#[test]
fn test_iteration_sweep_table() {
    let dir = tempfile::tempdir().unwrap();
    let mut sim = simulation(0, 10);
    let mut sink = CsvSink::new(dir.path(), None).unwrap();

    iteration_sweep(&mut sim, &IterationRange::new(20, 40, 10), &mut sink, &ProgressBar::hidden())
        .unwrap();

    let rows = lines(&dir.path().join("ising_mc_data.csv"));
    assert_eq!(rows.len(), 3);
    assert!(rows[0].starts_with("MC,<E>,"));
    assert!(rows[1].starts_with("20,"));
    assert!(rows[2].starts_with("30,"));
}
