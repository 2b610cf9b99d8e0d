use std::io::Write;
use std::path::PathBuf;

use ising_scan::{
    Experiment, Generator, InitialState, IterationRange, SimConfig, SimError, SweepMode,
};

#[test]
fn test_empty_config_uses_defaults() {
    let config = SimConfig::from_yaml_str("").unwrap();
    assert_eq!(config, SimConfig::default());
    assert_eq!(config.model.stable_iterations, 5000);
    assert_eq!(config.model.coupling, 1.0);
    assert_eq!(config.model.initial, InitialState::Random);
    assert_eq!(config.model.generator, Generator::ChaCha);
    assert_eq!(config.output.directory, PathBuf::from("data_files"));
    config.validate().unwrap();
}

#[test]
fn test_full_config() {
    let yaml = r#"
model:
  dimension: 32
  mc_iterations: 50000
  stable_iterations: 10000
  coupling: 0.5
  seed: 99
  initial: ordered
  generator: pcg
experiment:
  kind: temperature_sweep
  start: 1.5
  end: 3.0
  step: 0.1
  mode: convergence
  parallel: true
output:
  directory: runs
  postfix: L32
"#;
    let config = SimConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.model.dimension, 32);
    assert_eq!(config.model.mc_iterations, 50_000);
    assert_eq!(config.model.stable_iterations, 10_000);
    assert_eq!(config.model.coupling, 0.5);
    assert_eq!(config.model.seed, 99);
    assert_eq!(config.model.initial, InitialState::Ordered);
    assert_eq!(config.model.generator, Generator::Pcg);
    match &config.experiment {
        Experiment::TemperatureSweep(p) => {
            assert_eq!((p.start, p.end, p.step), (1.5, 3.0, 0.1));
            assert_eq!(p.mode, SweepMode::Convergence);
            assert!(p.parallel);
        }
        other => panic!("expected a temperature sweep, got {other:?}"),
    }
    assert_eq!(config.output.directory, PathBuf::from("runs"));
    assert_eq!(config.output.postfix.as_deref(), Some("L32"));
    config.validate().unwrap();
}

#[test]
fn test_partial_config_keeps_other_defaults() {
    let config = SimConfig::from_yaml_str("model:\n  dimension: 8\n").unwrap();
    assert_eq!(config.model.dimension, 8);
    assert_eq!(config.model.stable_iterations, 5000);
    assert_eq!(config.experiment, Experiment::default());
}

#[test]
fn test_iteration_sweep_config() {
    let yaml = "experiment:\n  kind: iteration_sweep\n  start: 6000\n  end: 9000\n  step: 1000\n";
    let config = SimConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(
        config.experiment,
        Experiment::IterationSweep(IterationRange::new(6000, 9000, 1000))
    );
    config.validate().unwrap();

    // 5000 equilibration sweeps leave nothing to sample at MC = 5000
    let yaml = "experiment:\n  kind: iteration_sweep\n  start: 5000\n  end: 9000\n  step: 1000\n";
    let config = SimConfig::from_yaml_str(yaml).unwrap();
    assert!(matches!(
        config.validate(),
        Err(SimError::SamplingWindow { total: 5000, stable: 5000 })
    ));
}

#[test]
fn test_validation_errors() {
    let mut config = SimConfig::default();
    config.model.dimension = 0;
    assert!(matches!(config.validate(), Err(SimError::ZeroDimension(0))));

    let mut config = SimConfig::default();
    config.model.mc_iterations = config.model.stable_iterations;
    assert!(matches!(config.validate(), Err(SimError::SamplingWindow { .. })));

    let mut config = SimConfig::default();
    config.model.coupling = f64::NAN;
    assert!(matches!(config.validate(), Err(SimError::Config(_))));

    let config = SimConfig::from_yaml_str(
        "experiment:\n  kind: temperature_sweep\n  start: 2.0\n  end: 1.0\n  step: 0.1\n",
    )
    .unwrap();
    assert!(matches!(config.validate(), Err(SimError::TemperatureRange { .. })));
}

#[test]
fn test_convergence_mode_skips_window_check() {
    let yaml = r#"
model:
  mc_iterations: 100
experiment:
  kind: temperature_sweep
  start: 1.0
  end: 2.0
  step: 0.5
  mode: convergence
"#;
    SimConfig::from_yaml_str(yaml).unwrap().validate().unwrap();
}

#[test]
fn test_unknown_fields_are_rejected() {
    assert!(matches!(
        SimConfig::from_yaml_str("model:\n  dimensions: 8\n"),
        Err(SimError::Parse(_))
    ));
    assert!(matches!(
        SimConfig::from_yaml_str("model:\n  generator: mt19937\n"),
        Err(SimError::Parse(_))
    ));
}

#[test]
fn test_yaml_round_trip_and_file_loading() {
    let mut config = SimConfig::default();
    config.model.dimension = 12;
    config.output.postfix = Some("run1".to_string());
    let yaml = config.to_yaml().unwrap();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    let loaded = SimConfig::from_path(file.path()).unwrap();
    assert_eq!(loaded, config);

    assert!(matches!(
        SimConfig::from_path("/nonexistent/ising.yaml"),
        Err(SimError::Io(_))
    ));
}
