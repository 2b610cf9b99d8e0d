//! Destinations for sweep results.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use csv::{Writer, WriterBuilder};
use tracing::info;

use crate::error::Result;
use crate::experiment::{RunHeader, RunKind};
use crate::observables::ConvergenceTrace;
use crate::sweep::SampleRecord;

/// Receives what the drivers produce, in order.
pub trait RecordSink {
    /// Called once before the first record or trace of a run.
    fn begin(&mut self, _header: &RunHeader) -> Result<()> {
        Ok(())
    }

    fn record(&mut self, record: &SampleRecord) -> Result<()>;

    fn trace(&mut self, trace: &ConvergenceTrace) -> Result<()>;

    /// Called once after the last record or trace of a run.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Keeps everything in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub headers: Vec<RunHeader>,
    pub records: Vec<SampleRecord>,
    pub traces: Vec<ConvergenceTrace>,
    pub finished: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordSink for MemorySink {
    fn begin(&mut self, header: &RunHeader) -> Result<()> {
        self.headers.push(header.clone());
        Ok(())
    }

    fn record(&mut self, record: &SampleRecord) -> Result<()> {
        self.records.push(*record);
        Ok(())
    }

    fn trace(&mut self, trace: &ConvergenceTrace) -> Result<()> {
        self.traces.push(trace.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished += 1;
        Ok(())
    }
}

const TABLE_COLUMNS: [&str; 9] = [
    "<E>", "<E^2>", "<M>", "<M^2>", "<|M|>", "samples", "acceptance", "n", "mc_iterations",
];

/// One CSV file opened for appending, with its header-once flag.
struct CsvFile {
    writer: Writer<File>,
    header_written: bool,
}

impl CsvFile {
    fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        // appending to an existing table: its header is already there
        let header_written = file.metadata()?.len() > 0;
        let writer = WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(file);
        info!(path = %path.display(), "writing");
        Ok(Self { writer, header_written })
    }

    fn write_header_once<I, T>(&mut self, header: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        if !self.header_written {
            self.writer.write_record(header)?;
            self.header_written = true;
        }
        Ok(())
    }
}

/// Writes sampling records and convergence traces as CSV tables.
///
/// * `ising_data[_postfix].csv`: one row per temperature,
/// * `ising_mc_data[_postfix].csv`: one row per iteration count,
/// * `energy_convergence[_postfix].csv`, `magnetization_convergence[_postfix].csv`:
///   one row per temperature: `T` followed by one value per sweep.
///
/// Files are appended to, so repeated runs accumulate in the same tables.
pub struct CsvSink {
    directory: PathBuf,
    postfix: Option<String>,
    kind: Option<RunKind>,
    temperature_table: Option<CsvFile>,
    iteration_table: Option<CsvFile>,
    energy_trace: Option<CsvFile>,
    magnetization_trace: Option<CsvFile>,
}

impl CsvSink {
    /// Creates `directory` if needed; files are opened on first use.
    pub fn new(directory: impl Into<PathBuf>, postfix: Option<String>) -> Result<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        Ok(Self {
            directory,
            postfix,
            kind: None,
            temperature_table: None,
            iteration_table: None,
            energy_trace: None,
            magnetization_trace: None,
        })
    }

    /// Path of the table named `stem`.
    pub fn path_for(&self, stem: &str) -> PathBuf {
        let name = match &self.postfix {
            Some(postfix) => format!("{stem}_{postfix}.csv"),
            None => format!("{stem}.csv"),
        };
        self.directory.join(name)
    }

    fn table(&mut self) -> Result<&mut CsvFile> {
        let by_iterations = self.kind == Some(RunKind::IterationSweep);
        let (stem, label) = if by_iterations {
            ("ising_mc_data", "MC")
        } else {
            ("ising_data", "T")
        };
        let path = self.path_for(stem);
        let slot = if by_iterations {
            &mut self.iteration_table
        } else {
            &mut self.temperature_table
        };
        let file = match slot.take() {
            Some(file) => file,
            None => CsvFile::open(&path)?,
        };
        let file = slot.insert(file);
        file.write_header_once(std::iter::once(label).chain(TABLE_COLUMNS))?;
        Ok(file)
    }

    fn open_traces(&mut self) -> Result<()> {
        if self.energy_trace.is_none() {
            self.energy_trace = Some(CsvFile::open(&self.path_for("energy_convergence"))?);
        }
        if self.magnetization_trace.is_none() {
            self.magnetization_trace =
                Some(CsvFile::open(&self.path_for("magnetization_convergence"))?);
        }
        Ok(())
    }
}

fn trace_row(temperature: f64, values: &[f64]) -> Vec<String> {
    std::iter::once(temperature)
        .chain(values.iter().copied())
        .map(|v| v.to_string())
        .collect()
}

fn trace_header(sweeps: usize) -> Vec<String> {
    std::iter::once("T".to_string())
        .chain((1..=sweeps).map(|i| format!("sweep_{i}")))
        .collect()
}

impl RecordSink for CsvSink {
    fn begin(&mut self, header: &RunHeader) -> Result<()> {
        self.kind = Some(header.kind);
        info!(
            kind = ?header.kind,
            n = header.dimension,
            mc_iterations = header.mc_iterations,
            stable_iterations = header.stable_iterations,
            "run started"
        );
        Ok(())
    }

    fn record(&mut self, record: &SampleRecord) -> Result<()> {
        let label = match self.kind {
            Some(RunKind::IterationSweep) => record.mc_iterations.to_string(),
            _ => record.temperature.to_string(),
        };
        let avg = &record.averages;
        let row = [
            label,
            avg.energy.to_string(),
            avg.energy_squared.to_string(),
            avg.magnetization.to_string(),
            avg.magnetization_squared.to_string(),
            avg.magnetization_abs.to_string(),
            record.samples.to_string(),
            record.acceptance.to_string(),
            record.dimension.to_string(),
            record.mc_iterations.to_string(),
        ];
        self.table()?.writer.write_record(&row)?;
        Ok(())
    }

    fn trace(&mut self, trace: &ConvergenceTrace) -> Result<()> {
        self.open_traces()?;
        let header = trace_header(trace.len());
        for (slot, values) in [
            (&mut self.energy_trace, &trace.energy),
            (&mut self.magnetization_trace, &trace.magnetization),
        ] {
            if let Some(file) = slot.as_mut() {
                file.write_header_once(&header)?;
                file.writer.write_record(trace_row(trace.temperature, values))?;
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        for file in [
            &mut self.temperature_table,
            &mut self.iteration_table,
            &mut self.energy_trace,
            &mut self.magnetization_trace,
        ]
        .into_iter()
        .flatten()
        {
            file.writer.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_header_numbers_sweeps_from_one() {
        assert_eq!(trace_header(2), vec!["T", "sweep_1", "sweep_2"]);
    }

    #[test]
    fn postfix_is_appended_to_stem() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::new(dir.path(), Some("L4".into())).unwrap();
        assert_eq!(sink.path_for("ising_data"), dir.path().join("ising_data_L4.csv"));
    }
}
