// ============================================================
// Layer 6 — Metrics Sink
// ============================================================
// Records scalar training summaries to a CSV file.
//
// Every event is one row tagged with the global step:
//
//   step,tag,value
//   20,loss,0.03125
//   40,loss,0.02781
//   ...
//
// The file lives at <log_dir>/metrics.csv and is appended to
// across runs, so a resumed run continues the same curve.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

use crate::domain::traits::MetricsSink;

/// Name of the metrics file inside the log directory
pub const METRICS_FILENAME: &str = "metrics.csv";

/// One scalar summary event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarEvent {
    pub step: u64,
    pub tag: String,
    pub value: f64,
}

impl ScalarEvent {
    pub fn new(tag: impl Into<String>, value: f64, step: u64) -> Self {
        Self { step, tag: tag.into(), value }
    }
}

/// Appends scalar events to <log_dir>/metrics.csv.
pub struct CsvMetricsSink {
    csv_path: PathBuf,
}

impl CsvMetricsSink {
    /// Create the log directory and write the CSV header if the file is new.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create log directory '{}'", dir.display()))?;

        let csv_path = dir.join(METRICS_FILENAME);

        if !csv_path.exists() {
            let mut writer = csv::Writer::from_path(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writer.write_record(["step", "tag", "value"])?;
            writer.flush()?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }

    /// Read every event back, in file order.
    #[cfg(test)]
    pub fn read_events(&self) -> Result<Vec<ScalarEvent>> {
        let mut reader = csv::Reader::from_path(&self.csv_path)
            .with_context(|| format!("Cannot read '{}'", self.csv_path.display()))?;
        let mut events = Vec::new();
        for row in reader.deserialize() {
            events.push(row?);
        }
        Ok(events)
    }
}

impl MetricsSink for CsvMetricsSink {
    fn scalar(&mut self, tag: &str, value: f64, step: u64) -> Result<()> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        // Header is already in the file; quoting comes from the writer
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer.serialize(ScalarEvent::new(tag, value, step))?;
        writer.flush()?;

        tracing::debug!("Logged {}={:.4} at step {}", tag, value, step);
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_round_trip_through_csv() {
        let tmp = tempfile::tempdir().unwrap();
        let mut sink = CsvMetricsSink::new(tmp.path().join("logs")).unwrap();
        sink.scalar("loss", 0.5, 20).unwrap();
        sink.scalar("loss", 0.25, 40).unwrap();

        let events = sink.read_events().unwrap();
        assert_eq!(
            events,
            vec![ScalarEvent::new("loss", 0.5, 20), ScalarEvent::new("loss", 0.25, 40)]
        );
    }

    #[test]
    fn test_tags_with_separators_are_quoted() {
        let tmp = tempfile::tempdir().unwrap();
        let mut sink = CsvMetricsSink::new(tmp.path()).unwrap();
        sink.scalar("loss, \"smoothed\"", 1.5, 3).unwrap();
        sink.scalar("loss", 0.125, 4).unwrap();

        let events = sink.read_events().unwrap();
        assert_eq!(
            events,
            vec![
                ScalarEvent::new("loss, \"smoothed\"", 1.5, 3),
                ScalarEvent::new("loss", 0.125, 4),
            ]
        );
    }

    #[test]
    fn test_reopening_appends() {
        let tmp = tempfile::tempdir().unwrap();
        CsvMetricsSink::new(tmp.path()).unwrap().scalar("loss", 1.0, 1).unwrap();

        let mut again = CsvMetricsSink::new(tmp.path()).unwrap();
        again.scalar("loss", 2.0, 2).unwrap();

        let steps: Vec<u64> = again.read_events().unwrap().iter().map(|e| e.step).collect();
        assert_eq!(steps, vec![1, 2]);
    }
}
