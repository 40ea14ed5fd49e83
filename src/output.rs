// src/output.rs
// =============================================================================
// Writes crawl and scrape results to disk.
//
// Every save creates a new file named <prefix>_<UTC timestamp>.<ext> inside
// the output directory, so repeated runs never overwrite each other:
//
//   data/outputs/crawl_results_20260101_120000.json
//
// Formats:
// - json: a pretty-printed array of records
// - csv: one header row plus one row per record
// =============================================================================

use crate::error::CrawlerError;
use chrono::Utc;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

/// A record that can be written as one CSV row
pub trait Tabular {
    fn header() -> &'static [&'static str];
    fn row(&self) -> Vec<String>;
}

#[derive(Debug, Clone)]
pub struct OutputHandler {
    format: OutputFormat,
    directory: PathBuf,
    timestamp: String,
}

impl OutputHandler {
    pub fn new(format: OutputFormat, directory: impl Into<PathBuf>) -> Self {
        Self {
            format,
            directory: directory.into(),
            timestamp: Utc::now().format("%Y%m%d_%H%M%S").to_string(),
        }
    }

    /// Path a save with `prefix` will write to
    pub fn path_for(&self, prefix: &str) -> PathBuf {
        self.directory.join(format!(
            "{}_{}.{}",
            prefix,
            self.timestamp,
            self.format.extension()
        ))
    }

    /// Writes `records` in the configured format and returns the file path
    pub fn save<T>(&self, prefix: &str, records: &[T]) -> Result<PathBuf, CrawlerError>
    where
        T: Serialize + Tabular,
    {
        fs::create_dir_all(&self.directory)
            .map_err(|e| CrawlerError::output(&self.directory, e))?;

        let path = self.path_for(prefix);
        match self.format {
            OutputFormat::Json => write_json(&path, records)?,
            OutputFormat::Csv => write_csv(&path, records)?,
        }

        info!(path = %path.display(), records = records.len(), "saved output");
        Ok(path)
    }
}

fn write_json<T: Serialize>(path: &Path, records: &[T]) -> Result<(), CrawlerError> {
    let file = File::create(path).map_err(|e| CrawlerError::output(path, e))?;
    serde_json::to_writer_pretty(BufWriter::new(file), records)
        .map_err(|e| CrawlerError::output(path, e))
}

fn write_csv<T: Tabular>(path: &Path, records: &[T]) -> Result<(), CrawlerError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| CrawlerError::output(path, e))?;

    writer
        .write_record(T::header())
        .map_err(|e| CrawlerError::output(path, e))?;
    for record in records {
        writer
            .write_record(record.row())
            .map_err(|e| CrawlerError::output(path, e))?;
    }

    writer.flush().map_err(|e| CrawlerError::output(path, e))
}
