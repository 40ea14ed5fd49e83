// src/error.rs
// =============================================================================
// Typed errors for the few things that can fail outside a single page fetch.
//
// Per-URL failures (timeouts, 404s, dropped connections) never show up here:
// the crawl workers absorb them and keep going. What remains are systemic
// problems that happen before or after a crawl run:
// - an invalid CrawlConfig
// - a transport (HTTP client) that cannot be built
// - a settings file that cannot be read or parsed
// - an output file that cannot be written
// =============================================================================

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlerError {
    /// The crawl configuration failed validation
    #[error("invalid crawl configuration: {0}")]
    Config(String),

    /// The HTTP client could not be constructed
    #[error("failed to build HTTP transport: {0}")]
    Transport(#[from] reqwest::Error),

    /// The settings file exists but could not be read or parsed
    #[error("failed to load settings from {path}: {reason}")]
    Settings { path: PathBuf, reason: String },

    /// Results could not be written to disk
    #[error("failed to write output {path}: {reason}")]
    Output { path: PathBuf, reason: String },
}

impl CrawlerError {
    pub fn output(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        CrawlerError::Output {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn settings(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        CrawlerError::Settings {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
