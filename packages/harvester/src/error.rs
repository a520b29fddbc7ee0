//! Error types for the harvester.
//!
//! Uses the dual-error pattern: `HarvesterError` for failures that abort a
//! registry, and [`Warning`](crate::types::Warning) values for recoverable
//! issues that are aggregated and reported at the end of a run.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the harvester library.
#[derive(Debug, Error)]
pub enum HarvesterError {
    /// Registry document could not be obtained from the network or the cache.
    #[error("Failed to fetch {source_key}: {message}")]
    Fetch { source_key: String, message: String },

    /// Registry document structure was not recognized.
    #[error("Failed to parse registry {registry}: {message}")]
    Parse { registry: String, message: String },

    /// Managed-region markers are missing or malformed in the destination.
    #[error("Destination conflict in {}: {reason}", .path.display())]
    DestinationConflict { path: PathBuf, reason: String },

    /// Unknown registry identifier.
    #[error("Unknown registry '{0}'. Run `iana-harvester list` for the supported registries")]
    UnknownRegistry(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// All retry attempts failed.
    #[error("Request failed after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// CSV decoding failed.
    #[error("CSV parsing failed: {0}")]
    Csv(#[from] csv::Error),

    /// Cache metadata could not be (de)serialized.
    #[error("Cache metadata error: {0}")]
    Json(#[from] serde_json::Error),

    /// Settings file could not be parsed.
    #[error("Settings file is invalid: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// At least one registry failed during a run.
    #[error("{0} of the selected registries failed")]
    RunFailed(usize),

    /// A registry worker thread panicked.
    #[error("Worker for registry {0} panicked")]
    WorkerPanicked(String),
}

impl HarvesterError {
    /// Build a parse error for a registry.
    pub fn parse(registry: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Build a destination conflict error.
    pub fn conflict(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::DestinationConflict {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Short category label used in run summaries.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch { .. } | Self::RetriesExhausted { .. } | Self::Http(_) => "fetch",
            Self::Parse { .. } | Self::Csv(_) => "parse",
            Self::DestinationConflict { .. } => "destination",
            Self::UnknownRegistry(_) | Self::Config(_) | Self::Toml(_) => "config",
            Self::Json(_) | Self::Io(_) => "io",
            Self::WorkerPanicked(_) | Self::RunFailed(_) => "run",
        }
    }
}

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, HarvesterError>;
