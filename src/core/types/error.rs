use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("{0}")]
    Custom(String),
}

/// The target catalog could not be read; the run cannot proceed without it.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Target catalog {path} is unavailable: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Target catalog {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Conditions checked before any work starts. Each one aborts the run with exit status 1.
#[derive(Debug, Error)]
pub enum PreconditionError {
    #[error("{backend} coverage currently only works with the Ninja backend ({} not found)", manifest.display())]
    UnsupportedBuildBackend {
        backend: &'static str,
        manifest: PathBuf,
    },
    #[error("Required {role} directory does not exist: {}", path.display())]
    MissingDirectory { role: &'static str, path: PathBuf },
    #[error("Invalid filename exclusion regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Could not find {tool}: {reason}")]
    ToolNotFound { tool: String, reason: String },
}

/// Failure to read the overall summary out of a per-target XML report.
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },
    #[error("Element <{0}> missing from coverage summary")]
    MissingElement(&'static str),
    #[error("Element <{element}> holds '{value}', which is not a percentage")]
    InvalidPercentage {
        element: &'static str,
        value: String,
    },
}
