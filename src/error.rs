//! Error types for ruleset mining
//!
//! Only the edges of a run can fail: reading tables, parsing version checks,
//! loading configuration and writing outputs. Data-quality events inside the
//! core (inconsistent methods, degenerate rules) are recovered locally and
//! never surface here.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, mining or exporting rules
#[derive(Error, Debug)]
pub enum RulesetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid version check: {0:?}")]
    InvalidCheck(String),

    #[error("Missing column '{column}' in {path}")]
    MissingColumn { column: String, path: PathBuf },

    #[error("Malformed row {line} in {path}: {reason}")]
    MalformedRow {
        line: usize,
        path: PathBuf,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Output file already exists: {0}")]
    OutputExists(PathBuf),

    #[error("Failed to export graph to {path}: {reason}")]
    Export { path: PathBuf, reason: String },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for ruleset operations
pub type Result<T> = std::result::Result<T, RulesetError>;
