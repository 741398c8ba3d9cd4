use std::path::PathBuf;
use thiserror::Error;

/// Errors that can stop a tagging run.
///
/// Decode failures in discovered directories never reach this type as a
/// fatal error: the resolver logs them and treats the source as empty.
#[derive(Debug, Error)]
pub enum LogTagError {
    #[error("No input files. Use -f or provide file arguments.")]
    InputMissing,

    #[error("Invalid file pattern '{pattern}': {reason}")]
    Glob { pattern: String, reason: String },

    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write output file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode '{path}': {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Invalid regex '{keyword}' in category '{category}': {source}")]
    RegexCompile {
        category: String,
        keyword: String,
        #[source]
        source: regex::Error,
    },

    #[error("Unknown column kind: '{0}'. Valid kinds are: TAG, CATEGORY, FILE, LOG")]
    UnknownColumnKind(String),

    #[error("Failed to render report: {0}")]
    Render(String),
}

impl LogTagError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// Whether this error came from a document that could not be decoded.
    pub fn is_decode(&self) -> bool {
        matches!(self, LogTagError::Decode { .. })
    }
}
