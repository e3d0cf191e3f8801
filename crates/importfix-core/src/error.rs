//! Error types and error code constants for importfix.
//!
//! `FixError` is the single error type returned by the core. Only conditions
//! that should stop a run live here: a missing target file or an unmet patch
//! guard is reported in the run report instead.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad config file, rule that does not compile)
//! - `4`: Apply errors (filesystem read/write failures, undo without journal)
//! - `10`: Internal errors (corrupt journal, unexpected state)

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Stable error codes, used as process exit codes and in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments or configuration.
    InvalidArguments = 2,
    /// Failed to read or write a file, or nothing to undo.
    ApplyError = 4,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Errors that abort an importfix run.
#[derive(Debug, Error)]
pub enum FixError {
    /// Filesystem failure while reading or writing `path`.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Configuration file could not be read or parsed.
    #[error("config error: {message}")]
    Config { message: String },

    /// A rewrite rule pattern failed to compile.
    #[error("invalid rule '{name}': {message}")]
    InvalidRule { name: String, message: String },

    /// `undo` was requested but no run journal exists.
    #[error("no run journal found at {path}")]
    NoJournal { path: PathBuf },

    /// The run journal exists but cannot be used.
    #[error("journal error: {message}")]
    Journal { message: String },
}

impl From<&FixError> for OutputErrorCode {
    fn from(err: &FixError) -> Self {
        match err {
            FixError::Config { .. } => OutputErrorCode::InvalidArguments,
            FixError::InvalidRule { .. } => OutputErrorCode::InvalidArguments,
            FixError::Io { .. } => OutputErrorCode::ApplyError,
            FixError::NoJournal { .. } => OutputErrorCode::ApplyError,
            FixError::Journal { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<FixError> for OutputErrorCode {
    fn from(err: FixError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl FixError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        FixError::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        FixError::Config {
            message: message.into(),
        }
    }

    /// Create a journal error.
    pub fn journal(message: impl Into<String>) -> Self {
        FixError::Journal {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
