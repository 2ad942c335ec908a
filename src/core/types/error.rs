//! Error types for process introspection and scanning

use thiserror::Error;

/// Main error type for locator, resolver and scanner operations
#[derive(Error, Debug)]
pub enum SigError {
    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Permission denied for process {pid}: {reason}")]
    PermissionDenied { pid: u32, reason: String },

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Malformed mapping record at line {line}: {reason}")]
    MapParse { line: usize, reason: String },

    #[error("Invalid signature '{input}': {reason}")]
    SignatureParse { input: String, reason: String },

    #[error("Scan out of bounds: signature needs {needed} bytes, buffer has {available}")]
    OutOfBounds { needed: usize, available: usize },

    #[error("Invalid memory address: {0}")]
    InvalidAddress(String),

    #[error("Failed to read memory at {address}: {reason}")]
    ReadFailed { address: String, reason: String },

    #[error("Platform backend error: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for scanning operations
pub type SigResult<T> = Result<T, SigError>;

impl SigError {
    /// Creates a permission denied error for a process
    pub fn permission_denied(pid: u32, reason: impl Into<String>) -> Self {
        SigError::PermissionDenied {
            pid,
            reason: reason.into(),
        }
    }

    /// Creates a malformed mapping record error
    pub fn map_parse(line: usize, reason: impl Into<String>) -> Self {
        SigError::MapParse {
            line,
            reason: reason.into(),
        }
    }

    /// Creates a signature parse error
    pub fn signature_parse(input: impl Into<String>, reason: impl Into<String>) -> Self {
        SigError::SignatureParse {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Creates a read failed error
    pub fn read_failed(address: impl std::fmt::Display, reason: impl Into<String>) -> Self {
        SigError::ReadFailed {
            address: address.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates an out of bounds error
    pub fn out_of_bounds(needed: usize, available: usize) -> Self {
        SigError::OutOfBounds { needed, available }
    }

    /// True when the failure is recoverable by skipping the candidate
    /// during best-effort enumeration.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            SigError::PermissionDenied { .. } | SigError::Io(_) | SigError::ReadFailed { .. }
        )
    }
}
