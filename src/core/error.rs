//! Structured error taxonomy for kiln.
//!
//! Every failure surfaced to the user maps onto one of these kinds. Commands
//! wrap core calls with `anyhow::Context`, so the structured error converts
//! into `anyhow::Error` at the boundary and prints as a single line on the
//! diagnostic stream.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A field failed one of the pure validation predicates.
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// A configuration-level problem with a remediation suggestion.
    #[error("{message} ({suggestion})")]
    Config { message: String, suggestion: String },

    /// Access denied, decryption refused, or a private key supplied where a
    /// public key was expected. Never carries cryptographic details.
    #[error("{message} ({suggestion})")]
    Security { message: String, suggestion: String },

    /// Ill-formed user-supplied datum (JSON, recipient spec, template).
    #[error("invalid input: {0}")]
    Input(String),

    /// A lower-level library or I/O failure, tagged with the operation and
    /// the resource it was acting on.
    #[error("{operation} failed for '{resource}': {source}")]
    Operation {
        operation: String,
        resource: String,
        #[source]
        source: anyhow::Error,
    },

    /// Filesystem interaction failure.
    #[error("cannot access '{path}': {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn config(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    pub fn security(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Error::Security {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    pub fn operation(
        operation: impl Into<String>,
        resource: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Error::Operation {
            operation: operation.into(),
            resource: resource.into(),
            source: source.into(),
        }
    }

    pub fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::FileAccess {
            path: path.into(),
            source,
        }
    }
}
