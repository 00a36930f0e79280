//! Error type shared by the library modules.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can stop a scan before or while it runs.
///
/// Per-attempt connect failures and display-name lookups are not errors:
/// they only decide whether a port is reported open and how it is labelled.
#[derive(Debug, Error)]
pub enum ScanError {
    /// A CIDR entry could not be parsed or is too wide to enumerate.
    #[error("invalid CIDR `{input}`: {reason}")]
    InvalidCidr { input: String, reason: String },

    /// A port token is malformed or outside 1..=65535.
    #[error("invalid port spec `{token}`: {reason}")]
    InvalidPortSpec { token: String, reason: String },

    /// Reading an input file or creating the result file failed.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A worker task panicked or was aborted.
    #[error("scan worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl ScanError {
    pub(crate) fn cidr(input: &str, reason: impl ToString) -> Self {
        Self::InvalidCidr {
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn port(token: &str, reason: impl ToString) -> Self {
        Self::InvalidPortSpec {
            token: token.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
