//! crates/docket_core/src/error.rs
//!
//! The error taxonomy of the versioning core. Every public ledger and
//! history operation fails with one of these kinds; the service shell maps
//! them onto HTTP statuses.

use crate::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// A document or version id did not resolve.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request named records that do not fit together (a version from
    /// another document) or was missing required content.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An append kept losing the version-number race until the retry
    /// budget ran out.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The record store failed in a way the core cannot interpret.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<PortError> for HistoryError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(msg) => HistoryError::NotFound(msg),
            PortError::Conflict(msg) => HistoryError::Conflict(msg),
            PortError::Unexpected(msg) => HistoryError::Storage(msg),
        }
    }
}
