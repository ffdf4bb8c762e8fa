//! Node error types.

use serde::Deserialize;

/// Errors returned by a [`LedgerApi`](super::LedgerApi).
///
/// Classified at the call site from the transport outcome and HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// The node could not be reached or failed internally.
    #[error(transparent)]
    Transient(reqwest::Error),
    /// The requested resource does not exist.
    #[error("{0} not found")]
    NotFound(String),
    /// The response could not be decoded.
    #[error("unexpected response: {0}")]
    Protocol(String),
    /// The node refused the submitted transactions.
    #[error("transaction rejected: {reason}")]
    Rejected {
        /// Raw rejection reason reported by the node.
        reason: String,
    },
}

/// Error body returned by the node.
#[derive(Debug, Deserialize)]
pub struct NodeErrorResponse {
    /// Error message.
    pub message: String,
}
