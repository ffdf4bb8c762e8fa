use crate::types::AppId;

/// Errors returned by [`StorageApi`](crate::storage::StorageApi).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No record exists for the escrow.
    #[error("no escrow record for application {0}")]
    EscrowNotFound(AppId),
    /// The store answered with an error status.
    #[error("document store returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message returned by the store.
        message: String,
    },
    /// A stored document has an unexpected shape.
    #[error("malformed document: {0}")]
    MalformedDocument(String),
    /// The store could not be reached.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    /// A deserialization error occurred.
    #[error("a deserialization error occurred")]
    SerdeError(#[from] serde_json::Error),
}
