//! Escrow adapter error types.
use crate::{
    node::NodeError,
    types::{AppId, TxId},
};
use core::fmt;
use jsonrpsee::core::RpcResult;
use serde_json::json;
use thiserror::Error;

mod signer;
pub use signer::SignerError;

mod storage;
pub use storage::StorageError;

mod transition;
pub use transition::TransitionError;

/// The overarching error type returned by the escrow adapter.
///
/// Every variant maps to a distinct [`ErrorKind`] so callers can pick a message without
/// inspecting error text.
#[derive(Debug, Error)]
pub enum EscrowError {
    /// Malformed application id, address or method signature.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The requested resource does not exist on the ledger.
    #[error("{0} not found")]
    NotFound(String),
    /// The application exists but exposes no global state.
    #[error(
        "application {0} has no global state; it may be uninitialized or deployed on another network"
    )]
    EmptyState(AppId),
    /// The node answered with an unexpected shape.
    #[error("unexpected node response: {0}")]
    Protocol(String),
    /// The action is not allowed from the current state or by the acting party.
    #[error(transparent)]
    InvalidStateTransition(#[from] TransitionError),
    /// The signer declined the request.
    #[error("signing was cancelled by the user")]
    UserCancelled,
    /// The node could not be reached.
    #[error("node unavailable: {0}")]
    TransientFetch(String),
    /// The transaction was not confirmed within the polled rounds. It may still confirm.
    #[error("transaction {tx_id} not confirmed after {rounds} rounds")]
    ConfirmationTimeout {
        /// The watched transaction.
        tx_id: TxId,
        /// Number of rounds waited.
        rounds: u64,
    },
    /// The contract logic rejected the transaction.
    #[error("transaction rejected: {0}")]
    ContractRejected(String),
    /// Errors related to the wallet signer.
    #[error(transparent)]
    Signer(SignerError),
    /// Errors related to the document store.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// A transaction could not be encoded.
    #[error("failed to encode transaction: {0}")]
    Encoding(#[from] rmp::encode::ValueWriteError),
}

impl EscrowError {
    /// Creates a new [`EscrowError::InvalidInput`].
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Returns the structured kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::EmptyState(_) => ErrorKind::EmptyState,
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::InvalidStateTransition(_) => ErrorKind::InvalidStateTransition,
            Self::UserCancelled => ErrorKind::UserCancelled,
            Self::TransientFetch(_) => ErrorKind::TransientFetch,
            Self::ConfirmationTimeout { .. } => ErrorKind::ConfirmationTimeout,
            Self::ContractRejected(_) => ErrorKind::ContractRejected,
            Self::Signer(_) => ErrorKind::Signer,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Encoding(_) => ErrorKind::Internal,
        }
    }

    /// Whether the caller may retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::TransientFetch | ErrorKind::ConfirmationTimeout)
    }
}

impl From<NodeError> for EscrowError {
    fn from(err: NodeError) -> Self {
        match err {
            NodeError::Transient(err) => Self::TransientFetch(err.to_string()),
            NodeError::NotFound(what) => Self::NotFound(what),
            NodeError::Protocol(msg) => Self::Protocol(msg),
            NodeError::Rejected { reason } => Self::ContractRejected(reason),
        }
    }
}

impl From<SignerError> for EscrowError {
    fn from(err: SignerError) -> Self {
        match err {
            SignerError::UserCancelled => Self::UserCancelled,
            err => Self::Signer(err),
        }
    }
}

/// Structured classification of an [`EscrowError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`EscrowError::InvalidInput`].
    InvalidInput,
    /// See [`EscrowError::NotFound`].
    NotFound,
    /// See [`EscrowError::EmptyState`].
    EmptyState,
    /// See [`EscrowError::Protocol`].
    Protocol,
    /// See [`EscrowError::InvalidStateTransition`].
    InvalidStateTransition,
    /// See [`EscrowError::UserCancelled`].
    UserCancelled,
    /// See [`EscrowError::TransientFetch`].
    TransientFetch,
    /// See [`EscrowError::ConfirmationTimeout`].
    ConfirmationTimeout,
    /// See [`EscrowError::ContractRejected`].
    ContractRejected,
    /// See [`EscrowError::Signer`].
    Signer,
    /// See [`EscrowError::Storage`].
    Storage,
    /// Internal failure.
    Internal,
}

impl ErrorKind {
    /// Stable identifier exposed to RPC clients.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::NotFound => "not_found",
            Self::EmptyState => "empty_state",
            Self::Protocol => "protocol_error",
            Self::InvalidStateTransition => "invalid_state_transition",
            Self::UserCancelled => "user_cancelled",
            Self::TransientFetch => "transient_fetch_error",
            Self::ConfirmationTimeout => "confirmation_timeout",
            Self::ContractRejected => "contract_rejected",
            Self::Signer => "signer_error",
            Self::Storage => "storage_error",
            Self::Internal => "internal_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<EscrowError> for jsonrpsee::types::error::ErrorObject<'static> {
    fn from(err: EscrowError) -> Self {
        let kind = err.kind();
        match kind {
            ErrorKind::InvalidInput
            | ErrorKind::InvalidStateTransition
            | ErrorKind::NotFound
            | ErrorKind::EmptyState => invalid_params(err.to_string(), kind),
            ErrorKind::UserCancelled
            | ErrorKind::ContractRejected
            | ErrorKind::ConfirmationTimeout
            | ErrorKind::TransientFetch => rpc_err(EXECUTION_ERROR_CODE, err.to_string(), kind),
            ErrorKind::Protocol | ErrorKind::Signer | ErrorKind::Storage | ErrorKind::Internal => {
                internal_rpc("an internal error occurred", kind)
            }
        }
    }
}

/// A helper trait to provide an RPC error code.
pub trait ToRpcResult<Ok, Err>: Sized {
    /// Converts result to [`RpcResult`] by converting error variant to
    /// [`jsonrpsee_types::error::ErrorObject`]
    fn to_rpc_result(self) -> RpcResult<Ok>
    where
        Err: fmt::Display;
}

impl<Ok> ToRpcResult<Ok, EscrowError> for Result<Ok, EscrowError> {
    fn to_rpc_result(self) -> RpcResult<Ok> {
        self.map_err(|err| err.into())
    }
}

/// JSON-RPC code for failures that happened while executing a transaction.
const EXECUTION_ERROR_CODE: i32 = 3;

/// Constructs an invalid params JSON‑RPC error.
fn invalid_params(
    msg: impl Into<String>,
    kind: ErrorKind,
) -> jsonrpsee::types::error::ErrorObject<'static> {
    rpc_err(jsonrpsee::types::error::INVALID_PARAMS_CODE, msg, kind)
}

/// Constructs an internal JSON‑RPC error.
fn internal_rpc(
    msg: impl Into<String>,
    kind: ErrorKind,
) -> jsonrpsee::types::error::ErrorObject<'static> {
    rpc_err(jsonrpsee::types::error::INTERNAL_ERROR_CODE, msg, kind)
}

/// Constructs a JSON‑RPC error with `code`, `message` and the error kind as `data`.
fn rpc_err(
    code: i32,
    msg: impl Into<String>,
    kind: ErrorKind,
) -> jsonrpsee::types::error::ErrorObject<'static> {
    jsonrpsee::types::error::ErrorObject::owned(code, msg.into(), Some(json!({ "kind": kind.as_str() })))
}
