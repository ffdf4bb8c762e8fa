//! Ledger query api.

use super::{
    NodeError,
    types::{Application, NodeStatus, PendingTransactionInfo, TransactionParams},
};
use crate::types::{AppId, TxId};
use async_trait::async_trait;
use std::fmt::Debug;

/// Type alias for `Result<T, NodeError>`
pub type Result<T> = core::result::Result<T, NodeError>;

/// Operations the escrow adapter consumes from a ledger node.
#[async_trait]
pub trait LedgerApi: Debug + Send + Sync {
    /// Reads an application record.
    async fn application(&self, app_id: AppId) -> Result<Application>;

    /// Reads the current transaction parameters.
    async fn transaction_params(&self) -> Result<TransactionParams>;

    /// Reads the node status.
    async fn status(&self) -> Result<NodeStatus>;

    /// Waits until a block after `round` is available and returns the node status.
    async fn status_after_round(&self, round: u64) -> Result<NodeStatus>;

    /// Reads the pool record of a submitted transaction.
    async fn pending_transaction(&self, tx_id: &TxId) -> Result<PendingTransactionInfo>;

    /// Submits concatenated signed transactions, returning the id of the first one.
    async fn send_raw_transactions(&self, signed: Vec<u8>) -> Result<TxId>;
}
