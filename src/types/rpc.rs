//! Request and response types of the `escrow_` RPC namespace.

use crate::types::{
    Address, AppId, EscrowAction, EscrowSnapshot, EscrowStatus, RecordStatus, TxId,
    format_micro_units,
};
use serde::{Deserialize, Serialize};

/// Response of `escrow_getEscrow`: a snapshot with its display fields resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscrowDetails {
    /// The decoded state.
    #[serde(flatten)]
    pub snapshot: EscrowSnapshot,
    /// The decoded status.
    pub status: EscrowStatus,
    /// The escrowed amount in whole units with six decimals.
    pub amount: String,
}

impl From<EscrowSnapshot> for EscrowDetails {
    fn from(snapshot: EscrowSnapshot) -> Self {
        Self {
            status: snapshot.status(),
            amount: format_micro_units(snapshot.escrow_amount_micro_units),
            snapshot,
        }
    }
}

/// Request parameters for `escrow_prepareAction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareActionParameters {
    /// The escrow application.
    pub app_id: AppId,
    /// The requested action.
    pub action: EscrowAction,
    /// The acting address, which must be the escrow client.
    pub sender: Address,
}

/// Response of `escrow_prepareAction`: an unsigned transaction group ready for a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedAction {
    /// The escrow application.
    pub app_id: AppId,
    /// The requested action.
    pub action: EscrowAction,
    /// The snapshot the group was composed against.
    pub snapshot: EscrowSnapshot,
    /// Canonically encoded unsigned transactions, in submission order.
    #[serde(with = "crate::serde::base64_vec")]
    pub transactions: Vec<Vec<u8>>,
    /// Ids of the transactions, in submission order.
    pub tx_ids: Vec<TxId>,
    /// Shared group id, absent for single transactions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

/// Request parameters for `escrow_submitAction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitActionParameters {
    /// The escrow application.
    pub app_id: AppId,
    /// The action the signed group performs.
    pub action: EscrowAction,
    /// Signed transactions, in submission order.
    #[serde(with = "crate::serde::base64_vec")]
    pub signed_transactions: Vec<Vec<u8>>,
}

/// Request parameters for `escrow_executeAction`.
pub type ExecuteActionParameters = PrepareActionParameters;

/// Response of `escrow_submitAction` and `escrow_executeAction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAction {
    /// The watched transaction.
    pub tx_id: TxId,
    /// Round the transaction was confirmed in.
    pub confirmed_round: u64,
    /// Status written to the document store, absent if the update failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_status: Option<RecordStatus>,
}
