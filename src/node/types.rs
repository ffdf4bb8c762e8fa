//! Node response types.

use super::NodeError;
use crate::types::{DecodeError, StateEntry, SuggestedParams, TealValue};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Deserialize;

/// Value type tag for byte strings.
const VALUE_TYPE_BYTES: u64 = 1;
/// Value type tag for integers.
const VALUE_TYPE_UINT: u64 = 2;

/// Application record returned by `/v2/applications/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Application {
    /// The application id.
    pub id: u64,
    /// Application parameters.
    pub params: ApplicationParams,
}

impl Application {
    /// Returns the raw global state, `None` if the node reported none.
    pub fn global_state(&self) -> Option<&[RawStateEntry]> {
        self.params.global_state.as_deref()
    }
}

/// Parameters of an application.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ApplicationParams {
    /// Creator of the application.
    #[serde(default)]
    pub creator: Option<String>,
    /// Global key/value state.
    #[serde(default)]
    pub global_state: Option<Vec<RawStateEntry>>,
}

/// A global-state entry as transmitted by the node, with base64 keys and byte values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawStateEntry {
    /// Base64 encoded key.
    pub key: String,
    /// Tagged value.
    pub value: RawTealValue,
}

/// A tagged state value as transmitted by the node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawTealValue {
    /// `1` for bytes, `2` for uint.
    #[serde(rename = "type")]
    pub ty: u64,
    /// Base64 encoded bytes.
    #[serde(default)]
    pub bytes: String,
    /// Integer value.
    #[serde(default)]
    pub uint: u64,
}

impl TryFrom<&RawStateEntry> for StateEntry {
    type Error = DecodeError;

    fn try_from(raw: &RawStateEntry) -> Result<Self, Self::Error> {
        let key = STANDARD.decode(&raw.key).map_err(|_| DecodeError::InvalidBase64("key"))?;
        let value = match raw.value.ty {
            VALUE_TYPE_BYTES => TealValue::Bytes(
                STANDARD.decode(&raw.value.bytes).map_err(|_| DecodeError::InvalidBase64("value"))?,
            ),
            VALUE_TYPE_UINT => TealValue::Uint(raw.value.uint),
            other => return Err(DecodeError::UnknownValueType(other)),
        };
        Ok(Self { key, value })
    }
}

/// Response of `/v2/transactions/params`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TransactionParams {
    /// Consensus protocol version.
    #[serde(default)]
    pub consensus_version: String,
    /// Fee per byte.
    pub fee: u64,
    /// Base64 encoded genesis hash.
    pub genesis_hash: String,
    /// Genesis id.
    pub genesis_id: String,
    /// Latest round known to the node.
    pub last_round: u64,
    /// Minimum transaction fee.
    pub min_fee: u64,
}

impl TransactionParams {
    /// Converts the node parameters into [`SuggestedParams`] valid for `validity_window`
    /// rounds starting at the latest round.
    pub fn into_suggested(self, validity_window: u64) -> Result<SuggestedParams, NodeError> {
        let genesis_hash = STANDARD
            .decode(&self.genesis_hash)
            .ok()
            .and_then(|hash| <[u8; 32]>::try_from(hash.as_slice()).ok())
            .ok_or_else(|| NodeError::Protocol(format!("invalid genesis hash {}", self.genesis_hash)))?;

        Ok(SuggestedParams {
            fee_per_byte: self.fee,
            min_fee: self.min_fee,
            first_valid: self.last_round,
            last_valid: self.last_round.saturating_add(validity_window),
            genesis_id: self.genesis_id,
            genesis_hash,
        })
    }
}

/// Response of `/v2/status`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodeStatus {
    /// Latest round.
    pub last_round: u64,
}

/// Response of `/v2/transactions/pending/{txid}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PendingTransactionInfo {
    /// Round the transaction was confirmed in, absent or zero while pending.
    #[serde(default)]
    pub confirmed_round: Option<u64>,
    /// Reason the transaction was removed from the pool, empty otherwise.
    #[serde(default)]
    pub pool_error: String,
}

impl PendingTransactionInfo {
    /// Returns the confirmation round, if confirmed.
    pub fn confirmed_round(&self) -> Option<u64> {
        self.confirmed_round.filter(|round| *round > 0)
    }
}

/// Response of `POST /v2/transactions`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    /// Id of the first submitted transaction.
    #[serde(rename = "txId")]
    pub tx_id: String,
}
