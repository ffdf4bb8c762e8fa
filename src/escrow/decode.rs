//! Decoding of escrow global state into an [`EscrowSnapshot`].
//!
//! Keys are matched by exact name and unknown keys are ignored. An entry that fails to decode is
//! skipped on its own and never aborts the decode of the remaining entries.

use crate::{
    error::EscrowError,
    node::RawStateEntry,
    types::{
        ASSET_ID_KEY, Address, AppId, CLIENT_ADDR_KEY, DecodeError, ESCROW_AMOUNT_KEY,
        EscrowSnapshot, FREELANCER_ADDR_KEY, STATUS_KEY, StateEntry, TealValue,
        UNITARY_PRICE_KEY,
    },
};
use tracing::{debug, warn};

/// A recognized global-state field and the decoded value it contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    ClientAddress(Option<Address>),
    FreelancerAddress(Option<Address>),
    Status(Option<u64>),
    EscrowAmount(Option<u64>),
    AssetId(Option<u64>),
    UnitaryPrice(Option<u64>),
}

/// Outcome of decoding a list of entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// The decoded snapshot.
    pub snapshot: EscrowSnapshot,
    /// Number of entries skipped because they failed to decode.
    pub skipped: usize,
}

/// Decodes the raw global state reported by the node.
///
/// Returns [`EscrowError::EmptyState`] if the state is absent or has no entries.
pub fn decode_raw_global_state(
    app_id: AppId,
    raw: Option<&[RawStateEntry]>,
) -> Result<Decoded, EscrowError> {
    let raw = raw.filter(|entries| !entries.is_empty()).ok_or(EscrowError::EmptyState(app_id))?;

    let mut skipped = 0;
    let entries = raw
        .iter()
        .filter_map(|entry| {
            StateEntry::try_from(entry)
                .inspect_err(|err| {
                    skipped += 1;
                    warn!(%app_id, key = %entry.key, %err, "Skipping undecodable state entry");
                })
                .ok()
        })
        .collect::<Vec<_>>();

    // every entry being malformed still means the contract has state
    let mut decoded = decode_entries(app_id, &entries);
    decoded.skipped += skipped;
    Ok(decoded)
}

/// Decodes already typed global-state entries.
///
/// Returns [`EscrowError::EmptyState`] if `entries` is empty.
pub fn decode_global_state(
    app_id: AppId,
    entries: &[StateEntry],
) -> Result<Decoded, EscrowError> {
    if entries.is_empty() {
        return Err(EscrowError::EmptyState(app_id));
    }
    Ok(decode_entries(app_id, entries))
}

fn decode_entries(app_id: AppId, entries: &[StateEntry]) -> Decoded {
    let mut snapshot = EscrowSnapshot::new(app_id);
    let mut skipped = 0;

    for entry in entries {
        match decode_entry(entry) {
            Ok(Some(field)) => {
                debug!(%app_id, ?field, "Decoded state entry");
                apply(&mut snapshot, field);
            }
            Ok(None) => {}
            Err(err) => {
                skipped += 1;
                warn!(%app_id, %err, "Skipping undecodable state entry");
            }
        }
    }

    Decoded { snapshot, skipped }
}

fn apply(snapshot: &mut EscrowSnapshot, field: Field) {
    match field {
        Field::ClientAddress(address) => snapshot.client_address = address,
        Field::FreelancerAddress(address) => snapshot.freelancer_address = address,
        Field::Status(code) => snapshot.status_code = code,
        Field::EscrowAmount(amount) => {
            snapshot.escrow_amount_micro_units = amount.unwrap_or_default()
        }
        Field::AssetId(id) => snapshot.asset_id = id.unwrap_or_default(),
        Field::UnitaryPrice(price) => snapshot.unitary_price = price.unwrap_or_default(),
    }
}

/// Decodes a single entry. Returns `Ok(None)` for keys outside the recognized set.
fn decode_entry(entry: &StateEntry) -> Result<Option<Field>, DecodeError> {
    let key = entry.key.as_slice();
    let field = match key {
        CLIENT_ADDR_KEY => Field::ClientAddress(decode_address(key, &entry.value)?),
        FREELANCER_ADDR_KEY => Field::FreelancerAddress(decode_address(key, &entry.value)?),
        STATUS_KEY => Field::Status(decode_uint(key, &entry.value)?),
        ESCROW_AMOUNT_KEY => Field::EscrowAmount(decode_uint(key, &entry.value)?),
        ASSET_ID_KEY => Field::AssetId(decode_uint(key, &entry.value)?),
        UNITARY_PRICE_KEY => Field::UnitaryPrice(decode_uint(key, &entry.value)?),
        _ => return Ok(None),
    };
    Ok(Some(field))
}

/// Decodes an address value. Empty bytes leave the address unset.
fn decode_address(key: &[u8], value: &TealValue) -> Result<Option<Address>, DecodeError> {
    match value {
        TealValue::Bytes(bytes) if bytes.is_empty() => Ok(None),
        TealValue::Bytes(bytes) => Address::from_slice(bytes)
            .map(Some)
            .ok_or_else(|| DecodeError::MalformedAddress { key: key_name(key), len: bytes.len() }),
        TealValue::Uint(_) => Err(DecodeError::WrongType { key: key_name(key), expected: "bytes" }),
    }
}

/// Decodes an integer value, accepting the big-endian byte encoding as well. Empty bytes leave
/// the field unset.
fn decode_uint(key: &[u8], value: &TealValue) -> Result<Option<u64>, DecodeError> {
    match value {
        TealValue::Uint(value) => Ok(Some(*value)),
        TealValue::Bytes(bytes) if bytes.is_empty() => Ok(None),
        TealValue::Bytes(bytes) => bytes
            .first_chunk::<8>()
            .map(|chunk| Some(u64::from_be_bytes(*chunk)))
            .ok_or_else(|| DecodeError::MalformedInteger { key: key_name(key), len: bytes.len() }),
    }
}

fn key_name(key: &[u8]) -> String {
    String::from_utf8_lossy(key).into_owned()
}
