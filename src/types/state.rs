//! Raw global-state entries of an application.

/// Global-state key holding the client address.
pub const CLIENT_ADDR_KEY: &[u8] = b"client_addr";
/// Global-state key holding the freelancer address.
pub const FREELANCER_ADDR_KEY: &[u8] = b"freelancer_addr";
/// Global-state key holding the escrow status code.
pub const STATUS_KEY: &[u8] = b"status";
/// Global-state key holding the escrowed amount in micro-units.
pub const ESCROW_AMOUNT_KEY: &[u8] = b"escrow_amount";
/// Global-state key holding the asset id, `0` for the native currency.
pub const ASSET_ID_KEY: &[u8] = b"asset_id";
/// Global-state key holding the unitary price.
pub const UNITARY_PRICE_KEY: &[u8] = b"unitary_price";

/// A value stored in application state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TealValue {
    /// Raw byte string.
    Bytes(Vec<u8>),
    /// Unsigned 64-bit integer.
    Uint(u64),
}

/// One key/value pair of application global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEntry {
    /// Raw key bytes.
    pub key: Vec<u8>,
    /// Stored value.
    pub value: TealValue,
}

impl StateEntry {
    /// Creates an integer entry.
    pub fn uint(key: impl Into<Vec<u8>>, value: u64) -> Self {
        Self { key: key.into(), value: TealValue::Uint(value) }
    }

    /// Creates a byte-string entry.
    pub fn bytes(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into(), value: TealValue::Bytes(value.into()) }
    }
}

/// Failure to decode a single state entry.
///
/// Entries failing to decode are skipped individually.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// A key or value was not valid base64.
    #[error("invalid base64 in {0}")]
    InvalidBase64(&'static str),
    /// The value type tag is not recognized.
    #[error("unknown value type {0}")]
    UnknownValueType(u64),
    /// The value has the wrong type for its key.
    #[error("key {key} expects {expected} value")]
    WrongType {
        /// The entry key.
        key: String,
        /// The expected value type.
        expected: &'static str,
    },
    /// An address value is not 32 bytes long.
    #[error("key {key} holds a {len}-byte address")]
    MalformedAddress {
        /// The entry key.
        key: String,
        /// The actual length.
        len: usize,
    },
    /// A byte-encoded integer is shorter than 8 bytes.
    #[error("key {key} holds a {len}-byte integer")]
    MalformedInteger {
        /// The entry key.
        key: String,
        /// The actual length.
        len: usize,
    },
}
