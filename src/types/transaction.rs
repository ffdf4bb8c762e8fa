//! Unsigned transactions and their canonical encoding.
//!
//! Transactions are encoded as MessagePack maps with lexicographically sorted keys, with every
//! zero or empty field omitted. The transaction id is the SHA-512/256 digest of the encoding
//! prefixed with `TX`.

use crate::{
    constants::{SIGNATURE_OVERHEAD, TX_ID_PREFIX},
    error::EscrowError,
    types::{Address, AppId},
};
use data_encoding::BASE32_NOPAD;
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha512_256};
use std::{collections::BTreeMap, fmt};

/// Network parameters required to build a transaction.
///
/// Fetched fresh for every composition since the validity window moves with the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestedParams {
    /// Fee per encoded byte, usually zero when the network is not congested.
    pub fee_per_byte: u64,
    /// Minimum fee for any transaction.
    pub min_fee: u64,
    /// First round the transaction is valid in.
    pub first_valid: u64,
    /// Last round the transaction is valid in.
    pub last_valid: u64,
    /// Genesis id of the network.
    pub genesis_id: String,
    /// Genesis hash of the network.
    pub genesis_hash: [u8; 32],
}

/// Action performed by an application call once it completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u64)]
pub enum OnComplete {
    /// Only execute the approval program.
    #[default]
    NoOp = 0,
    /// Opt the sender into the application.
    OptIn = 1,
    /// Close out the sender's local state.
    CloseOut = 2,
}

/// Type-specific transaction fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionKind {
    /// Native currency transfer.
    Payment {
        /// Receiver of the funds.
        receiver: Address,
        /// Amount in micro-units.
        amount: u64,
    },
    /// Application call.
    ApplicationCall {
        /// The called application.
        app_id: AppId,
        /// On-completion action.
        on_complete: OnComplete,
        /// Application arguments; the first is the method selector.
        args: Vec<Vec<u8>>,
        /// Referenced accounts.
        accounts: Vec<Address>,
    },
}

impl TransactionKind {
    /// The wire name of the transaction type.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Payment { .. } => "pay",
            Self::ApplicationCall { .. } => "appl",
        }
    }
}

/// An unsigned transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Sender, which is also the required signer.
    pub sender: Address,
    /// Flat fee in micro-units.
    pub fee: u64,
    /// First valid round.
    pub first_valid: u64,
    /// Last valid round.
    pub last_valid: u64,
    /// Genesis id.
    pub genesis_id: String,
    /// Genesis hash.
    pub genesis_hash: [u8; 32],
    /// Group id, set once the transaction joins a group.
    pub group: Option<[u8; 32]>,
    /// Free-form note.
    pub note: Vec<u8>,
    /// Type-specific fields.
    pub kind: TransactionKind,
}

impl Transaction {
    /// Creates a transaction with the validity window of `params` and no fee set.
    pub fn new(sender: Address, kind: TransactionKind, params: &SuggestedParams) -> Self {
        Self {
            sender,
            fee: 0,
            first_valid: params.first_valid,
            last_valid: params.last_valid,
            genesis_id: params.genesis_id.clone(),
            genesis_hash: params.genesis_hash,
            group: None,
            note: Vec::new(),
            kind,
        }
    }

    /// Creates a payment.
    pub fn payment(
        sender: Address,
        receiver: Address,
        amount: u64,
        params: &SuggestedParams,
    ) -> Self {
        Self::new(sender, TransactionKind::Payment { receiver, amount }, params)
    }

    /// Creates a no-op application call.
    pub fn application_call(
        sender: Address,
        app_id: AppId,
        args: Vec<Vec<u8>>,
        accounts: Vec<Address>,
        params: &SuggestedParams,
    ) -> Self {
        Self::new(
            sender,
            TransactionKind::ApplicationCall {
                app_id,
                on_complete: OnComplete::NoOp,
                args,
                accounts,
            },
            params,
        )
    }

    /// Sets the flat fee from `params`, additionally covering `inner_transactions` minimum
    /// fees for transactions issued by the called contract.
    pub fn with_suggested_fee(
        mut self,
        params: &SuggestedParams,
        inner_transactions: u64,
    ) -> Result<Self, EscrowError> {
        let size = self.encode()?.len() as u64 + SIGNATURE_OVERHEAD;
        let fee = params.fee_per_byte.saturating_mul(size).max(params.min_fee);
        self.fee = fee.saturating_add(params.min_fee.saturating_mul(inner_transactions));
        Ok(self)
    }

    /// Returns the canonical MessagePack encoding.
    pub fn encode(&self) -> Result<Vec<u8>, EscrowError> {
        let fields = self.fields();
        let mut buf = Vec::with_capacity(256);
        rmp::encode::write_map_len(&mut buf, fields.len() as u32)?;
        for (key, field) in fields {
            rmp::encode::write_str(&mut buf, key)?;
            field.write(&mut buf)?;
        }
        Ok(buf)
    }

    /// Returns the bytes that are hashed into the transaction id and signed.
    pub fn bytes_to_sign(&self) -> Result<Vec<u8>, EscrowError> {
        let encoded = self.encode()?;
        let mut buf = Vec::with_capacity(TX_ID_PREFIX.len() + encoded.len());
        buf.extend_from_slice(TX_ID_PREFIX);
        buf.extend_from_slice(&encoded);
        Ok(buf)
    }

    /// Returns the transaction id.
    pub fn id(&self) -> Result<TxId, EscrowError> {
        Ok(TxId(Sha512_256::digest(self.bytes_to_sign()?).into()))
    }

    /// Collects the non-empty fields keyed by wire name. The map ordering is the canonical
    /// key ordering.
    fn fields<'a>(&'a self) -> BTreeMap<&'static str, Field<'a>> {
        let mut fields = BTreeMap::new();
        let mut put = |key: &'static str, field: Field<'a>| {
            if !field.is_empty() {
                fields.insert(key, field);
            }
        };

        put("fee", Field::Uint(self.fee));
        put("fv", Field::Uint(self.first_valid));
        put("lv", Field::Uint(self.last_valid));
        put("gen", Field::Str(&self.genesis_id));
        put("gh", Field::Digest(&self.genesis_hash));
        if let Some(group) = &self.group {
            put("grp", Field::Digest(group));
        }
        put("note", Field::Bin(&self.note));
        put("snd", Field::Digest(self.sender.as_bytes()));
        put("type", Field::Str(self.kind.type_name()));

        match &self.kind {
            TransactionKind::Payment { receiver, amount } => {
                put("amt", Field::Uint(*amount));
                put("rcv", Field::Digest(receiver.as_bytes()));
            }
            TransactionKind::ApplicationCall { app_id, on_complete, args, accounts } => {
                put("apid", Field::Uint(app_id.get()));
                put("apan", Field::Uint(*on_complete as u64));
                put("apaa", Field::BinArray(args.iter().map(Vec::as_slice).collect()));
                put(
                    "apat",
                    Field::BinArray(accounts.iter().map(|a| a.as_bytes().as_slice()).collect()),
                );
            }
        }

        fields
    }
}

/// A single encodable field value.
enum Field<'a> {
    Uint(u64),
    Str(&'a str),
    Bin(&'a [u8]),
    Digest(&'a [u8; 32]),
    BinArray(Vec<&'a [u8]>),
}

impl Field<'_> {
    fn is_empty(&self) -> bool {
        match self {
            Self::Uint(value) => *value == 0,
            Self::Str(value) => value.is_empty(),
            Self::Bin(value) => value.is_empty(),
            Self::Digest(value) => value.iter().all(|b| *b == 0),
            Self::BinArray(values) => values.is_empty(),
        }
    }

    fn write(&self, buf: &mut Vec<u8>) -> Result<(), EscrowError> {
        match self {
            Self::Uint(value) => {
                rmp::encode::write_uint(buf, *value)?;
            }
            Self::Str(value) => rmp::encode::write_str(buf, value)?,
            Self::Bin(value) => rmp::encode::write_bin(buf, value)?,
            Self::Digest(value) => rmp::encode::write_bin(buf, value.as_slice())?,
            Self::BinArray(values) => {
                rmp::encode::write_array_len(buf, values.len() as u32)?;
                for value in values {
                    rmp::encode::write_bin(buf, value)?;
                }
            }
        }
        Ok(())
    }
}

/// A transaction id.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxId(pub [u8; 32]);

impl TxId {
    /// Returns the raw digest.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&BASE32_NOPAD.encode(&self.0))
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TxId").field(&self.to_string()).finish()
    }
}

impl Serialize for TxId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TxId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = BASE32_NOPAD.decode(s.as_bytes()).map_err(serde::de::Error::custom)?;
        <[u8; 32]>::try_from(bytes.as_slice())
            .map(Self)
            .map_err(|_| serde::de::Error::custom("transaction id must be 32 bytes"))
    }
}
