//! Atomic transaction groups.

use crate::{
    constants::GROUP_ID_PREFIX,
    error::EscrowError,
    types::{Transaction, TxId},
};
use sha2::{Digest, Sha512_256};

/// Maximum number of transactions the network accepts in a single group.
pub const MAX_GROUP_SIZE: usize = 16;

/// An ordered set of unsigned transactions the network executes atomically.
///
/// Built right before signing and dropped after submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionGroup {
    transactions: Vec<Transaction>,
    group_id: Option<[u8; 32]>,
}

impl TransactionGroup {
    /// Creates a group from `transactions`.
    ///
    /// A single transaction is submitted as-is. Two or more are bound together by a group id
    /// derived from their transaction ids, which is written into every member.
    pub fn new(mut transactions: Vec<Transaction>) -> Result<Self, EscrowError> {
        if transactions.is_empty() || transactions.len() > MAX_GROUP_SIZE {
            return Err(EscrowError::invalid_input(format!(
                "transaction group must contain 1 to {MAX_GROUP_SIZE} transactions, got {}",
                transactions.len()
            )));
        }

        if transactions.len() == 1 {
            transactions[0].group = None;
            return Ok(Self { transactions, group_id: None });
        }

        let group_id = compute_group_id(&transactions)?;
        for tx in &mut transactions {
            tx.group = Some(group_id);
        }

        Ok(Self { transactions, group_id: Some(group_id) })
    }

    /// Returns the transactions in submission order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Returns the shared group id, if the group has more than one member.
    pub fn group_id(&self) -> Option<[u8; 32]> {
        self.group_id
    }

    /// Returns the number of transactions.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Always false; groups are never empty.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Returns the ids of all members.
    pub fn tx_ids(&self) -> Result<Vec<TxId>, EscrowError> {
        self.transactions.iter().map(Transaction::id).collect()
    }

    /// Returns the encoded members, ready to hand to a wallet.
    pub fn encoded(&self) -> Result<Vec<Vec<u8>>, EscrowError> {
        self.transactions.iter().map(Transaction::encode).collect()
    }
}

/// Computes the group id: the digest of `TG || msgpack({"txlist": [txid, ...]})` over the
/// transaction ids with the group field cleared.
pub fn compute_group_id(transactions: &[Transaction]) -> Result<[u8; 32], EscrowError> {
    let mut buf = Vec::with_capacity(16 + transactions.len() * 34);
    rmp::encode::write_map_len(&mut buf, 1)?;
    rmp::encode::write_str(&mut buf, "txlist")?;
    rmp::encode::write_array_len(&mut buf, transactions.len() as u32)?;
    for tx in transactions {
        let mut tx = tx.clone();
        tx.group = None;
        rmp::encode::write_bin(&mut buf, tx.id()?.as_bytes())?;
    }

    let mut hasher = Sha512_256::new();
    hasher.update(GROUP_ID_PREFIX);
    hasher.update(&buf);
    Ok(hasher.finalize().into())
}
