//! Wallet signers.
//!
//! Signing is delegated to a wallet that owns the keys. Nothing in this crate holds private key
//! material.

mod kmd;
pub use kmd::KmdSigner;

use crate::{error::SignerError, transactions::TransactionGroup, types::Address};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// A wallet able to sign transaction groups on behalf of its accounts.
#[async_trait]
pub trait WalletSigner: Debug + Send + Sync {
    /// Opens a new session and returns the accounts it exposes.
    async fn connect(&self) -> Result<Vec<Address>, SignerError>;

    /// Resumes the current session, opening a new one if it expired.
    async fn reconnect(&self) -> Result<Vec<Address>, SignerError>;

    /// Closes the current session.
    async fn disconnect(&self) -> Result<(), SignerError>;

    /// Signs every member of `group` as `signer`, returning the encoded signed transactions in
    /// group order.
    async fn sign_group(
        &self,
        group: &TransactionGroup,
        signer: Address,
    ) -> Result<Vec<Vec<u8>>, SignerError>;
}

/// A caller-owned wallet session.
///
/// Tracks the accounts exposed by the wallet between `connect` and `disconnect`. The first
/// account is the active one.
#[derive(Debug, Clone)]
pub struct WalletConnection {
    signer: Arc<dyn WalletSigner>,
    accounts: Arc<RwLock<Vec<Address>>>,
}

impl WalletConnection {
    /// Creates a disconnected session for `signer`.
    pub fn new(signer: Arc<dyn WalletSigner>) -> Self {
        Self { signer, accounts: Default::default() }
    }

    /// Connects to the wallet and returns the active account.
    pub async fn connect(&self) -> Result<Address, SignerError> {
        let accounts = self.signer.connect().await?;
        self.set_accounts(accounts).await
    }

    /// Resumes the wallet session and returns the active account.
    pub async fn reconnect(&self) -> Result<Address, SignerError> {
        let accounts = self.signer.reconnect().await?;
        self.set_accounts(accounts).await
    }

    /// Disconnects from the wallet. The session is cleared even if the wallet fails to close it.
    pub async fn disconnect(&self) -> Result<(), SignerError> {
        self.accounts.write().await.clear();
        self.signer.disconnect().await
    }

    /// Returns the active account, if connected.
    pub async fn active_account(&self) -> Option<Address> {
        self.accounts.read().await.first().copied()
    }

    /// Returns all accounts exposed by the wallet.
    pub async fn accounts(&self) -> Vec<Address> {
        self.accounts.read().await.clone()
    }

    /// Whether a session is open.
    pub async fn is_connected(&self) -> bool {
        !self.accounts.read().await.is_empty()
    }

    /// Signs `group` with the account sending its transactions.
    pub async fn sign(&self, group: &TransactionGroup) -> Result<Vec<Vec<u8>>, SignerError> {
        let sender = group
            .transactions()
            .first()
            .map(|tx| tx.sender)
            .ok_or_else(|| SignerError::Protocol("empty transaction group".to_string()))?;

        let accounts = self.accounts.read().await;
        if accounts.is_empty() {
            return Err(SignerError::NotConnected);
        }
        if !accounts.contains(&sender) {
            return Err(SignerError::UnknownAccount(sender.to_string()));
        }
        drop(accounts);

        debug!(%sender, transactions = group.len(), "Requesting signatures");
        let signed = self.signer.sign_group(group, sender).await?;
        if signed.len() != group.len() {
            return Err(SignerError::Protocol(format!(
                "wallet returned {} signed transactions for a group of {}",
                signed.len(),
                group.len()
            )));
        }

        Ok(signed)
    }

    async fn set_accounts(&self, accounts: Vec<Address>) -> Result<Address, SignerError> {
        let active = *accounts.first().ok_or(SignerError::NoAccounts)?;
        info!(%active, accounts = accounts.len(), "Wallet connected");
        *self.accounts.write().await = accounts;
        Ok(active)
    }
}
