//! Escrow client adapter.
//!
//! Reads escrow contract state from a ledger node, decodes it into an [`EscrowSnapshot`], and
//! composes the transaction groups that move an escrow through its lifecycle. Signing is
//! delegated to a [`WalletConnection`].

mod compose;
pub use compose::ActionComposer;
mod decode;
pub use decode::{Decoded, decode_global_state, decode_raw_global_state};

use crate::{
    config::ContractConfig,
    error::EscrowError,
    node::{LedgerApi, NodeError},
    signers::WalletConnection,
    storage::{EscrowStorage, StorageApi},
    transactions::{EscrowMetrics, TransactionGroup, TransactionMonitoringHandle},
    types::{Address, AppId, EscrowAction, EscrowSnapshot, rpc::SubmittedAction},
};
use futures_util::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Escrow client adapter.
#[derive(Debug, Clone)]
pub struct EscrowClient {
    ledger: Arc<dyn LedgerApi>,
    storage: EscrowStorage,
    composer: ActionComposer,
    monitor: TransactionMonitoringHandle,
    metrics: Arc<EscrowMetrics>,
}

impl EscrowClient {
    /// Creates a new client.
    pub fn new(ledger: Arc<dyn LedgerApi>, storage: EscrowStorage, contract: ContractConfig) -> Self {
        let metrics = Arc::new(EscrowMetrics::default());
        let monitor = TransactionMonitoringHandle::new(
            ledger.clone(),
            contract.confirmation_rounds,
            metrics.clone(),
        );
        Self { ledger, storage, composer: ActionComposer::new(contract), monitor, metrics }
    }

    /// Returns the document store.
    pub fn storage(&self) -> &EscrowStorage {
        &self.storage
    }

    /// Returns the composer.
    pub fn composer(&self) -> &ActionComposer {
        &self.composer
    }

    /// Fetches and decodes the current state of an escrow application.
    ///
    /// Every call reads fresh state. Fails with [`EscrowError::NotFound`] if the application
    /// does not exist and with [`EscrowError::EmptyState`] if it has no global state.
    #[instrument(skip(self))]
    pub async fn fetch_snapshot(&self, app_id: AppId) -> Result<EscrowSnapshot, EscrowError> {
        let result = self.try_fetch_snapshot(app_id).await;
        match &result {
            Ok(_) => self.metrics.fetched.increment(1),
            Err(_) => self.metrics.fetch_failed.increment(1),
        }
        result
    }

    async fn try_fetch_snapshot(&self, app_id: AppId) -> Result<EscrowSnapshot, EscrowError> {
        let application = self.ledger.application(app_id).await.map_err(|err| match err {
            NodeError::NotFound(_) => EscrowError::NotFound(format!("application {app_id}")),
            err => err.into(),
        })?;

        if application.id != app_id.get() {
            return Err(EscrowError::Protocol(format!(
                "requested application {app_id}, node returned {}",
                application.id
            )));
        }

        let Decoded { snapshot, skipped } =
            decode_raw_global_state(app_id, application.global_state())?;
        if skipped > 0 {
            self.metrics.skipped_entries.increment(skipped as u64);
        }

        debug!(status = %snapshot.status(), amount = snapshot.escrow_amount_micro_units, "Fetched escrow");
        Ok(snapshot)
    }

    /// Fetches the snapshots of every escrow the document store lists for `client`.
    ///
    /// Applications are fetched concurrently. Failed fetches are logged and omitted.
    #[instrument(skip(self))]
    pub async fn client_snapshots(
        &self,
        client: &Address,
    ) -> Result<Vec<EscrowSnapshot>, EscrowError> {
        let records = self.storage.read_client_escrows(client).await?;

        let fetches = records.iter().map(|record| async move {
            (record.app_id, self.fetch_snapshot(record.app_id).await)
        });

        Ok(join_all(fetches)
            .await
            .into_iter()
            .filter_map(|(app_id, result)| {
                result.inspect_err(|err| warn!(%app_id, %err, "Failed to fetch escrow")).ok()
            })
            .collect())
    }

    /// Composes the unsigned transaction group performing `action` as `actor`.
    ///
    /// Preconditions are checked before any network call. Transaction parameters are fetched
    /// fresh on every call.
    #[instrument(skip(self, snapshot), fields(app_id = %snapshot.application_id))]
    pub async fn prepare(
        &self,
        action: EscrowAction,
        snapshot: &EscrowSnapshot,
        actor: Address,
    ) -> Result<TransactionGroup, EscrowError> {
        if let Err(err) = self.composer.check(action, snapshot, &actor) {
            self.metrics.rejected_transitions.increment(1);
            return Err(err.into());
        }

        let params = self
            .ledger
            .transaction_params()
            .await?
            .into_suggested(self.composer.contract().validity_window)?;

        let group = self.composer.compose(action, snapshot, actor, &params)?;
        self.metrics.composed.increment(1);
        debug!(transactions = group.len(), first_valid = params.first_valid, "Composed group");

        Ok(group)
    }

    /// Submits a signed group, waits for its confirmation and records the outcome in the
    /// document store.
    ///
    /// A failed store update does not fail the submission; it is reported by an absent
    /// [`SubmittedAction::record_status`].
    #[instrument(skip(self, signed))]
    pub async fn submit(
        &self,
        action: EscrowAction,
        app_id: AppId,
        signed: Vec<Vec<u8>>,
    ) -> Result<SubmittedAction, EscrowError> {
        if signed.is_empty() || signed.iter().any(Vec::is_empty) {
            return Err(EscrowError::invalid_input("no signed transactions to submit"));
        }

        let tx_id = match self.ledger.send_raw_transactions(signed.concat()).await {
            Ok(tx_id) => tx_id,
            Err(err) => {
                self.metrics.failed.increment(1);
                return Err(err.into());
            }
        };
        self.metrics.sent.increment(1);
        info!(%tx_id, transactions = signed.len(), "Submitted escrow action");

        // group members confirm atomically, so the first one stands for all of them
        let confirmed_round = self.monitor.watch(&tx_id).await?;

        let status = action.resulting_record_status();
        let record_status = match self.storage.update_escrow_status(app_id, status).await {
            Ok(()) => Some(status),
            Err(err) => {
                self.metrics.storage_failed.increment(1);
                warn!(%err, "Failed to update escrow record");
                None
            }
        };

        Ok(SubmittedAction { tx_id, confirmed_round, record_status })
    }

    /// Performs `action` end to end: fetches fresh state, composes the group, signs it with the
    /// connected wallet account and submits it.
    #[instrument(skip(self, connection))]
    pub async fn execute(
        &self,
        action: EscrowAction,
        app_id: AppId,
        connection: &WalletConnection,
    ) -> Result<SubmittedAction, EscrowError> {
        let actor = match connection.active_account().await {
            Some(actor) => actor,
            None => connection.reconnect().await?,
        };
        self.execute_as(action, app_id, actor, connection).await
    }

    /// Like [`EscrowClient::execute`], acting as a specific wallet account.
    pub async fn execute_as(
        &self,
        action: EscrowAction,
        app_id: AppId,
        actor: Address,
        connection: &WalletConnection,
    ) -> Result<SubmittedAction, EscrowError> {
        let snapshot = self.fetch_snapshot(app_id).await?;
        let group = self.prepare(action, &snapshot, actor).await?;
        let signed = connection.sign(&group).await?;
        self.submit(action, app_id, signed).await
    }
}
