use super::metrics::EscrowMetrics;
use crate::{error::EscrowError, node::LedgerApi, types::TxId};
use std::{sync::Arc, time::Instant};
use tracing::{debug, info, warn};

/// Waits until `tx_id` is confirmed, polling for at most `rounds` rounds.
///
/// Returns the confirmation round. A transaction dropped from the pool with an error fails with
/// [`EscrowError::ContractRejected`]. Exhausting the rounds fails with
/// [`EscrowError::ConfirmationTimeout`], in which case the transaction may still confirm later.
pub async fn wait_for_confirmation(
    ledger: &dyn LedgerApi,
    tx_id: &TxId,
    rounds: u64,
) -> Result<u64, EscrowError> {
    let start_round = ledger.status().await?.last_round;
    let mut current_round = start_round;

    while current_round < start_round.saturating_add(rounds) {
        let pending = ledger.pending_transaction(tx_id).await?;
        if let Some(confirmed_round) = pending.confirmed_round() {
            return Ok(confirmed_round);
        }
        if !pending.pool_error.is_empty() {
            return Err(EscrowError::ContractRejected(pending.pool_error));
        }

        debug!(%tx_id, round = current_round, "Transaction pending");
        ledger.status_after_round(current_round).await?;
        current_round += 1;
    }

    Err(EscrowError::ConfirmationTimeout { tx_id: *tx_id, rounds })
}

/// Handle to monitor submitted transactions.
#[derive(Debug, Clone)]
pub struct TransactionMonitoringHandle {
    ledger: Arc<dyn LedgerApi>,
    rounds: u64,
    metrics: Arc<EscrowMetrics>,
}

impl TransactionMonitoringHandle {
    /// Creates a new [`TransactionMonitoringHandle`] waiting at most `rounds` rounds.
    pub fn new(ledger: Arc<dyn LedgerApi>, rounds: u64, metrics: Arc<EscrowMetrics>) -> Self {
        Self { ledger, rounds, metrics }
    }

    /// Returns the number of rounds waited before giving up.
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Waits for `tx_id` to be confirmed, recording the outcome.
    pub async fn watch(&self, tx_id: &TxId) -> Result<u64, EscrowError> {
        let started = Instant::now();
        let result = wait_for_confirmation(self.ledger.as_ref(), tx_id, self.rounds).await;

        match &result {
            Ok(round) => {
                self.metrics.confirmed.increment(1);
                self.metrics.confirmation_time.record(started.elapsed().as_millis() as f64);
                info!(%tx_id, round, "Transaction confirmed");
            }
            Err(EscrowError::ConfirmationTimeout { rounds, .. }) => {
                self.metrics.timed_out.increment(1);
                warn!(%tx_id, rounds, "Transaction not confirmed in time");
            }
            Err(err) => {
                self.metrics.failed.increment(1);
                warn!(%tx_id, %err, "Transaction failed");
            }
        }

        result
    }
}
