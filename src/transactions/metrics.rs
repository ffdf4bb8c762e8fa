use metrics::{Counter, Histogram};
use metrics_derive::Metrics;

/// Metrics for an [`EscrowClient`](crate::escrow::EscrowClient).
#[derive(Metrics)]
#[metrics(scope = "escrow")]
pub struct EscrowMetrics {
    /// Number of fetched escrow snapshots.
    pub fetched: Counter,
    /// Number of failed snapshot fetches.
    pub fetch_failed: Counter,
    /// Number of global-state entries skipped while decoding.
    pub skipped_entries: Counter,
    /// Number of actions rejected by the client-side precondition check.
    pub rejected_transitions: Counter,
    /// Number of composed transaction groups.
    pub composed: Counter,
    /// Number of submitted transaction groups.
    pub sent: Counter,
    /// Number of groups the node or contract rejected.
    pub failed: Counter,
    /// Number of confirmed transaction groups.
    pub confirmed: Counter,
    /// Number of groups not confirmed within the polled rounds.
    pub timed_out: Counter,
    /// Number of failed document store updates.
    pub storage_failed: Counter,
    /// Time it takes to confirm transactions, in milliseconds.
    pub confirmation_time: Histogram,
}
