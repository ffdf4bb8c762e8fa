//! Transaction groups and confirmation monitoring.

mod group;
pub use group::{MAX_GROUP_SIZE, TransactionGroup, compute_group_id};
mod metrics;
pub use metrics::EscrowMetrics;
mod monitor;
pub use monitor::{TransactionMonitoringHandle, wait_for_confirmation};
