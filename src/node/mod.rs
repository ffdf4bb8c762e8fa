//! Ledger node integration.

pub mod api;
pub use api::LedgerApi;

mod client;
pub use client::AlgodClient;

mod error;
pub use error::{NodeError, NodeErrorResponse};

mod types;
pub use types::{
    Application, ApplicationParams, NodeStatus, PendingTransactionInfo, RawStateEntry,
    RawTealValue, SubmitResponse, TransactionParams,
};
