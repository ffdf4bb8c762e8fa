//! # Algorand escrow
//!
//! Library for reading escrow contract state on an Algorand network and composing the
//! transactions that move an escrow through its lifecycle.

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod escrow;
pub mod metrics;
pub mod node;
pub mod rpc;
pub mod serde;
pub mod signers;
pub mod spawn;
pub mod storage;
pub mod transactions;
pub mod types;
