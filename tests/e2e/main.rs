//! Escrow end-to-end tests
#![allow(missing_docs, dead_code)]

mod environment;

pub use constants::*;
pub use environment::*;
