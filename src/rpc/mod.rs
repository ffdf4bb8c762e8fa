//! RPC modules.

mod escrow;

pub use escrow::*;
