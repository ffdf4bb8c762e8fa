//! Shared primitive types.

mod action;
pub use action::*;

mod address;
pub use address::*;

mod app_id;
pub use app_id::*;

mod method;
pub use method::*;

mod record;
pub use record::*;

pub mod rpc;

mod snapshot;
pub use snapshot::*;

mod state;
pub use state::*;

mod transaction;
pub use transaction::*;
