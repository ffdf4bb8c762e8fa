use crate::types::{Address, EscrowAction, EscrowStatus};
use thiserror::Error;

/// An escrow action that is not allowed in the current state.
///
/// Raised before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The escrow is not in the status the action requires.
    #[error("cannot {action} escrow in status {current}, required status is {required}")]
    WrongStatus {
        /// The requested action.
        action: EscrowAction,
        /// The current status.
        current: EscrowStatus,
        /// The required status.
        required: EscrowStatus,
    },
    /// The acting party is not the escrow client.
    #[error("only the client can {action} the escrow; {actor} is not the client")]
    NotClient {
        /// The requested action.
        action: EscrowAction,
        /// The acting address.
        actor: Address,
        /// The recorded client, if any.
        client: Option<Address>,
    },
}
