use crate::types::{EscrowStatus, RecordStatus};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A party-initiated escrow transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscrowAction {
    /// Release the escrowed funds to the freelancer.
    Approve,
    /// Refund the escrowed funds to the client.
    Cancel,
}

impl EscrowAction {
    /// The status the escrow must be in for this action.
    pub const fn required_status(self) -> EscrowStatus {
        match self {
            Self::Approve | Self::Cancel => EscrowStatus::Funded,
        }
    }

    /// The document store status written once the action is confirmed.
    pub const fn resulting_record_status(self) -> RecordStatus {
        match self {
            Self::Approve => RecordStatus::Completed,
            Self::Cancel => RecordStatus::Cancelled,
        }
    }
}

impl fmt::Display for EscrowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approve => f.write_str("approve"),
            Self::Cancel => f.write_str("cancel"),
        }
    }
}

impl FromStr for EscrowAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(Self::Approve),
            "cancel" => Ok(Self::Cancel),
            other => Err(format!("unknown escrow action: {other}")),
        }
    }
}
