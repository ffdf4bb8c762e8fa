//! Decoded escrow state.

use crate::{
    constants::MICRO_UNITS_PER_UNIT,
    types::{Address, AppId},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of an escrow contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EscrowStatus {
    /// Created, not yet funded.
    Initialized,
    /// Funds are held by the contract.
    Funded,
    /// Funds were released to the freelancer.
    Completed,
    /// Funds were refunded to the client.
    Cancelled,
    /// Status missing or not recognized. Never actionable.
    Unknown,
}

impl EscrowStatus {
    /// Maps a raw status code to a status.
    pub const fn from_code(code: u64) -> Self {
        match code {
            0 => Self::Initialized,
            1 => Self::Funded,
            2 => Self::Completed,
            3 => Self::Cancelled,
            _ => Self::Unknown,
        }
    }

    /// Returns the raw status code, if the status is recognized.
    pub const fn code(self) -> Option<u64> {
        match self {
            Self::Initialized => Some(0),
            Self::Funded => Some(1),
            Self::Completed => Some(2),
            Self::Cancelled => Some(3),
            Self::Unknown => None,
        }
    }

    /// Human readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Initialized => "Initialized",
            Self::Funded => "Funded",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::Unknown => "Unknown",
        }
    }

    /// Whether no further transition is possible.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Typed view of one escrow application's global state.
///
/// Produced fresh on every fetch and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscrowSnapshot {
    /// The application the state was read from.
    pub application_id: AppId,
    /// Client address, unset until the contract records it.
    pub client_address: Option<Address>,
    /// Freelancer address, unset until the contract records it.
    pub freelancer_address: Option<Address>,
    /// Reserved funds in micro-units.
    pub escrow_amount_micro_units: u64,
    /// Raw status code as stored by the contract.
    pub status_code: Option<u64>,
    /// Asset id, `0` for the native currency.
    pub asset_id: u64,
    /// Auxiliary pricing metadata.
    pub unitary_price: u64,
}

impl EscrowSnapshot {
    /// Creates an empty snapshot for the given application.
    pub fn new(application_id: AppId) -> Self {
        Self {
            application_id,
            client_address: None,
            freelancer_address: None,
            escrow_amount_micro_units: 0,
            status_code: None,
            asset_id: 0,
            unitary_price: 0,
        }
    }

    /// Returns the decoded status.
    pub fn status(&self) -> EscrowStatus {
        self.status_code.map(EscrowStatus::from_code).unwrap_or(EscrowStatus::Unknown)
    }

    /// Whether the escrow pays out in the native currency.
    pub fn is_native_asset(&self) -> bool {
        self.asset_id == 0
    }

    /// Whether `address` is the recorded client.
    pub fn is_client(&self, address: &Address) -> bool {
        self.client_address.as_ref() == Some(address)
    }
}

/// Formats a micro-unit amount as whole units with six decimals.
pub fn format_micro_units(amount: u64) -> String {
    format!("{}.{:06}", amount / MICRO_UNITS_PER_UNIT, amount % MICRO_UNITS_PER_UNIT)
}
