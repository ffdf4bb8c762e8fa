//! Document store records.

use crate::types::{Address, AppId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Off-chain status of an escrow, as tracked by the document store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Escrow is live on-chain.
    #[default]
    Open,
    /// Work was approved and funds released.
    Completed,
    /// Escrow was cancelled and funds refunded.
    Cancelled,
}

impl RecordStatus {
    /// Text form stored in the document.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown escrow record status: {other}")),
        }
    }
}

/// Association of an escrow application with its client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscrowRecord {
    /// The escrow application.
    pub app_id: AppId,
    /// The client that created the escrow.
    pub client_address: Address,
    /// The freelancer, if known when the record was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freelancer_address: Option<Address>,
    /// Off-chain status.
    #[serde(default)]
    pub status: RecordStatus,
    /// Last time the record was written.
    pub updated_at: DateTime<Utc>,
}

impl EscrowRecord {
    /// Creates an open record.
    pub fn new(app_id: AppId, client_address: Address) -> Self {
        Self {
            app_id,
            client_address,
            freelancer_address: None,
            status: RecordStatus::Open,
            updated_at: Utc::now(),
        }
    }

    /// Sets the freelancer address.
    pub fn with_freelancer(mut self, freelancer: Address) -> Self {
        self.freelancer_address = Some(freelancer);
        self
    }
}
