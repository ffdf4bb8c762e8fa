use crate::{error::EscrowError, types::Address};
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};

/// Identifier of a deployed escrow application.
///
/// Always positive. Deserializes from either a JSON number or a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AppId(u64);

impl AppId {
    /// Creates a new [`AppId`], rejecting zero.
    pub fn new(id: u64) -> Result<Self, EscrowError> {
        if id == 0 {
            return Err(EscrowError::invalid_input("application id must be positive"));
        }
        Ok(Self(id))
    }

    /// Returns the raw identifier.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the account address controlled by this application.
    pub fn address(self) -> Address {
        Address::for_application(self.0)
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for AppId {
    type Err = EscrowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s
            .trim()
            .parse::<u64>()
            .map_err(|_| EscrowError::invalid_input(format!("invalid application id: {s:?}")))?;
        Self::new(id)
    }
}

impl TryFrom<u64> for AppId {
    type Error = EscrowError;

    fn try_from(id: u64) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl<'de> Deserialize<'de> for AppId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(id) => Self::new(id),
            Raw::Text(s) => s.parse(),
        }
        .map_err(serde::de::Error::custom)
    }
}
