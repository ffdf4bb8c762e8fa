//! Account addresses.

use crate::{constants::APP_ID_PREFIX, error::EscrowError};
use data_encoding::BASE32_NOPAD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha512_256};
use std::{fmt, str::FromStr};

/// Length of the checksum appended to the public key in the textual form.
const CHECKSUM_LEN: usize = 4;

/// Length of the textual address form.
pub const ADDRESS_TEXT_LEN: usize = 58;

/// A 32-byte public-key-derived account address.
///
/// Displayed and parsed in the checksummed base32 text form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 32]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Self = Self([0; 32]);

    /// Creates an address from raw public key bytes.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Creates an address from a byte slice, which must be exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; 32]>::try_from(bytes).ok().map(Self)
    }

    /// Returns the account address controlled by the given application.
    pub fn for_application(app_id: u64) -> Self {
        let mut hasher = Sha512_256::new();
        hasher.update(APP_ID_PREFIX);
        hasher.update(app_id.to_be_bytes());
        Self(hasher.finalize().into())
    }

    /// Returns the raw public key bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    fn checksum(&self) -> [u8; CHECKSUM_LEN] {
        let digest = Sha512_256::digest(self.0);
        let mut checksum = [0; CHECKSUM_LEN];
        checksum.copy_from_slice(&digest[digest.len() - CHECKSUM_LEN..]);
        checksum
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = [0u8; 32 + CHECKSUM_LEN];
        buf[..32].copy_from_slice(&self.0);
        buf[32..].copy_from_slice(&self.checksum());
        f.write_str(&BASE32_NOPAD.encode(&buf))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Address").field(&self.to_string()).finish()
    }
}

impl FromStr for Address {
    type Err = EscrowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ADDRESS_TEXT_LEN {
            return Err(EscrowError::invalid_input(format!(
                "address must be {ADDRESS_TEXT_LEN} characters, got {}",
                s.len()
            )));
        }

        let decoded = BASE32_NOPAD
            .decode(s.as_bytes())
            .map_err(|err| EscrowError::invalid_input(format!("malformed address: {err}")))?;
        let (pk, checksum) = decoded.split_at(32);

        let address = Self::from_slice(pk)
            .ok_or_else(|| EscrowError::invalid_input("malformed address length"))?;
        if address.checksum() != checksum {
            return Err(EscrowError::invalid_input(format!("address checksum mismatch: {s}")));
        }

        Ok(address)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
