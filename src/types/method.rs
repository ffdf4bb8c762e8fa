//! Contract method signatures and selectors.

use crate::error::EscrowError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha512_256};
use std::{fmt, str::FromStr};

/// Argument types that refer to a preceding transaction in the group instead of an
/// application argument.
const TRANSACTION_ARG_TYPES: &[&str] = &["txn", "pay", "keyreg", "acfg", "axfer", "afrz", "appl"];

/// A contract method, parsed from its `name(args)returns` signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    name: String,
    args: Vec<String>,
    returns: String,
}

impl Method {
    /// Returns the method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the argument types.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns the return type.
    pub fn returns(&self) -> &str {
        &self.returns
    }

    /// Returns the canonical signature text.
    pub fn signature(&self) -> String {
        format!("{}({}){}", self.name, self.args.join(","), self.returns)
    }

    /// Returns the 4-byte selector: the SHA-512/256 prefix of the signature.
    pub fn selector(&self) -> [u8; 4] {
        let digest = Sha512_256::digest(self.signature().as_bytes());
        [digest[0], digest[1], digest[2], digest[3]]
    }

    /// Number of arguments satisfied by preceding group transactions.
    pub fn transaction_args(&self) -> usize {
        self.args.iter().filter(|arg| TRANSACTION_ARG_TYPES.contains(&arg.as_str())).count()
    }
}

impl FromStr for Method {
    type Err = EscrowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EscrowError::invalid_input(format!("invalid method signature: {s:?}"));

        let open = s.find('(').ok_or_else(invalid)?;
        let close = matching_paren(s, open).ok_or_else(invalid)?;

        let name = &s[..open];
        let returns = &s[close + 1..];
        if name.is_empty()
            || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            || returns.is_empty()
        {
            return Err(invalid());
        }

        let inner = &s[open + 1..close];
        let args = if inner.is_empty() { Vec::new() } else { split_args(inner).ok_or_else(invalid)? };
        if args.iter().any(String::is_empty) {
            return Err(invalid());
        }

        Ok(Self { name: name.to_string(), args, returns: returns.to_string() })
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())
    }
}

impl Serialize for Method {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Method {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Finds the parenthesis closing the one at `open`.
fn matching_paren(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, c) in s.char_indices().skip_while(|(idx, _)| *idx < open) {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits top-level comma separated arguments, keeping tuple types intact.
fn split_args(s: &str) -> Option<Vec<String>> {
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => {
                args.push(s[start..idx].to_string());
                start = idx + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    args.push(s[start..].to_string());
    Some(args)
}
