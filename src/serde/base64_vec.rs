//! Helpers for (de)serializing a list of byte strings as base64 strings.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Deserializer, Serializer, ser::SerializeSeq};

/// Serialize a list of byte strings as base64 strings.
pub fn serialize<S>(items: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut seq = serializer.serialize_seq(Some(items.len()))?;
    for item in items {
        seq.serialize_element(&STANDARD.encode(item))?;
    }
    seq.end()
}

/// Deserialize a list of byte strings from base64 strings.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Vec<u8>>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<String>::deserialize(deserializer)?
        .iter()
        .map(|s| STANDARD.decode(s.trim()).map_err(serde::de::Error::custom))
        .collect()
}
