//! Serde helpers.

pub mod base64_vec;
pub mod duration;
