//! Serde helpers for 64-bit permission masks.
//!
//! Masks are held as `u64` in memory but written to JSON as decimal
//! strings: several JSON consumers only guarantee 53-bit-safe integers,
//! and a truncated permission mask is a silent security bug.

use serde::{Deserialize, Deserializer, Serializer};

/// Encode a `u64` as a decimal string.
pub fn serialize<S>(mask: &u64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&mask.to_string())
}

/// Decode a decimal string back into a `u64`.
pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse::<u64>()
        .map_err(|e| serde::de::Error::custom(format!("invalid permission mask '{s}': {e}")))
}
