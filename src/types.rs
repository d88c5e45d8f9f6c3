/// Shared serde helpers for request payloads

use serde::{Deserialize, Deserializer};

/// Distinguishes an absent field from an explicit `null` in partial updates.
///
/// Use with `#[serde(default, deserialize_with = "crate::types::double_option")]` on an
/// `Option<Option<T>>`: absent -> `None` (leave untouched), `null` -> `Some(None)` (clear),
/// value -> `Some(Some(v))` (set).
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
