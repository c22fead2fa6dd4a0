use serde::{Deserialize, Deserializer};

pub mod slug;
pub mod space_service;
pub mod taxonomy_service;
pub mod user_service;

/// Deserializer for nullable fields in partial updates, used with
/// `#[serde(default, deserialize_with = "double_option")]`:
/// an absent key stays `None`, an explicit `null` becomes `Some(None)`,
/// and a value becomes `Some(Some(v))`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
