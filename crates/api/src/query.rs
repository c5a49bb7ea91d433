//! Shared request parameter types for API handlers.

use serde::{Deserialize, Deserializer};

/// Generic pagination parameters (`?limit=&offset=`).
///
/// Values are clamped with `bazaar_db::clamp_limit` / `clamp_offset`.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Deserialize a present field into `Some`, so that `Option<Option<T>>`
/// distinguishes an absent key (`None`) from an explicit `null`
/// (`Some(None)`). Use with `#[serde(default, deserialize_with = ...)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
