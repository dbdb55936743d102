//! Entity model for tabs, groups, settings and history.
//!
//! # Responsibility
//! - Define the data shapes owned by the store.
//! - Correct malformed input by defaulting rather than rejecting.
//!
//! # Invariants
//! - Model types have no side effects; relational rules live in `engine`.

use serde::{Deserialize, Deserializer};

pub mod action_log;
pub mod group;
pub mod settings;
pub mod snapshot;
pub mod tab;

/// Deserializes `null` as `Some(None)`; combined with `#[serde(default)]`
/// an absent key stays `None`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
