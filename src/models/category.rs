//! Top-level catalog category.

use serde::{Deserialize, Serialize};

/// A top-level grouping of stock (e.g. food, drinks).
///
/// Categories are created at seed time and rarely change afterwards; nothing
/// in the catalog deletes them automatically. Both `name` and `slug` are
/// unique across the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Database identifier.
    pub id: i64,
    /// Human-readable display name (unique).
    pub name: String,
    /// Stable URL-safe identifier (unique).
    pub slug: String,
}
