//! Subcategory records.

use serde::{Deserialize, Serialize};

/// A named subdivision of a [`Category`](super::Category).
///
/// The `slug` is derived from `name` at creation and recomputed on every
/// rename; it is unique across the whole catalog. Items refer to
/// subcategories by slug only — deleting a subcategory leaves those
/// references dangling on purpose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCategory {
    /// Database identifier.
    pub id: i64,
    /// Human-readable display name.
    pub name: String,
    /// Derived URL-safe identifier (unique across the catalog).
    pub slug: String,
    /// Stored icon reference; never empty once persisted.
    pub icon: String,
    /// Owning category.
    pub category_id: i64,
}
