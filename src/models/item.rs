//! Stock item records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A tracked stock item.
///
/// `subcategory` is a weak reference: it holds a subcategory *slug*, not a
/// foreign key, and may point at a subcategory that no longer exists. That
/// is tolerated by design — repairing orphans is a manual follow-up, and the
/// catalog never picks a replacement on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Database identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Current stock count.
    pub quantity: i64,
    /// Desired stock count.
    pub target_quantity: i64,
    /// Icon reference, assigned once at creation.
    pub icon: String,
    /// Optional expiry date.
    pub expiry_date: Option<NaiveDate>,
    /// Weak subcategory reference by slug; dangling values are allowed.
    pub subcategory: Option<String>,
    /// Owning category (required).
    pub category_id: i64,
}

impl Item {
    /// How many units short of the target this item is (0 when at or above).
    #[must_use]
    pub fn shortage(&self) -> i64 {
        (self.target_quantity - self.quantity).max(0)
    }
}

/// Input record for item creation.
///
/// No icon field: the store assigns the icon through the resolution chain
/// (stored subcategory icon, then the static default table, then the
/// generic fallback). Quantities are stored as given — range checks are the
/// caller's responsibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    /// Display name.
    pub name: String,
    /// Initial stock count.
    pub quantity: i64,
    /// Desired stock count.
    pub target_quantity: i64,
    /// Optional subcategory slug (weak reference).
    pub subcategory: Option<String>,
    /// Optional expiry date.
    pub expiry_date: Option<NaiveDate>,
    /// Owning category.
    pub category_id: i64,
}
