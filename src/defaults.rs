//! Built-in catalog structure and icon defaults.
//!
//! These tables seed a fresh database and back the second tier of icon
//! resolution. They are constructed once at startup and injected into the
//! components that need them, so the core stays testable in isolation.

/// Icon reference used whenever nothing more specific applies.
pub const GENERIC_ICON: &str = "pack_generic.png";

/// Slug of the category that absorbs items the intake channel cannot place.
pub const FALLBACK_CATEGORY_SLUG: &str = "misc";

/// A seeded category and its default subcategories.
#[derive(Debug, Clone)]
pub struct CategoryDefault {
    /// Stable category slug (e.g. "food").
    pub slug: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Default subcategories as (slug, display name) pairs.
    pub subcategories: &'static [(&'static str, &'static str)],
}

/// Immutable default tables for seeding and icon fallback.
#[derive(Debug, Clone)]
pub struct CatalogDefaults {
    categories: Vec<CategoryDefault>,
    icons: Vec<(&'static str, &'static str)>,
}

impl CatalogDefaults {
    /// Builds the built-in defaults.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            categories: vec![
                CategoryDefault {
                    slug: "food",
                    name: "Еда",
                    subcategories: &[
                        ("canned_meat", "Мясная консервация"),
                        ("canned_fish", "Рыбная консервация"),
                        ("canned_veg", "Овощная консервация"),
                        ("instant", "Быстрое приготовление"),
                        ("snack", "Снеки"),
                        ("cereal", "Крупы"),
                    ],
                },
                CategoryDefault {
                    slug: "drinks",
                    name: "Напитки",
                    subcategories: &[
                        ("water", "Вода"),
                        ("soda", "Газировка"),
                        ("energy", "Энергетики"),
                        ("alcohol", "Алкоголь"),
                    ],
                },
                CategoryDefault {
                    slug: "misc",
                    name: "Разное",
                    subcategories: &[("general", "Прочее")],
                },
            ],
            icons: vec![
                ("canned_meat", "can_meat.png"),
                ("canned_fish", "can_fish.png"),
                ("canned_veg", "jar.png"),
                ("instant", "bowl.png"),
                ("snack", "box.png"),
                ("cereal", "box.png"),
                ("water", "bottle_5l.png"),
                ("soda", "bottle_2l.png"),
                ("energy", "can_drink.png"),
                ("alcohol", "bottle_glass.png"),
                ("general", GENERIC_ICON),
            ],
        }
    }

    /// Returns the seeded category structure in insertion order.
    #[must_use]
    pub fn categories(&self) -> &[CategoryDefault] {
        &self.categories
    }

    /// Looks up the default icon for a subcategory slug.
    #[must_use]
    pub fn icon_for(&self, slug: &str) -> Option<&'static str> {
        self.icons
            .iter()
            .find(|(s, _)| *s == slug)
            .map(|(_, icon)| *icon)
    }
}

impl Default for CatalogDefaults {
    fn default() -> Self {
        Self::builtin()
    }
}
