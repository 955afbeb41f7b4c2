//! SQLite-backed catalog store.
//!
//! Single source of truth for categories, subcategories, and items. The
//! store owns the referential rules of the catalog: slug uniqueness,
//! rejection of names that reduce to an empty slug, and the rename cascade
//! that rewrites every item referencing a renamed subcategory inside one
//! transaction.
//!
//! Each operation acquires the connection as a scoped handle (a mutex guard)
//! and releases it on return, success or failure. No locking beyond that is
//! layered on top of SQLite's own transaction isolation.

use std::path::Path;
use std::sync::Arc;

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::defaults::{CatalogDefaults, GENERIC_ICON};
use crate::icons;
use crate::models::{Category, Item, NewItem, SubCategory};
use crate::slug::make_slug;

/// Typed failures of catalog operations.
///
/// Entity-integrity failures (`NotFound`, `DuplicateSlug`, `EmptySlug`)
/// carry enough detail for the caller to act on; everything else surfaces
/// as `Storage`.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The referenced record does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Which table the lookup missed.
        entity: &'static str,
        /// The id that was requested.
        id: i64,
    },
    /// The derived or supplied slug is already taken.
    #[error("slug '{slug}' is already taken")]
    DuplicateSlug {
        /// The colliding slug.
        slug: String,
    },
    /// The display name reduces to an empty slug.
    #[error("name '{name}' does not reduce to a usable slug")]
    EmptySlug {
        /// The offending display name.
        name: String,
    },
    /// Underlying SQLite failure.
    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
}

/// Result alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// SQLite-backed store for the whole catalog.
pub struct CatalogStore {
    conn: Mutex<Connection>,
    defaults: Arc<CatalogDefaults>,
}

impl CatalogStore {
    /// Opens (or creates) a database at the given path.
    pub fn open(path: &Path, defaults: Arc<CatalogDefaults>) -> CatalogResult<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn, defaults)
    }

    /// Opens an in-memory database (used by tests).
    pub fn open_in_memory(defaults: Arc<CatalogDefaults>) -> CatalogResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, defaults)
    }

    fn with_connection(conn: Connection, defaults: Arc<CatalogDefaults>) -> CatalogResult<Self> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS categories (
                id   INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                slug TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS subcategories (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL,
                slug        TEXT NOT NULL UNIQUE,
                icon        TEXT NOT NULL DEFAULT 'pack_generic.png',
                category_id INTEGER NOT NULL REFERENCES categories(id)
            );

            CREATE TABLE IF NOT EXISTS items (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL,
                quantity        INTEGER NOT NULL DEFAULT 0,
                target_quantity INTEGER NOT NULL DEFAULT 0,
                icon            TEXT NOT NULL DEFAULT 'pack_generic.png',
                expiry_date     TEXT,
                subcategory     TEXT,
                category_id     INTEGER NOT NULL REFERENCES categories(id)
            );

            CREATE INDEX IF NOT EXISTS idx_items_subcategory ON items(subcategory);
            CREATE INDEX IF NOT EXISTS idx_items_category ON items(category_id);
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
            defaults,
        })
    }

    /// Seeds the fixed category structure into an empty database.
    ///
    /// Idempotent: categories are only inserted when the table is empty, and
    /// likewise for subcategories, so a restart never duplicates rows.
    pub async fn seed(&self) -> CatalogResult<()> {
        let conn = self.conn.lock().await;

        let category_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        if category_count == 0 {
            for cat in self.defaults.categories() {
                conn.execute(
                    "INSERT INTO categories (name, slug) VALUES (?1, ?2)",
                    params![cat.name, cat.slug],
                )?;
            }
            tracing::info!("seeded {} categories", self.defaults.categories().len());
        }

        let subcategory_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM subcategories", [], |row| row.get(0))?;
        if subcategory_count == 0 {
            for cat in self.defaults.categories() {
                let category_id: Option<i64> = conn
                    .query_row(
                        "SELECT id FROM categories WHERE slug = ?1",
                        params![cat.slug],
                        |row| row.get(0),
                    )
                    .optional()?;
                let Some(category_id) = category_id else {
                    continue;
                };

                for (sub_slug, sub_name) in cat.subcategories {
                    let icon = self.defaults.icon_for(sub_slug).unwrap_or(GENERIC_ICON);
                    conn.execute(
                        "INSERT INTO subcategories (name, slug, icon, category_id)
                         VALUES (?1, ?2, ?3, ?4)",
                        params![sub_name, sub_slug, icon, category_id],
                    )?;
                }
            }
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------

    /// Inserts a category. Name/slug collisions surface as `DuplicateSlug`.
    pub async fn create_category(&self, name: &str, slug: &str) -> CatalogResult<Category> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO categories (name, slug) VALUES (?1, ?2)",
            params![name, slug],
        )
        .map_err(|err| map_constraint(err, slug))?;

        Ok(Category {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            slug: slug.to_string(),
        })
    }

    /// Lists all categories in insertion order.
    pub async fn list_categories(&self) -> CatalogResult<Vec<Category>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT id, name, slug FROM categories ORDER BY id")?;
        let rows = stmt.query_map([], category_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Looks up a category by slug.
    pub async fn find_category_by_slug(&self, slug: &str) -> CatalogResult<Option<Category>> {
        let conn = self.conn.lock().await;
        let category = conn
            .query_row(
                "SELECT id, name, slug FROM categories WHERE slug = ?1",
                params![slug],
                category_from_row,
            )
            .optional()?;
        Ok(category)
    }

    // ------------------------------------------------------------------
    // Subcategories
    // ------------------------------------------------------------------

    /// Creates a subcategory from a display name.
    ///
    /// The slug is derived here (callers never supply one). Fails with
    /// `EmptySlug` when the name has no slug-able characters and
    /// `DuplicateSlug` when the derived slug is already taken anywhere in
    /// the catalog. `icon` is an already-stored reference; `None` gets the
    /// generic icon.
    pub async fn create_subcategory(
        &self,
        name: &str,
        category_id: i64,
        icon: Option<String>,
    ) -> CatalogResult<SubCategory> {
        let slug = make_slug(name);
        if slug.is_empty() {
            return Err(CatalogError::EmptySlug {
                name: name.to_string(),
            });
        }

        let conn = self.conn.lock().await;

        let taken: Option<i64> = conn
            .query_row(
                "SELECT id FROM subcategories WHERE slug = ?1",
                params![slug],
                |row| row.get(0),
            )
            .optional()?;
        if taken.is_some() {
            return Err(CatalogError::DuplicateSlug { slug });
        }

        let icon = icon.unwrap_or_else(|| GENERIC_ICON.to_string());
        conn.execute(
            "INSERT INTO subcategories (name, slug, icon, category_id) VALUES (?1, ?2, ?3, ?4)",
            params![name, slug, icon, category_id],
        )?;

        Ok(SubCategory {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            slug,
            icon,
            category_id,
        })
    }

    /// Lists all subcategories in insertion order.
    pub async fn list_subcategories(&self) -> CatalogResult<Vec<SubCategory>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, name, slug, icon, category_id FROM subcategories ORDER BY id",
        )?;
        let rows = stmt.query_map([], subcategory_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Looks up a subcategory by slug.
    ///
    /// This is the weak-reference lookup used for item icons: "no match" is
    /// a normal outcome, not an error, because item subcategory slugs may
    /// dangle.
    pub async fn subcategory_by_slug(&self, slug: &str) -> CatalogResult<Option<SubCategory>> {
        let conn = self.conn.lock().await;
        let sub = conn
            .query_row(
                "SELECT id, name, slug, icon, category_id FROM subcategories WHERE slug = ?1",
                params![slug],
                subcategory_from_row,
            )
            .optional()?;
        Ok(sub)
    }

    /// Renames a subcategory and cascades the change to referencing items.
    ///
    /// Runs as one transaction: the subcategory row update and the rewrite
    /// of every item whose `subcategory` equals the old slug commit
    /// together or not at all. When `icon` is provided the referencing
    /// items' icons are rewritten too.
    pub async fn rename_subcategory(
        &self,
        id: i64,
        new_name: &str,
        icon: Option<String>,
    ) -> CatalogResult<SubCategory> {
        let new_slug = make_slug(new_name);
        if new_slug.is_empty() {
            return Err(CatalogError::EmptySlug {
                name: new_name.to_string(),
            });
        }

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let existing = tx
            .query_row(
                "SELECT id, name, slug, icon, category_id FROM subcategories WHERE id = ?1",
                params![id],
                subcategory_from_row,
            )
            .optional()?;
        let Some(old) = existing else {
            return Err(CatalogError::NotFound {
                entity: "subcategory",
                id,
            });
        };

        // Slug uniqueness must hold after every rename.
        let clash: Option<i64> = tx
            .query_row(
                "SELECT id FROM subcategories WHERE slug = ?1 AND id <> ?2",
                params![new_slug, id],
                |row| row.get(0),
            )
            .optional()?;
        if clash.is_some() {
            return Err(CatalogError::DuplicateSlug { slug: new_slug });
        }

        let new_icon = icon.unwrap_or_else(|| old.icon.clone());
        let icon_changed = new_icon != old.icon;

        tx.execute(
            "UPDATE subcategories SET name = ?1, slug = ?2, icon = ?3 WHERE id = ?4",
            params![new_name, new_slug, new_icon, id],
        )?;
        tx.execute(
            "UPDATE items SET subcategory = ?1 WHERE subcategory = ?2",
            params![new_slug, old.slug],
        )?;
        if icon_changed {
            tx.execute(
                "UPDATE items SET icon = ?1 WHERE subcategory = ?2",
                params![new_icon, new_slug],
            )?;
        }

        tx.commit()?;

        Ok(SubCategory {
            id,
            name: new_name.to_string(),
            slug: new_slug,
            icon: new_icon,
            category_id: old.category_id,
        })
    }

    /// Deletes a subcategory row.
    ///
    /// Items referencing its slug are left untouched: their reference
    /// dangles until an operator reassigns them. The catalog has no
    /// authority to pick a replacement.
    pub async fn delete_subcategory(&self, id: i64) -> CatalogResult<()> {
        let conn = self.conn.lock().await;
        let affected = conn.execute("DELETE FROM subcategories WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(CatalogError::NotFound {
                entity: "subcategory",
                id,
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------

    /// Creates an item, resolving its icon through the precedence chain.
    ///
    /// When a subcategory slug is supplied the icon comes from the stored
    /// subcategory record, then the static default table, then the generic
    /// fallback; without a slug the generic icon is used. Quantities are
    /// stored as given.
    pub async fn create_item(&self, new: NewItem) -> CatalogResult<Item> {
        let conn = self.conn.lock().await;

        let icon = match new.subcategory.as_deref() {
            Some(slug) => {
                let stored: Option<String> = conn
                    .query_row(
                        "SELECT icon FROM subcategories WHERE slug = ?1",
                        params![slug],
                        |row| row.get(0),
                    )
                    .optional()?;
                icons::resolve_icon(stored.as_deref(), &self.defaults, slug)
            }
            None => GENERIC_ICON.to_string(),
        };

        conn.execute(
            "INSERT INTO items (name, quantity, target_quantity, icon, expiry_date, subcategory, category_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                new.name,
                new.quantity,
                new.target_quantity,
                icon,
                new.expiry_date,
                new.subcategory,
                new.category_id,
            ],
        )?;

        Ok(Item {
            id: conn.last_insert_rowid(),
            name: new.name,
            quantity: new.quantity,
            target_quantity: new.target_quantity,
            icon,
            expiry_date: new.expiry_date,
            subcategory: new.subcategory,
            category_id: new.category_id,
        })
    }

    /// Lists items with paging.
    pub async fn list_items(&self, skip: usize, limit: usize) -> CatalogResult<Vec<Item>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, name, quantity, target_quantity, icon, expiry_date, subcategory, category_id
             FROM items ORDER BY id LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt.query_map(params![limit as i64, skip as i64], item_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Fetches a single item.
    pub async fn get_item(&self, id: i64) -> CatalogResult<Item> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT id, name, quantity, target_quantity, icon, expiry_date, subcategory, category_id
             FROM items WHERE id = ?1",
            params![id],
            item_from_row,
        )
        .optional()?
        .ok_or(CatalogError::NotFound { entity: "item", id })
    }

    /// Sets an item's current stock count.
    pub async fn update_item_quantity(&self, id: i64, quantity: i64) -> CatalogResult<Item> {
        let conn = self.conn.lock().await;
        let affected = conn.execute(
            "UPDATE items SET quantity = ?1 WHERE id = ?2",
            params![quantity, id],
        )?;
        if affected == 0 {
            return Err(CatalogError::NotFound { entity: "item", id });
        }
        conn.query_row(
            "SELECT id, name, quantity, target_quantity, icon, expiry_date, subcategory, category_id
             FROM items WHERE id = ?1",
            params![id],
            item_from_row,
        )
        .map_err(CatalogError::from)
    }

    /// Deletes an item.
    pub async fn delete_item(&self, id: i64) -> CatalogResult<()> {
        let conn = self.conn.lock().await;
        let affected = conn.execute("DELETE FROM items WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(CatalogError::NotFound { entity: "item", id });
        }
        Ok(())
    }
}

/// Maps a SQLite uniqueness violation to `DuplicateSlug`.
fn map_constraint(err: rusqlite::Error, slug: &str) -> CatalogError {
    if let rusqlite::Error::SqliteFailure(e, _) = &err {
        if e.code == rusqlite::ErrorCode::ConstraintViolation {
            return CatalogError::DuplicateSlug {
                slug: slug.to_string(),
            };
        }
    }
    CatalogError::Storage(err)
}

fn category_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
    })
}

fn subcategory_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SubCategory> {
    Ok(SubCategory {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        icon: row.get(3)?,
        category_id: row.get(4)?,
    })
}

fn item_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        name: row.get(1)?,
        quantity: row.get(2)?,
        target_quantity: row.get(3)?,
        icon: row.get(4)?,
        expiry_date: row.get(5)?,
        subcategory: row.get(6)?,
        category_id: row.get(7)?,
    })
}
