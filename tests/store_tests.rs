//! Integration tests for catalog store invariants.
//!
//! These exercise the referential rules that make the catalog trustworthy:
//! slug uniqueness, the atomic rename cascade, and the deliberate
//! dangling-reference behavior on subcategory deletion.

use std::sync::Arc;

use stockroom::defaults::{CatalogDefaults, GENERIC_ICON};
use stockroom::models::NewItem;
use stockroom::store::{CatalogError, CatalogStore};

fn new_store() -> CatalogStore {
    CatalogStore::open_in_memory(Arc::new(CatalogDefaults::builtin()))
        .expect("Failed to open in-memory store")
}

async fn seeded_store() -> CatalogStore {
    let store = new_store();
    store.seed().await.expect("Failed to seed store");
    store
}

fn new_item(name: &str, category_id: i64, subcategory: Option<&str>) -> NewItem {
    NewItem {
        name: name.to_string(),
        quantity: 1,
        target_quantity: 5,
        subcategory: subcategory.map(ToString::to_string),
        expiry_date: None,
        category_id,
    }
}

async fn category_id(store: &CatalogStore, slug: &str) -> i64 {
    store
        .find_category_by_slug(slug)
        .await
        .unwrap()
        .expect("category missing")
        .id
}

// ============================================================================
// Seeding
// ============================================================================

#[tokio::test]
async fn test_seed_creates_fixed_structure() {
    let store = seeded_store().await;

    let categories = store.list_categories().await.unwrap();
    let slugs: Vec<&str> = categories.iter().map(|c| c.slug.as_str()).collect();
    assert_eq!(slugs, vec!["food", "drinks", "misc"]);

    let subcategories = store.list_subcategories().await.unwrap();
    assert_eq!(subcategories.len(), 11);

    let canned_meat = store.subcategory_by_slug("canned_meat").await.unwrap().unwrap();
    assert_eq!(canned_meat.icon, "can_meat.png");
    assert_eq!(canned_meat.name, "Мясная консервация");
}

#[tokio::test]
async fn test_seed_is_idempotent() {
    let store = seeded_store().await;
    store.seed().await.unwrap();

    assert_eq!(store.list_categories().await.unwrap().len(), 3);
    assert_eq!(store.list_subcategories().await.unwrap().len(), 11);
}

// ============================================================================
// Categories
// ============================================================================

#[tokio::test]
async fn test_create_category_conflict() {
    let store = seeded_store().await;

    let err = store.create_category("Другое", "misc").await.unwrap_err();
    assert!(matches!(err, CatalogError::DuplicateSlug { slug } if slug == "misc"));
}

// ============================================================================
// Subcategories
// ============================================================================

#[tokio::test]
async fn test_create_subcategory_derives_slug() {
    let store = seeded_store().await;
    let food = category_id(&store, "food").await;

    let sub = store
        .create_subcategory("Сухофрукты", food, None)
        .await
        .unwrap();

    assert_eq!(sub.slug, "suhofrukty");
    assert_eq!(sub.icon, GENERIC_ICON);
    assert_eq!(sub.category_id, food);
}

#[tokio::test]
async fn test_duplicate_slug_rejected_leaving_one_row() {
    let store = seeded_store().await;
    let food = category_id(&store, "food").await;

    // Two display names that normalize to the same slug.
    store.create_subcategory("Dried Fruit", food, None).await.unwrap();
    let err = store
        .create_subcategory("dried  FRUIT!", food, None)
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::DuplicateSlug { slug } if slug == "dried_fruit"));

    let count = store
        .list_subcategories()
        .await
        .unwrap()
        .iter()
        .filter(|s| s.slug == "dried_fruit")
        .count();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_unusable_name_rejected() {
    let store = seeded_store().await;
    let food = category_id(&store, "food").await;

    let err = store.create_subcategory("!!!", food, None).await.unwrap_err();
    assert!(matches!(err, CatalogError::EmptySlug { .. }));
}

#[tokio::test]
async fn test_rename_cascades_slug_to_items() {
    let store = seeded_store().await;
    let food = category_id(&store, "food").await;

    let sub = store.create_subcategory("Trail Mix", food, None).await.unwrap();
    let a = store
        .create_item(new_item("peanuts", food, Some("trail_mix")))
        .await
        .unwrap();
    let b = store
        .create_item(new_item("raisins", food, Some("trail_mix")))
        .await
        .unwrap();
    // An item in a different subcategory must not be touched.
    let other = store
        .create_item(new_item("beans", food, Some("canned_veg")))
        .await
        .unwrap();

    let renamed = store
        .rename_subcategory(sub.id, "Hiking Rations", None)
        .await
        .unwrap();
    assert_eq!(renamed.slug, "hiking_rations");

    let items = store.list_items(0, 100).await.unwrap();
    let by_id = |id: i64| items.iter().find(|i| i.id == id).unwrap();

    assert_eq!(by_id(a.id).subcategory.as_deref(), Some("hiking_rations"));
    assert_eq!(by_id(b.id).subcategory.as_deref(), Some("hiking_rations"));
    assert_eq!(by_id(other.id).subcategory.as_deref(), Some("canned_veg"));
    assert!(items
        .iter()
        .all(|i| i.subcategory.as_deref() != Some("trail_mix")));
}

#[tokio::test]
async fn test_rename_with_icon_change_updates_item_icons() {
    let store = seeded_store().await;
    let food = category_id(&store, "food").await;

    let sub = store
        .create_subcategory("Trail Mix", food, Some("mix_v1.png".to_string()))
        .await
        .unwrap();
    let item = store
        .create_item(new_item("peanuts", food, Some("trail_mix")))
        .await
        .unwrap();
    assert_eq!(item.icon, "mix_v1.png");

    store
        .rename_subcategory(sub.id, "Trail Mix", Some("mix_v2.png".to_string()))
        .await
        .unwrap();

    let reloaded = store.get_item(item.id).await.unwrap();
    assert_eq!(reloaded.icon, "mix_v2.png");
    assert_eq!(reloaded.subcategory.as_deref(), Some("trail_mix"));
}

#[tokio::test]
async fn test_rename_without_icon_change_keeps_item_icons() {
    let store = seeded_store().await;
    let food = category_id(&store, "food").await;

    let sub = store
        .create_subcategory("Trail Mix", food, Some("mix_v1.png".to_string()))
        .await
        .unwrap();
    let item = store
        .create_item(new_item("peanuts", food, Some("trail_mix")))
        .await
        .unwrap();

    store
        .rename_subcategory(sub.id, "Hiking Rations", None)
        .await
        .unwrap();

    let reloaded = store.get_item(item.id).await.unwrap();
    assert_eq!(reloaded.icon, "mix_v1.png");
    assert_eq!(reloaded.subcategory.as_deref(), Some("hiking_rations"));
}

#[tokio::test]
async fn test_rename_to_taken_slug_changes_nothing() {
    let store = seeded_store().await;
    let food = category_id(&store, "food").await;

    let sub = store.create_subcategory("Trail Mix", food, None).await.unwrap();
    let item = store
        .create_item(new_item("peanuts", food, Some("trail_mix")))
        .await
        .unwrap();

    // "Snack" normalizes to the seeded "snack" slug.
    let err = store
        .rename_subcategory(sub.id, "Snack", None)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::DuplicateSlug { slug } if slug == "snack"));

    // The whole transaction aborted: neither the subcategory nor the item
    // moved.
    let unchanged = store.subcategory_by_slug("trail_mix").await.unwrap();
    assert!(unchanged.is_some());
    let reloaded = store.get_item(item.id).await.unwrap();
    assert_eq!(reloaded.subcategory.as_deref(), Some("trail_mix"));
}

#[tokio::test]
async fn test_rename_unknown_subcategory() {
    let store = seeded_store().await;

    let err = store.rename_subcategory(9999, "Ghost", None).await.unwrap_err();
    assert!(matches!(
        err,
        CatalogError::NotFound {
            entity: "subcategory",
            id: 9999
        }
    ));
}

#[tokio::test]
async fn test_delete_leaves_items_dangling() {
    let store = seeded_store().await;
    let food = category_id(&store, "food").await;

    let sub = store.create_subcategory("Trail Mix", food, None).await.unwrap();
    let item = store
        .create_item(new_item("peanuts", food, Some("trail_mix")))
        .await
        .unwrap();

    store.delete_subcategory(sub.id).await.unwrap();

    // The subcategory is gone, the item keeps its (now dangling) slug and
    // is still retrievable. No error, no cascade delete.
    assert!(store.subcategory_by_slug("trail_mix").await.unwrap().is_none());
    let orphaned = store.get_item(item.id).await.unwrap();
    assert_eq!(orphaned.subcategory.as_deref(), Some("trail_mix"));
}

#[tokio::test]
async fn test_delete_unknown_subcategory() {
    let store = seeded_store().await;

    let err = store.delete_subcategory(9999).await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { .. }));
}

// ============================================================================
// Items
// ============================================================================

#[tokio::test]
async fn test_item_icon_prefers_stored_subcategory_icon() {
    let store = seeded_store().await;
    let drinks = category_id(&store, "drinks").await;

    // Recreate the "soda" slug with a custom icon: the stored icon must win
    // even though "soda" is also present in the static default table.
    let seeded = store.subcategory_by_slug("soda").await.unwrap().unwrap();
    store.delete_subcategory(seeded.id).await.unwrap();
    store
        .create_subcategory("Soda", drinks, Some("custom_soda.png".to_string()))
        .await
        .unwrap();

    let item = store
        .create_item(new_item("cola", drinks, Some("soda")))
        .await
        .unwrap();
    assert_eq!(item.icon, "custom_soda.png");
}

#[tokio::test]
async fn test_item_icon_falls_back_to_static_table() {
    let store = seeded_store().await;
    let drinks = category_id(&store, "drinks").await;

    // Remove the subcategory record entirely; the slug still resolves
    // through the static default table.
    let seeded = store.subcategory_by_slug("soda").await.unwrap().unwrap();
    store.delete_subcategory(seeded.id).await.unwrap();

    let item = store
        .create_item(new_item("cola", drinks, Some("soda")))
        .await
        .unwrap();
    assert_eq!(item.icon, "bottle_2l.png");
}

#[tokio::test]
async fn test_item_icon_generic_for_unknown_slug_or_none() {
    let store = seeded_store().await;
    let misc = category_id(&store, "misc").await;

    let unknown = store
        .create_item(new_item("widget", misc, Some("no_such_slug")))
        .await
        .unwrap();
    assert_eq!(unknown.icon, GENERIC_ICON);

    let none = store.create_item(new_item("gadget", misc, None)).await.unwrap();
    assert_eq!(none.icon, GENERIC_ICON);
}

#[tokio::test]
async fn test_update_item_quantity() {
    let store = seeded_store().await;
    let misc = category_id(&store, "misc").await;

    let item = store.create_item(new_item("widget", misc, None)).await.unwrap();
    let updated = store.update_item_quantity(item.id, 42).await.unwrap();
    assert_eq!(updated.quantity, 42);

    let err = store.update_item_quantity(9999, 1).await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { entity: "item", .. }));
}

#[tokio::test]
async fn test_delete_item() {
    let store = seeded_store().await;
    let misc = category_id(&store, "misc").await;

    let item = store.create_item(new_item("widget", misc, None)).await.unwrap();
    store.delete_item(item.id).await.unwrap();

    let err = store.get_item(item.id).await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { entity: "item", .. }));

    let err = store.delete_item(item.id).await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { entity: "item", .. }));
}

#[tokio::test]
async fn test_list_items_paging() {
    let store = seeded_store().await;
    let misc = category_id(&store, "misc").await;

    for i in 0..5 {
        store
            .create_item(new_item(&format!("widget-{i}"), misc, None))
            .await
            .unwrap();
    }

    let page = store.list_items(2, 2).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].name, "widget-2");
    assert_eq!(page[1].name, "widget-3");

    let tail = store.list_items(4, 100).await.unwrap();
    assert_eq!(tail.len(), 1);
}
