//! Web API module for Stockroom.
//!
//! REST surface over the catalog store plus the assisted-intake channel.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /api/items` - List items (optional ?skip=&limit=)
//! - `POST /api/items` - Create an item
//! - `PUT /api/items/{id}` - Update an item's quantity
//! - `DELETE /api/items/{id}` - Delete an item
//! - `GET /api/categories` - List categories with their subcategories
//! - `POST /api/subcategories` - Create a subcategory
//! - `PUT /api/subcategories/{id}` - Rename a subcategory / replace its icon
//! - `DELETE /api/subcategories/{id}` - Delete a subcategory
//! - `POST /api/ai/chat` - Assisted intake (one message, one reply)

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::icons;
use crate::intake::IntakeDispatcher;
use crate::models::{Category, Item, NewItem, SubCategory};
use crate::store::{CatalogError, CatalogStore};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the web API.
#[derive(Clone)]
pub struct AppState {
    /// Catalog store (single source of truth).
    store: Arc<CatalogStore>,
    /// Assisted-intake dispatcher.
    dispatcher: Arc<IntakeDispatcher>,
    /// Directory uploaded icons are written to.
    icons_dir: PathBuf,
}

impl AppState {
    /// Creates a new application state.
    #[must_use]
    pub fn new(
        store: Arc<CatalogStore>,
        dispatcher: Arc<IntakeDispatcher>,
        icons_dir: PathBuf,
    ) -> Self {
        Self {
            store,
            dispatcher,
            icons_dir,
        }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Current health status (e.g., "healthy").
    pub status: String,
    /// Application version.
    pub version: String,
}

/// Paging parameters for item listings.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// Rows to skip.
    pub skip: Option<usize>,
    /// Maximum rows to return.
    pub limit: Option<usize>,
}

/// Item list response.
#[derive(Debug, Serialize)]
pub struct ItemListResponse {
    /// Matching items.
    pub items: Vec<Item>,
    /// Count of returned items.
    pub total: usize,
}

/// Item creation request.
#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    /// Display name.
    pub name: String,
    /// Initial stock count.
    #[serde(default)]
    pub quantity: i64,
    /// Desired stock count.
    #[serde(default)]
    pub target_quantity: i64,
    /// Optional subcategory slug.
    pub subcategory: Option<String>,
    /// Optional expiry date (ISO 8601).
    pub expiry_date: Option<NaiveDate>,
    /// Owning category.
    pub category_id: i64,
}

/// Quantity update request.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    /// New stock count.
    pub quantity: i64,
}

/// A category with its subcategories, for the listing endpoint.
#[derive(Debug, Serialize)]
pub struct CategoryWithSubcategories {
    /// Database identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Stable slug.
    pub slug: String,
    /// Subcategories owned by this category.
    pub subcategories: Vec<SubCategory>,
}

/// Category list response.
#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    /// All categories with their subcategories.
    pub categories: Vec<CategoryWithSubcategories>,
}

/// Subcategory creation request.
#[derive(Debug, Deserialize)]
pub struct CreateSubcategoryRequest {
    /// Display name; the slug is derived server-side.
    pub name: String,
    /// Owning category.
    pub category_id: i64,
    /// Optional base64-encoded icon image.
    pub icon_data: Option<String>,
}

/// Subcategory update request (rename and/or icon replacement).
#[derive(Debug, Deserialize)]
pub struct UpdateSubcategoryRequest {
    /// New display name; the slug is re-derived and cascades to items.
    pub name: String,
    /// Optional base64-encoded replacement icon.
    pub icon_data: Option<String>,
}

/// Assisted-intake request.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The operator's message.
    pub message: String,
    /// Prior exchange, accepted for interface compatibility but unused —
    /// no conversation state is carried across requests.
    #[serde(default)]
    pub history: Vec<serde_json::Value>,
}

/// Assisted-intake reply. There is no structured error field: every failure
/// degrades to advisory text in `response`.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Reply text.
    pub response: String,
}

/// API error response.
#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Error message.
    pub error: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// Maps catalog failures to HTTP responses.
///
/// Entity-integrity errors carry the detail the caller needs (which id,
/// which slug); storage internals stay in the details field.
fn catalog_error_response(err: &CatalogError) -> (StatusCode, Json<ApiError>) {
    match err {
        CatalogError::NotFound { .. } => {
            (StatusCode::NOT_FOUND, Json(ApiError::new(err.to_string())))
        }
        CatalogError::DuplicateSlug { .. } => {
            (StatusCode::CONFLICT, Json(ApiError::new(err.to_string())))
        }
        CatalogError::EmptySlug { .. } => {
            (StatusCode::BAD_REQUEST, Json(ApiError::new(err.to_string())))
        }
        CatalogError::Storage(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::with_details("Catalog storage failure", e.to_string())),
        ),
    }
}

/// Decodes a base64 icon payload from a request body.
fn decode_icon_payload(data: &str) -> Result<Vec<u8>, (StatusCode, Json<ApiError>)> {
    BASE64.decode(data).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError::with_details("Invalid icon_data encoding", e.to_string())),
        )
    })
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET /health - Health check endpoint.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/items - List items with paging.
async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ItemListResponse>, (StatusCode, Json<ApiError>)> {
    let skip = query.skip.unwrap_or(0);
    let limit = query.limit.unwrap_or(100);

    let items = state
        .store
        .list_items(skip, limit)
        .await
        .map_err(|e| catalog_error_response(&e))?;

    let total = items.len();
    Ok(Json(ItemListResponse { items, total }))
}

/// POST /api/items - Create an item.
async fn create_item(
    State(state): State<AppState>,
    Json(request): Json<CreateItemRequest>,
) -> Result<Json<Item>, (StatusCode, Json<ApiError>)> {
    let item = state
        .store
        .create_item(NewItem {
            name: request.name,
            quantity: request.quantity,
            target_quantity: request.target_quantity,
            subcategory: request.subcategory,
            expiry_date: request.expiry_date,
            category_id: request.category_id,
        })
        .await
        .map_err(|e| catalog_error_response(&e))?;

    Ok(Json(item))
}

/// PUT /api/items/{id} - Update an item's quantity.
async fn update_item_quantity(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<Json<Item>, (StatusCode, Json<ApiError>)> {
    let item = state
        .store
        .update_item_quantity(id, request.quantity)
        .await
        .map_err(|e| catalog_error_response(&e))?;

    Ok(Json(item))
}

/// DELETE /api/items/{id} - Delete an item.
async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    state
        .store
        .delete_item(id)
        .await
        .map_err(|e| catalog_error_response(&e))?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/categories - List categories with their subcategories.
async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoryListResponse>, (StatusCode, Json<ApiError>)> {
    let categories = state
        .store
        .list_categories()
        .await
        .map_err(|e| catalog_error_response(&e))?;
    let subcategories = state
        .store
        .list_subcategories()
        .await
        .map_err(|e| catalog_error_response(&e))?;

    Ok(Json(CategoryListResponse {
        categories: group_subcategories(categories, subcategories),
    }))
}

/// Groups subcategories under their owning categories, preserving order.
fn group_subcategories(
    categories: Vec<Category>,
    subcategories: Vec<SubCategory>,
) -> Vec<CategoryWithSubcategories> {
    categories
        .into_iter()
        .map(|cat| {
            let subs = subcategories
                .iter()
                .filter(|s| s.category_id == cat.id)
                .cloned()
                .collect();
            CategoryWithSubcategories {
                id: cat.id,
                name: cat.name,
                slug: cat.slug,
                subcategories: subs,
            }
        })
        .collect()
}

/// POST /api/subcategories - Create a subcategory.
///
/// An unusable icon upload is not fatal here: the subcategory falls back to
/// the generic icon, matching the low blast radius of a brand-new record.
async fn create_subcategory(
    State(state): State<AppState>,
    Json(request): Json<CreateSubcategoryRequest>,
) -> Result<Json<SubCategory>, (StatusCode, Json<ApiError>)> {
    let icon = match request.icon_data.as_deref() {
        Some(data) => {
            let bytes = decode_icon_payload(data)?;
            match icons::store_icon(&bytes, &state.icons_dir) {
                Ok(filename) => Some(filename),
                Err(e) => {
                    warn!("icon ingest failed, using generic icon: {e}");
                    None
                }
            }
        }
        None => None,
    };

    let sub = state
        .store
        .create_subcategory(&request.name, request.category_id, icon)
        .await
        .map_err(|e| catalog_error_response(&e))?;

    Ok(Json(sub))
}

/// PUT /api/subcategories/{id} - Rename a subcategory and/or replace its
/// icon. Slug and icon changes cascade to every referencing item in one
/// transaction.
///
/// Unlike creation, an explicit icon replacement that cannot be processed
/// fails the request — the caller asked for exactly that change.
async fn update_subcategory(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateSubcategoryRequest>,
) -> Result<Json<SubCategory>, (StatusCode, Json<ApiError>)> {
    let icon = match request.icon_data.as_deref() {
        Some(data) => {
            let bytes = decode_icon_payload(data)?;
            let filename = icons::store_icon(&bytes, &state.icons_dir).map_err(|e| {
                (
                    StatusCode::BAD_REQUEST,
                    Json(ApiError::with_details("Failed to process icon", e.to_string())),
                )
            })?;
            Some(filename)
        }
        None => None,
    };

    let sub = state
        .store
        .rename_subcategory(id, &request.name, icon)
        .await
        .map_err(|e| catalog_error_response(&e))?;

    Ok(Json(sub))
}

/// DELETE /api/subcategories/{id} - Delete a subcategory.
///
/// Items referencing it keep their slug and will need manual reassignment.
async fn delete_subcategory(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    state
        .store
        .delete_subcategory(id)
        .await
        .map_err(|e| catalog_error_response(&e))?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/ai/chat - Assisted intake.
///
/// Always answers 200 with a textual reply; intake failures are folded into
/// advisory text by the dispatcher.
async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let response = state.dispatcher.handle(&state.store, &request.message).await;
    Json(ChatResponse { response })
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - allow all origins for development.
    // The server is designed to run on the operator's own machine or LAN.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Item endpoints
        .route("/api/items", get(list_items).post(create_item))
        .route(
            "/api/items/{id}",
            axum::routing::put(update_item_quantity).delete(delete_item),
        )
        // Category endpoints
        .route("/api/categories", get(list_categories))
        .route("/api/subcategories", post(create_subcategory))
        .route(
            "/api/subcategories/{id}",
            axum::routing::put(update_subcategory).delete(delete_subcategory),
        )
        // Assisted intake
        .route("/api/ai/chat", post(chat))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Runs the web server.
///
/// # Errors
///
/// Returns an error if the server fails to bind or serve.
pub async fn run_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_router(state);

    info!("Starting Stockroom web server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
