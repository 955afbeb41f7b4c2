//! Assisted-intake channel: one free-text message in, one reply out.
//!
//! A message becomes at most one catalog mutation or query. The external
//! model either answers in plain text or requests one of two declared tools
//! (`add_item`, `get_inventory`); the dispatcher executes the request
//! locally and composes the user-visible reply itself, so confirmations
//! always reflect what the database actually did.
//!
//! Every external-service failure is absorbed here: the caller only ever
//! sees a fixed in-persona advisory, never an error type or a stack trace.

pub mod gemini;
pub mod prompt;

use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::defaults::FALLBACK_CATEGORY_SLUG;
use crate::models::NewItem;
use crate::store::CatalogStore;

use gemini::{collect_text, FunctionDeclaration, GeminiClient, Part};

/// Reply when no credential was configured at startup. No network call is
/// attempted in that state.
pub const MISSING_CREDENTIAL_REPLY: &str = "SYSTEM ERROR: API_KEY_MISSING. CONTACT ADMIN.";

/// Reply for any failure while talking to the external service. A single
/// failed attempt is terminal; the user is expected to resend.
pub const COMMUNICATION_FAILURE_REPLY: &str = "COMMUNICATION FAILURE. INTERFERENCE DETECTED.";

/// Target quantity assigned to items created through the intake channel.
const INTAKE_TARGET_QUANTITY: i64 = 10;

/// Page size for the inventory summary (matches the catalog's listing
/// default).
const INVENTORY_LIMIT: usize = 100;

/// What the model asked for, as an exhaustive set of outcomes.
///
/// Adding a tool means adding a variant here, and the compiler will point
/// at every dispatch site that needs to handle it.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelAction {
    /// No tool was invoked; relay the text as-is.
    PlainReply(String),
    /// The model wants an item added to stock.
    AddItem(AddItemArgs),
    /// The model wants the current inventory before answering.
    GetInventory,
}

/// Parsed arguments of an `add_item` invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct AddItemArgs {
    /// Item display name.
    pub name: String,
    /// Stock count, coerced to an integer.
    pub quantity: i64,
    /// Category slug suggested by the model.
    pub category_slug: String,
    /// Icon suggested by the model; advisory only, the store resolves icons
    /// itself.
    pub icon_type: Option<String>,
}

/// Extracts the action from a model turn.
///
/// Only the first function call is honored; extra calls are reported in the
/// second tuple field so the caller can log them. A turn with no function
/// call and no text is an error.
fn parse_action(parts: &[Part]) -> Result<(ModelAction, usize)> {
    let mut calls = parts.iter().filter_map(|p| p.function_call.as_ref());

    if let Some(call) = calls.next() {
        let extra_calls = calls.count();
        let action = match call.name.as_str() {
            "add_item" => ModelAction::AddItem(parse_add_item_args(&call.args)?),
            "get_inventory" => ModelAction::GetInventory,
            other => return Err(anyhow!("model invoked undeclared tool '{other}'")),
        };
        return Ok((action, extra_calls));
    }

    let text = collect_text(parts);
    if text.is_empty() {
        return Err(anyhow!("model returned neither text nor a tool call"));
    }
    Ok((ModelAction::PlainReply(text), 0))
}

fn parse_add_item_args(args: &Value) -> Result<AddItemArgs> {
    let name = args
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("add_item call is missing 'name'"))?
        .to_string();
    let quantity = args
        .get("quantity")
        .and_then(coerce_quantity)
        .ok_or_else(|| anyhow!("add_item call has no usable 'quantity'"))?;
    let category_slug = args
        .get("category_slug")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("add_item call is missing 'category_slug'"))?
        .to_string();
    let icon_type = args
        .get("icon_type")
        .and_then(Value::as_str)
        .map(ToString::to_string);

    Ok(AddItemArgs {
        name,
        quantity,
        category_slug,
        icon_type,
    })
}

/// Coerces a JSON value to an integer quantity.
///
/// Models emit quantities as integers, floats, or numeric strings depending
/// on the day; all three are accepted.
fn coerce_quantity(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    if let Some(f) = value.as_f64() {
        return Some(f as i64);
    }
    value.as_str()?.trim().parse::<i64>().ok()
}

/// The two capabilities declared to the model on every request.
fn tool_declarations() -> Vec<FunctionDeclaration> {
    vec![
        FunctionDeclaration {
            name: "add_item".to_string(),
            description: "Add an item to the inventory.".to_string(),
            parameters: json!({
                "type": "OBJECT",
                "properties": {
                    "name": {"type": "STRING", "description": "Item name"},
                    "quantity": {"type": "INTEGER", "description": "How many units"},
                    "category_slug": {
                        "type": "STRING",
                        "description": "One of: food, drinks, misc"
                    },
                    "icon_type": {"type": "STRING", "description": "Icon filename"}
                },
                "required": ["name", "quantity", "category_slug"]
            }),
        },
        FunctionDeclaration {
            name: "get_inventory".to_string(),
            description: "Get current inventory list.".to_string(),
            parameters: json!({"type": "OBJECT", "properties": {}}),
        },
    ]
}

/// Converts one operator message into at most one catalog mutation or query.
pub struct IntakeDispatcher {
    client: Option<GeminiClient>,
}

impl IntakeDispatcher {
    /// Creates a dispatcher. `None` means no credential was present at
    /// startup, which disables the channel without touching the network.
    #[must_use]
    pub fn new(client: Option<GeminiClient>) -> Self {
        Self { client }
    }

    /// Whether the intake channel has a credential to work with.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Handles one message and always produces a reply string.
    ///
    /// All failures degrade to fixed advisory text; the underlying cause is
    /// logged, never shown.
    pub async fn handle(&self, store: &CatalogStore, message: &str) -> String {
        let Some(client) = &self.client else {
            return MISSING_CREDENTIAL_REPLY.to_string();
        };

        match self.dispatch(client, store, message).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!("intake request failed: {err:#}");
                COMMUNICATION_FAILURE_REPLY.to_string()
            }
        }
    }

    async fn dispatch(
        &self,
        client: &GeminiClient,
        store: &CatalogStore,
        message: &str,
    ) -> Result<String> {
        let parts = client
            .generate(prompt::system_prompt(), message, tool_declarations())
            .await?;

        let (action, extra_calls) = parse_action(&parts)?;
        if extra_calls > 0 {
            warn!("model requested {extra_calls} extra tool call(s); only the first is honored");
        }

        match action {
            ModelAction::PlainReply(text) => Ok(text),
            ModelAction::AddItem(args) => self.add_item(store, args).await,
            ModelAction::GetInventory => self.suggest_recipe(client, store, message).await,
        }
    }

    /// Executes an `add_item` request and composes the acknowledgement
    /// locally — the model never gets to phrase the confirmation, so it
    /// cannot claim a write that did not happen.
    async fn add_item(&self, store: &CatalogStore, args: AddItemArgs) -> Result<String> {
        let category = match store.find_category_by_slug(&args.category_slug).await? {
            Some(category) => category,
            // Unknown category suggestions land in the designated default
            // rather than failing the whole request.
            None => store
                .find_category_by_slug(FALLBACK_CATEGORY_SLUG)
                .await?
                .ok_or_else(|| anyhow!("fallback category '{FALLBACK_CATEGORY_SLUG}' missing"))?,
        };

        if let Some(icon_type) = &args.icon_type {
            debug!("model suggested icon '{icon_type}'; store resolves icons itself");
        }

        let item = store
            .create_item(NewItem {
                name: args.name,
                quantity: args.quantity,
                target_quantity: INTAKE_TARGET_QUANTITY,
                subcategory: None,
                expiry_date: None,
                category_id: category.id,
            })
            .await?;

        Ok(format!(
            "ACKNOWLEDGE. ADDED {} {}. STOCK UPDATED.",
            item.quantity, item.name
        ))
    }

    /// Executes the inventory-query path: read the stock, then ask the
    /// model again with the summary as plain context. The two calls are not
    /// transactional with the read — stock may change in between, which is
    /// accepted.
    async fn suggest_recipe(
        &self,
        client: &GeminiClient,
        store: &CatalogStore,
        message: &str,
    ) -> Result<String> {
        let items = store.list_items(0, INVENTORY_LIMIT).await?;
        let inventory = prompt::serialize_inventory(&items);

        client
            .generate_text(
                prompt::system_prompt(),
                &prompt::recipe_prompt(message, &inventory),
            )
            .await
    }
}
