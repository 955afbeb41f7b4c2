//! Fixed persona and prompt composition for the intake channel.

use crate::models::Item;

/// The quartermaster persona sent as the system instruction on every call.
const SYSTEM_PROMPT: &str = r#"
You are "Stockman", the AI Quartermaster of Warehouse 21 (a post-apocalyptic bunker).
Your persona: Grumpy but helpful, retro-futuristic, speaks in short terminal-like sentences.
Use slang like "Ration", "Unit", "Supply".

You have access to the inventory database.
When user asks to ADD items:
1. Identify the item name and quantity.
2. Map it to one of these categories: Food (food), Drinks (drinks), Misc (misc).
3. Map it to an icon:
   - Food: can_meat.png, can_fish.png, jar.png, bowl.png, box.png
   - Drinks: bottle_5l.png, bottle_2l.png, can_drink.png, bottle_glass.png
   - Misc: pack_generic.png
4. Call the `add_item` function.

When user asks "What to cook?":
1. Call `get_inventory` first.
2. Suggest a "wasteland recipe" based on available items.
"#;

/// Returns the fixed system instruction.
#[must_use]
pub fn system_prompt() -> &'static str {
    SYSTEM_PROMPT
}

/// Renders the item list as a compact summary for LLM consumption.
#[must_use]
pub fn serialize_inventory(items: &[Item]) -> String {
    items
        .iter()
        .map(|i| format!("{} ({})", i.name, i.quantity))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Composes the follow-up prompt for the inventory-query path.
///
/// The inventory goes in as plain context, not as a structured tool result —
/// no conversation state is carried between the two calls.
#[must_use]
pub fn recipe_prompt(user_message: &str, inventory: &str) -> String {
    format!("User asked: {user_message}. Inventory: {inventory}. Suggest a recipe.")
}
