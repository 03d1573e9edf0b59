mod config;
mod item;
mod ls;
mod shell;

pub use config::{cmd_config_get, cmd_config_set, cmd_config_show};
pub use item::{ItemChanges, cmd_add, cmd_edit, cmd_rm, cmd_show};
pub use ls::{ListOptions, cmd_ls};
pub use shell::cmd_shell;

use owo_colors::OwoColorize;
use serde_json::{Value, json};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli::OutputOptions;
use crate::config::Config;
use crate::error::Result;
use crate::query::QueryState;
use crate::remote::InventoryGateway;
use crate::sync::{InventoryController, RenderState};
use crate::types::InventoryItem;

/// Print a JSON value, pretty-printed
pub fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Output of a command in both machine and human form
pub struct CommandOutput {
    json: Value,
    text: Option<String>,
}

impl CommandOutput {
    pub fn new(json: Value) -> Self {
        Self { json, text: None }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn print(self, output: OutputOptions) -> Result<()> {
        match self.text {
            Some(text) if !output.json => {
                println!("{text}");
                Ok(())
            }
            _ => print_json(&self.json),
        }
    }
}

/// Controller for a one-shot command, seeded from the list defaults
pub(crate) fn controller_for<G: InventoryGateway>(
    gateway: G,
    config: &Config,
    query: QueryState,
) -> InventoryController<G> {
    InventoryController::new(gateway, query, config.debounce())
}

/// A row in the item table
#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "SKU")]
    sku: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Qty")]
    quantity: u32,
    #[tabled(rename = "Price")]
    price: String,
}

impl From<&InventoryItem> for ItemRow {
    fn from(item: &InventoryItem) -> Self {
        ItemRow {
            id: item.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string()),
            name: item.name.clone(),
            sku: item.sku.clone(),
            category: item.category.clone(),
            quantity: item.quantity,
            price: format_price(item.price),
        }
    }
}

pub fn format_price(price: f64) -> String {
    format!("{price:.2}")
}

pub fn item_table(items: &[InventoryItem]) -> String {
    let mut table = Table::new(items.iter().map(ItemRow::from));
    table.with(Style::rounded());
    table.to_string()
}

pub fn item_json(item: &InventoryItem) -> Value {
    json!({
        "id": item.id,
        "name": item.name,
        "sku": item.sku,
        "quantity": item.quantity,
        "price": item.price,
        "category": item.category,
    })
}

pub fn render_json(render: &RenderState) -> Value {
    let query = &render.query;
    json!({
        "items": render.items().iter().map(item_json).collect::<Vec<_>>(),
        "page": query.page_index() + 1,
        "page_size": query.page_size(),
        "total_pages": render.total_pages(),
        "total_elements": render.page.as_ref().and_then(|p| p.total_elements),
        "sort": query.sort_param(),
        "search": query.search_text(),
        "category": query.category(),
    })
}

/// Human rendering of the list: table, then a one-line page summary
pub fn render_text(render: &RenderState) -> String {
    let mut text = String::new();

    if render.items().is_empty() {
        text.push_str(&"No items found.".dimmed().to_string());
    } else {
        text.push_str(&item_table(render.items()));
    }
    text.push('\n');

    let query = &render.query;
    let total_pages = render.total_pages().max(1);
    let mut summary = format!(
        "Page {} of {} - sorted by {} {}",
        query.page_index() + 1,
        total_pages,
        query.sort_field(),
        query.sort_order()
    );
    if let Some(total) = render.page.as_ref().and_then(|p| p.total_elements) {
        summary.push_str(&format!(" - {total} item(s)"));
    }
    if !query.search_text().trim().is_empty() {
        summary.push_str(&format!(" - search \"{}\"", query.search_text().trim()));
    }
    if !query.category().is_empty() {
        summary.push_str(&format!(" - category \"{}\"", query.category()));
    }
    text.push_str(&summary.dimmed().to_string());

    if render.loading || render.refresh_pending {
        text.push('\n');
        text.push_str(&"Loading...".yellow().to_string());
    }
    if let Some(error) = &render.error {
        text.push('\n');
        text.push_str(&error.red().to_string());
    }
    text
}
