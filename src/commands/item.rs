//! Single-item commands: show, add, edit, rm.

use futures::stream::{self, StreamExt};
use owo_colors::OwoColorize;
use serde_json::json;

use crate::cli::OutputOptions;
use crate::error::{InventoryError, Result};
use crate::remote::InventoryGateway;
use crate::types::{InventoryItem, ItemId};

use super::{CommandOutput, format_price, item_json};

const MAX_CONCURRENT_DELETES: usize = 4;

/// Field changes requested by `edit`; `None` keeps the stored value
#[derive(Debug, Default, Clone)]
pub struct ItemChanges {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub quantity: Option<u32>,
    pub price: Option<f64>,
    pub category: Option<String>,
}

impl ItemChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.sku.is_none()
            && self.quantity.is_none()
            && self.price.is_none()
            && self.category.is_none()
    }

    pub fn apply(self, item: &mut InventoryItem) {
        if let Some(name) = self.name {
            item.name = name;
        }
        if let Some(sku) = self.sku {
            item.sku = sku;
        }
        if let Some(quantity) = self.quantity {
            item.quantity = quantity;
        }
        if let Some(price) = self.price {
            item.price = price;
        }
        if let Some(category) = self.category {
            item.category = category;
        }
    }
}

fn item_details(item: &InventoryItem) -> String {
    let id = item.id.map(|id| id.to_string()).unwrap_or_default();
    let mut text = format!("{} {}\n", id.cyan(), item.name.bold());
    text.push_str(&format!("  sku:      {}\n", item.sku));
    text.push_str(&format!("  category: {}", item.category));
    if !item.has_known_category() {
        text.push_str(&format!(" {}", "(custom)".dimmed()));
    }
    text.push('\n');
    let quantity = if item.quantity == 0 {
        "0 (out of stock)".red().to_string()
    } else {
        item.quantity.to_string()
    };
    text.push_str(&format!("  quantity: {quantity}\n"));
    text.push_str(&format!("  price:    {}", format_price(item.price)));
    text
}

/// Display a single item
pub async fn cmd_show<G: InventoryGateway>(
    gateway: &G,
    id: ItemId,
    output: OutputOptions,
) -> Result<()> {
    let item = gateway.get(id).await?;
    CommandOutput::new(item_json(&item))
        .with_text(item_details(&item))
        .print(output)
}

/// Create an item
pub async fn cmd_add<G: InventoryGateway>(
    gateway: G,
    item: InventoryItem,
    output: OutputOptions,
) -> Result<()> {
    item.validate()?;
    let created = gateway.create(&item).await?;
    let id = created.id.map(|id| id.to_string()).unwrap_or_default();

    CommandOutput::new(json!({
        "action": "created",
        "item": item_json(&created),
    }))
    .with_text(format!("Created item {}", id.cyan()))
    .print(output)
}

/// Change fields of an existing item
pub async fn cmd_edit<G: InventoryGateway>(
    gateway: G,
    id: ItemId,
    changes: ItemChanges,
    output: OutputOptions,
) -> Result<()> {
    if changes.is_empty() {
        return Err(InventoryError::Other(
            "nothing to change: pass at least one of --name, --sku, --quantity, --price, --category"
                .to_string(),
        ));
    }

    let mut item = gateway.get(id).await?;
    changes.apply(&mut item);
    item.validate()?;
    let updated = gateway.update(id, &item).await?;

    CommandOutput::new(json!({
        "action": "updated",
        "item": item_json(&updated),
    }))
    .with_text(format!("Updated item {}", id.cyan()))
    .print(output)
}

/// Delete items concurrently. Items that are already gone count as deleted.
pub async fn cmd_rm<G: InventoryGateway>(
    gateway: G,
    ids: &[ItemId],
    output: OutputOptions,
) -> Result<()> {
    let mut unique: Vec<ItemId> = ids.to_vec();
    unique.sort();
    unique.dedup();

    let gateway = &gateway;
    let results: Vec<(ItemId, Result<()>)> = stream::iter(unique)
        .map(|id| async move { (id, gateway.delete(id).await) })
        .buffer_unordered(MAX_CONCURRENT_DELETES)
        .collect()
        .await;

    let mut deleted = Vec::new();
    let mut missing = Vec::new();
    let mut failures = Vec::new();
    for (id, result) in results {
        match result {
            Ok(()) => deleted.push(id),
            Err(InventoryError::NotFound(_)) => missing.push(id),
            Err(err) => failures.push((id, err)),
        }
    }
    deleted.sort();
    missing.sort();
    failures.sort_by_key(|(id, _)| *id);

    let mut text = String::new();
    for id in &deleted {
        text.push_str(&format!("Deleted item {}\n", id.cyan()));
    }
    for id in &missing {
        text.push_str(&format!("Item {} was already deleted\n", id.cyan()));
    }
    for (id, err) in &failures {
        text.push_str(&format!("Failed to delete item {}: {}\n", id.cyan(), err.user_message()));
    }

    let json = json!({
        "action": "deleted",
        "deleted": deleted,
        "already_deleted": missing,
        "failed": failures
            .iter()
            .map(|(id, err)| json!({ "id": id, "error": err.user_message() }))
            .collect::<Vec<_>>(),
    });
    CommandOutput::new(json)
        .with_text(text.trim_end().to_string())
        .print(output)?;

    match failures.into_iter().next() {
        Some((_, err)) => Err(err),
        None => Ok(()),
    }
}
