use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FieldError, FieldErrors, InventoryError, Result};

/// Categories offered by the entry form. Any other non-blank text is accepted.
pub const KNOWN_CATEGORIES: &[&str] = &["Books", "Clothing", "Electronics", "Appliances", "Furniture"];

/// Server-assigned identity of an inventory item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl ItemId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ItemId {
    fn from(value: i64) -> Self {
        ItemId(value)
    }
}

impl FromStr for ItemId {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<i64>()
            .map(ItemId)
            .map_err(|_| InventoryError::Other(format!("invalid item id '{s}'")))
    }
}

/// A single inventory record as exchanged with the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Absent until the server persists the item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
    pub name: String,
    pub sku: String,
    pub quantity: u32,
    pub price: f64,
    pub category: String,
}

impl InventoryItem {
    pub fn new(
        name: impl Into<String>,
        sku: impl Into<String>,
        quantity: u32,
        price: f64,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            sku: sku.into(),
            quantity,
            price,
            category: category.into(),
        }
    }

    pub fn with_id(mut self, id: ItemId) -> Self {
        self.id = Some(id);
        self
    }

    /// Copy of this item suitable for a create request.
    pub fn without_id(&self) -> Self {
        Self {
            id: None,
            ..self.clone()
        }
    }

    /// Check the same constraints the backend enforces, before any request is made.
    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();

        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "Name is mandatory"));
        }
        if self.sku.trim().is_empty() {
            errors.push(FieldError::new("sku", "SKU is mandatory"));
        }
        if !self.price.is_finite() {
            errors.push(FieldError::new("price", "Price is required"));
        } else if self.price < 0.0 {
            errors.push(FieldError::new("price", "Price must be non-negative"));
        }
        if self.category.trim().is_empty() {
            errors.push(FieldError::new("category", "Category is mandatory"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(InventoryError::Validation(errors))
        }
    }

    pub fn has_known_category(&self) -> bool {
        KNOWN_CATEGORIES
            .iter()
            .any(|c| unicase::eq(*c, self.category.as_str()))
    }
}

/// One page of the remote collection.
///
/// A page is a snapshot; the list store swaps whole pages rather than editing one in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(rename = "content")]
    pub items: Vec<InventoryItem>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_elements: Option<u64>,
}

impl Page {
    pub fn new(items: Vec<InventoryItem>, total_pages: u32) -> Self {
        Self {
            items,
            total_pages,
            total_elements: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.items.iter().filter_map(|i| i.id).collect()
    }

    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|i| i.id == Some(id))
    }
}
