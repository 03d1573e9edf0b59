//! In-process inventory backend.
//!
//! Honours the same query contract as the REST backend: search prefers an
//! exact (case-insensitive) name match and otherwise matches name or SKU
//! substrings; the category filter is a case-insensitive substring; pages are
//! zero-based. Backs the offline shell and the test suites.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use unicase::UniCase;

use crate::error::{InventoryError, Result};
use crate::query::{QueryState, contains_ignore_case, sort_items_by};
use crate::types::{InventoryItem, ItemId, Page};

use super::InventoryGateway;

#[derive(Debug)]
pub struct InMemoryGateway {
    items: Mutex<BTreeMap<ItemId, InventoryItem>>,
    next_id: AtomicI64,
    latency: Mutex<Option<Duration>>,
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            latency: Mutex::new(None),
        }
    }

    /// Seed the collection; items without an id are assigned one.
    pub fn with_items(items: impl IntoIterator<Item = InventoryItem>) -> Self {
        let gateway = Self::new();
        for item in items {
            gateway.insert(item);
        }
        gateway
    }

    /// A small catalogue covering every well-known category.
    pub fn sample() -> Self {
        Self::with_items([
            InventoryItem::new("Rust in Action", "BK-001", 12, 39.99, "Books"),
            InventoryItem::new("The Pragmatic Programmer", "BK-002", 4, 45.5, "Books"),
            InventoryItem::new("Rain Jacket", "CL-101", 20, 79.0, "Clothing"),
            InventoryItem::new("Wool Socks", "CL-102", 64, 9.5, "Clothing"),
            InventoryItem::new("USB-C Hub", "EL-201", 15, 29.99, "Electronics"),
            InventoryItem::new("Mechanical Keyboard", "EL-202", 7, 119.0, "Electronics"),
            InventoryItem::new("Noise Cancelling Headphones", "EL-203", 3, 249.0, "Electronics"),
            InventoryItem::new("Espresso Machine", "AP-301", 2, 399.0, "Appliances"),
            InventoryItem::new("Toaster", "AP-302", 11, 34.0, "Appliances"),
            InventoryItem::new("Standing Desk", "FU-401", 5, 499.0, "Furniture"),
            InventoryItem::new("Desk Lamp", "FU-402", 18, 24.5, "Furniture"),
            InventoryItem::new("Bookshelf", "FU-403", 6, 89.0, "Furniture"),
        ])
    }

    /// Delay every call by the given duration.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.lock().contains_key(&id)
    }

    /// Direct insert that bypasses the gateway API, as another client would.
    pub fn insert(&self, item: InventoryItem) -> InventoryItem {
        let id = match item.id {
            Some(id) => {
                self.next_id.fetch_max(id.get() + 1, Ordering::SeqCst);
                id
            }
            None => ItemId(self.next_id.fetch_add(1, Ordering::SeqCst)),
        };
        let stored = item.with_id(id);
        self.items.lock().insert(id, stored.clone());
        stored
    }

    /// Direct removal that bypasses the gateway API, as another client would.
    pub fn remove(&self, id: ItemId) -> Option<InventoryItem> {
        self.items.lock().remove(&id)
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn query_page(&self, query: &QueryState) -> Page {
        let all: Vec<InventoryItem> = self.items.lock().values().cloned().collect();

        let category = query.category().trim();
        let in_category: Vec<InventoryItem> = all
            .into_iter()
            .filter(|i| category.is_empty() || contains_ignore_case(&i.category, category))
            .collect();

        let search = query.search_text().trim();
        let mut matched: Vec<InventoryItem> = if search.is_empty() {
            in_category
        } else {
            let exact: Vec<InventoryItem> = in_category
                .iter()
                .filter(|i| UniCase::new(i.name.as_str()) == UniCase::new(search))
                .cloned()
                .collect();
            if !exact.is_empty() {
                exact
            } else {
                in_category
                    .into_iter()
                    .filter(|i| {
                        contains_ignore_case(&i.name, search) || contains_ignore_case(&i.sku, search)
                    })
                    .collect()
            }
        };

        sort_items_by(&mut matched, query.sort_field(), query.sort_order());

        let total = matched.len() as u64;
        let size = query.page_size().max(1) as usize;
        let total_pages = matched.len().div_ceil(size) as u32;
        let start = (query.page_index() as usize).saturating_mul(size);
        let items = matched.into_iter().skip(start).take(size).collect();

        Page {
            items,
            total_pages,
            total_elements: Some(total),
        }
    }
}

impl InventoryGateway for InMemoryGateway {
    async fn list(&self, query: &QueryState) -> Result<Page> {
        self.simulate_latency().await;
        Ok(self.query_page(query))
    }

    async fn get(&self, id: ItemId) -> Result<InventoryItem> {
        self.simulate_latency().await;
        self.items
            .lock()
            .get(&id)
            .cloned()
            .ok_or(InventoryError::NotFound(id))
    }

    async fn create(&self, item: &InventoryItem) -> Result<InventoryItem> {
        self.simulate_latency().await;
        item.validate()?;
        Ok(self.insert(item.without_id()))
    }

    async fn update(&self, id: ItemId, item: &InventoryItem) -> Result<InventoryItem> {
        self.simulate_latency().await;
        item.validate()?;
        let mut items = self.items.lock();
        let existing = items.get_mut(&id).ok_or(InventoryError::NotFound(id))?;
        *existing = item.clone().with_id(id);
        Ok(existing.clone())
    }

    async fn delete(&self, id: ItemId) -> Result<()> {
        self.simulate_latency().await;
        self.items
            .lock()
            .remove(&id)
            .map(|_| ())
            .ok_or(InventoryError::NotFound(id))
    }
}
