//! List store: the current page and the optimistic patches applied to it.
//!
//! The store is the only writer of the visible page. A successful fetch
//! replaces the page wholesale; mutations try a local patch and fall back to a
//! refetch whenever the patch could misplace an item.

use std::sync::Arc;

use crate::query::{QueryState, compare_items};
use crate::types::{InventoryItem, ItemId, Page};

/// Result of applying a local patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// The page was updated in place
    Applied,
    /// Nothing to patch; the item is not on the current page
    NotPresent,
    /// A local patch could be wrong; the caller should refetch
    NeedsRefetch,
}

impl PatchOutcome {
    pub fn needs_refetch(self) -> bool {
        matches!(self, PatchOutcome::NeedsRefetch)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListStore {
    page: Option<Arc<Page>>,
    /// Query the current page was fetched for
    query: QueryState,
}

impl ListStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self) -> Option<Arc<Page>> {
        self.page.clone()
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    pub fn total_pages(&self) -> Option<u32> {
        self.page.as_ref().map(|p| p.total_pages)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.page
            .as_ref()
            .is_some_and(|p| p.position(id).is_some())
    }

    /// Unconditional overwrite after a successful fetch.
    pub fn replace(&mut self, page: Page, query: QueryState) {
        self.page = Some(Arc::new(page));
        self.query = query;
    }

    /// Append a newly created item when it provably belongs at the end of this page.
    pub fn patch_insert(&mut self, item: &InventoryItem) -> PatchOutcome {
        let Some(current) = self.page.as_deref() else {
            return PatchOutcome::NeedsRefetch;
        };
        if item.id.is_none() {
            return PatchOutcome::NeedsRefetch;
        }

        let page_index = self.query.page_index();
        let is_last_page = current.total_pages == 0 || page_index + 1 >= current.total_pages;
        let has_room = (current.items.len() as u64) < u64::from(self.query.page_size());
        if !is_last_page || !has_room {
            return PatchOutcome::NeedsRefetch;
        }

        if self.query.has_search() || !self.query.matches(item) {
            return PatchOutcome::NeedsRefetch;
        }

        let sorts_last = current.items.last().is_none_or(|last| {
            compare_items(last, item, self.query.sort_field(), self.query.sort_order()).is_le()
        });
        if !sorts_last {
            return PatchOutcome::NeedsRefetch;
        }

        let mut next = current.clone();
        next.items.push(item.clone());
        next.total_pages = next.total_pages.max(1);
        if let Some(total) = next.total_elements.as_mut() {
            *total += 1;
        }
        self.page = Some(Arc::new(next));
        PatchOutcome::Applied
    }

    /// Replace an item in place when its position cannot have changed.
    pub fn patch_update(&mut self, item: &InventoryItem) -> PatchOutcome {
        let (Some(current), Some(id)) = (self.page.as_deref(), item.id) else {
            return PatchOutcome::NeedsRefetch;
        };
        let Some(index) = current.position(id) else {
            return PatchOutcome::NeedsRefetch;
        };

        let previous = &current.items[index];
        if !self.query.sort_field().same_value(previous, item) {
            return PatchOutcome::NeedsRefetch;
        }
        if self.query.has_search() || !self.query.matches(item) {
            return PatchOutcome::NeedsRefetch;
        }

        let mut next = current.clone();
        next.items[index] = item.clone();
        self.page = Some(Arc::new(next));
        PatchOutcome::Applied
    }

    /// Drop an item from the current page. `total_pages` stays as fetched.
    pub fn patch_remove(&mut self, id: ItemId) -> PatchOutcome {
        let Some(current) = self.page.as_deref() else {
            return PatchOutcome::NotPresent;
        };
        let Some(index) = current.position(id) else {
            return PatchOutcome::NotPresent;
        };

        let mut next = current.clone();
        next.items.remove(index);
        if let Some(total) = next.total_elements.as_mut() {
            *total = total.saturating_sub(1);
        }
        self.page = Some(Arc::new(next));
        PatchOutcome::Applied
    }
}
