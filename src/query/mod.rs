//! Query state for list fetches.
//!
//! `QueryState` is the value the presentation layer edits and hands to the
//! controller. Any change to a filter or sort key returns to the first page so
//! a narrowed result set never lands on an out-of-range page.

pub mod sort;

use crate::types::InventoryItem;

pub use sort::{SortField, SortOrder, compare_items, sort_items_by};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Combined filter, sort and pagination parameters driving a list fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryState {
    search_text: String,
    category: String,
    sort_field: SortField,
    sort_order: SortOrder,
    page_index: u32,
    page_size: u32,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            category: String::new(),
            sort_field: SortField::default(),
            sort_order: SortOrder::default(),
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style page size; zero is treated as one.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_sort(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort_field = field;
        self.sort_order = order;
        self
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn sort_field(&self) -> SortField {
        self.sort_field
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    // Each setter returns whether the state changed.

    pub fn set_search_text(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if self.search_text == text {
            return false;
        }
        self.search_text = text;
        self.page_index = 0;
        true
    }

    pub fn set_category(&mut self, category: impl Into<String>) -> bool {
        let category = category.into();
        if self.category == category {
            return false;
        }
        self.category = category;
        self.page_index = 0;
        true
    }

    pub fn set_sort_field(&mut self, field: SortField) -> bool {
        if self.sort_field == field {
            return false;
        }
        self.sort_field = field;
        self.page_index = 0;
        true
    }

    pub fn set_sort_order(&mut self, order: SortOrder) -> bool {
        if self.sort_order == order {
            return false;
        }
        self.sort_order = order;
        self.page_index = 0;
        true
    }

    /// Column-header click: the active column flips order, a new column sorts ascending.
    pub fn toggle_or_set_sort(&mut self, field: SortField) {
        if self.sort_field == field {
            self.sort_order = self.sort_order.flipped();
        } else {
            self.sort_field = field;
            self.sort_order = SortOrder::Ascending;
        }
        self.page_index = 0;
    }

    pub fn set_page_index(&mut self, page_index: u32) -> bool {
        if self.page_index == page_index {
            return false;
        }
        self.page_index = page_index;
        true
    }

    pub fn set_page_size(&mut self, page_size: u32) -> bool {
        let page_size = page_size.max(1);
        if self.page_size == page_size {
            return false;
        }
        self.page_size = page_size;
        self.page_index = 0;
        true
    }

    pub fn has_filters(&self) -> bool {
        self.has_search() || !self.category.trim().is_empty()
    }

    pub fn has_search(&self) -> bool {
        !self.search_text.trim().is_empty()
    }

    /// `sort` parameter in the backend's `field,direction` form.
    pub fn sort_param(&self) -> String {
        format!("{},{}", self.sort_field, self.sort_order)
    }

    /// Query-string parameters for `GET /inventory`.
    pub fn to_query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page_index.to_string()),
            ("size", self.page_size.to_string()),
            ("sort", self.sort_param()),
        ];

        let search = self.search_text.trim();
        if !search.is_empty() {
            params.push(("searchTerm", search.to_string()));
        }
        if !self.category.is_empty() {
            params.push(("category", self.category.clone()));
        }

        params
    }

    /// Local approximation of the server filter, used to decide whether an
    /// optimistic patch can be trusted.
    ///
    /// Not exact for a non-blank search: the server prefers exact name matches
    /// over substring hits, which depends on rows this client has not seen.
    pub fn matches(&self, item: &InventoryItem) -> bool {
        let category = self.category.trim();
        if !category.is_empty() && !contains_ignore_case(&item.category, category) {
            return false;
        }

        let search = self.search_text.trim();
        if search.is_empty() {
            return true;
        }
        contains_ignore_case(&item.name, search) || contains_ignore_case(&item.sku, search)
    }
}

/// Parse a `field,direction` sort string such as `price,desc`.
pub fn parse_sort(value: &str) -> crate::error::Result<(SortField, SortOrder)> {
    let mut parts = value.splitn(2, ',');
    let field = parts.next().unwrap_or_default().parse::<SortField>()?;
    let order = match parts.next() {
        Some(order) => order.parse::<SortOrder>()?,
        None => SortOrder::Ascending,
    };
    Ok((field, order))
}

pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
