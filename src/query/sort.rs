//! Sort keys for inventory items.
//!
//! The server orders pages; these comparators reproduce that order locally so
//! the list store can tell whether an optimistic insert would land in place,
//! and so the in-memory gateway can honour the same contract.

use std::cmp::Ordering;

use unicase::UniCase;

use crate::types::InventoryItem;

/// Column a list can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortField {
    #[default]
    Name,
    Sku,
    Quantity,
    Price,
    Category,
}

enum_display_fromstr!(
    SortField,
    crate::error::InventoryError::invalid_sort_field,
    {
        Name => "name",
        Sku => "sku",
        Quantity => "quantity",
        Price => "price",
        Category => "category",
    }
);

/// Direction of a sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

enum_display_fromstr!(
    SortOrder,
    crate::error::InventoryError::invalid_sort_order,
    {
        Ascending => "asc",
        Descending => "desc",
    }
);

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }

    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}

impl SortField {
    /// Compare two items by this field only, ascending.
    pub fn compare(self, a: &InventoryItem, b: &InventoryItem) -> Ordering {
        match self {
            SortField::Name => UniCase::new(a.name.as_str()).cmp(&UniCase::new(b.name.as_str())),
            SortField::Sku => UniCase::new(a.sku.as_str()).cmp(&UniCase::new(b.sku.as_str())),
            SortField::Quantity => a.quantity.cmp(&b.quantity),
            SortField::Price => a.price.total_cmp(&b.price),
            SortField::Category => {
                UniCase::new(a.category.as_str()).cmp(&UniCase::new(b.category.as_str()))
            }
        }
    }

    /// Whether two versions of an item hold the same value for this field.
    pub fn same_value(self, a: &InventoryItem, b: &InventoryItem) -> bool {
        match self {
            SortField::Name => a.name == b.name,
            SortField::Sku => a.sku == b.sku,
            SortField::Quantity => a.quantity == b.quantity,
            SortField::Price => a.price == b.price,
            SortField::Category => a.category == b.category,
        }
    }
}

/// Full ordering used for lists: the sort field, then id as a stable tie-break.
pub fn compare_items(
    a: &InventoryItem,
    b: &InventoryItem,
    field: SortField,
    order: SortOrder,
) -> Ordering {
    order.apply(field.compare(a, b).then_with(|| a.id.cmp(&b.id)))
}

/// Sort items in place by the given field and order
pub fn sort_items_by(items: &mut [InventoryItem], field: SortField, order: SortOrder) {
    items.sort_by(|a, b| compare_items(a, b, field, order));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemId;

    fn item(id: i64, name: &str, price: f64) -> InventoryItem {
        InventoryItem::new(name, format!("SKU-{id}"), id as u32, price, "Books").with_id(ItemId(id))
    }

    #[test]
    fn test_sort_by_name_then_toggle() {
        let mut items = vec![item(1, "B", 1.0), item(2, "A", 1.0)];

        sort_items_by(&mut items, SortField::Name, SortOrder::Ascending);
        assert_eq!(items[0].id, Some(ItemId(2)));
        assert_eq!(items[1].id, Some(ItemId(1)));

        sort_items_by(&mut items, SortField::Name, SortOrder::Ascending.flipped());
        assert_eq!(items[0].id, Some(ItemId(1)));
        assert_eq!(items[1].id, Some(ItemId(2)));
    }

    #[test]
    fn test_name_sort_ignores_case() {
        let mut items = vec![item(1, "banana", 1.0), item(2, "Apple", 1.0)];
        sort_items_by(&mut items, SortField::Name, SortOrder::Ascending);
        assert_eq!(items[0].name, "Apple");
    }

    #[test]
    fn test_price_sort_with_ties_uses_id() {
        let mut items = vec![item(3, "c", 2.0), item(1, "a", 2.0), item(2, "b", 0.5)];
        sort_items_by(&mut items, SortField::Price, SortOrder::Ascending);
        let ids: Vec<_> = items.iter().map(|i| i.id.unwrap().get()).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_same_value() {
        let a = item(1, "a", 2.0);
        let mut b = a.clone();
        b.quantity = 99;
        assert!(SortField::Name.same_value(&a, &b));
        assert!(!SortField::Quantity.same_value(&a, &b));
    }

    #[test]
    fn test_parse_sort_field_and_order() {
        assert_eq!("Price".parse::<SortField>().unwrap(), SortField::Price);
        assert!("colour".parse::<SortField>().is_err());
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Descending);
        assert_eq!(SortOrder::Descending.to_string(), "desc");
    }
}
