//! Mutation coordination: per-item submission guard and reconciliation of
//! gateway results with the list store.

use std::collections::HashMap;

use crate::error::{InventoryError, Result};
use crate::types::{InventoryItem, ItemId};

use super::store::{ListStore, PatchOutcome};

/// Lifecycle of a mutation for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationPhase {
    #[default]
    Idle,
    Submitting,
    Settled,
    Failed,
}

/// Tracks which items have a mutation in flight.
#[derive(Debug, Default)]
pub struct MutationCoordinator {
    phases: HashMap<ItemId, MutationPhase>,
}

impl MutationCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `id` into `Submitting`, or reject if it already is.
    pub fn begin(&mut self, id: ItemId) -> Result<()> {
        if self.phase(id) == MutationPhase::Submitting {
            tracing::info!("rejecting mutation for item {id}: previous change still submitting");
            return Err(InventoryError::ConcurrentModification(id));
        }
        self.phases.insert(id, MutationPhase::Submitting);
        Ok(())
    }

    pub fn settle(&mut self, id: ItemId, succeeded: bool) {
        let phase = if succeeded {
            MutationPhase::Settled
        } else {
            MutationPhase::Failed
        };
        self.phases.insert(id, phase);
    }

    pub fn phase(&self, id: ItemId) -> MutationPhase {
        self.phases.get(&id).copied().unwrap_or_default()
    }

    /// Ids currently in `Submitting`, ascending.
    pub fn submitting(&self) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self
            .phases
            .iter()
            .filter(|(_, phase)| **phase == MutationPhase::Submitting)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }
}

/// What the controller must do after a mutation result was reconciled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub refetch: bool,
    /// User-facing message, if the mutation failed
    pub error: Option<String>,
}

impl Resolution {
    fn patched(outcome: PatchOutcome) -> Self {
        Self {
            refetch: outcome.needs_refetch(),
            error: None,
        }
    }

    fn failed(err: &InventoryError) -> Self {
        Self {
            refetch: false,
            error: Some(err.user_message()),
        }
    }
}

pub fn reconcile_create(store: &mut ListStore, result: &Result<InventoryItem>) -> Resolution {
    match result {
        Ok(created) => {
            let outcome = store.patch_insert(created);
            tracing::debug!("create patch: {outcome:?}");
            Resolution::patched(outcome)
        }
        Err(err) => Resolution::failed(err),
    }
}

pub fn reconcile_update(
    store: &mut ListStore,
    id: ItemId,
    result: &Result<InventoryItem>,
) -> Resolution {
    match result {
        Ok(updated) => {
            let outcome = store.patch_update(updated);
            tracing::debug!("update patch for item {id}: {outcome:?}");
            Resolution::patched(outcome)
        }
        Err(InventoryError::NotFound(_)) => {
            store.patch_remove(id);
            Resolution {
                refetch: true,
                error: Some(InventoryError::NotFound(id).user_message()),
            }
        }
        Err(err) => Resolution::failed(err),
    }
}

/// A delete of an item that is already gone counts as success.
pub fn reconcile_delete(store: &mut ListStore, id: ItemId, result: &Result<()>) -> Resolution {
    match result {
        Ok(()) | Err(InventoryError::NotFound(_)) => {
            let outcome = store.patch_remove(id);
            tracing::debug!("delete patch for item {id}: {outcome:?}");
            Resolution::default()
        }
        Err(err) => Resolution::failed(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryState;
    use crate::types::Page;

    fn item(id: i64, name: &str) -> InventoryItem {
        InventoryItem::new(name, format!("SKU-{id}"), 1, 5.0, "Books").with_id(ItemId(id))
    }

    fn loaded(items: Vec<InventoryItem>) -> ListStore {
        let mut store = ListStore::new();
        store.replace(Page::new(items, 1), QueryState::new());
        store
    }

    #[test]
    fn test_second_begin_is_rejected_while_submitting() {
        let mut coordinator = MutationCoordinator::new();
        coordinator.begin(ItemId(1)).unwrap();
        let err = coordinator.begin(ItemId(1)).unwrap_err();
        assert!(matches!(err, InventoryError::ConcurrentModification(ItemId(1))));
        // Other ids are independent
        coordinator.begin(ItemId(2)).unwrap();
        assert_eq!(coordinator.submitting(), vec![ItemId(1), ItemId(2)]);
    }

    #[test]
    fn test_settled_id_can_begin_again() {
        let mut coordinator = MutationCoordinator::new();
        assert_eq!(coordinator.phase(ItemId(3)), MutationPhase::Idle);
        coordinator.begin(ItemId(3)).unwrap();
        coordinator.settle(ItemId(3), false);
        assert_eq!(coordinator.phase(ItemId(3)), MutationPhase::Failed);
        coordinator.begin(ItemId(3)).unwrap();
        coordinator.settle(ItemId(3), true);
        assert_eq!(coordinator.phase(ItemId(3)), MutationPhase::Settled);
        assert!(coordinator.submitting().is_empty());
    }

    #[test]
    fn test_create_appends_when_safe() {
        let mut store = loaded(vec![item(1, "a")]);
        let resolution = reconcile_create(&mut store, &Ok(item(2, "b")));
        assert_eq!(resolution, Resolution::default());
        assert!(store.contains(ItemId(2)));
    }

    #[test]
    fn test_create_failure_leaves_list_unchanged() {
        let mut store = loaded(vec![item(1, "a")]);
        let resolution = reconcile_create(
            &mut store,
            &Err(InventoryError::Server("disk full".to_string())),
        );
        assert!(!resolution.refetch);
        assert!(resolution.error.unwrap().contains("disk full"));
        assert_eq!(store.page().unwrap().items.len(), 1);
    }

    #[test]
    fn test_update_changing_sort_value_requests_refetch() {
        let mut store = loaded(vec![item(1, "a"), item(2, "b")]);
        let resolution = reconcile_update(&mut store, ItemId(1), &Ok(item(1, "z")));
        assert!(resolution.refetch);
        assert!(resolution.error.is_none());
    }

    #[test]
    fn test_update_of_vanished_item_removes_and_refetches() {
        let mut store = loaded(vec![item(1, "a"), item(2, "b")]);
        let resolution = reconcile_update(
            &mut store,
            ItemId(2),
            &Err(InventoryError::NotFound(ItemId(2))),
        );
        assert!(resolution.refetch);
        assert!(resolution.error.unwrap().contains("no longer exists"));
        assert!(!store.contains(ItemId(2)));
    }

    #[test]
    fn test_delete_of_missing_item_is_silent() {
        let mut store = loaded(vec![item(5, "e")]);
        let resolution = reconcile_delete(
            &mut store,
            ItemId(5),
            &Err(InventoryError::NotFound(ItemId(5))),
        );
        assert_eq!(resolution, Resolution::default());
        assert!(!store.contains(ItemId(5)));
    }

    #[test]
    fn test_delete_transport_failure_keeps_item() {
        let mut store = loaded(vec![item(5, "e")]);
        let resolution = reconcile_delete(
            &mut store,
            ItemId(5),
            &Err(InventoryError::Transport("reset".to_string())),
        );
        assert!(resolution.error.is_some());
        assert!(store.contains(ItemId(5)));
    }
}
