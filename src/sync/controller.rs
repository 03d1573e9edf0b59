//! The list sync controller.
//!
//! [`InventoryController`] owns the query, the fetch state, the list store and
//! the mutation coordinator behind a single lock. Intents mutate that state
//! synchronously and publish a fresh [`RenderState`]; network calls happen
//! outside the lock and their results are reconciled when they return.
//!
//! Query edits are debounced. Every fetch carries a [`RequestToken`] and only
//! the latest one may replace the visible page, so responses that arrive out
//! of order cannot regress the list.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::error::{InventoryError, Result};
use crate::query::{QueryState, SortField, SortOrder};
use crate::remote::InventoryGateway;
use crate::types::{InventoryItem, ItemId, Page};

use super::debounce::Debouncer;
use super::fetch::{FetchController, FetchOutcome, RequestToken};
use super::mutation::{
    MutationCoordinator, Resolution, reconcile_create, reconcile_delete, reconcile_update,
};
use super::store::ListStore;

/// Default quiet period between the last query edit and the fetch.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Everything a view needs to draw the list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderState {
    pub page: Option<Arc<Page>>,
    pub loading: bool,
    pub error: Option<String>,
    /// Current query, which may be ahead of the page while a fetch is pending
    pub query: QueryState,
    /// A debounced fetch is scheduled but has not started
    pub refresh_pending: bool,
    pub submitting: Vec<ItemId>,
}

impl RenderState {
    pub fn items(&self) -> &[InventoryItem] {
        self.page.as_deref().map_or(&[], |page| page.items.as_slice())
    }

    pub fn total_pages(&self) -> u32 {
        self.page.as_deref().map_or(0, |page| page.total_pages)
    }

    pub fn is_submitting(&self, id: ItemId) -> bool {
        self.submitting.contains(&id)
    }
}

#[derive(Debug, Default)]
struct ControllerState {
    query: QueryState,
    store: ListStore,
    fetch: FetchController,
    mutations: MutationCoordinator,
    /// Bumped on every schedule or cancel so a timer that already fired for
    /// an older edit cannot start a fetch
    debounce_generation: u64,
    refresh_pending: bool,
    creates_in_flight: usize,
}

impl ControllerState {
    fn render(&self) -> RenderState {
        RenderState {
            page: self.store.page(),
            loading: self.fetch.loading(),
            error: self.fetch.error().map(str::to_string),
            query: self.query.clone(),
            refresh_pending: self.refresh_pending,
            submitting: self.mutations.submitting(),
        }
    }

    fn is_idle(&self) -> bool {
        !self.refresh_pending
            && !self.fetch.loading()
            && self.creates_in_flight == 0
            && self.mutations.submitting().is_empty()
    }
}

struct Shared<G> {
    gateway: G,
    state: Mutex<ControllerState>,
    debouncer: Debouncer,
    render: watch::Sender<RenderState>,
}

impl<G: InventoryGateway> Shared<G> {
    fn publish(&self, state: &ControllerState) {
        self.render.send_replace(state.render());
    }

    /// Restart the debounce timer for the current query.
    fn schedule_fetch(self: &Arc<Self>, state: &mut ControllerState) {
        state.debounce_generation += 1;
        state.refresh_pending = true;
        let generation = state.debounce_generation;
        let query = state.query.clone();
        let weak: Weak<Self> = Arc::downgrade(self);

        self.debouncer.schedule(move || {
            if let Some(shared) = weak.upgrade() {
                shared.debounce_fired(generation, query);
            }
        });
    }

    fn debounce_fired(self: &Arc<Self>, generation: u64, query: QueryState) {
        let mut state = self.state.lock();
        if state.debounce_generation != generation {
            tracing::trace!("ignoring stale debounce timer");
            return;
        }
        state.refresh_pending = false;
        self.spawn_fetch(&mut state, query);
        self.publish(&state);
    }

    fn cancel_debounce(&self, state: &mut ControllerState) {
        state.debounce_generation += 1;
        state.refresh_pending = false;
        self.debouncer.cancel();
    }

    /// Issue a fetch for the current query right away, dropping any pending timer.
    fn refetch_now(self: &Arc<Self>, state: &mut ControllerState) {
        self.cancel_debounce(state);
        let query = state.query.clone();
        self.spawn_fetch(state, query);
    }

    fn spawn_fetch(self: &Arc<Self>, state: &mut ControllerState, query: QueryState) {
        let token = state.fetch.begin();
        tracing::debug!("fetch {token} issued for {}", describe(&query));

        let shared = Arc::clone(self);
        tokio::spawn(async move {
            let result = shared.gateway.list(&query).await;
            shared.finish_fetch(token, query, result);
        });
    }

    fn finish_fetch(
        &self,
        token: RequestToken,
        query: QueryState,
        result: Result<Page>,
    ) -> FetchOutcome {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let outcome = state.fetch.resolve(token, query, result, &mut state.store);
        if outcome != FetchOutcome::Superseded {
            self.publish(state);
        }
        outcome
    }

    /// Apply a reconciled mutation result and publish.
    ///
    /// A fetch still in flight was issued before the patch and would overwrite
    /// it, so a successful mutation then refetches as well.
    fn settle(self: &Arc<Self>, state: &mut ControllerState, resolution: Resolution) {
        let overtaken = resolution.error.is_none() && state.fetch.loading();
        match resolution.error {
            Some(message) => state.fetch.set_error(message),
            None => state.fetch.clear_error(),
        }
        if resolution.refetch || overtaken {
            self.refetch_now(state);
        }
        self.publish(state);
    }

    fn reject(&self, err: &InventoryError) {
        let mut state = self.state.lock();
        state.fetch.set_error(err.user_message());
        self.publish(&state);
    }
}

/// A submission that has been registered but not reconciled yet.
#[derive(Debug, Clone, Copy)]
enum InFlight {
    Create,
    Item(ItemId),
}

/// Releases a registered submission if its future is dropped before the
/// gateway answered, so the item does not stay locked.
struct SubmitGuard<'a, G: InventoryGateway> {
    shared: &'a Shared<G>,
    pending: Option<InFlight>,
}

impl<'a, G: InventoryGateway> SubmitGuard<'a, G> {
    fn new(shared: &'a Shared<G>, submission: InFlight) -> Self {
        Self {
            shared,
            pending: Some(submission),
        }
    }

    /// The gateway answered; the caller reconciles from here.
    fn disarm(mut self) {
        self.pending = None;
    }
}

impl<G: InventoryGateway> Drop for SubmitGuard<'_, G> {
    fn drop(&mut self) {
        let Some(submission) = self.pending.take() else {
            return;
        };
        tracing::debug!("{submission:?} dropped before the gateway answered");
        let mut state = self.shared.state.lock();
        match submission {
            InFlight::Create => {
                state.creates_in_flight = state.creates_in_flight.saturating_sub(1);
            }
            InFlight::Item(id) => state.mutations.settle(id, false),
        }
        self.shared.publish(&state);
    }
}

fn describe(query: &QueryState) -> String {
    format!(
        "search='{}' category='{}' sort={} page={} size={}",
        query.search_text(),
        query.category(),
        query.sort_param(),
        query.page_index(),
        query.page_size()
    )
}

/// Cheaply clonable handle; clones share one state.
pub struct InventoryController<G> {
    shared: Arc<Shared<G>>,
}

impl<G> Clone for InventoryController<G> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<G: InventoryGateway> InventoryController<G> {
    pub fn new(gateway: G, query: QueryState, debounce: Duration) -> Self {
        let state = ControllerState {
            query,
            ..ControllerState::default()
        };
        let (render, _) = watch::channel(state.render());

        Self {
            shared: Arc::new(Shared {
                gateway,
                state: Mutex::new(state),
                debouncer: Debouncer::new(debounce),
                render,
            }),
        }
    }

    pub fn with_default_debounce(gateway: G, query: QueryState) -> Self {
        Self::new(gateway, query, DEFAULT_DEBOUNCE)
    }

    pub fn gateway(&self) -> &G {
        &self.shared.gateway
    }

    pub fn snapshot(&self) -> RenderState {
        self.shared.render.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RenderState> {
        self.shared.render.subscribe()
    }

    pub fn query(&self) -> QueryState {
        self.shared.state.lock().query.clone()
    }

    /// Apply a query edit and restart the debounce timer when it changed anything.
    fn edit_query(&self, edit: impl FnOnce(&mut QueryState, Option<u32>) -> bool) -> bool {
        let mut state = self.shared.state.lock();
        let total_pages = state.store.total_pages();
        let changed = edit(&mut state.query, total_pages);
        if changed {
            self.shared.schedule_fetch(&mut state);
            self.shared.publish(&state);
        }
        changed
    }

    pub fn set_search_text(&self, text: impl Into<String>) -> bool {
        let text = text.into();
        self.edit_query(|query, _| query.set_search_text(text))
    }

    pub fn set_category(&self, category: impl Into<String>) -> bool {
        let category = category.into();
        self.edit_query(|query, _| query.set_category(category))
    }

    pub fn set_sort_field(&self, field: SortField) -> bool {
        self.edit_query(|query, _| query.set_sort_field(field))
    }

    pub fn set_sort_order(&self, order: SortOrder) -> bool {
        self.edit_query(|query, _| query.set_sort_order(order))
    }

    /// Column-header behaviour: flip the active column, or switch to a new one ascending.
    pub fn toggle_or_set_sort_order(&self, field: SortField) -> bool {
        self.edit_query(|query, _| {
            query.toggle_or_set_sort(field);
            true
        })
    }

    /// Move to a page, clamped to the last page of the loaded result.
    pub fn set_page_index(&self, page_index: u32) -> bool {
        self.edit_query(|query, total_pages| {
            let index = match total_pages {
                Some(total) if total > 0 => page_index.min(total - 1),
                _ => page_index,
            };
            query.set_page_index(index)
        })
    }

    pub fn set_page_size(&self, page_size: u32) -> bool {
        self.edit_query(|query, _| query.set_page_size(page_size))
    }

    /// Fetch the current query now, bypassing the debounce window.
    pub async fn refresh(&self) -> FetchOutcome {
        let (token, query) = {
            let mut state = self.shared.state.lock();
            self.shared.cancel_debounce(&mut state);
            let token = state.fetch.begin();
            let query = state.query.clone();
            tracing::debug!("fetch {token} issued for {}", describe(&query));
            self.shared.publish(&state);
            (token, query)
        };

        let result = self.shared.gateway.list(&query).await;
        self.shared.finish_fetch(token, query, result)
    }

    /// Create an item; the list is patched or refetched once the server answers.
    pub async fn submit_create(&self, item: InventoryItem) -> Result<InventoryItem> {
        if let Err(err) = item.validate() {
            self.shared.reject(&err);
            return Err(err);
        }

        {
            let mut state = self.shared.state.lock();
            state.creates_in_flight += 1;
        }
        let guard = SubmitGuard::new(&self.shared, InFlight::Create);

        let result = self.shared.gateway.create(&item).await;
        guard.disarm();

        let mut state = self.shared.state.lock();
        state.creates_in_flight -= 1;
        let resolution = reconcile_create(&mut state.store, &result);
        self.shared.settle(&mut state, resolution);
        result
    }

    /// Save changes to an existing item. Rejected while another change to the
    /// same item is still being submitted.
    pub async fn submit_update(&self, id: ItemId, item: InventoryItem) -> Result<InventoryItem> {
        if let Err(err) = item.validate() {
            self.shared.reject(&err);
            return Err(err);
        }
        self.begin_mutation(id)?;
        let guard = SubmitGuard::new(&self.shared, InFlight::Item(id));

        let result = self.shared.gateway.update(id, &item).await;
        guard.disarm();

        let mut state = self.shared.state.lock();
        state.mutations.settle(id, result.is_ok());
        let resolution = reconcile_update(&mut state.store, id, &result);
        self.shared.settle(&mut state, resolution);
        result
    }

    /// Delete an item. An item that is already gone counts as deleted.
    pub async fn submit_delete(&self, id: ItemId) -> Result<()> {
        self.begin_mutation(id)?;
        let guard = SubmitGuard::new(&self.shared, InFlight::Item(id));

        let result = match self.shared.gateway.delete(id).await {
            Err(InventoryError::NotFound(_)) => {
                tracing::debug!("item {id} was already deleted");
                Ok(())
            }
            other => other,
        };
        guard.disarm();

        let mut state = self.shared.state.lock();
        state.mutations.settle(id, result.is_ok());
        let resolution = reconcile_delete(&mut state.store, id, &result);
        self.shared.settle(&mut state, resolution);
        result
    }

    fn begin_mutation(&self, id: ItemId) -> Result<()> {
        let mut state = self.shared.state.lock();
        if let Err(err) = state.mutations.begin(id) {
            state.fetch.set_error(err.user_message());
            self.shared.publish(&state);
            return Err(err);
        }
        self.shared.publish(&state);
        Ok(())
    }

    pub fn is_idle(&self) -> bool {
        self.shared.state.lock().is_idle()
    }

    /// Wait until no timer is pending and no request is in flight.
    pub async fn wait_idle(&self) {
        let mut render = self.subscribe();
        loop {
            render.borrow_and_update();
            if self.is_idle() {
                return;
            }
            if render.changed().await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::InMemoryGateway;

    fn controller() -> InventoryController<Arc<InMemoryGateway>> {
        let gateway = Arc::new(InMemoryGateway::sample());
        InventoryController::new(gateway, QueryState::new().with_page_size(5), DEFAULT_DEBOUNCE)
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_loads_first_page() {
        let controller = controller();
        assert!(controller.snapshot().page.is_none());

        assert_eq!(controller.refresh().await, FetchOutcome::Applied);
        let render = controller.snapshot();
        assert_eq!(render.items().len(), 5);
        assert_eq!(render.total_pages(), 3);
        assert!(!render.loading);
        assert!(render.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_edit_marks_refresh_pending() {
        let controller = controller();
        assert!(controller.set_search_text("desk"));
        let render = controller.snapshot();
        assert!(render.refresh_pending);
        assert_eq!(render.query.search_text(), "desk");

        controller.wait_idle().await;
        let render = controller.snapshot();
        assert!(!render.refresh_pending);
        assert_eq!(render.items().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_edit_does_not_schedule() {
        let controller = controller();
        assert!(!controller.set_category(""));
        assert!(!controller.snapshot().refresh_pending);
        assert!(controller.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_index_is_clamped_to_last_page() {
        let controller = controller();
        controller.refresh().await;
        controller.set_page_index(9);
        assert_eq!(controller.query().page_index(), 2);
        controller.wait_idle().await;
        assert_eq!(controller.snapshot().items().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sort_toggle_reports_change() {
        let controller = controller();
        assert!(controller.toggle_or_set_sort_order(SortField::Name));
        assert_eq!(controller.query().sort_order(), SortOrder::Descending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_submission_releases_item() {
        let gateway = Arc::new(InMemoryGateway::sample());
        gateway.set_latency(Some(Duration::from_millis(500)));
        let controller =
            InventoryController::new(Arc::clone(&gateway), QueryState::new(), DEFAULT_DEBOUNCE);

        let item = InventoryItem::new("Toaster", "AP-302", 1, 34.0, "Appliances");
        let dropped = tokio::time::timeout(
            Duration::from_millis(100),
            controller.submit_update(ItemId(9), item),
        )
        .await;
        assert!(dropped.is_err());
        assert!(controller.snapshot().submitting.is_empty());
        assert!(controller.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_validation_failure_is_surfaced_without_request() {
        let controller = controller();
        let invalid = InventoryItem::new("", "SKU", 1, 1.0, "Books");
        let err = controller.submit_create(invalid).await.unwrap_err();
        assert!(matches!(err, InventoryError::Validation(_)));
        assert!(controller.snapshot().error.is_some());
        assert_eq!(controller.gateway().len(), 12);
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_mutation_clears_error() {
        let controller = controller();
        controller.refresh().await;
        let _ = controller
            .submit_create(InventoryItem::new("", "x", 1, 1.0, "Books"))
            .await;
        assert!(controller.snapshot().error.is_some());

        let first = controller.snapshot().items()[0].clone();
        let id = first.id.unwrap();
        let mut edited = first.clone();
        edited.quantity += 1;
        controller.submit_update(id, edited).await.unwrap();
        let render = controller.snapshot();
        assert!(render.error.is_none());
        assert_eq!(render.items()[0].quantity, first.quantity + 1);
    }
}
