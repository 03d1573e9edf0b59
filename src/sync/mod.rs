//! Client-side list synchronisation.
//!
//! - [`debounce`]: cancellable quiet-period timer
//! - [`fetch`]: request tokens and latest-wins resolution
//! - [`store`]: the visible page and its optimistic patches
//! - [`mutation`]: per-item submission guard and result reconciliation
//! - [`controller`]: ties the above to a gateway and publishes render state

pub mod controller;
pub mod debounce;
pub mod fetch;
pub mod mutation;
pub mod store;

pub use controller::{DEFAULT_DEBOUNCE, InventoryController, RenderState};
pub use debounce::Debouncer;
pub use fetch::{FetchController, FetchOutcome, RequestToken};
pub use mutation::{MutationCoordinator, MutationPhase};
pub use store::{ListStore, PatchOutcome};
