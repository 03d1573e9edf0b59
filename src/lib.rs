#[macro_use]
mod macros;

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod query;
pub mod remote;
pub mod sync;
pub mod types;

pub use config::Config;
pub use error::{FieldError, FieldErrors, InventoryError, Result};
pub use query::{QueryState, SortField, SortOrder};
pub use remote::{HttpGateway, InMemoryGateway, InventoryGateway};
pub use sync::{FetchOutcome, InventoryController, PatchOutcome, RenderState};
pub use types::{InventoryItem, ItemId, KNOWN_CATEGORIES, Page};
