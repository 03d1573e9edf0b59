//! Fetch state: request tokens, loading flag and the last fetch error.
//!
//! Every fetch is tagged with a monotonically increasing token. Only the
//! response carrying the latest token may touch the list store, so the
//! visible page always belongs to the most recently issued query no matter in
//! which order responses arrive.

use std::fmt;

use crate::error::{InventoryError, Result};
use crate::query::QueryState;
use crate::types::Page;

use super::store::ListStore;

/// Identifier minted per fetch, used to discard superseded responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What happened to a fetch response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page was written to the store
    Applied,
    /// A newer request was issued; the response was dropped
    Superseded,
    /// The latest request failed; the stale page was kept
    Failed(String),
}

#[derive(Debug, Default)]
pub struct FetchController {
    issued: u64,
    latest: Option<RequestToken>,
    loading: bool,
    error: Option<String>,
}

impl FetchController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a token for a new request and mark it as the latest.
    pub fn begin(&mut self) -> RequestToken {
        self.issued += 1;
        let token = RequestToken(self.issued);
        self.latest = Some(token);
        self.loading = true;
        token
    }

    pub fn is_latest(&self, token: RequestToken) -> bool {
        self.latest == Some(token)
    }

    pub fn latest(&self) -> Option<RequestToken> {
        self.latest
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Record a message produced outside a fetch, e.g. a failed mutation.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Apply a response for `token` that was issued for `query`.
    pub fn resolve(
        &mut self,
        token: RequestToken,
        query: QueryState,
        result: Result<Page>,
        store: &mut ListStore,
    ) -> FetchOutcome {
        if !self.is_latest(token) {
            tracing::debug!("discarding superseded fetch {token}");
            return FetchOutcome::Superseded;
        }

        self.loading = false;
        match result {
            Ok(page) => {
                tracing::debug!(
                    "fetch {token} applied: {} items, {} pages",
                    page.items.len(),
                    page.total_pages
                );
                store.replace(page, query);
                self.error = None;
                FetchOutcome::Applied
            }
            Err(err) => {
                tracing::warn!("fetch {token} failed: {err}");
                let message = fetch_error_message(&err);
                self.error = Some(message.clone());
                FetchOutcome::Failed(message)
            }
        }
    }
}

fn fetch_error_message(err: &InventoryError) -> String {
    format!("Failed to load inventory. {}", err.user_message())
}
