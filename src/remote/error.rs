//! Error normalisation for gateway responses.
//!
//! Converts HTTP statuses, response bodies and transport failures into the
//! `InventoryError` taxonomy so every gateway reports failures the same way.

use std::fmt;

use serde::Deserialize;

use crate::error::{FieldError, FieldErrors, InventoryError};
use crate::types::ItemId;

/// Gateway operation a failure belongs to.
///
/// The same status means different things per operation: a 404 from `list`
/// is a server fault, a 404 from `update` means the item was deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Get(ItemId),
    Create,
    Update(ItemId),
    Delete(ItemId),
}

impl Operation {
    fn target(self) -> Option<ItemId> {
        match self {
            Operation::Get(id) | Operation::Update(id) | Operation::Delete(id) => Some(id),
            Operation::List | Operation::Create => None,
        }
    }

    fn accepts_validation(self) -> bool {
        matches!(self, Operation::Create | Operation::Update(_))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::List => write!(f, "list"),
            Operation::Get(id) => write!(f, "get {id}"),
            Operation::Create => write!(f, "create"),
            Operation::Update(id) => write!(f, "update {id}"),
            Operation::Delete(id) => write!(f, "delete {id}"),
        }
    }
}

/// Non-2xx response from the backend.
#[derive(Debug)]
pub struct ApiError {
    pub operation: Operation,
    pub status: reqwest::StatusCode,
    /// Raw response body, possibly empty
    pub body: String,
}

/// Shapes of error bodies the backend is known to return.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorEntry {
    #[serde(default)]
    field: Option<String>,
    #[serde(default)]
    default_message: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ApiError {
    pub fn new(operation: Operation, status: reqwest::StatusCode, body: impl Into<String>) -> Self {
        Self {
            operation,
            status,
            body: body.into(),
        }
    }

    /// Human-readable message extracted from the body, falling back to the status reason.
    pub fn message(&self) -> String {
        let parsed: Option<ErrorBody> = serde_json::from_str(&self.body).ok();
        if let Some(body) = &parsed {
            if let Some(message) = body.message.as_deref().filter(|m| !m.trim().is_empty()) {
                return message.to_string();
            }
            if let Some(error) = body.error.as_deref().filter(|m| !m.trim().is_empty()) {
                return error.to_string();
            }
        }

        let raw = self.body.trim();
        if !raw.is_empty() && parsed.is_none() {
            return raw.to_string();
        }

        format!(
            "{} {}",
            self.status.as_u16(),
            self.status.canonical_reason().unwrap_or("Unknown")
        )
    }

    /// Field-level messages, one per rejected field.
    pub fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();

        if let Ok(body) = serde_json::from_str::<ErrorBody>(&self.body) {
            for entry in body.errors {
                let Some(message) = entry.default_message.or(entry.message) else {
                    continue;
                };
                errors.push(FieldError {
                    field: entry.field,
                    message,
                });
            }
        }

        if errors.is_empty() {
            errors.push(FieldError::general(self.message()));
        }
        errors
    }

    pub fn into_inventory_error(self) -> InventoryError {
        let status = self.status;

        if status == reqwest::StatusCode::NOT_FOUND
            && let Some(id) = self.operation.target()
        {
            return InventoryError::NotFound(id);
        }

        if status.is_client_error() && self.operation.accepts_validation() {
            return InventoryError::Validation(self.field_errors());
        }

        InventoryError::Server(format!("{} failed: {}", self.operation, self.message()))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} returned {}: {}", self.operation, self.status, self.message())
    }
}

impl From<ApiError> for InventoryError {
    fn from(error: ApiError) -> Self {
        error.into_inventory_error()
    }
}

/// Classify a reqwest failure that happened before a usable response arrived.
pub fn transport_error(operation: Operation, err: reqwest::Error) -> InventoryError {
    if err.is_decode() {
        return InventoryError::Server(format!("{operation} returned a malformed response: {err}"));
    }
    if err.is_timeout() {
        return InventoryError::Transport(format!("{operation} timed out"));
    }
    InventoryError::Transport(format!("{operation} failed: {err}"))
}
