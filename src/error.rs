use std::fmt;

use thiserror::Error;

use crate::types::ItemId;

/// A single field-level validation message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field the message refers to, when the server or validator named one
    pub field: Option<String>,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    pub fn general(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{field}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Validation messages passed through from the server or the local validator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(pub Vec<FieldError>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", joined.join("; "))
    }
}

#[derive(Error, Debug)]
pub enum InventoryError {
    // Gateway errors
    #[error("network error: {0}")]
    Transport(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    #[error("item {0} not found")]
    NotFound(ItemId),

    // Local guard
    #[error("item {0} already has a change in progress")]
    ConcurrentModification(ItemId),

    #[error("invalid sort field '{0}', expected one of: name, sku, quantity, price, category")]
    InvalidSortField(String),

    #[error("invalid sort order '{0}', expected 'asc' or 'desc'")]
    InvalidSortOrder(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl InventoryError {
    pub fn invalid_sort_field(value: String) -> Self {
        InventoryError::InvalidSortField(value)
    }

    pub fn invalid_sort_order(value: String) -> Self {
        InventoryError::InvalidSortOrder(value)
    }

    /// One-line message suitable for showing next to the list.
    pub fn user_message(&self) -> String {
        match self {
            InventoryError::Transport(_) => {
                "Could not reach the inventory service. Check your connection and try again."
                    .to_string()
            }
            InventoryError::Server(message) => {
                format!("The inventory service reported an error: {message}")
            }
            InventoryError::Validation(errors) => format!("Please fix the following: {errors}"),
            InventoryError::NotFound(_) => "This item no longer exists.".to_string(),
            InventoryError::ConcurrentModification(_) => {
                "This item is still being saved. Wait for the previous change to finish."
                    .to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, InventoryError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, InventoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_display() {
        let errors = FieldErrors(vec![
            FieldError::new("name", "Name is mandatory"),
            FieldError::general("Price must be non-negative"),
        ]);
        assert_eq!(
            errors.to_string(),
            "name: Name is mandatory; Price must be non-negative"
        );
    }

    #[test]
    fn test_user_message_hides_transport_details() {
        let err = InventoryError::Transport("tcp connect error: refused".to_string());
        let msg = err.user_message();
        assert!(msg.contains("Could not reach"));
        assert!(!msg.contains("refused"));
    }

    #[test]
    fn test_user_message_for_not_found() {
        let err = InventoryError::NotFound(ItemId(9));
        assert_eq!(err.user_message(), "This item no longer exists.");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_user_message_passes_server_message() {
        let err = InventoryError::Server("database unavailable".to_string());
        assert!(err.user_message().contains("database unavailable"));
    }
}
