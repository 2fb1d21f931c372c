//! Unified error type definition

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export library error type
pub use contas_backend::BackendError;

/// Which account write failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOperation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for WriteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// Field-scoped validation messages, keyed by field name.
///
/// Only the first message recorded for a field is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Errors with a single entry.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when empty, otherwise a [`CoreError::Validation`].
    pub fn into_result(self) -> CoreResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, message)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
        }
        Ok(())
    }
}

/// A backend row that does not have the shape of a bank account.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("column `{column}`: {reason}")]
pub struct DecodeError {
    pub column: String,
    pub reason: String,
}

impl DecodeError {
    pub fn new(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            reason: reason.into(),
        }
    }
}

/// Core layer error type
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Local input check failed; nothing was sent.
    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    /// Loading accounts failed
    #[error("Failed to load accounts: {0}")]
    RemoteRead(BackendError),

    /// The backend rejected a create, update or delete
    #[error("Failed to {operation} account: {source}")]
    RemoteWrite {
        operation: WriteOperation,
        source: BackendError,
    },

    /// Malformed account row
    #[error("Malformed account row: {0}")]
    Decode(#[from] DecodeError),

    /// An operation needs a signed-in user and there is none
    #[error("Not signed in")]
    NotAuthenticated,

    /// Sign-in or sign-out failed
    #[error("Authentication failed: {0}")]
    Auth(BackendError),
}

impl CoreError {
    /// Whether it is expected behavior (user input, missing row, bad password), used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    /// **Update this method when adding variants.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::Validation(_) | Self::NotAuthenticated => true,
            Self::RemoteRead(e) | Self::RemoteWrite { source: e, .. } | Self::Auth(e) => {
                e.is_expected()
            }
            Self::Decode(_) => false,
        }
    }

    /// Write error for `operation`.
    pub fn write(operation: WriteOperation, source: BackendError) -> Self {
        Self::RemoteWrite { operation, source }
    }

    /// The underlying backend failure, if any.
    pub fn backend_error(&self) -> Option<&BackendError> {
        match self {
            Self::RemoteRead(e) | Self::RemoteWrite { source: e, .. } | Self::Auth(e) => Some(e),
            _ => None,
        }
    }

    /// Whether a write lost against a concurrent change.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::RemoteWrite {
                source: BackendError::Conflict { .. },
                ..
            }
        )
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_keeps_first_message_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("description", "required");
        errors.add("description", "too long");
        errors.add("bank_code", "must be a whole number");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("description"), Some("required"));
        assert_eq!(
            errors.to_string(),
            "bank_code: must be a whole number; description: required"
        );
    }

    #[test]
    fn empty_validation_is_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
        let err = ValidationErrors::single("email", "required")
            .into_result()
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(err.is_expected());
    }

    #[test]
    fn write_error_display_names_operation() {
        let err = CoreError::write(
            WriteOperation::Delete,
            BackendError::NotFound {
                resource: "contas_bancarias id=9".to_string(),
                raw_message: None,
            },
        );
        assert_eq!(
            err.to_string(),
            "Failed to delete account: contas_bancarias id=9 not found"
        );
        assert!(err.is_expected());
        assert!(!err.is_conflict());
    }

    #[test]
    fn expected_follows_backend_classification() {
        let err = CoreError::RemoteRead(BackendError::Timeout {
            detail: "30s".to_string(),
        });
        assert!(!err.is_expected());
        assert!(!CoreError::Decode(DecodeError::new("id", "missing")).is_expected());
    }

    #[test]
    fn conflict_is_detected() {
        let err = CoreError::write(
            WriteOperation::Update,
            BackendError::Conflict {
                resource: "contas_bancarias id=1".to_string(),
                raw_message: None,
            },
        );
        assert!(err.is_conflict());
        assert!(err.backend_error().is_some());
    }

    #[test]
    fn serializes_with_code_and_details() {
        let err = CoreError::Validation(ValidationErrors::single("email", "required"));
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "Validation");
        assert_eq!(json["details"]["email"], "required");
    }
}
