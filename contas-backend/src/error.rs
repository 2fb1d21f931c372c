use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for every call made against the hosted backend.
///
/// Variants carry the raw message returned by the service when one exists so the
/// caller can surface it verbatim.
///
/// # Transient errors
///
/// [`Network`](Self::Network) and [`Timeout`](Self::Timeout) describe transport
/// failures. They are reported as-is: the client never retries on its own and
/// every failure requires the user to re-initiate the action.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "code")]
pub enum BackendError {
    /// A network-level error occurred (DNS resolution failure, connection refused, etc.).
    #[error("Network error: {detail}")]
    Network {
        /// Error details.
        detail: String,
    },

    /// The HTTP request timed out.
    #[error("Request timeout: {detail}")]
    Timeout {
        /// Error details.
        detail: String,
    },

    /// Missing, invalid or expired credentials (bad password, expired JWT).
    #[error("Unauthorized{}", suffix(.raw_message))]
    Unauthorized {
        /// Original error message from the service, if available.
        raw_message: Option<String>,
    },

    /// The authenticated user may not touch the requested rows (row-level security).
    #[error("Permission denied{}", suffix(.raw_message))]
    PermissionDenied {
        /// Original error message from the service, if available.
        raw_message: Option<String>,
    },

    /// The targeted row or resource does not exist.
    #[error("{resource} not found{}", suffix(.raw_message))]
    NotFound {
        /// What was looked up, e.g. `contas_bancarias id=7`.
        resource: String,
        /// Original error message from the service, if available.
        raw_message: Option<String>,
    },

    /// The write collides with existing data (unique violation or a stale precondition).
    #[error("Conflict on {resource}{}", suffix(.raw_message))]
    Conflict {
        /// Resource the write was aimed at.
        resource: String,
        /// Original error message from the service, if available.
        raw_message: Option<String>,
    },

    /// The service rejected the request as malformed (constraint or type violation).
    #[error("Invalid request: {raw_message}")]
    InvalidRequest {
        /// Raw error code from the service, if available.
        raw_code: Option<String>,
        /// Raw error message from the service.
        raw_message: String,
    },

    /// Failed to parse the service's response.
    #[error("Parse error: {detail}")]
    Parse {
        /// Details about the parse failure.
        detail: String,
    },

    /// Failed to serialize a request body.
    #[error("Serialization error: {detail}")]
    Serialization {
        /// Details about the serialization failure.
        detail: String,
    },

    /// An unrecognized error from the service.
    #[error("Backend error{}: {raw_message}", status_suffix(.status))]
    Unknown {
        /// HTTP status, if the error came from a response.
        status: Option<u16>,
        /// Raw error code, if available.
        raw_code: Option<String>,
        /// Raw error message.
        raw_message: String,
    },
}

fn suffix(raw_message: &Option<String>) -> String {
    raw_message
        .as_ref()
        .map(|msg| format!(": {msg}"))
        .unwrap_or_default()
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl BackendError {
    /// Whether the error is expected behavior (user input, missing row, etc.).
    ///
    /// `true` should be logged at `warn`, `false` at `error`.
    /// **Update this method when adding variants.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized { .. }
                | Self::PermissionDenied { .. }
                | Self::NotFound { .. }
                | Self::Conflict { .. }
                | Self::InvalidRequest { .. }
        )
    }

    /// Whether the failure happened before any response was received.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Timeout { .. })
    }
}

/// Convenience type alias for `Result<T, BackendError>`.
pub type Result<T> = std::result::Result<T, BackendError>;
