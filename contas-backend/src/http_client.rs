//! Generic HTTP client tools
//!
//! Sending, logging and error mapping shared by the data and auth endpoints.
//! Each endpoint builds its own `RequestBuilder` (URL, headers, body); this module
//! only runs it and turns the outcome into a status/body pair or a [`BackendError`].
//!
//! Nothing here retries: a failed call is reported to the caller immediately.

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::BackendError;
use crate::utils::log_sanitizer::truncate_for_log;

/// HTTP tool function set
pub struct HttpUtils;

impl HttpUtils {
    /// Performs an HTTP request and returns the status code and response text.
    ///
    /// # Arguments
    /// * `request_builder` - configured request (URL, headers, body)
    /// * `method_name` - request method name, for logs
    /// * `target` - URL or logical endpoint name, for logs
    ///
    /// # Errors
    /// * `BackendError::Timeout` - the request timed out
    /// * `BackendError::Network` - connection failure or unreadable body
    pub async fn execute_request(
        request_builder: RequestBuilder,
        method_name: &str,
        target: &str,
    ) -> Result<(u16, String), BackendError> {
        log::debug!("{method_name} {target}");

        let response = request_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout {
                    detail: e.to_string(),
                }
            } else {
                BackendError::Network {
                    detail: e.to_string(),
                }
            }
        })?;

        let status_code = response.status().as_u16();
        log::debug!("Response Status: {status_code}");

        let response_text = response.text().await.map_err(|e| BackendError::Network {
            detail: format!("Failed to read response body: {e}"),
        })?;

        log::debug!("Response Body: {}", truncate_for_log(&response_text));

        Ok((status_code, response_text))
    }

    /// Runs a request and requires a 2xx status, mapping anything else through
    /// [`error_from_response`].
    pub async fn execute_expecting_success(
        request_builder: RequestBuilder,
        method_name: &str,
        target: &str,
        resource: &str,
    ) -> Result<String, BackendError> {
        let (status, body) = Self::execute_request(request_builder, method_name, target).await?;
        if (200..300).contains(&status) {
            return Ok(body);
        }
        let err = error_from_response(status, &body, resource);
        if err.is_expected() {
            log::warn!("{method_name} {target} failed: {err}");
        } else {
            log::error!("{method_name} {target} failed: {err}");
        }
        Err(err)
    }

    /// Parse a JSON response.
    ///
    /// # Errors
    /// `BackendError::Parse` when the text is not valid JSON for `T`.
    pub fn parse_json<T>(response_text: &str) -> Result<T, BackendError>
    where
        T: DeserializeOwned,
    {
        serde_json::from_str(response_text).map_err(|e| {
            log::error!("JSON parse failed: {e}");
            log::error!("Raw response: {}", truncate_for_log(response_text));
            BackendError::Parse {
                detail: e.to_string(),
            }
        })
    }
}

/// Error payloads of both services, flattened.
///
/// Data service: `{"code":"23505","message":"...","details":"...","hint":null}`.
/// Auth service: `{"error":"invalid_grant","error_description":"..."}` or
/// `{"code":400,"error_code":"invalid_credentials","msg":"..."}`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    code: Option<Value>,
    error_code: Option<String>,
    error: Option<String>,
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
}

impl ErrorBody {
    fn code(&self) -> Option<String> {
        self.error_code
            .clone()
            .or_else(|| match &self.code {
                Some(Value::String(s)) => Some(s.clone()),
                _ => None,
            })
            .or_else(|| self.error.clone())
    }

    fn message(&self) -> Option<String> {
        self.message
            .clone()
            .or_else(|| self.msg.clone())
            .or_else(|| self.error_description.clone())
            .or_else(|| self.error.clone())
    }
}

/// Map a non-success response onto the error taxonomy.
///
/// Service error codes win over the HTTP status because the auth service reports
/// bad credentials as a plain 400.
pub fn error_from_response(status: u16, body: &str, resource: &str) -> BackendError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let raw_code = parsed.code();
    let raw_message = parsed
        .message()
        .or_else(|| (!body.trim().is_empty()).then(|| truncate_for_log(body)));

    match raw_code.as_deref() {
        Some("PGRST116") => {
            return BackendError::NotFound {
                resource: resource.to_string(),
                raw_message,
            }
        }
        Some("23505") => {
            return BackendError::Conflict {
                resource: resource.to_string(),
                raw_message,
            }
        }
        Some("42501") => return BackendError::PermissionDenied { raw_message },
        Some(
            "PGRST301" | "PGRST302" | "invalid_grant" | "invalid_credentials" | "bad_jwt"
            | "session_not_found",
        ) => return BackendError::Unauthorized { raw_message },
        _ => {}
    }

    match status {
        401 => BackendError::Unauthorized { raw_message },
        403 => BackendError::PermissionDenied { raw_message },
        404 => BackendError::NotFound {
            resource: resource.to_string(),
            raw_message,
        },
        409 => BackendError::Conflict {
            resource: resource.to_string(),
            raw_message,
        },
        400 | 422 => BackendError::InvalidRequest {
            raw_code,
            raw_message: raw_message.unwrap_or_else(|| format!("HTTP {status}")),
        },
        502..=504 => BackendError::Network {
            detail: format!(
                "HTTP {status}: {}",
                raw_message.unwrap_or_default()
            ),
        },
        _ => BackendError::Unknown {
            status: Some(status),
            raw_code,
            raw_message: raw_message.unwrap_or_else(|| format!("HTTP {status}")),
        },
    }
}
