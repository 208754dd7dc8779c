//!
//! # Client Error Handling
//!
//! This module defines `ClientError`, the single failure type returned by every
//! public operation of the client. Callers never see a panic or an untyped error:
//! each failure path ends in one of the variants below.
//!
//! `ClientError` is `Clone` so that the outcome of a shared refresh exchange can be
//! handed to every request waiting on it. `From` implementations for `reqwest`,
//! `serde_json`, `validator`, `jsonwebtoken` and `std::io` errors allow the `?`
//! operator to be used throughout the crate.

use reqwest::StatusCode;
use serde_json::Value;
use validator::ValidationErrors;

/// Represents all possible failure conditions surfaced by the client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// The session can no longer be recovered: the refresh exchange failed or the
    /// refreshed credential was rejected as well. Credentials have been cleared and
    /// the caller should send the user back to the login surface.
    #[error("Session expired")]
    SessionExpired,
    /// A request that does not take part in the refresh protocol (login, registration)
    /// was rejected with HTTP 401.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// Loading the board failed; the previously loaded tasks are untouched.
    #[error("Fetch failed: {0}")]
    FetchFailed(String),
    /// A move named a status outside the four workflow columns.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
    /// The server rejected an optimistic move; the board has been rolled back.
    #[error("Move failed: {0}")]
    MoveFailed(String),
    /// Input rejected before any network call was made.
    #[error("Validation Error: {0}")]
    Validation(String),
    /// The requested task or resource does not exist (locally or on the server).
    #[error("Not Found: {0}")]
    NotFound(String),
    /// Any other non-success HTTP status, surfaced verbatim.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },
    /// No response was received (connection refused, timeout, DNS...).
    #[error("Network error: {0}")]
    Network(String),
    /// A response body could not be decoded into the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),
    /// The durable session storage could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),
    /// The client configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Builds the error for a non-success HTTP response.
    ///
    /// The body is inspected for a human-readable message (`detail`, `error`,
    /// `message`, `non_field_errors`, or the first field error); when none is
    /// present the raw body text is used.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = extract_message(body).unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            } else {
                body.trim().to_string()
            }
        });
        match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            _ => ClientError::Server {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// A human-readable message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::SessionExpired => "Your session has expired, please log in again".into(),
            ClientError::Server { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

fn extract_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;

    for key in ["detail", "error", "message"] {
        if let Some(text) = object.get(key).and_then(Value::as_str) {
            return Some(text.to_string());
        }
    }
    if let Some(first) = object
        .get("non_field_errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
        .and_then(Value::as_str)
    {
        return Some(first.to_string());
    }
    // DRF-style field errors: {"title": ["This field is required."]}
    object.iter().find_map(|(field, errors)| {
        errors
            .as_array()
            .and_then(|list| list.first())
            .and_then(Value::as_str)
            .map(|text| format!("{}: {}", field, text))
    })
}

/// Converts `reqwest::Error` into `ClientError`.
///
/// Failures to decode a body become `Decode`, everything else means no usable
/// response arrived and becomes `Network`.
impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> ClientError {
        if error.is_decode() {
            ClientError::Decode(error.to_string())
        } else {
            ClientError::Network(error.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(error: serde_json::Error) -> ClientError {
        ClientError::Decode(error.to_string())
    }
}

/// Converts `validator::ValidationErrors` into `ClientError::Validation`.
///
/// The detailed validation messages are preserved.
impl From<ValidationErrors> for ClientError {
    fn from(error: ValidationErrors) -> ClientError {
        ClientError::Validation(error.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for ClientError {
    fn from(error: jsonwebtoken::errors::Error) -> ClientError {
        ClientError::Decode(format!("Invalid token: {}", error))
    }
}

impl From<std::io::Error> for ClientError {
    fn from(error: std::io::Error) -> ClientError {
        ClientError::Storage(error.to_string())
    }
}
