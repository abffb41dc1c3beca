//! Error types for the SoulCross paywall service
//!
//! This module provides the error type hierarchy using `thiserror`, plus the
//! translation of errors into HTTP responses at the axum boundary. Every
//! public operation recovers business-rule failures here and surfaces them as
//! a typed outcome (error code + message); no failure leaves the persisted
//! state partially updated.

use axum::response::{IntoResponse, Response};
use http::StatusCode;
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// The main error type for paywall operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or incomplete reading input
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Persistence errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Payment-provider or content-generation errors
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Inbound webhook rejection
    #[error("Webhook error: {0}")]
    Webhook(#[from] WebhookError),

    /// Unknown reading request id
    #[error("Reading request not found: {0}")]
    ReadingNotFound(String),

    /// Unknown order id
    #[error("Order not found: {0}")]
    OrderNotFound(String),
}

/// Reading-input validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    /// One or more mandatory fields were empty after sanitization
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// Request body could not be interpreted as reading input
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

/// Durable-store errors
///
/// A failed mutation never leaves a partial write behind: the snapshot is
/// swapped atomically, so callers must treat any of these as "no state
/// change occurred".
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem failure while loading or persisting the snapshot
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot could not be serialized
    #[error("Snapshot encoding failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Persisted snapshot could not be parsed
    #[error("Snapshot decoding failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// Referential integrity violation in the persisted state
    #[error("State corruption: {0}")]
    Corrupt(String),
}

/// Errors from external collaborators (payment provider, content generator)
///
/// All of these are retryable from the caller's point of view; no order or
/// reading state is committed when a provider call fails outright.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Transport-level failure reaching the provider
    #[error("Payment provider request failed: {0}")]
    Request(String),

    /// Provider returned a non-success HTTP status
    #[error("Payment provider returned HTTP {status}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body or error message
        message: String,
    },

    /// Provider call exceeded the configured deadline
    #[error("Payment provider call timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Content generation collaborator failed
    #[error("Content generation failed: {0}")]
    ContentGeneration(String),
}

/// Inbound webhook rejections; all of these fail closed
#[derive(Error, Debug)]
pub enum WebhookError {
    /// No `stripe-signature` header on the request
    #[error("Missing stripe-signature header")]
    MissingSignature,

    /// Signature header did not contain a timestamp and a v1 signature
    #[error("Malformed signature header: {0}")]
    MalformedSignature(String),

    /// HMAC verification failed
    #[error("Signature verification failed")]
    InvalidSignature,

    /// Signed timestamp outside the replay tolerance window
    #[error("Signature timestamp outside tolerance")]
    StaleTimestamp,

    /// Event body could not be parsed
    #[error("Invalid event payload: {0}")]
    InvalidPayload(String),
}

/// Result type alias for paywall operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Stable machine-readable code for the boundary response
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation_error",
            Error::Store(_) => "store_error",
            Error::Provider(_) => "provider_error",
            Error::Webhook(_) => "webhook_rejected",
            Error::ReadingNotFound(_) | Error::OrderNotFound(_) => "not_found",
        }
    }

    /// HTTP status this error maps to at the service boundary
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::Webhook(_) => StatusCode::BAD_REQUEST,
            Error::ReadingNotFound(_) | Error::OrderNotFound(_) => StatusCode::NOT_FOUND,
            Error::Provider(_) => StatusCode::BAD_GATEWAY,
            Error::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_names_missing_fields() {
        let err = Error::Validation(ValidationError::MissingFields(vec![
            "person_a.name",
            "person_b.birthday",
        ]));
        assert!(err
            .to_string()
            .contains("person_a.name, person_b.birthday"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "validation_error");
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let err = Error::ReadingNotFound("abc".to_string());
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_provider_error_is_retryable_gateway_failure() {
        let err = Error::Provider(ProviderError::Http {
            status: 503,
            message: "upstream down".to_string(),
        });
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_webhook_rejection_fails_closed() {
        let err = Error::Webhook(WebhookError::InvalidSignature);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "webhook_rejected");
    }
}
