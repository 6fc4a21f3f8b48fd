//! API error handling module
//!
//! Provides a unified error type for all API endpoints with structured
//! error variants.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use cardvault_core::CardvaultError;

use crate::classifier::ClassifierError;
use crate::db::StoreError;

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request - client provided invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Not found - requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error - unexpected server-side failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Service unavailable - required service is not configured or available
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Core error - image policy or fingerprint violation
    #[error("Validation error: {0}")]
    Core(#[from] CardvaultError),

    /// Storage backend error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// External classifier error
    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a service unavailable error
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,

            // Image policy and fingerprint violations are the client's to fix,
            // except encode failures which are ours.
            Self::Core(CardvaultError::ThumbnailEncode(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Core(_) => StatusCode::BAD_REQUEST,

            Self::Store(ref e) => match e {
                StoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                StoreError::Connection(_) | StoreError::Migration(_) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                StoreError::Query(_) | StoreError::Serialization(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },

            // The classifier is an upstream dependency; its failures are not
            // the client's fault.
            Self::Classifier(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get the error code for programmatic error handling
    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Core(ref e) => match e {
                CardvaultError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
                CardvaultError::ImageDecode(_) => "IMAGE_DECODE_FAILED",
                CardvaultError::ImageTooLarge { .. } => "IMAGE_TOO_LARGE",
                CardvaultError::ImageTooSmall { .. } => "IMAGE_TOO_SMALL",
                CardvaultError::ThumbnailEncode(_) => "THUMBNAIL_ENCODE_FAILED",
                CardvaultError::EmptyFingerprint => "EMPTY_FINGERPRINT",
            },
            Self::Store(ref e) => match e {
                StoreError::InvalidInput(_) => "INVALID_INPUT",
                StoreError::Connection(_) | StoreError::Migration(_) => "STORE_UNAVAILABLE",
                StoreError::Query(_) | StoreError::Serialization(_) => "STORE_ERROR",
            },
            Self::Classifier(_) => "CLASSIFIER_UNAVAILABLE",
        }
    }

    /// Get sanitized error message for client response
    fn client_message(&self) -> String {
        match self {
            // Query text and connection strings stay out of responses.
            Self::Store(ref e) => match e {
                StoreError::InvalidInput(msg) => format!("Invalid input: {msg}"),
                StoreError::Connection(_) | StoreError::Migration(_) => {
                    "Storage unavailable".to_string()
                }
                StoreError::Query(_) | StoreError::Serialization(_) => {
                    "Storage error".to_string()
                }
            },
            Self::Classifier(_) => "Image classification unavailable".to_string(),
            _ => self.to_string(),
        }
    }

    /// Get the error category for logging
    fn error_category(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal",
            Self::ServiceUnavailable(_) => "service_unavailable",
            Self::Core(_) => "validation",
            Self::Store(_) => "store",
            Self::Classifier(_) => "classifier",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let category = self.error_category();
        let code = self.error_code();
        let internal_message = self.to_string();
        let client_message = self.client_message();

        // Log based on severity, always including internal details
        if status.is_client_error() {
            tracing::warn!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Client error"
            );
        } else {
            tracing::error!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Server error"
            );
        }

        // All error responses include a `code` field for programmatic
        // error handling
        let body = serde_json::json!({
            "error": client_message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_violations_are_client_errors() {
        let err = ApiError::from(CardvaultError::ImageTooLarge { size: 10, max: 5 });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "IMAGE_TOO_LARGE");
    }

    #[test]
    fn test_store_query_errors_are_sanitized() {
        let err = ApiError::from(StoreError::Query("SELECT secret FROM users".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.client_message(), "Storage error");
    }

    #[test]
    fn test_classifier_errors_are_service_unavailable() {
        let err = ApiError::from(ClassifierError::Request("connection refused".to_string()));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.error_code(), "CLASSIFIER_UNAVAILABLE");
    }
}
