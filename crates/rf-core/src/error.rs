//! # Errors
//!
//! Centralized error handling for the Rusty-Forum client.
//! `ApiError` is what the backend port reports; `AppError` is everything the
//! client may surface through its notification slot.

use thiserror::Error;

/// Shown instead of transport details when the backend cannot be reached.
pub const NETWORK_FAILURE_MESSAGE: &str = "Could not reach the forum server. Please try again.";

/// How a failure is handled by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The request could not complete. Never fatal, screen stays as it was.
    NetworkFailure,
    /// The bearer token was refused. Triggers an implicit logout.
    AuthRejected,
    /// The backend rejected the request with a detail message.
    ValidationRejected,
    /// Missing ownership or admin rights.
    PermissionDenied,
}

/// Structured failure of a backend call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Transport failure (connection refused, reset, DNS, ...).
    #[error("network failure: {0}")]
    Network(String),

    /// 401 on an authenticated call.
    #[error("{0}")]
    AuthRejected(String),

    /// 403 from the backend.
    #[error("{0}")]
    PermissionDenied(String),

    /// Any other non-success status carrying a detail message.
    #[error("{detail}")]
    Rejected { status: u16, detail: String },

    /// The response body did not match the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Maps an HTTP status and the backend's detail text onto the taxonomy.
    pub fn from_status(status: u16, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match status {
            401 => Self::AuthRejected(detail),
            403 => Self::PermissionDenied(detail),
            _ => Self::Rejected { status, detail },
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Network(_) | Self::Decode(_) => ErrorCategory::NetworkFailure,
            Self::AuthRejected(_) => ErrorCategory::AuthRejected,
            Self::PermissionDenied(_) => ErrorCategory::PermissionDenied,
            Self::Rejected { .. } => ErrorCategory::ValidationRejected,
        }
    }

    /// Text for the notification slot. Backend details are passed through
    /// verbatim; transport errors get a generic message.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) | Self::Decode(_) => NETWORK_FAILURE_MESSAGE.to_string(),
            Self::AuthRejected(detail) | Self::PermissionDenied(detail) => detail.clone(),
            Self::Rejected { detail, .. } => detail.clone(),
        }
    }
}

/// The primary error type for client operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// The backend (or the way to it) failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Input rejected before any request was issued.
    #[error("validation error: {0}")]
    Validation(String),

    /// Action refused by the local permission pre-check.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Durable token storage failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// A screen could not be rendered.
    #[error("render error: {0}")]
    Render(String),
}

impl AppError {
    /// Text for the notification slot.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) => err.user_message(),
            Self::Validation(msg) | Self::Unauthorized(msg) => msg.clone(),
            Self::Storage(_) => "Could not update the saved session.".to_string(),
            Self::Render(_) => "Could not display this page.".to_string(),
        }
    }

    /// True when the backend refused our token.
    pub fn is_auth_rejected(&self) -> bool {
        matches!(self, Self::Api(ApiError::AuthRejected(_)))
    }
}

/// A specialized Result type for client logic.
pub type Result<T> = std::result::Result<T, AppError>;

/// Result of a single backend call.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_taxonomy() {
        assert_eq!(ApiError::from_status(401, "x").category(), ErrorCategory::AuthRejected);
        assert_eq!(ApiError::from_status(403, "x").category(), ErrorCategory::PermissionDenied);
        assert_eq!(ApiError::from_status(404, "x").category(), ErrorCategory::ValidationRejected);
        assert_eq!(ApiError::from_status(409, "x").category(), ErrorCategory::ValidationRejected);
        assert_eq!(ApiError::Network("refused".into()).category(), ErrorCategory::NetworkFailure);
    }

    #[test]
    fn backend_detail_is_surfaced_verbatim() {
        let err = AppError::from(ApiError::from_status(400, "Username already registered"));
        assert_eq!(err.user_message(), "Username already registered");
    }

    #[test]
    fn network_failure_hides_transport_details() {
        let err = AppError::from(ApiError::Network("tcp connect error: refused".into()));
        assert_eq!(err.user_message(), NETWORK_FAILURE_MESSAGE);
    }
}
