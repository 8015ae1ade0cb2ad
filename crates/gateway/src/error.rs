//! Unified error handling for the gateway.
//!
//! Taxonomy: authentication and validation problems are client errors;
//! a store that is absent *or* not owned by the requester is a plain 404;
//! an incomplete credential is a 400 with a configuration-shaped message,
//! never confused with an upstream outage; upstream failures on write
//! paths surface as 502. Read paths usually never get here, since they
//! degrade through [`crate::fallback`] first.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::directory::DirectoryError;
use crate::retry::RetryExhausted;
use crate::upstream::UpstreamError;

/// Application-level error type for gateway endpoints.
#[derive(Debug, Error)]
pub enum AppError {
    /// No valid tenant session.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Missing or invalid request parameter.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Resource absent, or owned by another tenant (indistinguishable).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Tenant directory operation failed.
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Upstream commerce platform operation failed.
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Retry budget exhausted on a retried mutation.
    #[error("Retry exhausted: {0}")]
    RetryExhausted(#[from] RetryExhausted<UpstreamError>),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Server-side failures go to Sentry
        if matches!(
            self,
            Self::Directory(_) | Self::Internal(_) | Self::RetryExhausted(_)
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Gateway request error"
            );
        }

        let status = match &self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream(e) if e.is_config() => StatusCode::BAD_REQUEST,
            Self::Upstream(_) | Self::RetryExhausted(_) => StatusCode::BAD_GATEWAY,
            Self::Directory(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Directory(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Upstream(e) if e.is_config() => e.to_string(),
            Self::Upstream(_) => "Upstream service error".to_string(),
            Self::RetryExhausted(e) => e.to_string(),
            _ => self.to_string(),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(status_of(AppError::Unauthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_of(AppError::BadRequest("Missing storeId".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::NotFound("Store not found".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Internal("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_config_error_is_bad_request_not_gateway_error() {
        let err = AppError::Upstream(UpstreamError::Config("API secret"));
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);

        let err = AppError::Upstream(UpstreamError::Status {
            status: 500,
            body: String::new(),
        });
        assert_eq!(status_of(err), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_internal_details_not_leaked() {
        let err = AppError::Internal("connection string postgres://user:pw@db".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        // Body is the generic message; details stay in the logs.
    }
}
