// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("No soil data provider available: {0}")]
    ProviderNotFound(String),

    #[error("Map unit not found: {0}")]
    MapUnitNotFound(String),

    #[error("Soil data service timed out after {0} seconds")]
    Timeout(u64),

    #[error("Soil data service error (HTTP {status}): {body}")]
    RemoteService { status: u16, body: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Status used for transport failures that never produced an HTTP response.
    pub const NO_RESPONSE_STATUS: u16 = 0;

    /// Whether this error came from the remote soil service (timeout or bad response).
    pub fn is_remote_failure(&self) -> bool {
        matches!(self, AppError::Timeout(_) | AppError::RemoteService { .. })
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::ProviderNotFound(msg) => (
                StatusCode::NOT_FOUND,
                "provider_not_found",
                Some(msg.clone()),
            ),
            AppError::MapUnitNotFound(mukey) => (
                StatusCode::NOT_FOUND,
                "map_unit_not_found",
                Some(format!("Map unit {} not found", mukey)),
            ),
            AppError::Timeout(secs) => {
                tracing::warn!(timeout_secs = secs, "Soil data service timed out");
                (StatusCode::GATEWAY_TIMEOUT, "soil_service_timeout", None)
            }
            AppError::RemoteService { status, body } => {
                tracing::error!(status, body = %body, "Soil data service error");
                (
                    StatusCode::BAD_GATEWAY,
                    "soil_service_error",
                    Some(format!("Upstream returned HTTP {}", status)),
                )
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
