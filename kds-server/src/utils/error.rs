//! Unified error handling
//!
//! Application error taxonomy for the KDS core:
//!
//! | Variant | Meaning | HTTP |
//! |---------|---------|------|
//! | `InvalidTransition` | requested status is not the valid successor | 409 |
//! | `NotFound` | display order / room unknown | 404 |
//! | `Validation` | malformed request payload | 400 |
//! | `Persistence` | external status-update call failed | 502 |
//! | `Load` | snapshot fetch from the Orders API failed | 502 |
//! | `Channel` | channel transport failure (not HTTP-visible) | 500 |
//! | `Internal` | anything else | 500 |
//!
//! Nothing here is fatal to the process: a failed component never crashes
//! the whole display pipeline.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shared::OrderStatus;
use tracing::error;

use super::AppResponse;

/// 应用错误枚举
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Requested status skips, repeats or regresses the fixed sequence.
    /// Rejected locally: no network call made, no broadcast.
    #[error("Invalid status transition: {current} -> {requested}")]
    InvalidTransition {
        current: OrderStatus,
        requested: OrderStatus,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// External status-update call failed; the optimistic local update has
    /// been reverted and the order remains actionable for retry.
    #[error("Status persistence failed: {0}")]
    Persistence(String),

    /// Snapshot fetch failed; prior state is retained and the next poll
    /// tick retries automatically.
    #[error("Snapshot load failed: {0}")]
    Load(String),

    /// Channel transport failure - surfaced non-fatally, never interrupts
    /// polling.
    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::InvalidTransition { .. } => (StatusCode::CONFLICT, self.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Persistence(msg) => {
                error!(target: "orders_api", error = %msg, "Status persistence failed");
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::Load(msg) => {
                error!(target: "orders_api", error = %msg, "Snapshot load failed");
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::Channel(msg) => {
                error!(target: "channel", error = %msg, "Channel error surfaced over HTTP");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(AppResponse::<()>::error(message))).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}

/// 处理器的 Result 类型别名
pub type AppResult<T> = Result<T, AppError>;

/// Create a successful response
pub fn ok<T: serde::Serialize>(data: T) -> Json<AppResponse<T>> {
    Json(AppResponse::success(data))
}
