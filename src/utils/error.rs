use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::app::event::ApiResponse;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure outside the request's control, e.g. the database went away.
/// Never shown to the client beyond a generic message.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
}

/// Semantic app error, rendered as `{"error": message}` with the standard headers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppError {
    MethodNotAllowed,
    PromoCodeRequired,
    MessageRequired,
    ResponseRequired,
    InvalidBody,
    MessageNotFound,
    NotConfigured,
}

impl AppError {
    pub fn message(&self) -> &'static str {
        match self {
            AppError::MethodNotAllowed => "Method not allowed",
            AppError::PromoCodeRequired => "Promo code is required",
            AppError::MessageRequired => "Message is required",
            AppError::ResponseRequired => "ID and admin_response are required",
            AppError::InvalidBody => "Invalid request body",
            AppError::MessageNotFound => "Message not found",
            AppError::NotConfigured => "Database connection not configured",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::PromoCodeRequired
            | AppError::MessageRequired
            | AppError::ResponseRequired
            | AppError::InvalidBody => StatusCode::BAD_REQUEST,
            AppError::MessageNotFound => StatusCode::NOT_FOUND,
            AppError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.message().fmt(f)
    }
}

/// Errors that escape a handler end up here, in the HTTP adapter.
impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("{self}");
        ApiResponse::json(
            StatusCode::INTERNAL_SERVER_ERROR,
            &serde_json::json!({"error": "Internal server error."}),
        )
        .into_response()
    }
}
