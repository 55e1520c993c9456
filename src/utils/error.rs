use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::store::StoreError;
use crate::utils::response::error as error_response;

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid fields: {}", describe_fields(.0))]
    InvalidFields(Vec<FieldError>),

    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Covers both missing records and records owned by someone else.
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Store error")]
    StoreError(#[from] StoreError),
}

fn describe_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{} {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidFields(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) | AppError::InvalidFields(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::StoreError(_) => "STORE_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::ValidationError(msg) => debug!(message = %msg, "Rejected request"),
            AppError::InvalidFields(fields) => debug!(?fields, "Rejected request fields"),
            AppError::AuthError(msg) => warn!(message = %msg, "Unauthenticated request"),
            AppError::NotFound(msg) => debug!(message = %msg, "Resource not found"),
            AppError::StoreError(e) => error!(error = ?e, "Store error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Log internal details
        self.log();

        // Only expose high-level message to the client
        let (public_message, details) = match &self {
            AppError::ValidationError(msg) | AppError::AuthError(msg) | AppError::NotFound(msg) => {
                (msg.clone(), None)
            }
            AppError::InvalidFields(fields) => (
                format!("Invalid or missing fields: {}", describe_fields(fields)),
                serde_json::to_value(fields).ok(),
            ),
            AppError::StoreError(_) => ("Internal Server Error".to_string(), None),
        };

        error_response(code, public_message, details, status)
    }
}
