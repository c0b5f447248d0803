// src/error.rs
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

// --- Error Handling ---

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Nieprawidłowy format pliku CSV: {0}")]
    Format(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Invalid range for group '{group}': {reason}")]
    InvalidRange { group: String, reason: String },
    #[error("Invalid color '{value}' for group '{group}'")]
    InvalidColor { group: String, value: String },
    #[error("Invalid month: {0} (expected 1-12)")]
    InvalidMonth(u32),
    #[error("Invalid day: {0}")]
    InvalidDay(u32),
    #[error("Employee not found: {0}")]
    EmployeeNotFound(String),
    #[error("At least 2 employees are required for comparison, got {selected}")]
    NotEnoughSelected { selected: usize },
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization failed: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("CSV processing failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] envy::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

// Map AppError to Axum's IntoResponse
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("Error occurred: {}", self);

        let status_code = match self {
            AppError::Format(_)
            | AppError::InvalidRange { .. }
            | AppError::InvalidColor { .. }
            | AppError::InvalidMonth(_)
            | AppError::InvalidDay(_)
            | AppError::NotEnoughSelected { .. }
            | AppError::Csv(_) => StatusCode::BAD_REQUEST,
            AppError::EmployeeNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Storage(_)
            | AppError::Io(_)
            | AppError::SerdeJson(_)
            | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Internal details stay in the log
        let message = if status_code.is_server_error() {
            "Internal server error. Check logs.".to_string()
        } else {
            self.to_string()
        };

        (status_code, Json(ErrorBody { error: message })).into_response()
    }
}
