use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("{0}")]
    InternalError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            PipelineError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            PipelineError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            PipelineError::InvalidInput(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            PipelineError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            PipelineError::ConfigError(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            PipelineError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database operation failed".to_string(),
            ),
            PipelineError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred".to_string(),
            ),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

// Helper functions for creating specific errors
impl PipelineError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        PipelineError::ConfigError(msg.into())
    }

    pub fn unauthorized<S: Into<String>>(msg: S) -> Self {
        PipelineError::Unauthorized(msg.into())
    }

    pub fn forbidden<S: Into<String>>(msg: S) -> Self {
        PipelineError::Forbidden(msg.into())
    }

    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        PipelineError::InvalidInput(msg.into())
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        PipelineError::NotFound(msg.into())
    }

    pub fn database<S: Into<String>>(msg: S) -> Self {
        PipelineError::DatabaseError(msg.into())
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        PipelineError::InternalError(msg.into())
    }
}
