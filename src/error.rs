use crate::domain::assembly::AssemblyError;
use crate::domain::pipeline::PipelineError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Main application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response structure - simplified to just message + status code
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::ExternalService(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            message: self.to_string(),
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let message = err.to_string();
        match err {
            PipelineError::MissingScript(_) | PipelineError::MissingNews(_) => {
                AppError::NotFound(message)
            }
            PipelineError::Assembly(AssemblyError::NoSegments)
            | PipelineError::Assembly(AssemblyError::MissingInput(_)) => AppError::NotFound(message),
            PipelineError::EmptyScript(_) => AppError::BadRequest(message),
            PipelineError::MissingSegments { .. } => AppError::Conflict(message),
            PipelineError::News(_) | PipelineError::ScriptWriter(_) | PipelineError::Synthesis(_) => {
                AppError::ExternalService(message)
            }
            PipelineError::Assembly(_)
            | PipelineError::Configuration(_)
            | PipelineError::Io(_)
            | PipelineError::Serialization(_) => AppError::Internal(message),
        }
    }
}

/// Implement IntoResponse for automatic conversion in handlers
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::error!(
            error = %self,
            status = %status.as_u16(),
            "Request failed"
        );

        (status, Json(self.to_response())).into_response()
    }
}

/// Custom result type for the application
pub type AppResult<T> = Result<T, AppError>;
