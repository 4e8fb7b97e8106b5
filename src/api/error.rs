use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::error::SimulationError;

/// API error types that can be returned from handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Error response that gets serialized to JSON
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NotFound",
            ApiError::BadRequest(_) => "BadRequest",
            ApiError::InternalError(_) => "InternalServerError",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            ApiError::InternalError(_) => {
                tracing::error!(error = %self, "API error occurred");
                "An internal error occurred".to_string()
            }
            _ => {
                tracing::debug!(error = %self, "Client error");
                self.to_string()
            }
        };

        let body = ErrorResponse {
            error: self.error_type().to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<SimulationError> for ApiError {
    fn from(error: SimulationError) -> Self {
        match error {
            SimulationError::UnknownEntity(_) => ApiError::NotFound(error.to_string()),
            SimulationError::InvalidTimeRange { .. }
            | SimulationError::InvalidInterval(_)
            | SimulationError::InvalidTimestamp(_)
            | SimulationError::TimeReversal { .. }
            | SimulationError::InvalidAcceleration(_)
            | SimulationError::LimitExceeded(_)
            | SimulationError::InvalidUnitId(_) => ApiError::BadRequest(error.to_string()),
            SimulationError::DuplicateEntity(_)
            | SimulationError::MissingWeatherStation { .. } => {
                ApiError::InternalError(error.to_string())
            }
        }
    }
}
