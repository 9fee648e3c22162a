//! Centralized error handling: one error body shape for every non-2xx
//! response, and the handler-side error type that maps onto it.

use actix_web::error::JsonPayloadError;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use log::{error, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::ValidationError;

/// Error body shared by every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Failures a handler can surface. Anything not covered here is internal
/// and reaches the client as a generic 500.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{resource} not found")]
    NotFound { resource: &'static str },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::NotFound { .. } => "not_found",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Internal detail is logged here and never sent to the client.
        let message = match self {
            ApiError::Internal(err) => {
                error!("internal error: {err:#}");
                "Internal server error".to_string()
            }
            other => {
                warn!("request failed: {other}");
                other.to_string()
            }
        };
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            message,
            code: Some(self.code().to_string()),
        })
    }
}

/// Keeps malformed-JSON rejections in the [`ErrorResponse`] shape instead of
/// actix's default plain-text body.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    warn!("rejected request payload: {err}");
    let response = HttpResponse::BadRequest().json(ErrorResponse {
        message: err.to_string(),
        code: Some("invalid_json".to_string()),
    });
    actix_web::error::InternalError::from_response(err, response).into()
}
