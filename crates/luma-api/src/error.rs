//! HTTP mapping for API failures.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use luma_core::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] AppError),

    #[error("missing or empty {0} header")]
    MissingUser(&'static str),
}

impl ApiError {
    pub fn not_found(what: &str, id: impl ToString) -> Self {
        ApiError::Core(AppError::NotFound(what.to_string(), id.to_string()))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingUser(_) => StatusCode::UNAUTHORIZED,
            ApiError::Core(AppError::NotFound(..)) => StatusCode::NOT_FOUND,
            ApiError::Core(AppError::ValidationError(_)) => StatusCode::BAD_REQUEST,
            ApiError::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": self.to_string() }))
    }
}
