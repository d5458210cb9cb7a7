//! # Errors
//!
//! [`AppError`] is the one error type handlers return. Its
//! [`ResponseError`] impl turns it into a status code and a JSON
//! `{"error": "..."}` body.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::error;
use thiserror::Error;

/// Errors surfaced by ingestion, the read path and the HTTP edge.
///
/// The first four variants are the ingestion taxonomy. `BadRequest` and
/// `Unauthorized` only come out of request handling.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or invalid settings. Raised before any network call is made.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The vendor answered with a non-success status or a body that is not an item array.
    #[error("feed fetch failed: {0}")]
    FeedFetch(String),

    /// A storage failure while upserting, or a vendor item whose date cannot be read.
    #[error("ingestion failed for {context}: {source}")]
    Ingestion {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

impl AppError {
    pub fn ingestion(
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        AppError::Ingestion {
            context: context.into(),
            source: source.into(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::FeedFetch(_) => StatusCode::BAD_GATEWAY,
            AppError::Ingestion { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("request error: {}", self);
        }
        HttpResponse::build(status).json(serde_json::json!({ "error": self.to_string() }))
    }
}
