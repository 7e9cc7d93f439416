// API error module
// Failures a book handler can end with, and how each is answered

use hyper::StatusCode;
use thiserror::Error;

use super::response::error_response;
use crate::http::HttpResponse;
use crate::logger;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Book not found")]
    NotFound,
    /// Body could not be read or bound; the detail is logged, never returned
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Request body too large (max: {max} bytes)")]
    PayloadTooLarge { max: usize },
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    /// Fixed message placed in the `error` field of the response body
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::NotFound => "Book not found",
            Self::InvalidRequest(_) => "Invalid request",
            Self::PayloadTooLarge { .. } => "Payload Too Large",
        }
    }

    pub fn into_response(self) -> HttpResponse {
        if !matches!(self, Self::NotFound) {
            logger::log_warning(&self.to_string());
        }
        error_response(self.status(), self.public_message())
    }
}
