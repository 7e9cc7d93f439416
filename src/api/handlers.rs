// Book handlers module
// One function per catalog operation: read the body if any, call the store, shape the reply

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Request, StatusCode};
use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::response::{json_response, message_response};
use crate::config::AppState;
use crate::http::HttpResponse;
use crate::logger;
use crate::store::{BookPatch, NewBook};

/// Errors a request body can produce while being read
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// GET /books
pub fn list_books(state: &AppState) -> HttpResponse {
    json_response(StatusCode::OK, &state.store.list())
}

/// GET /books/{id}
pub fn get_book(state: &AppState, id: &str) -> Result<HttpResponse, ApiError> {
    let book = state.store.get(id).ok_or(ApiError::NotFound)?;
    Ok(json_response(StatusCode::OK, &book))
}

/// POST /books
pub async fn create_book<B>(req: Request<B>, state: &AppState) -> Result<HttpResponse, ApiError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let new_book: NewBook = read_json(req, state.config.max_body_size()).await?;
    let book = state.store.create(new_book);
    logger::log_debug(&format!("Created book {} ({:?})", book.id, book.title));
    Ok(json_response(StatusCode::CREATED, &book))
}

/// PUT /books/{id}
pub async fn update_book<B>(
    req: Request<B>,
    state: &AppState,
    id: &str,
) -> Result<HttpResponse, ApiError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let patch: BookPatch = read_json(req, state.config.max_body_size()).await?;
    if patch.is_empty() {
        logger::log_debug(&format!("Empty update for book {id}"));
    }
    let book = state.store.update(id, patch).ok_or(ApiError::NotFound)?;
    logger::log_debug(&format!("Updated book {id}"));
    Ok(json_response(StatusCode::OK, &book))
}

/// DELETE /books/{id}
pub fn delete_book(state: &AppState, id: &str) -> Result<HttpResponse, ApiError> {
    if !state.store.delete(id) {
        return Err(ApiError::NotFound);
    }
    logger::log_debug(&format!("Deleted book {id}"));
    Ok(message_response("Book deleted successfully"))
}

/// Read at most `max_body_size` bytes and bind them as JSON
async fn read_json<T, B>(req: Request<B>, max_body_size: usize) -> Result<T, ApiError>
where
    T: DeserializeOwned,
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    check_content_length(&req, max_body_size)?;

    let body = Limited::new(req.into_body(), max_body_size)
        .collect()
        .await
        .map_err(|e| {
            if e.is::<LengthLimitError>() {
                ApiError::PayloadTooLarge { max: max_body_size }
            } else {
                ApiError::InvalidRequest(format!("Failed to read request body: {e}"))
            }
        })?
        .to_bytes();

    let value: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid JSON: {e}")))?;
    // Derived struct impls also bind arrays positionally; only objects are accepted
    if !value.is_object() {
        return Err(ApiError::InvalidRequest(
            "Request body must be a JSON object".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|e| ApiError::InvalidRequest(format!("Invalid JSON: {e}")))
}

/// Reject early when the declared Content-Length is over the limit
fn check_content_length<B>(req: &Request<B>, max_body_size: usize) -> Result<(), ApiError> {
    let Some(value) = req.headers().get("content-length") else {
        return Ok(());
    };
    match value.to_str().ok().and_then(|v| v.parse::<u64>().ok()) {
        Some(size) if size > u64::try_from(max_body_size).unwrap_or(u64::MAX) => {
            Err(ApiError::PayloadTooLarge { max: max_body_size })
        }
        Some(_) => Ok(()),
        None => {
            logger::log_warning("Invalid Content-Length value, skipping size check");
            Ok(())
        }
    }
}
