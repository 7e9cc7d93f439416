// API response utility functions module

use crate::http::HttpResponse;
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;

/// Build JSON response
pub fn json_response<T: Serialize + ?Sized>(status: StatusCode, body: &T) -> HttpResponse {
    let json = match serde_json::to_string_pretty(body) {
        Ok(j) => j,
        Err(e) => {
            logger::log_error(&format!("Failed to serialize response: {e}"));
            return raw_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                r#"{"error":"Internal server error"}"#.to_string(),
            );
        }
    };
    raw_json(status, json)
}

/// `{"error": message}` with the given status
pub fn error_response(status: StatusCode, message: &str) -> HttpResponse {
    json_response(status, &serde_json::json!({ "error": message }))
}

/// 200 `{"message": message}`
pub fn message_response(message: &str) -> HttpResponse {
    json_response(StatusCode::OK, &serde_json::json!({ "message": message }))
}

/// 404 for paths nothing is served at
pub fn route_not_found() -> HttpResponse {
    error_response(StatusCode::NOT_FOUND, "Not Found")
}

/// 405 with the methods the route does support
pub fn method_not_allowed(allow: &'static str) -> HttpResponse {
    let mut response = error_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    response
        .headers_mut()
        .insert("Allow", hyper::header::HeaderValue::from_static(allow));
    response
}

fn raw_json(status: StatusCode, json: String) -> HttpResponse {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            logger::log_error(&format!("Failed to build response: {e}"));
            Response::new(Full::new(Bytes::from("Error")))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(resp: HttpResponse) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_response_shape() {
        let resp = error_response(StatusCode::NOT_FOUND, "Book not found");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.headers()["content-type"], "application/json");
        assert_eq!(body_json(resp).await, serde_json::json!({"error": "Book not found"}));
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let resp = method_not_allowed("GET, POST, OPTIONS");
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers()["allow"], "GET, POST, OPTIONS");
        assert_eq!(body_json(resp).await["error"], "Method Not Allowed");
    }

    #[tokio::test]
    async fn test_message_response() {
        let resp = message_response("done");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["message"], "done");
    }
}
