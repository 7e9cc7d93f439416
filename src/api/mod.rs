// API module entry
// Book catalog routes: dispatches each request to a handler and writes the access log

mod error;
mod handlers;
mod response;
mod routes;

use hyper::body::{Body, Bytes};
use hyper::{Method, Request};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AppState;
use crate::http::{self, HttpResponse};
use crate::logger::{self, AccessLogEntry};

pub use error::ApiError;
pub use handlers::BoxError;
pub use routes::Route;

/// Main entry point for HTTP request handling
///
/// Never fails: every outcome, including bad input, becomes a response.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<HttpResponse, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let started = Instant::now();
    let entry = state
        .access_log_enabled()
        .then(|| access_entry(&req, peer_addr));

    let mut response = dispatch(req, &state).await;
    http::apply_common_headers(
        &mut response,
        &state.config.http.server_name,
        state.config.http.enable_cors,
    );

    if let Some(mut entry) = entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
        entry.elapsed = started.elapsed();
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route a request and run the matching handler
async fn dispatch<B>(req: Request<B>, state: &AppState) -> HttpResponse
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let Some(route) = Route::resolve(&path, &state.config.routes) else {
        logger::log_debug(&format!("No route for {method} {path}"));
        return response::route_not_found();
    };

    let result = match (route, &method) {
        (Route::Liveness | Route::Readiness, &Method::GET | &Method::HEAD) => {
            Ok(http::build_health_response("ok", method == Method::HEAD))
        }
        (_, &Method::OPTIONS) => Ok(http::build_options_response(
            route.allow(),
            state.config.http.enable_cors,
        )),
        (Route::Collection, &Method::GET | &Method::HEAD) => Ok(handlers::list_books(state)),
        (Route::Collection, &Method::POST) => handlers::create_book(req, state).await,
        (Route::Item(id), &Method::GET | &Method::HEAD) => handlers::get_book(state, id),
        (Route::Item(id), &Method::PUT) => handlers::update_book(req, state, id).await,
        (Route::Item(id), &Method::DELETE) => handlers::delete_book(state, id),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method} {path}"));
            Ok(response::method_not_allowed(route.allow()))
        }
    };

    let response = result.unwrap_or_else(ApiError::into_response);
    if method == Method::HEAD {
        http::without_body(response)
    } else {
        response
    }
}

fn access_entry<B>(req: &Request<B>, peer_addr: SocketAddr) -> AccessLogEntry {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().as_str(),
        req.uri().path(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = match req.version() {
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        _ => "1.1",
    }
    .to_string();
    entry.referer = header("referer");
    entry.user_agent = header("user-agent");
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::BookStore;
    use http_body_util::{BodyExt, Full};
    use hyper::StatusCode;
    use serde_json::{json, Value};

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState::new(Config::for_tests(), BookStore::seeded()))
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:50000".parse().unwrap()
    }

    fn request(method: Method, uri: &str, body: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    async fn send(state: &Arc<AppState>, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
        let resp = handle_request(request(method, uri, body), Arc::clone(state), peer())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    fn ids(list: &Value) -> Vec<&str> {
        list.as_array()
            .unwrap()
            .iter()
            .map(|b| b["id"].as_str().unwrap())
            .collect()
    }

    const NEW_BOOK: &str =
        r#"{"title":"X","author":"Y","genre":"Z","description":"D","publishedYear":2020}"#;

    #[tokio::test]
    async fn test_list_books() {
        let state = test_state();
        let (status, body) = send(&state, Method::GET, "/books", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec!["1", "2"]);
        assert_eq!(body[0]["title"], "hasaan here");
        assert_eq!(body[1]["publishedYear"], 2024);
    }

    #[tokio::test]
    async fn test_create_book() {
        let state = test_state();
        let (status, body) = send(&state, Method::POST, "/books", NEW_BOOK).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], "3");
        assert_eq!(body["title"], "X");
        assert!(body.get("coverImageUrl").is_none());

        let (status, fetched) = send(&state, Method::GET, "/books/3", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, body);
    }

    #[tokio::test]
    async fn test_create_with_cover() {
        let state = test_state();
        let payload = json!({
            "title": "Dune", "author": "Herbert", "genre": "SF", "description": "Spice",
            "publishedYear": 1965, "coverImageUrl": "https://img.example/dune.jpg"
        });
        let (status, body) = send(&state, Method::POST, "/api/books", &payload.to_string()).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["coverImageUrl"], "https://img.example/dune.jpg");
    }

    #[tokio::test]
    async fn test_create_malformed_json() {
        let state = test_state();
        let (status, body) = send(&state, Method::POST, "/books", "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Invalid request"}));
        assert_eq!(state.store.len(), 2);
    }

    #[tokio::test]
    async fn test_create_missing_field() {
        let state = test_state();
        let (status, body) = send(&state, Method::POST, "/books", r#"{"title":"only"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request");
        assert_eq!(state.store.len(), 2);
    }

    #[tokio::test]
    async fn test_get_missing_book() {
        let state = test_state();
        let (status, body) = send(&state, Method::GET, "/books/99", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Book not found"}));
    }

    #[tokio::test]
    async fn test_update_book() {
        let state = test_state();
        let (status, body) = send(&state, Method::PUT, "/books/2", r#"{"title":"New"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "2");
        assert_eq!(body["title"], "New");
        assert_eq!(body["author"], "Hassan");
    }

    #[tokio::test]
    async fn test_update_empty_body_object() {
        let state = test_state();
        let before = state.store.get("1").unwrap();
        let (status, body) = send(&state, Method::PUT, "/books/1", "{}").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::to_value(&before).unwrap());
    }

    #[tokio::test]
    async fn test_update_cannot_change_id() {
        let state = test_state();
        let (status, body) =
            send(&state, Method::PUT, "/books/1", r#"{"_id":"7","id":"8","genre":"Poetry"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "1");
        assert_eq!(body["genre"], "Poetry");
    }

    #[tokio::test]
    async fn test_update_missing_and_malformed() {
        let state = test_state();
        let (status, body) = send(&state, Method::PUT, "/books/99", r#"{"title":"New"}"#).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Book not found");

        let (status, body) = send(&state, Method::PUT, "/books/1", "[1,2").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request");

        let (status, _) = send(&state, Method::PUT, "/books/1", r#"{"publishedYear":"soon"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(state.store.get("1").unwrap().published_year, 2023);
    }

    #[tokio::test]
    async fn test_array_bodies_rejected() {
        let state = test_state();
        let before = state.store.list();

        let (status, body) =
            send(&state, Method::POST, "/books", r#"["X","Y","Z",null,"D",2020]"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Invalid request"}));

        let (status, body) =
            send(&state, Method::PUT, "/books/1", r#"["T",null,null,null,null,null]"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request");

        let (status, _) = send(&state, Method::PUT, "/books/1", "null").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert_eq!(state.store.list(), before);
    }

    #[tokio::test]
    async fn test_delete_book() {
        let state = test_state();
        let (status, body) = send(&state, Method::DELETE, "/books/1", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "Book deleted successfully"}));

        let (status, body) = send(&state, Method::DELETE, "/books/1", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Book not found");
    }

    #[tokio::test]
    async fn test_catalog_scenario_over_http() {
        let state = test_state();
        let (_, created) = send(&state, Method::POST, "/books", NEW_BOOK).await;
        assert_eq!(created["id"], "3");

        let (status, _) = send(&state, Method::DELETE, "/books/1", "").await;
        assert_eq!(status, StatusCode::OK);

        let (_, list) = send(&state, Method::GET, "/books", "").await;
        assert_eq!(ids(&list), vec!["2", "3"]);

        let (status, _) = send(&state, Method::GET, "/books/1", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, updated) = send(&state, Method::PUT, "/books/2", r#"{"title":"New"}"#).await;
        assert_eq!(updated["title"], "New");
        assert_eq!(updated["author"], "Hassan");

        let (_, created) = send(&state, Method::POST, "/books", NEW_BOOK).await;
        assert_eq!(created["id"], "4");
    }

    #[tokio::test]
    async fn test_head_book_routes() {
        let state = test_state();
        for uri in ["/books", "/books/1", "/api/books/2"] {
            let get = handle_request(request(Method::GET, uri, ""), Arc::clone(&state), peer())
                .await
                .unwrap();
            let get_len = get.into_body().collect().await.unwrap().to_bytes().len();

            let head = handle_request(request(Method::HEAD, uri, ""), Arc::clone(&state), peer())
                .await
                .unwrap();
            assert_eq!(head.status(), StatusCode::OK, "HEAD {uri}");
            assert_eq!(head.headers()["content-type"], "application/json");
            assert_eq!(head.headers()["content-length"], get_len.to_string().as_str());
            let body = head.into_body().collect().await.unwrap().to_bytes();
            assert!(body.is_empty());
        }

        let (status, body) = send(&state, Method::HEAD, "/books/99", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let state = test_state();
        let (status, body) = send(&state, Method::GET, "/authors", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not Found");
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let state = test_state();
        let resp = handle_request(request(Method::DELETE, "/books", ""), Arc::clone(&state), peer())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers()["allow"], "GET, HEAD, POST, OPTIONS");

        let (status, _) = send(&state, Method::POST, "/books/1", NEW_BOOK).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(state.store.len(), 2);
    }

    #[tokio::test]
    async fn test_options_and_cors() {
        let mut config = Config::for_tests();
        config.http.enable_cors = true;
        let state = Arc::new(AppState::new(config, BookStore::seeded()));

        let resp = handle_request(request(Method::OPTIONS, "/books/1", ""), Arc::clone(&state), peer())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(resp.headers()["allow"], "GET, HEAD, PUT, DELETE, OPTIONS");
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");

        let resp = handle_request(request(Method::GET, "/books", ""), state, peer())
            .await
            .unwrap();
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
        assert_eq!(resp.headers()["server"], "book-catalog/0.1");
        assert_eq!(resp.headers()["content-type"], "application/json");
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let state = test_state();
        let (status, body) = send(&state, Method::GET, "/healthz", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("ok".to_string()));

        let (status, body) = send(&state, Method::HEAD, "/readyz", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);

        let (status, _) = send(&state, Method::POST, "/healthz", "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_body_size_limit() {
        let mut config = Config::for_tests();
        config.http.max_body_size = 16;
        let state = Arc::new(AppState::new(config, BookStore::seeded()));

        let (status, body) = send(&state, Method::POST, "/books", NEW_BOOK).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"], "Payload Too Large");

        let oversized = Request::builder()
            .method(Method::PUT)
            .uri("/books/1")
            .header("content-length", "4096")
            .body(Full::new(Bytes::from_static(b"{}")))
            .unwrap();
        let resp = handle_request(oversized, Arc::clone(&state), peer()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(state.store.len(), 2);
    }

    #[tokio::test]
    async fn test_access_log_enabled() {
        let mut config = Config::for_tests();
        config.logging.access_log = true;
        config.logging.access_log_format = "json".to_string();
        let state = Arc::new(AppState::new(config, BookStore::seeded()));
        let (status, _) = send(&state, Method::GET, "/books?page=1", "").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[test]
    fn test_access_entry_fields() {
        let req = Request::builder()
            .method(Method::GET)
            .uri("/books?sort=title")
            .header("user-agent", "test-agent")
            .body(())
            .unwrap();
        let entry = access_entry(&req, peer());
        assert_eq!(entry.remote_addr, "127.0.0.1");
        assert_eq!(entry.method, "GET");
        assert_eq!(entry.path, "/books");
        assert_eq!(entry.query.as_deref(), Some("sort=title"));
        assert_eq!(entry.user_agent.as_deref(), Some("test-agent"));
        assert_eq!(entry.referer, None);
    }
}
