//! Route resolution module
//!
//! Maps a request path onto one of the catalog's resources.

use crate::config::RoutesConfig;

const BOOKS: &str = "/books";

/// A resolved request target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    Liveness,
    Readiness,
    /// `/books`
    Collection,
    /// `/books/{id}`
    Item(&'a str),
}

impl<'a> Route<'a> {
    /// Resolve `path`, or `None` when nothing is served there
    pub fn resolve(path: &'a str, routes: &RoutesConfig) -> Option<Self> {
        // Health checks take priority over book routes
        if routes.health.enabled {
            if path == routes.health.liveness_path {
                return Some(Self::Liveness);
            }
            if path == routes.health.readiness_path {
                return Some(Self::Readiness);
            }
        }

        let rest = books_suffix(path, &routes.api_prefix)?;
        if rest.is_empty() || rest == "/" {
            return Some(Self::Collection);
        }

        let id = rest.strip_prefix('/')?;
        let id = id.strip_suffix('/').unwrap_or(id);
        if id.is_empty() || id.contains('/') {
            return None;
        }
        Some(Self::Item(id))
    }

    /// Value of the `Allow` header for this route
    pub const fn allow(&self) -> &'static str {
        match self {
            Self::Liveness | Self::Readiness => "GET, HEAD, OPTIONS",
            Self::Collection => "GET, HEAD, POST, OPTIONS",
            Self::Item(_) => "GET, HEAD, PUT, DELETE, OPTIONS",
        }
    }
}

/// Whatever follows `/books` in `path`, with the optional API prefix removed
fn books_suffix<'a>(path: &'a str, api_prefix: &str) -> Option<&'a str> {
    let prefix = api_prefix.trim_end_matches('/');
    let path = if prefix.is_empty() {
        path
    } else {
        path.strip_prefix(prefix)
            .filter(|rest| rest.starts_with('/'))
            .unwrap_or(path)
    };

    let rest = path.strip_prefix(BOOKS)?;
    (rest.is_empty() || rest.starts_with('/')).then_some(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(path: &str) -> Option<Route<'_>> {
        Route::resolve(path, &RoutesConfig::default())
    }

    #[test]
    fn test_collection_paths() {
        assert_eq!(resolve("/books"), Some(Route::Collection));
        assert_eq!(resolve("/books/"), Some(Route::Collection));
        assert_eq!(resolve("/api/books"), Some(Route::Collection));
    }

    #[test]
    fn test_item_paths() {
        assert_eq!(resolve("/books/1"), Some(Route::Item("1")));
        assert_eq!(resolve("/books/42/"), Some(Route::Item("42")));
        assert_eq!(resolve("/api/books/abc"), Some(Route::Item("abc")));
    }

    #[test]
    fn test_unknown_paths() {
        assert_eq!(resolve("/"), None);
        assert_eq!(resolve("/bookshelf"), None);
        assert_eq!(resolve("/books//"), None);
        assert_eq!(resolve("/books/1/pages"), None);
        assert_eq!(resolve("/apibooks"), None);
        assert_eq!(resolve("/v2/books"), None);
    }

    #[test]
    fn test_health_paths() {
        assert_eq!(resolve("/healthz"), Some(Route::Liveness));
        assert_eq!(resolve("/readyz"), Some(Route::Readiness));

        let mut routes = RoutesConfig::default();
        routes.health.enabled = false;
        assert_eq!(Route::resolve("/healthz", &routes), None);
    }

    #[test]
    fn test_custom_api_prefix() {
        let mut routes = RoutesConfig::default();
        routes.api_prefix = "/v1/".to_string();
        assert_eq!(Route::resolve("/v1/books/7", &routes), Some(Route::Item("7")));
        assert_eq!(Route::resolve("/api/books", &routes), None);

        routes.api_prefix = String::new();
        assert_eq!(Route::resolve("/books", &routes), Some(Route::Collection));
        assert_eq!(Route::resolve("/api/books", &routes), None);
    }

    #[test]
    fn test_allow_header() {
        assert_eq!(Route::Collection.allow(), "GET, HEAD, POST, OPTIONS");
        assert_eq!(Route::Item("1").allow(), "GET, HEAD, PUT, DELETE, OPTIONS");
    }
}
