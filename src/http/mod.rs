//! HTTP protocol layer module
//!
//! Protocol-level response helpers that know nothing about books: health
//! probes, preflight answers, and headers stamped on every response.

pub mod response;

// Re-export commonly used types
pub use response::{
    apply_common_headers, build_health_response, build_options_response, without_body,
    HttpResponse,
};
