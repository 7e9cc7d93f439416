// Connection handling module
// Accepts a single TCP connection and serves it with hyper

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::signal::ShutdownSignal;
use crate::api;
use crate::config::{AppState, PerformanceConfig};
use crate::logger;

/// Accept and process a connection, checking limits and logging.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
/// * `conn_counter` - Active connection counter
/// * `shutdown` - Server-wide shutdown signal
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
    shutdown: &Arc<ShutdownSignal>,
) {
    // Increment first, then check the limit, so two racing accepts can't both slip in
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if at_capacity(prev_count, state.config.performance.max_connections) {
        conn_counter.fetch_sub(1, Ordering::SeqCst);
        logger::log_warning(&format!(
            "Max connections reached: {prev_count}/{}. Connection from {peer_addr} rejected.",
            state.config.performance.max_connections.unwrap_or_default()
        ));
        drop(stream);
        return;
    }

    if state.access_log_enabled() {
        logger::log_connection_accepted(&peer_addr);
    }

    handle_connection(
        stream,
        peer_addr,
        Arc::clone(state),
        Arc::clone(conn_counter),
        Arc::clone(shutdown),
    );
}

/// Whether a connection arriving with `active` already open must be refused
fn at_capacity(active: usize, max_connections: Option<u64>) -> bool {
    max_connections.is_some_and(|max| active >= usize::try_from(max).unwrap_or(usize::MAX))
}

/// Overall deadline for one connection, keep-alive included
fn connection_timeout(perf: &PerformanceConfig) -> Duration {
    Duration::from_secs(std::cmp::max(perf.read_timeout, perf.write_timeout))
}

/// Serve a single connection in a spawned local task.
///
/// When `shutdown` fires the connection finishes its in-flight request and
/// closes; an idle keep-alive connection closes at once. The connection
/// counter is decremented when the task finishes, whether the connection
/// closed cleanly, errored, or hit the timeout.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
    shutdown: Arc<ShutdownSignal>,
) {
    tokio::task::spawn_local(async move {
        let io = TokioIo::new(stream);
        let timeout_duration = connection_timeout(&state.config.performance);

        let mut builder = http1::Builder::new();
        builder.keep_alive(state.config.performance.keep_alive_timeout > 0);

        let conn = builder.serve_connection(
            io,
            service_fn(move |req| api::handle_request(req, Arc::clone(&state), peer_addr)),
        );

        let served = async {
            tokio::pin!(conn);
            tokio::select! {
                result = conn.as_mut() => result,
                () = shutdown.wait() => {
                    conn.as_mut().graceful_shutdown();
                    conn.await
                }
            }
        };

        match tokio::time::timeout(timeout_duration, served).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => {
                logger::log_warning(&format!(
                    "Connection from {peer_addr} timed out after {} seconds",
                    timeout_duration.as_secs()
                ));
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}
