use std::sync::Arc;

mod api;
mod config;
mod http;
mod logger;
mod server;
mod store;

use server::signal::start_signal_handler;
use server::{create_reusable_listener, run_server, ShutdownSignal};
use store::BookStore;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    // Tokio runtime sized by the workers setting (CPU cores when unset)
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = create_reusable_listener(addr)?;

    let store = BookStore::seeded();
    logger::log_server_start(&addr, &cfg, store.len());
    let state = Arc::new(config::AppState::new(cfg, store));

    let shutdown = Arc::new(ShutdownSignal::new());
    start_signal_handler(Arc::clone(&shutdown));

    // Connections are served with spawn_local
    let local = tokio::task::LocalSet::new();
    local.run_until(run_server(listener, state, shutdown)).await
}
