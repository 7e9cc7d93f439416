// Configuration module entry point
// Loads layered configuration and exposes the shared application state

mod state;
mod types;

use std::net::SocketAddr;

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment, File};

// Re-export public types
pub use state::AppState;
pub use types::{Config, PerformanceConfig, RoutesConfig};

/// Config file used when no path is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from specified file path (extension optional)
    ///
    /// Sources, highest priority first: `CATALOG_`-prefixed environment
    /// variables (`CATALOG_SERVER__PORT=9000`), the file, built-in defaults.
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            .add_source(File::with_name(config_path).required(false))
            .add_source(
                Environment::with_prefix("CATALOG")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        Self::build_with_defaults(builder)
    }

    fn build_with_defaults(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings = builder
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("performance.shutdown_timeout", 10)?
            .set_default("http.server_name", "book-catalog/0.1")?
            .set_default("http.enable_cors", false)?
            .set_default("http.max_body_size", 1_048_576)? // 1MB
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Defaults only, with access logging off to keep test output quiet
    #[cfg(test)]
    pub fn for_tests() -> Self {
        let builder = config::Config::builder()
            .set_override("logging.access_log", false)
            .unwrap_or_else(|e| panic!("invalid test override: {e}"));
        Self::build_with_defaults(builder).unwrap_or_else(|e| panic!("invalid test config: {e}"))
    }

    /// Body limit as `usize`, saturating on narrow targets
    pub fn max_body_size(&self) -> usize {
        usize::try_from(self.http.max_body_size).unwrap_or(usize::MAX)
    }
}
