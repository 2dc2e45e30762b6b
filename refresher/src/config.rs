//! Refresher configuration.

use ratekeeper_fx::FxEngineConfig;

/// Main refresher configuration.
#[derive(Debug, Clone)]
pub struct RefresherConfig {
    /// Database URL.
    pub database_url: String,
    /// Connection pool size.
    pub max_connections: u32,
    /// Rate store and conversion settings.
    pub fx: FxEngineConfig,
    /// Log level used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for RefresherConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/ratekeeper".to_string(),
            max_connections: 2,
            fx: FxEngineConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl RefresherConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database_url = url;
        }

        if let Ok(max) = std::env::var("DATABASE_MAX_CONNECTIONS") {
            if let Ok(max) = max.parse() {
                config.max_connections = max;
            }
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.log_level = level;
        }

        config.fx = FxEngineConfig::from_env();
        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.database_url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }

        if self.max_connections == 0 {
            return Err("Connection pool size cannot be 0".to_string());
        }

        self.fx.validate()
    }
}
