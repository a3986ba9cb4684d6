// Environment detection, connection settings and logger configuration.

use std::sync::OnceLock;

/// Cached environment mode.
static ENV_MODE: OnceLock<EnvMode> = OnceLock::new();

pub const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvMode {
    Production,
    Development,
    Test,
}

impl EnvMode {
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "test" | "testing" => Self::Test,
            _ => Self::Development,
        }
    }

    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub fn default_log_filter(&self) -> &'static str {
        match self {
            Self::Production => "bisca=info",
            Self::Development | Self::Test => "bisca=debug",
        }
    }
}

/// Detect the current environment mode.
/// Checks `BISCA_ENV` then `RUST_ENV`; anything unrecognised is development.
pub fn detect_env_mode() -> EnvMode {
    *ENV_MODE.get_or_init(|| {
        let env_val = std::env::var("BISCA_ENV")
            .or_else(|_| std::env::var("RUST_ENV"))
            .unwrap_or_default();
        EnvMode::parse(&env_val)
    })
}

pub fn is_production() -> bool {
    detect_env_mode() == EnvMode::Production
}

/// `MONGODB_URI`, if set and non-empty.
pub fn mongodb_uri_from_env() -> Option<String> {
    std::env::var("MONGODB_URI").ok().filter(|v| !v.is_empty())
}

/// `BISCA_DB_NAME`, if set and non-empty.
pub fn database_name_from_env() -> Option<String> {
    std::env::var("BISCA_DB_NAME").ok().filter(|v| !v.is_empty())
}

/// Initialize the `tracing` subscriber.
///
/// `RUST_LOG` wins; otherwise the filter depends on the environment mode.
/// Calling it twice is harmless.
pub fn init_logger() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(detect_env_mode().default_log_filter()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .try_init();
}
