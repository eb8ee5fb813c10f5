// Logging setup
// Decision: fmt subscriber filtered by RUST_LOG (fallback LOG_LEVEL); JSON lines when LOG_FORMAT=json

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "vidora_api=debug,vidora_storage=info,tower_http=debug";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Log filter (e.g., "info", "vidora_api=debug")
    pub log_filter: Option<String>,
    pub format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: None,
            format: LogFormat::Text,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables
    ///
    /// - `RUST_LOG` or `LOG_LEVEL`: Log filter
    /// - `LOG_FORMAT`: "json" for structured output
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            log_filter: lookup("RUST_LOG").or_else(|| lookup("LOG_LEVEL")),
            format: match lookup("LOG_FORMAT").map(|v| v.to_lowercase()).as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
        }
    }

    fn filter(&self) -> EnvFilter {
        self.log_filter
            .as_ref()
            .and_then(|f| EnvFilter::try_new(f).ok())
            .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
    }
}

/// Install the global subscriber. Call once at startup.
pub fn init_telemetry(config: TelemetryConfig) {
    let filter = config.filter();

    let layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_filter(filter)
            .boxed(),
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_filter(filter)
            .boxed(),
    };

    tracing_subscriber::registry().with(layer).init();
}
