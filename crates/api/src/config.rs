// Server configuration loaded from environment variables
// Decision: No DATABASE_URL means dev mode on the in-memory backend

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::HeaderValue;
use vidora_storage::backend::DEFAULT_STORAGE_TIMEOUT;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_API_PREFIX: &str = "/api";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// PostgreSQL URL; `None` selects the in-memory backend
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// Upper bound on every storage call
    pub storage_timeout: Duration,
    pub bind_addr: SocketAddr,
    /// Prefix for API routes (e.g. "/api" gives /api/v1/users/...); may be empty
    pub api_prefix: String,
    /// Origins allowed by CORS; empty means same-origin only
    pub cors_allowed_origins: Vec<HeaderValue>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            database_max_connections: DEFAULT_MAX_CONNECTIONS,
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
            bind_addr: default_bind_addr(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// - `DATABASE_URL`: PostgreSQL URL (unset: in-memory dev mode)
    /// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
    /// - `STORAGE_TIMEOUT_MS`: per-call storage timeout (default: 5000)
    /// - `BIND_ADDR`: listen address (default: "0.0.0.0:8000")
    /// - `API_PREFIX`: route prefix (default: "/api")
    /// - `CORS_ALLOWED_ORIGINS`: comma separated origins
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let bind_addr = match lookup("BIND_ADDR") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Invalid BIND_ADDR, using default");
                defaults.bind_addr
            }),
            None => defaults.bind_addr,
        };

        Self {
            database_url: lookup("DATABASE_URL").filter(|s| !s.is_empty()),
            database_max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.database_max_connections),
            storage_timeout: lookup("STORAGE_TIMEOUT_MS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.storage_timeout),
            bind_addr,
            api_prefix: lookup("API_PREFIX")
                .map(|s| normalize_prefix(&s))
                .unwrap_or(defaults.api_prefix),
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .filter(|s| !s.is_empty())
                .map(|s| s.split(',').filter_map(|s| s.trim().parse().ok()).collect())
                .unwrap_or_default(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

/// "api/" -> "/api", "/" -> ""
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(|_| None);
        assert!(config.database_url.is_none());
        assert_eq!(config.storage_timeout, Duration::from_secs(5));
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.api_prefix, "/api");
        assert!(config.cors_allowed_origins.is_empty());
    }

    #[test]
    fn test_from_lookup() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/vidora"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("STORAGE_TIMEOUT_MS", "250"),
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("API_PREFIX", "v2/"),
            (
                "CORS_ALLOWED_ORIGINS",
                "https://app.example.com, https://admin.example.com",
            ),
        ]));

        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/vidora")
        );
        assert_eq!(config.database_max_connections, 4);
        assert_eq!(config.storage_timeout, Duration::from_millis(250));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(config.api_prefix, "/v2");
        assert_eq!(config.cors_allowed_origins.len(), 2);
    }

    #[test]
    fn test_empty_prefix_and_bad_addr() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("API_PREFIX", "/"),
            ("BIND_ADDR", "not an address"),
            ("DATABASE_URL", ""),
        ]));
        assert_eq!(config.api_prefix, "");
        assert_eq!(config.bind_addr, default_bind_addr());
        assert!(config.database_url.is_none());
    }
}
