//! Server configuration module
//!
//! Handles loading configuration from environment variables with sensible
//! defaults.

use std::net::SocketAddr;

use cardvault_core::{ImagePolicy, DEFAULT_HIDE_THRESHOLD};

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 3000)
    pub port: u16,
    /// Server host (default: 127.0.0.1)
    pub host: [u8; 4],
    /// Allowed CORS origins, comma-separated (default: allow all in dev)
    pub allowed_origins: Option<Vec<String>>,
    /// Request body limit in MB (default: 25)
    pub body_limit_mb: usize,
    /// Maximum image payload size in MB (default: 10)
    pub max_image_mb: usize,
    /// Minimum accepted image width in pixels (default: 200)
    pub min_image_width: u32,
    /// Minimum accepted image height in pixels (default: 200)
    pub min_image_height: u32,
    /// Report count at which an active shared image hides (default: 3)
    pub hide_threshold: u32,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Enable rate limiting (default: false for tests, true when loaded from env)
    pub rate_limit_enabled: bool,
    /// Rate limit: requests per second (default: 10)
    pub rate_limit_per_sec: u64,
    /// Rate limit: burst size (default: 20)
    pub rate_limit_burst: u32,
    /// Database connection string; in-memory storage when unset
    pub database_url: Option<String>,
    /// Database connection pool maximum connections (default: 20)
    pub database_max_connections: u32,
    /// Database connection pool minimum connections (default: 2)
    pub database_min_connections: u32,
    /// External classifier endpoint; classification skipped when unset
    pub classifier_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            host: [127, 0, 0, 1],
            allowed_origins: None, // None = allow all (dev mode)
            body_limit_mb: 25,
            max_image_mb: 10,
            min_image_width: 200,
            min_image_height: 200,
            hide_threshold: DEFAULT_HIDE_THRESHOLD,
            timeout_secs: 30,
            rate_limit_enabled: false, // Disabled by default (for tests)
            rate_limit_per_sec: 10,
            rate_limit_burst: 20,
            database_url: None,
            database_max_connections: 20,
            database_min_connections: 2,
            classifier_url: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Config::default();

        let port = env_parsed("PORT", defaults.port);

        let host = std::env::var("HOST")
            .ok()
            .map(|h| {
                if h == "0.0.0.0" {
                    [0, 0, 0, 0]
                } else {
                    [127, 0, 0, 1]
                }
            })
            .unwrap_or(defaults.host);

        let allowed_origins = std::env::var("ALLOWED_ORIGINS").ok().map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        // Rate limiting enabled by default in production, can be disabled
        // with RATE_LIMIT_ENABLED=false
        let rate_limit_enabled = std::env::var("RATE_LIMIT_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        let database_url = std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());
        let classifier_url = std::env::var("CLASSIFIER_URL").ok().filter(|v| !v.is_empty());

        Self {
            port,
            host,
            allowed_origins,
            body_limit_mb: env_parsed("BODY_LIMIT_MB", defaults.body_limit_mb),
            max_image_mb: env_parsed("MAX_IMAGE_MB", defaults.max_image_mb),
            min_image_width: env_parsed("MIN_IMAGE_WIDTH", defaults.min_image_width),
            min_image_height: env_parsed("MIN_IMAGE_HEIGHT", defaults.min_image_height),
            hide_threshold: env_parsed("REPORT_HIDE_THRESHOLD", defaults.hide_threshold),
            timeout_secs: env_parsed("REQUEST_TIMEOUT_SECS", defaults.timeout_secs),
            rate_limit_enabled,
            rate_limit_per_sec: env_parsed("RATE_LIMIT_PER_SEC", defaults.rate_limit_per_sec),
            rate_limit_burst: env_parsed("RATE_LIMIT_BURST", defaults.rate_limit_burst),
            database_url,
            database_max_connections: env_parsed(
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            ),
            database_min_connections: env_parsed(
                "DATABASE_MIN_CONNECTIONS",
                defaults.database_min_connections,
            ),
            classifier_url,
        }
    }

    /// Get socket address from config
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }

    /// The image acceptance policy enforced before anything is stored.
    pub fn image_policy(&self) -> ImagePolicy {
        ImagePolicy {
            max_bytes: self.max_image_mb * 1024 * 1024,
            min_width: self.min_image_width,
            min_height: self.min_image_height,
            ..ImagePolicy::default()
        }
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.hide_threshold, 3);
        assert!(config.database_url.is_none());
        assert!(config.classifier_url.is_none());
        assert!(!config.rate_limit_enabled);
    }

    #[test]
    fn test_image_policy_from_config() {
        let config = Config {
            max_image_mb: 2,
            min_image_width: 300,
            min_image_height: 400,
            ..Config::default()
        };
        let policy = config.image_policy();

        assert_eq!(policy.max_bytes, 2 * 1024 * 1024);
        assert_eq!(policy.min_width, 300);
        assert_eq!(policy.min_height, 400);
    }

    #[test]
    fn test_socket_addr() {
        let config = Config {
            host: [0, 0, 0, 0],
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
    }
}
