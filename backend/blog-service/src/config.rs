//! Configuration management for Blog Service
//!
//! Loads configuration from environment variables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Redis configuration
    pub redis: RedisConfig,
    /// Identity directory configuration
    pub identity: IdentityConfig,
    /// Post creation rate limit
    pub rate_limit: RateLimitConfig,
    /// Social graph settings
    pub social: SocialConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// HTTP port for health checks
    pub http_port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Min connections in pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration (backs the rate limiter)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

/// External identity directory (Clerk-compatible backend API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub timeout_ms: u64,
}

/// Sliding-window limit applied to post creation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum admitted requests per window
    pub max_requests: u32,
    /// Window length in seconds
    pub window_seconds: u64,
    /// Prefix for rate-limit keys in the backing store
    pub key_prefix: String,
    /// Upper bound on a single counter-store round trip
    pub store_timeout_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 3,
            window_seconds: 60,
            key_prefix: "ratelimit:post".to_string(),
            store_timeout_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialConfig {
    /// Reject follows of identities the directory does not know
    pub verify_followee: bool,
}

// Default values
fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env_parse("PORT").unwrap_or(8010),
        };

        let database = DatabaseConfig {
            url: std::env::var("DATABASE_URL")
                .context("DATABASE_URL environment variable not set")?,
            max_connections: env_parse("DB_MAX_CONNECTIONS")
                .unwrap_or_else(default_max_connections),
            min_connections: env_parse("DB_MIN_CONNECTIONS")
                .unwrap_or_else(default_min_connections),
        };

        let redis = RedisConfig {
            url: std::env::var("REDIS_URL").context("REDIS_URL environment variable not set")?,
        };

        let identity = IdentityConfig {
            base_url: std::env::var("IDENTITY_API_URL")
                .unwrap_or_else(|_| "https://api.clerk.com".to_string()),
            api_key: std::env::var("IDENTITY_API_KEY")
                .context("IDENTITY_API_KEY environment variable not set")?,
            timeout_ms: env_parse("IDENTITY_TIMEOUT_MS").unwrap_or(3000),
        };

        let defaults = RateLimitConfig::default();
        let rate_limit = RateLimitConfig {
            max_requests: env_parse("POST_RATE_LIMIT_MAX").unwrap_or(defaults.max_requests),
            window_seconds: env_parse("POST_RATE_LIMIT_WINDOW_SECS")
                .unwrap_or(defaults.window_seconds),
            key_prefix: defaults.key_prefix,
            store_timeout_ms: env_parse("POST_RATE_LIMIT_TIMEOUT_MS")
                .unwrap_or(defaults.store_timeout_ms),
        };

        let social = SocialConfig {
            verify_followee: env_parse("SOCIAL_VERIFY_FOLLOWEE").unwrap_or(true),
        };

        Ok(Config {
            app,
            database,
            redis,
            identity,
            rate_limit,
            social,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[serial_test::serial]
    fn test_default_values() {
        std::env::set_var("DATABASE_URL", "postgres://test");
        std::env::set_var("REDIS_URL", "redis://localhost");
        std::env::set_var("IDENTITY_API_KEY", "sk_test");
        std::env::remove_var("POST_RATE_LIMIT_MAX");
        std::env::remove_var("SOCIAL_VERIFY_FOLLOWEE");

        let config = Config::from_env().unwrap();

        assert_eq!(config.app.env, "development");
        assert_eq!(config.app.host, "0.0.0.0");
        assert_eq!(config.app.http_port, 8010);
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.database.min_connections, 5);
        assert_eq!(config.identity.base_url, "https://api.clerk.com");
        assert_eq!(config.rate_limit, RateLimitConfig::default());
        assert!(config.social.verify_followee);
    }

    #[test]
    #[serial_test::serial]
    fn test_missing_identity_key_fails() {
        std::env::set_var("DATABASE_URL", "postgres://test");
        std::env::set_var("REDIS_URL", "redis://localhost");
        std::env::remove_var("IDENTITY_API_KEY");

        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("IDENTITY_API_KEY"));
    }

    #[test]
    #[serial_test::serial]
    fn test_rate_limit_overrides() {
        std::env::set_var("DATABASE_URL", "postgres://test");
        std::env::set_var("REDIS_URL", "redis://localhost");
        std::env::set_var("IDENTITY_API_KEY", "sk_test");
        std::env::set_var("POST_RATE_LIMIT_MAX", "10");
        std::env::set_var("SOCIAL_VERIFY_FOLLOWEE", "false");
        std::env::set_var("POST_RATE_LIMIT_TIMEOUT_MS", "250");

        let config = Config::from_env().unwrap();
        assert_eq!(config.rate_limit.max_requests, 10);
        assert_eq!(config.rate_limit.window_seconds, 60);
        assert_eq!(config.rate_limit.store_timeout_ms, 250);
        assert!(!config.social.verify_followee);

        std::env::remove_var("POST_RATE_LIMIT_MAX");
        std::env::remove_var("POST_RATE_LIMIT_TIMEOUT_MS");
        std::env::remove_var("SOCIAL_VERIFY_FOLLOWEE");
    }
}
