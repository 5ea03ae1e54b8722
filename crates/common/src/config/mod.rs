//! Configuration management for CiteGraph services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Bibliographic source configuration (Semantic Scholar)
    #[serde(default)]
    pub source: SourceConfig,

    /// Network-builder configuration
    #[serde(default)]
    pub builder: BuilderConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Inbound rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Base URL of the bibliographic API
    #[serde(default = "default_source_base_url")]
    pub base_url: String,

    /// API key; requests run unauthenticated (and heavily throttled) without one
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_source_timeout")]
    pub timeout_secs: u64,

    /// Maximum attempts for a transiently failing call
    #[serde(default = "default_source_retries")]
    pub max_retries: u32,

    /// Base delay for exponential retry backoff, in milliseconds
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Outbound requests per second shared across all workers
    #[serde(default = "default_source_rps")]
    pub requests_per_second: u32,

    /// Outbound burst capacity
    #[serde(default = "default_source_burst")]
    pub burst: u32,

    /// Page size for reference/citation fetches
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BuilderConfig {
    /// Default cap on the reviewed-paper set
    #[serde(default = "default_max_reviewed")]
    pub max_reviewed: usize,

    /// Worker-pool width for per-paper resolution/reference calls
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per second
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 120 }
fn default_shutdown_timeout() -> u64 { 30 }
fn default_source_base_url() -> String {
    "https://api.semanticscholar.org/graph/v1".to_string()
}
fn default_source_timeout() -> u64 { 10 }
fn default_source_retries() -> u32 { 3 }
fn default_retry_base_delay_ms() -> u64 { 500 }
fn default_source_rps() -> u32 { 5 }
fn default_source_burst() -> u32 { 5 }
fn default_page_size() -> usize { 500 }
fn default_max_reviewed() -> usize { 50 }
fn default_concurrency() -> usize { 4 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "citegraph".to_string() }
fn default_rate_limit() -> u32 { 50 }
fn default_burst() -> u32 { 100 }
fn default_enabled() -> bool { true }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__SOURCE__API_KEY=...
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            source: SourceConfig::default(),
            builder: BuilderConfig::default(),
            observability: ObservabilityConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_source_base_url(),
            api_key: None,
            timeout_secs: default_source_timeout(),
            max_retries: default_source_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            requests_per_second: default_source_rps(),
            burst: default_source_burst(),
            page_size: default_page_size(),
        }
    }
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            max_reviewed: default_max_reviewed(),
            concurrency: default_concurrency(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rate_limit(),
            burst: default_burst(),
            enabled: default_enabled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.source.max_retries, 3);
        assert_eq!(config.source.page_size, 500);
        assert_eq!(config.builder.max_reviewed, 50);
    }

    #[test]
    fn test_source_defaults_point_at_semantic_scholar() {
        let config = SourceConfig::default();
        assert!(config.base_url.contains("semanticscholar.org"));
        assert!(config.api_key.is_none());
    }
}
