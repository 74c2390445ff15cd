//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the worker.
//! All types derive Serde traits for deserialization from config files.

use serde::Deserialize;

/// Root configuration for the worker.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct WorkerConfig {
    /// Transport listener (bind address).
    pub listener: ListenerConfig,

    /// Outbound HTTP client settings.
    pub client: ClientConfig,

    /// Per-call resource limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:10053").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:10053".to_string(),
        }
    }
}

/// Outbound HTTP client configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Connection establishment timeout in milliseconds (0 = none).
    pub connect_timeout_ms: u64,

    /// Maximum redirects followed when a call follows redirects.
    pub max_redirects: usize,

    /// Redirect behavior for calls that do not say.
    pub follow_redirects_by_default: bool,

    /// User-Agent sent when the caller does not set one.
    pub user_agent: Option<String>,

    /// Honor HTTP_PROXY / HTTPS_PROXY from the environment.
    pub use_system_proxy: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,
            max_redirects: 5,
            follow_redirects_by_default: true,
            user_agent: Some(concat!("urlfetcher/", env!("CARGO_PKG_VERSION")).to_string()),
            use_system_proxy: true,
        }
    }
}

/// Per-call limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest inbound request payload accepted, in bytes.
    pub max_payload_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: 16 * 1024 * 1024, // 16MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
