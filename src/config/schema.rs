//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the security gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GuardConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The origin application this gateway protects.
    pub upstream: UpstreamConfig,

    /// Abuse detection thresholds.
    pub thresholds: ThresholdConfig,

    /// Detection behavior (bypass prefix, login path, failure policy).
    pub detection: DetectionConfig,

    /// Block ledger database settings.
    pub database: DatabaseConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
        }
    }
}

/// Origin application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Origin address (e.g., "127.0.0.1:8080").
    pub address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Abuse detection thresholds.
///
/// All three heuristics count events per client IP in a trailing window.
/// The limit is strict: the configured maximum is still allowed, one more
/// triggers the block.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Maximum requests per IP within the rate window.
    pub rate_limit_requests: u32,

    /// Rate limiting window in seconds.
    pub rate_limit_window_secs: u64,

    /// Maximum failed logins per IP within the brute-force window.
    pub brute_force_attempts: u32,

    /// Brute-force window in seconds.
    pub brute_force_window_secs: u64,

    /// Maximum 404 responses per IP within the scan window.
    pub dir_scan_404s: u32,

    /// Directory-scan window in seconds.
    pub dir_scan_window_secs: u64,

    /// How long an offending IP stays blocked, in seconds.
    pub block_duration_secs: u64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            rate_limit_requests: 20,
            rate_limit_window_secs: 10,
            brute_force_attempts: 5,
            brute_force_window_secs: 300,
            dir_scan_404s: 10,
            dir_scan_window_secs: 60,
            block_duration_secs: 600,
        }
    }
}

/// Detection behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Path prefix that bypasses all detection (the dashboard).
    pub dashboard_prefix: String,

    /// The authentication route watched for failed logins.
    pub login_path: String,

    /// Ledger failure policy. When true, a persistence outage lets traffic
    /// through (availability over security); when false, all traffic is
    /// rejected until the ledger is reachable again.
    pub fail_open: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            dashboard_prefix: "/siteguard_dashboard".to_string(),
            login_path: "/login".to_string(),
            fail_open: true,
        }
    }
}

/// Block ledger database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database path. ":memory:" keeps the ledger in process memory.
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "siteguard.db".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
