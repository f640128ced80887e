//! Configuration validation.
//!
//! Semantic checks on top of what serde already guarantees syntactically.
//! Returns all validation errors, not just the first.

use crate::config::schema::GuardConfig;

/// A single semantic validation failure.
#[derive(Debug)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn err(field: &'static str, message: impl Into<String>) -> ValidationError {
    ValidationError {
        field,
        message: message.into(),
    }
}

/// Validate a configuration, collecting every failure.
pub fn validate_config(config: &GuardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(err("listener.bind_address", "not a valid socket address"));
    }
    if config.upstream.address.is_empty() {
        errors.push(err("upstream.address", "must not be empty"));
    }

    let t = &config.thresholds;
    if t.rate_limit_window_secs == 0 {
        errors.push(err("thresholds.rate_limit_window_secs", "must be > 0"));
    }
    if t.brute_force_window_secs == 0 {
        errors.push(err("thresholds.brute_force_window_secs", "must be > 0"));
    }
    if t.dir_scan_window_secs == 0 {
        errors.push(err("thresholds.dir_scan_window_secs", "must be > 0"));
    }
    if t.block_duration_secs == 0 {
        errors.push(err("thresholds.block_duration_secs", "must be > 0"));
    }

    let prefix = &config.detection.dashboard_prefix;
    if !prefix.starts_with('/') {
        errors.push(err("detection.dashboard_prefix", "must start with '/'"));
    } else if prefix == "/" || prefix.ends_with('/') {
        // Router::nest rejects the bare root and trailing slashes.
        errors.push(err(
            "detection.dashboard_prefix",
            "must be a non-root prefix without a trailing '/'",
        ));
    }
    if !config.detection.login_path.starts_with('/') {
        errors.push(err("detection.login_path", "must start with '/'"));
    }
    if config.database.path.is_empty() {
        errors.push(err("database.path", "must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
