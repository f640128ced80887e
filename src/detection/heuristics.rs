//! Pure threshold logic and the canonical reason strings.
//!
//! Kept free of side effects so the boundary semantics are testable
//! without trackers or a database.

use std::time::Duration;

use crate::config::ThresholdConfig;

/// Block reasons recorded in the ledger.
pub const REASON_RATE_LIMIT: &str = "Rate Limit (DoS)";
pub const REASON_BRUTE_FORCE: &str = "Brute Force";
pub const REASON_DIR_SCAN: &str = "Directory Scan (404s)";

/// Audit reasons for individual suspicious events.
pub const EVENT_FAILED_LOGIN: &str = "Failed Login";
pub const EVENT_NOT_FOUND: &str = "Page Not Found (404)";

/// One heuristic's limit: at most `max_events` within `window`.
///
/// The comparison is strict — the Nth event in the window is still
/// permitted, the (N+1)th trips the threshold.
#[derive(Debug, Clone, Copy)]
pub struct Threshold {
    pub max_events: u32,
    pub window: Duration,
}

impl Threshold {
    pub fn new(max_events: u32, window_secs: u64) -> Self {
        Self {
            max_events,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Whether a window count (including the current event) trips the limit.
    pub fn exceeded(&self, count: usize) -> bool {
        count as u64 > u64::from(self.max_events)
    }

    /// Request-rate threshold from config.
    pub fn rate(config: &ThresholdConfig) -> Self {
        Self::new(config.rate_limit_requests, config.rate_limit_window_secs)
    }

    /// Failed-login threshold from config.
    pub fn failed_login(config: &ThresholdConfig) -> Self {
        Self::new(config.brute_force_attempts, config.brute_force_window_secs)
    }

    /// 404-scan threshold from config.
    pub fn not_found(config: &ThresholdConfig) -> Self {
        Self::new(config.dir_scan_404s, config.dir_scan_window_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_is_strict() {
        let threshold = Threshold::new(20, 10);
        assert!(!threshold.exceeded(19));
        assert!(!threshold.exceeded(20));
        assert!(threshold.exceeded(21));
    }

    #[test]
    fn thresholds_from_default_config() {
        let config = crate::config::ThresholdConfig::default();
        assert_eq!(Threshold::rate(&config).max_events, 20);
        assert_eq!(Threshold::rate(&config).window, Duration::from_secs(10));
        assert_eq!(Threshold::failed_login(&config).max_events, 5);
        assert_eq!(Threshold::failed_login(&config).window, Duration::from_secs(300));
        assert_eq!(Threshold::not_found(&config).max_events, 10);
        assert_eq!(Threshold::not_found(&config).window, Duration::from_secs(60));
    }
}
