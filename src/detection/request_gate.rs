//! Pre-request policy: ledger check plus request-rate heuristic.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::detection::heuristics::{Threshold, REASON_RATE_LIMIT};
use crate::detection::tracker::TrackerStore;
use crate::store::BlockLedger;

/// Outcome of inspecting an inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestDecision {
    /// Dashboard traffic; no tracker or ledger is touched.
    Bypass,
    /// Forward to the origin.
    Allow,
    /// Terminate with 403 and this message; the origin is never contacted.
    Reject(&'static str),
}

/// Runs before every request reaches the proxy handler.
pub struct RequestGate {
    ledger: Arc<BlockLedger>,
    trackers: Arc<TrackerStore>,
    rate: Threshold,
    block_duration: Duration,
    dashboard_prefix: String,
}

impl RequestGate {
    pub fn new(
        ledger: Arc<BlockLedger>,
        trackers: Arc<TrackerStore>,
        rate: Threshold,
        block_duration: Duration,
        dashboard_prefix: String,
    ) -> Self {
        Self {
            ledger,
            trackers,
            rate,
            block_duration,
            dashboard_prefix,
        }
    }

    /// Decide whether this request may proceed to the origin.
    pub fn inspect(&self, identity: &str, path: &str, now: Instant) -> RequestDecision {
        // Never police our own dashboard
        if path.starts_with(&self.dashboard_prefix) {
            return RequestDecision::Bypass;
        }

        // 1. Already blocked?
        if self.ledger.is_blocked(identity) {
            return RequestDecision::Reject(
                "Your IP address has been temporarily blocked due to suspicious activity.",
            );
        }

        // 2. Rate limiting (DoS detection)
        let count = self
            .trackers
            .rate
            .record_and_count(identity, now, self.rate.window);
        if self.rate.exceeded(count) {
            self.ledger
                .block(identity, REASON_RATE_LIMIT, self.block_duration);
            self.trackers.rate.reset(identity);
            return RequestDecision::Reject("Rate limit exceeded. Your IP is blocked.");
        }

        RequestDecision::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ActivityLog, SqliteStore};

    fn gate_with_limit(max: u32) -> (RequestGate, Arc<SqliteStore>) {
        let store = Arc::new(SqliteStore::open(":memory:").unwrap());
        let ledger = Arc::new(BlockLedger::new(store.clone(), true));
        let gate = RequestGate::new(
            ledger,
            Arc::new(TrackerStore::new()),
            Threshold::new(max, 10),
            Duration::from_secs(600),
            "/siteguard_dashboard".to_string(),
        );
        (gate, store)
    }

    #[test]
    fn allows_up_to_the_limit() {
        let (gate, _store) = gate_with_limit(20);
        let now = Instant::now();

        for _ in 0..20 {
            assert_eq!(gate.inspect("10.0.0.1", "/", now), RequestDecision::Allow);
        }
    }

    #[test]
    fn twenty_first_request_is_rejected_and_blocked() {
        let (gate, store) = gate_with_limit(20);
        let now = Instant::now();

        for _ in 0..20 {
            assert_eq!(gate.inspect("10.0.0.1", "/", now), RequestDecision::Allow);
        }
        assert!(matches!(
            gate.inspect("10.0.0.1", "/", now),
            RequestDecision::Reject(_)
        ));

        let record = store.find_block("10.0.0.1").unwrap().unwrap();
        assert_eq!(record.reason, REASON_RATE_LIMIT);

        // The ledger now rejects before the tracker is even consulted.
        assert!(matches!(
            gate.inspect("10.0.0.1", "/", now),
            RequestDecision::Reject(_)
        ));
    }

    #[test]
    fn blocking_also_writes_an_audit_entry() {
        let (gate, store) = gate_with_limit(2);
        let now = Instant::now();

        for _ in 0..3 {
            gate.inspect("10.0.0.9", "/", now);
        }

        assert_eq!(store.total_blocked_events().unwrap(), 1);
        let events = store.recent_events(10).unwrap();
        assert_eq!(events[0].reason, format!("IP BLOCKED: {}", REASON_RATE_LIMIT));
    }

    #[test]
    fn identities_are_tracked_separately() {
        let (gate, _store) = gate_with_limit(2);
        let now = Instant::now();

        gate.inspect("10.0.0.1", "/", now);
        gate.inspect("10.0.0.1", "/", now);
        assert_eq!(gate.inspect("10.0.0.2", "/", now), RequestDecision::Allow);
    }

    #[test]
    fn dashboard_traffic_is_never_counted() {
        let (gate, store) = gate_with_limit(2);
        let now = Instant::now();

        for _ in 0..50 {
            assert_eq!(
                gate.inspect("10.0.0.1", "/siteguard_dashboard/data", now),
                RequestDecision::Bypass
            );
        }
        assert!(store.find_block("10.0.0.1").unwrap().is_none());

        // No tracker state accumulated either: normal requests still pass.
        assert_eq!(gate.inspect("10.0.0.1", "/", now), RequestDecision::Allow);
    }

    #[test]
    fn audit_failures_do_not_propagate() {
        // Sanity check that an ActivityLog over a broken store stays silent.
        let store = Arc::new(SqliteStore::open(":memory:").unwrap());
        store.execute_raw("DROP TABLE suspicious_logs").unwrap();
        let log = ActivityLog::new(store);
        log.record("10.0.0.1", "Failed Login", "/login");
    }
}
