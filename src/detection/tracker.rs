//! Sliding-window event tracking per client identity.

use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Recency-bounded event counter for one abuse heuristic.
///
/// Answers "how many qualifying events has this identity produced in the
/// trailing window?". Entries live only in process memory and are lost on
/// restart; the durable suppression state is the block ledger.
///
/// The map is sharded (`DashMap`), and every mutation of one identity's
/// event list happens under that entry's exclusive lock, so concurrent
/// workers cannot lose updates or double-count.
#[derive(Default)]
pub struct SlidingWindowTracker {
    events: DashMap<String, Vec<Instant>>,
}

impl SlidingWindowTracker {
    pub fn new() -> Self {
        Self {
            events: DashMap::new(),
        }
    }

    /// Append an event timestamp for this identity.
    pub fn record(&self, identity: &str, now: Instant) {
        self.events.entry(identity.to_string()).or_default().push(now);
    }

    /// Count events within the trailing window, pruning older entries.
    ///
    /// Pruning is a deliberate side effect: the list never grows beyond
    /// one window's worth of traffic per identity.
    pub fn count_in_window(&self, identity: &str, now: Instant, window: Duration) -> usize {
        match self.events.get_mut(identity) {
            Some(mut entry) => {
                entry.retain(|t| now.duration_since(*t) < window);
                entry.len()
            }
            None => 0,
        }
    }

    /// Append an event, prune, and count — all under one entry lock.
    ///
    /// The gates use this so the prune-and-append is atomic per identity.
    /// The returned count includes the event just recorded.
    pub fn record_and_count(&self, identity: &str, now: Instant, window: Duration) -> usize {
        let mut entry = self.events.entry(identity.to_string()).or_default();
        entry.retain(|t| now.duration_since(*t) < window);
        entry.push(now);
        entry.len()
    }

    /// Clear the identity's event list entirely.
    pub fn reset(&self, identity: &str) {
        self.events.remove(identity);
    }
}

/// The three independent trackers, one per heuristic.
///
/// Owned in one place and passed by handle into the gates instead of
/// living as ambient global state.
#[derive(Default)]
pub struct TrackerStore {
    /// Request-flood (DoS) tracker.
    pub rate: SlidingWindowTracker,
    /// Failed-login (brute force) tracker.
    pub failed_login: SlidingWindowTracker,
    /// 404 (directory scan) tracker.
    pub not_found: SlidingWindowTracker,
}

impl TrackerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(10);

    #[test]
    fn counts_recorded_events() {
        let tracker = SlidingWindowTracker::new();
        let now = Instant::now();

        tracker.record("10.0.0.1", now);
        tracker.record("10.0.0.1", now);
        tracker.record("10.0.0.2", now);

        assert_eq!(tracker.count_in_window("10.0.0.1", now, WINDOW), 2);
        assert_eq!(tracker.count_in_window("10.0.0.2", now, WINDOW), 1);
        assert_eq!(tracker.count_in_window("10.0.0.3", now, WINDOW), 0);
    }

    #[test]
    fn prunes_events_outside_window() {
        let tracker = SlidingWindowTracker::new();
        let start = Instant::now();
        let later = start + Duration::from_secs(15);

        tracker.record("10.0.0.1", start);
        tracker.record("10.0.0.1", start + Duration::from_secs(12));

        // Only the second event is still inside the trailing 10s.
        assert_eq!(tracker.count_in_window("10.0.0.1", later, WINDOW), 1);
    }

    #[test]
    fn record_and_count_includes_current_event() {
        let tracker = SlidingWindowTracker::new();
        let now = Instant::now();

        assert_eq!(tracker.record_and_count("10.0.0.1", now, WINDOW), 1);
        assert_eq!(tracker.record_and_count("10.0.0.1", now, WINDOW), 2);
    }

    #[test]
    fn record_and_count_prunes_stale_entries() {
        let tracker = SlidingWindowTracker::new();
        let start = Instant::now();

        tracker.record("10.0.0.1", start);
        tracker.record("10.0.0.1", start);

        // Both earlier events fall out of the window; only the new one counts.
        let later = start + Duration::from_secs(11);
        assert_eq!(tracker.record_and_count("10.0.0.1", later, WINDOW), 1);
    }

    #[test]
    fn reset_clears_identity() {
        let tracker = SlidingWindowTracker::new();
        let now = Instant::now();

        tracker.record("10.0.0.1", now);
        tracker.record("10.0.0.2", now);
        tracker.reset("10.0.0.1");

        assert_eq!(tracker.count_in_window("10.0.0.1", now, WINDOW), 0);
        assert_eq!(tracker.count_in_window("10.0.0.2", now, WINDOW), 1);
    }
}
