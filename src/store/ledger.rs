//! Block ledger and audit log over the SQLite store.
//!
//! These wrappers own the failure policy: a persistence outage is logged
//! for the operator and recovered locally. It is never surfaced to the
//! client and never aborts an in-flight request.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::store::sqlite::SqliteStore;

/// Durable single source of truth for suppressed identities.
pub struct BlockLedger {
    store: Arc<SqliteStore>,
    /// When the store is unreachable: true lets traffic through
    /// (availability over security), false rejects everything.
    fail_open: bool,
}

impl BlockLedger {
    pub fn new(store: Arc<SqliteStore>, fail_open: bool) -> Self {
        Self { store, fail_open }
    }

    /// Whether an active block exists for this identity.
    ///
    /// An expired record found here is deleted before returning false, so
    /// expiry needs no background sweep and repeat lookups are cheap.
    pub fn is_blocked(&self, identity: &str) -> bool {
        let now = Utc::now();
        match self.store.find_block(identity) {
            Ok(Some(record)) => {
                if record.blocked_until > now {
                    true
                } else {
                    // Guarded delete: a fresh block upserted since the
                    // lookup above must survive this cleanup.
                    if let Err(e) = self.store.delete_expired_block(identity, now) {
                        tracing::error!(client = %identity, error = %e, "Failed to remove expired block");
                    }
                    false
                }
            }
            Ok(None) => false,
            Err(e) => {
                tracing::error!(client = %identity, error = %e, "Block lookup failed");
                !self.fail_open
            }
        }
    }

    /// Block an identity for `duration`, overwriting any prior record.
    ///
    /// Always also appends an `IP BLOCKED: {reason}` audit entry; the two
    /// writes are one logical action. Store errors are logged and swallowed.
    pub fn block(&self, identity: &str, reason: &str, duration: Duration) {
        let now = Utc::now();
        let blocked_until = now
            + chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::zero());

        match self.store.upsert_block(identity, blocked_until, reason) {
            Ok(()) => {
                tracing::warn!(client = %identity, reason = %reason, until = %blocked_until, "IP blocked");
            }
            Err(e) => {
                tracing::error!(client = %identity, reason = %reason, error = %e, "Failed to persist block");
            }
        }

        let audit_reason = format!("IP BLOCKED: {}", reason);
        if let Err(e) = self.store.insert_event(identity, now, &audit_reason, Some("N/A")) {
            tracing::error!(client = %identity, error = %e, "Failed to log block event");
        }
    }
}

/// Append-only audit trail of suspicious events.
pub struct ActivityLog {
    store: Arc<SqliteStore>,
}

impl ActivityLog {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self { store }
    }

    /// Record one suspicious event. A write failure here must not abort
    /// the request being served, so errors are logged and dropped.
    pub fn record(&self, identity: &str, reason: &str, path: &str) {
        if let Err(e) = self.store.insert_event(identity, Utc::now(), reason, Some(path)) {
            tracing::error!(client = %identity, reason = %reason, error = %e, "Failed to log suspicious activity");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(fail_open: bool) -> (BlockLedger, Arc<SqliteStore>) {
        let store = Arc::new(SqliteStore::open(":memory:").unwrap());
        (BlockLedger::new(store.clone(), fail_open), store)
    }

    #[test]
    fn block_then_lookup() {
        let (ledger, _store) = ledger(true);

        assert!(!ledger.is_blocked("10.0.0.1"));
        ledger.block("10.0.0.1", "Rate Limit (DoS)", Duration::from_secs(600));
        assert!(ledger.is_blocked("10.0.0.1"));
        assert!(!ledger.is_blocked("10.0.0.2"));
    }

    #[test]
    fn expired_block_is_lazily_deleted() {
        let (ledger, store) = ledger(true);
        let past = Utc::now() - chrono::Duration::minutes(1);

        store.upsert_block("10.0.0.1", past, "Brute Force").unwrap();

        // First lookup observes the expiry and deletes the row.
        assert!(!ledger.is_blocked("10.0.0.1"));
        assert!(store.find_block("10.0.0.1").unwrap().is_none());

        // Repeat lookup is error-free.
        assert!(!ledger.is_blocked("10.0.0.1"));
    }

    #[test]
    fn block_writes_audit_entry() {
        let (ledger, store) = ledger(true);

        ledger.block("10.0.0.1", "Brute Force", Duration::from_secs(600));

        let events = store.recent_events(10).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].reason, "IP BLOCKED: Brute Force");
        assert_eq!(events[0].request_path.as_deref(), Some("N/A"));
    }

    #[test]
    fn reblocking_extends_the_existing_record() {
        let (ledger, store) = ledger(true);

        ledger.block("10.0.0.1", "Rate Limit (DoS)", Duration::from_secs(60));
        let first = store.find_block("10.0.0.1").unwrap().unwrap();

        ledger.block("10.0.0.1", "Brute Force", Duration::from_secs(600));
        let second = store.find_block("10.0.0.1").unwrap().unwrap();

        assert!(second.blocked_until > first.blocked_until);
        assert_eq!(second.reason, "Brute Force");
        // Two block actions, two audit entries, one ledger row.
        assert_eq!(store.total_blocked_events().unwrap(), 2);
        assert_eq!(store.active_blocks(Utc::now()).unwrap().len(), 1);
    }

    #[test]
    fn expiry_cleanup_spares_a_concurrent_fresh_block() {
        let (ledger, store) = ledger(true);
        let observed = Utc::now();

        store
            .upsert_block("10.0.0.1", observed - chrono::Duration::minutes(1), "Rate Limit (DoS)")
            .unwrap();

        // One worker's lookup observes the expired row...
        let stale = store.find_block("10.0.0.1").unwrap().unwrap();
        assert!(stale.blocked_until <= observed);

        // ...another worker installs a fresh block before the cleanup runs...
        ledger.block("10.0.0.1", "Brute Force", Duration::from_secs(600));

        // ...and the guarded delete leaves the fresh block untouched.
        store.delete_expired_block("10.0.0.1", observed).unwrap();
        let record = store.find_block("10.0.0.1").unwrap().unwrap();
        assert_eq!(record.reason, "Brute Force");
        assert!(ledger.is_blocked("10.0.0.1"));
    }

    #[test]
    fn blocks_survive_a_store_reopen() {
        let path = std::env::temp_dir().join(format!("siteguard-ledger-{}.db", std::process::id()));
        let path = path.to_string_lossy().into_owned();
        let _ = std::fs::remove_file(&path);

        {
            let store = Arc::new(SqliteStore::open(&path).unwrap());
            let ledger = BlockLedger::new(store, true);
            ledger.block("10.0.0.1", "Brute Force", Duration::from_secs(600));
        }

        // Reopen: schema bootstrap is idempotent, and both the ledger row
        // and the audit entry are still there.
        let store = Arc::new(SqliteStore::open(&path).unwrap());
        let ledger = BlockLedger::new(store.clone(), true);
        assert!(ledger.is_blocked("10.0.0.1"));
        assert_eq!(store.total_blocked_events().unwrap(), 1);

        drop(ledger);
        drop(store);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn fail_open_allows_on_store_error() {
        let (ledger, store) = ledger(true);
        store.execute_raw("DROP TABLE blocked_ips").unwrap();

        assert!(!ledger.is_blocked("10.0.0.1"));
    }

    #[test]
    fn fail_closed_rejects_on_store_error() {
        let (ledger, store) = ledger(false);
        store.execute_raw("DROP TABLE blocked_ips").unwrap();

        assert!(ledger.is_blocked("10.0.0.1"));
    }

    #[test]
    fn block_survives_audit_log_outage() {
        let (ledger, store) = ledger(true);
        store.execute_raw("DROP TABLE suspicious_logs").unwrap();

        // The ledger write still lands; the audit failure is swallowed.
        ledger.block("10.0.0.1", "Rate Limit (DoS)", Duration::from_secs(600));
        assert!(ledger.is_blocked("10.0.0.1"));
    }
}
