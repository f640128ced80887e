//! SQLite persistence for the block ledger and the suspicious-activity log.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use thiserror::Error;

/// Persistence failure. Callers in the decision path recover from this
/// locally; it never reaches a client.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// A currently- or formerly-blocked identity. One row per IP.
#[derive(Debug, Clone, Serialize)]
pub struct BlockRecord {
    pub ip_address: String,
    pub blocked_until: DateTime<Utc>,
    pub reason: String,
}

/// One append-only audit entry.
#[derive(Debug, Clone, Serialize)]
pub struct SuspiciousEvent {
    pub ip_address: String,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
    pub request_path: Option<String>,
}

/// Store wrapper around one long-lived SQLite connection.
///
/// All ledger operations for a given identity go through the same mutex,
/// so an upsert or lazy delete is atomic with respect to concurrent
/// lookups.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database and ensure the schema exists.
    ///
    /// `:memory:` is accepted for tests and ephemeral deployments.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS blocked_ips (
                ip_address    TEXT PRIMARY KEY NOT NULL,
                blocked_until TEXT NOT NULL,
                reason        TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS suspicious_logs (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                ip_address   TEXT NOT NULL,
                timestamp    TEXT NOT NULL,
                reason       TEXT NOT NULL,
                request_path TEXT
            );
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert or replace the block record for an IP.
    pub fn upsert_block(
        &self,
        ip: &str,
        blocked_until: DateTime<Utc>,
        reason: &str,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            "INSERT OR REPLACE INTO blocked_ips (ip_address, blocked_until, reason)
             VALUES (?1, ?2, ?3)",
            params![ip, blocked_until, reason],
        )?;
        Ok(())
    }

    /// Fetch the block record for an IP, active or expired.
    pub fn find_block(&self, ip: &str) -> Result<Option<BlockRecord>, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let record = conn
            .query_row(
                "SELECT ip_address, blocked_until, reason FROM blocked_ips
                 WHERE ip_address = ?1",
                params![ip],
                |row| {
                    Ok(BlockRecord {
                        ip_address: row.get(0)?,
                        blocked_until: row.get(1)?,
                        reason: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    /// Remove the block record for an IP only if it was already expired
    /// at `now`.
    ///
    /// Used for lazy expiry: the guard in the WHERE clause makes the
    /// delete a no-op when a concurrent upsert has installed a fresh
    /// block since the caller observed the expired row.
    pub fn delete_expired_block(
        &self,
        ip: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            "DELETE FROM blocked_ips WHERE ip_address = ?1 AND blocked_until <= ?2",
            params![ip, now],
        )?;
        Ok(())
    }

    /// Append one suspicious event. Rows are never updated or deleted.
    pub fn insert_event(
        &self,
        ip: &str,
        timestamp: DateTime<Utc>,
        reason: &str,
        path: Option<&str>,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            "INSERT INTO suspicious_logs (ip_address, timestamp, reason, request_path)
             VALUES (?1, ?2, ?3, ?4)",
            params![ip, timestamp, reason, path],
        )?;
        Ok(())
    }

    /// Count audit entries recording a block action.
    pub fn total_blocked_events(&self) -> Result<i64, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let count = conn.query_row(
            "SELECT COUNT(*) FROM suspicious_logs WHERE reason LIKE 'IP BLOCKED:%'",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// All block records still active at `now`.
    pub fn active_blocks(&self, now: DateTime<Utc>) -> Result<Vec<BlockRecord>, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT ip_address, blocked_until, reason FROM blocked_ips
             WHERE blocked_until > ?1",
        )?;
        let rows = stmt.query_map(params![now], |row| {
            Ok(BlockRecord {
                ip_address: row.get(0)?,
                blocked_until: row.get(1)?,
                reason: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Event counts grouped by reason, most frequent first.
    pub fn reason_breakdown(&self) -> Result<Vec<(String, i64)>, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT reason, COUNT(*) as count FROM suspicious_logs
             GROUP BY reason ORDER BY count DESC",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// The most recent events, newest first.
    pub fn recent_events(&self, limit: u32) -> Result<Vec<SuspiciousEvent>, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT ip_address, timestamp, reason, request_path FROM suspicious_logs
             ORDER BY timestamp DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(SuspiciousEvent {
                ip_address: row.get(0)?,
                timestamp: row.get(1)?,
                reason: row.get(2)?,
                request_path: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Run arbitrary SQL; test hook for simulating a broken store.
    #[cfg(test)]
    pub fn execute_raw(&self, sql: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute_batch(sql)?;
        Ok(())
    }
}
