//! Durable state subsystem.
//!
//! # Data Flow
//! ```text
//! gates decide
//!     → ledger.rs (BlockLedger upsert/lookup, ActivityLog append)
//!     → sqlite.rs (one long-lived connection, blocked_ips + suspicious_logs)
//!
//! dashboard reads
//!     → sqlite.rs aggregate queries
//! ```
//!
//! # Design Decisions
//! - One long-lived connection behind a mutex, not per-operation open/close
//! - Ledger failures degrade (fail-open by default), never crash a worker
//! - The suspicious log is append-only; rows are never updated or deleted

pub mod ledger;
pub mod sqlite;

pub use ledger::{ActivityLog, BlockLedger};
pub use sqlite::{BlockRecord, SqliteStore, StoreError, SuspiciousEvent};
