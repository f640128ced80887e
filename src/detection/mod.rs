//! Abuse detection subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → request_gate.rs (ledger check, request-rate heuristic)
//!     → [proxy forwards to origin]
//!     → response_gate.rs (failed-login and 404-scan heuristics)
//!     → Pass response to client, or replace with 403
//! ```
//!
//! # Design Decisions
//! - Three independent sliding-window trackers; heuristics never share counters
//! - Threshold checks are pure (heuristics.rs); block/log side effects live
//!   in the gates so the heuristics are testable without a database
//! - The block ledger, not the trackers, is the durable source of truth

pub mod heuristics;
pub mod request_gate;
pub mod response_gate;
pub mod tracker;

pub use request_gate::{RequestDecision, RequestGate};
pub use response_gate::{ResponseDecision, ResponseGate};
pub use tracker::{SlidingWindowTracker, TrackerStore};
