//! Process lifecycle subsystem.
//!
//! # Design Decisions
//! - Shutdown is a broadcast: every long-running task subscribes
//! - Tests trigger it programmatically; production uses Ctrl+C

pub mod shutdown;

pub use shutdown::Shutdown;
