//! HTTP serving subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, guard middleware, graceful shutdown)
//!     → detection gates decide (pass / 403)
//!     → server.rs proxy handler forwards to the origin
//!     → dashboard.rs serves the read-only audit data API
//! ```

pub mod dashboard;
pub mod reject;
pub mod server;

pub use server::GuardServer;
