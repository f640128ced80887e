//! SiteGuard — security gateway and reverse proxy.

pub mod config;
pub mod detection;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod store;

pub use config::schema::GuardConfig;
pub use http::GuardServer;
pub use lifecycle::Shutdown;
