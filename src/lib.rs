//! Relayer Keepalive - channel keep-alive and health monitoring
//!
//! Periodically refreshes the light clients behind an inter-chain channel
//! and exports the health of the channel, its clients and its packet
//! backlog as Prometheus gauges.

pub mod config;
pub mod ledger;
pub mod metrics;
pub mod path;
pub mod probe;
pub mod supervisor;
pub mod util;

pub use config::Config;
pub use supervisor::Supervisor;

/// Version for display
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
