//! Gauges published by the keep-alive probes

use std::sync::Arc;

use super::registry::{Gauge, MetricsRegistry};
use crate::path::Direction;

pub const SCRIPT_HEALTH: &str = "script_health";
pub const LAST_UPDATE: &str = "last_update";
pub const CHANNEL_OPEN: &str = "channel_open";
pub const UNRELAYED_SEQUENCES: &str = "unrelayed_sequences";

/// Gauges owned by one update runner
#[derive(Debug, Clone)]
pub struct UpdateGauges {
    /// 1.0 while updates succeed, 0.0 once a cycle fails
    pub health: Arc<Gauge>,
    /// Unix time of the last successful update
    pub last_update: Arc<Gauge>,
}

impl UpdateGauges {
    /// Register the gauges for one update direction
    ///
    /// `None` is used when a single client is monitored and yields the bare
    /// gauge names; a direction appends `_src` or `_dst`.
    pub fn register(registry: &MetricsRegistry, direction: Option<Direction>) -> Self {
        let suffixed = |base: &str| match direction {
            Some(dir) => format!("{}_{}", base, dir),
            None => base.to_string(),
        };

        Self {
            health: registry.gauge(
                &suffixed(SCRIPT_HEALTH),
                "0.0 if script is not running successfully, else 1.0",
            ),
            last_update: registry.gauge(
                &suffixed(LAST_UPDATE),
                "unix timestamp in seconds of when the last update was executed",
            ),
        }
    }
}

pub fn channel_open(registry: &MetricsRegistry) -> Arc<Gauge> {
    registry.gauge(CHANNEL_OPEN, "1.0 if channel open in both directions, else 0.0")
}

pub fn unrelayed_sequences(registry: &MetricsRegistry) -> Arc<Gauge> {
    registry.gauge(
        UNRELAYED_SEQUENCES,
        "number of unrelayed sequences or -1 if the probe failed",
    )
}
