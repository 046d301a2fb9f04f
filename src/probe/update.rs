//! Keep-alive update runner

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::ledger::{LedgerClient, LedgerError};
use crate::metrics::{Gauge, UpdateGauges};
use crate::path::{Direction, Path};

/// One direction of a path to keep alive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeepAliveTarget {
    /// Chain hosting the client
    pub src_chain: String,
    /// Chain the client tracks
    pub dst_chain: String,
    pub client_id: String,
}

impl KeepAliveTarget {
    /// Directions to keep alive for a path
    ///
    /// With an explicit client ID only the src -> dst direction is updated
    /// and the result carries no direction. Otherwise both ends' clients
    /// are updated.
    pub fn for_path(path: &Path, client_id: Option<&str>) -> Vec<(Option<Direction>, KeepAliveTarget)> {
        match client_id {
            Some(client_id) => vec![(
                None,
                KeepAliveTarget {
                    src_chain: path.src.chain_id.clone(),
                    dst_chain: path.dst.chain_id.clone(),
                    client_id: client_id.to_string(),
                },
            )],
            None => vec![
                (
                    Some(Direction::Src),
                    KeepAliveTarget {
                        src_chain: path.src.chain_id.clone(),
                        dst_chain: path.dst.chain_id.clone(),
                        client_id: path.src.client_id.clone(),
                    },
                ),
                (
                    Some(Direction::Dst),
                    KeepAliveTarget {
                        src_chain: path.dst.chain_id.clone(),
                        dst_chain: path.src.chain_id.clone(),
                        client_id: path.dst.client_id.clone(),
                    },
                ),
            ],
        }
    }
}

impl fmt::Display for KeepAliveTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}->{}", self.client_id, self.src_chain, self.dst_chain)
    }
}

/// Marks a runner unhealthy when its cycle ends, however it ends
struct HealthGuard<'a>(&'a Gauge);

impl Drop for HealthGuard<'_> {
    fn drop(&mut self) {
        self.0.set(0.0);
    }
}

/// Submits keep-alive updates for one direction on a fixed interval
pub struct UpdateRunner {
    client: Arc<dyn LedgerClient>,
    target: KeepAliveTarget,
    interval: Duration,
    gauges: UpdateGauges,
}

impl UpdateRunner {
    pub fn new(
        client: Arc<dyn LedgerClient>,
        target: KeepAliveTarget,
        interval: Duration,
        gauges: UpdateGauges,
    ) -> Self {
        Self {
            client,
            target,
            interval,
            gauges,
        }
    }

    pub fn target(&self) -> &KeepAliveTarget {
        &self.target
    }

    /// Run one update cycle until a submission fails
    ///
    /// The first update is sent immediately, then one per interval tick
    /// counted from the start of the cycle. Ticks missed while a submission
    /// is in flight collapse into one. A cycle only ends with the error that
    /// stopped it; the health gauge is 0 by the time this returns.
    pub async fn run_cycle(&self) -> Result<Infallible, LedgerError> {
        let _guard = HealthGuard(&self.gauges.health);

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        self.submit().await?;
        self.gauges.health.set(1.0);
        self.mark_success();

        loop {
            ticker.tick().await;
            self.submit().await?;
            self.mark_success();
        }
    }

    async fn submit(&self) -> Result<(), LedgerError> {
        info!(client = %self.target, "Updating clients");
        self.client
            .submit_keep_alive(
                &self.target.src_chain,
                &self.target.dst_chain,
                &self.target.client_id,
            )
            .await
    }

    /// Record a successful update; the timestamp never moves backwards
    fn mark_success(&self) {
        let previous = self.gauges.last_update.get();
        self.gauges.last_update.set_to_current_time();
        if self.gauges.last_update.get() < previous {
            self.gauges.last_update.set(previous);
        }
        debug!(client = %self.target, "Client update succeeded");
    }
}
