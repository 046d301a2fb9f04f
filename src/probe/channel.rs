//! Channel state probe

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::{Probe, ProbeResult};
use crate::ledger::LedgerClient;
use crate::metrics::Gauge;
use crate::path::PathEnd;

/// Checks that both ends of a channel are `OPEN`
pub struct ChannelProbe {
    client: Arc<dyn LedgerClient>,
    src: PathEnd,
    dst: PathEnd,
    interval: Duration,
    gauge: Arc<Gauge>,
}

impl ChannelProbe {
    pub fn new(
        client: Arc<dyn LedgerClient>,
        src: PathEnd,
        dst: PathEnd,
        interval: Duration,
        gauge: Arc<Gauge>,
    ) -> Self {
        Self {
            client,
            src,
            dst,
            interval,
            gauge,
        }
    }

    /// Ok if the end reports `OPEN`, else a description of what was seen
    async fn check_end(&self, side: &'static str, end: &PathEnd) -> Result<(), String> {
        match self.client.channel_state(end).await {
            Ok(state) if state.is_open() => Ok(()),
            Ok(state) => Err(format!(
                "expected {} channel {} to be OPEN but was {}",
                side, end, state
            )),
            Err(e) => Err(format!("failed to query {} channel {}: {}", side, end, e)),
        }
    }
}

#[async_trait]
impl Probe for ChannelProbe {
    fn name(&self) -> &'static str {
        "channel"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn check(&self) -> ProbeResult {
        // dst is only queried once src is known to be open
        let checked = match self.check_end("src", &self.src).await {
            Ok(()) => self.check_end("dst", &self.dst).await,
            Err(e) => Err(e),
        };

        match checked {
            Ok(()) => ProbeResult::Success(None),
            Err(reason) => ProbeResult::Failure(reason),
        }
    }

    fn record(&self, result: &ProbeResult) {
        match result {
            ProbeResult::Success(_) => self.gauge.set(1.0),
            ProbeResult::Failure(reason) => {
                warn!(%reason, "Wrong channel state");
                self.gauge.set(0.0);
            }
        }
    }
}
