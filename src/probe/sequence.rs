//! Unrelayed sequence probe

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::{Probe, ProbeResult};
use crate::ledger::LedgerClient;
use crate::metrics::Gauge;
use crate::path::Path;

/// Gauge value published when the backlog could not be determined
pub const PROBE_FAILED: f64 = -1.0;

/// Counts packets waiting to be relayed in either direction of a path
pub struct SequenceProbe {
    client: Arc<dyn LedgerClient>,
    path: Path,
    interval: Duration,
    gauge: Arc<Gauge>,
}

impl SequenceProbe {
    pub fn new(client: Arc<dyn LedgerClient>, path: Path, interval: Duration, gauge: Arc<Gauge>) -> Self {
        Self {
            client,
            path,
            interval,
            gauge,
        }
    }
}

#[async_trait]
impl Probe for SequenceProbe {
    fn name(&self) -> &'static str {
        "unrelayed_sequences"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn check(&self) -> ProbeResult {
        match self.client.unrelayed_sequences(&self.path).await {
            Ok(seqs) => ProbeResult::Success(Some(seqs.total())),
            Err(e) => {
                warn!(
                    path = %self.path.name,
                    stage = e.stage(),
                    error = %e,
                    "Couldn't get unrelayed sequences"
                );
                ProbeResult::Failure(e.to_string())
            }
        }
    }

    fn record(&self, result: &ProbeResult) {
        match result {
            ProbeResult::Success(Some(count)) => self.gauge.set(*count as f64),
            ProbeResult::Success(None) | ProbeResult::Failure(_) => self.gauge.set(PROBE_FAILED),
        }
    }
}
