//! Health probes
//!
//! Each probe is an independent loop that writes only to its own gauges.
//! Channel and sequence probes absorb failures every cycle; the update
//! runner ends its cycle on failure and is restarted by the supervisor.

mod channel;
mod sequence;
mod update;

pub use channel::ChannelProbe;
pub use sequence::SequenceProbe;
pub use update::{KeepAliveTarget, UpdateRunner};

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Outcome of a single probe execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    /// The probe ran; some probes carry a measured value
    Success(Option<u64>),
    /// The probe could not establish health
    Failure(String),
}

/// A periodic check that never aborts
#[async_trait]
pub trait Probe: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Time between the starts of consecutive cycles
    fn interval(&self) -> Duration;

    /// Run one check
    async fn check(&self) -> ProbeResult;

    /// Publish a result to the probe's gauge
    fn record(&self, result: &ProbeResult);

    /// Run one check and publish its result
    async fn run_once(&self) -> ProbeResult {
        let result = self.check().await;
        self.record(&result);
        result
    }
}

/// Run a probe on its interval forever, starting immediately
///
/// Cycles never overlap; a cycle that outlasts the interval delays the next
/// one rather than queueing extra runs.
pub async fn run_probe<P: Probe>(probe: P) {
    let mut ticker = tokio::time::interval(probe.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let result = probe.run_once().await;
        debug!(probe = probe.name(), ?result, "Probe cycle complete");
    }
}
