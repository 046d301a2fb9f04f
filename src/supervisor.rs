//! Probe supervision
//!
//! Every probe runs as its own tokio task for the lifetime of the process.
//! Only update runners are restarted: their cycles end on the first failed
//! submission and begin again, from an immediate update, after a fixed delay.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::ledger::LedgerClient;
use crate::metrics::{gauges, MetricsRegistry, UpdateGauges};
use crate::path::Path;
use crate::probe::{run_probe, ChannelProbe, KeepAliveTarget, Probe, SequenceProbe, UpdateRunner};

/// Delay before a failed update cycle is restarted
pub const DEFAULT_RESTART_DELAY: Duration = Duration::from_secs(1);

/// Cadence settings for every probe on a path
#[derive(Debug, Clone)]
pub struct Schedule {
    pub update_interval: Duration,
    pub channel_interval: Duration,
    pub unrelayed_interval: Duration,
    pub restart_delay: Duration,
}

/// Owns the probe tasks
pub struct Supervisor {
    tasks: JoinSet<()>,
    restart_delay: Duration,
}

impl Supervisor {
    pub fn new(restart_delay: Duration) -> Self {
        Self {
            tasks: JoinSet::new(),
            restart_delay,
        }
    }

    /// Register gauges and spawn every probe for a path
    ///
    /// One update runner per keep-alive direction, one channel probe and
    /// one unrelayed sequence probe.
    pub fn keep_alive(
        client: Arc<dyn LedgerClient>,
        registry: &MetricsRegistry,
        path: &Path,
        client_id: Option<&str>,
        schedule: &Schedule,
    ) -> Self {
        let mut supervisor = Self::new(schedule.restart_delay);

        supervisor.spawn_probe(SequenceProbe::new(
            client.clone(),
            path.clone(),
            schedule.unrelayed_interval,
            gauges::unrelayed_sequences(registry),
        ));

        for (direction, target) in KeepAliveTarget::for_path(path, client_id) {
            supervisor.spawn_update_runner(UpdateRunner::new(
                client.clone(),
                target,
                schedule.update_interval,
                UpdateGauges::register(registry, direction),
            ));
        }

        supervisor.spawn_probe(ChannelProbe::new(
            client,
            path.src.clone(),
            path.dst.clone(),
            schedule.channel_interval,
            gauges::channel_open(registry),
        ));

        info!(
            path = %path.name,
            tasks = supervisor.len(),
            "Keep-alive probes started"
        );
        supervisor
    }

    /// Spawn an update runner that is restarted whenever its cycle fails
    pub fn spawn_update_runner(&mut self, runner: UpdateRunner) {
        self.tasks.spawn(supervise_updates(runner, self.restart_delay));
    }

    /// Spawn a probe that runs on its interval forever
    pub fn spawn_probe<P: Probe + 'static>(&mut self, probe: P) {
        self.tasks.spawn(run_probe(probe));
    }

    /// Number of supervised tasks still running
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait on the supervised tasks
    ///
    /// Probe tasks never finish on their own, so this only returns once every
    /// task has panicked or been cancelled.
    pub async fn run(mut self) {
        while let Some(result) = self.tasks.join_next().await {
            match result {
                Err(e) if e.is_panic() => error!(error = %e, "Probe task panicked"),
                Err(e) => info!(error = %e, "Probe task cancelled"),
                Ok(()) => error!("Probe task exited"),
            }
        }
    }

    /// Cancel every supervised task
    pub async fn shutdown(mut self) {
        self.tasks.shutdown().await;
    }
}

/// Run update cycles forever, waiting `restart_delay` after each failure
///
/// There is no backoff and no retry limit.
pub async fn supervise_updates(runner: UpdateRunner, restart_delay: Duration) {
    let mut restarts: u64 = 0;

    loop {
        let err = match runner.run_cycle().await {
            Ok(never) => match never {},
            Err(e) => e,
        };

        error!(
            client = %runner.target(),
            stage = err.stage(),
            error = %err,
            restarts,
            "Error on update"
        );

        tokio::time::sleep(restart_delay).await;
        restarts += 1;
    }
}
