//! Keep-alive scheduling tests on a paused clock

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use relayer_keepalive::ledger::{ChannelState, UnrelayedSequences};
use relayer_keepalive::metrics::MetricsRegistry;
use relayer_keepalive::supervisor::Schedule;
use relayer_keepalive::{Config, Supervisor};
use tokio_test::assert_ok;

use crate::common::{FakeLedger, CONFIG};

fn schedule(config: &Config) -> Schedule {
    Schedule {
        update_interval: Duration::from_secs(5390),
        channel_interval: config.probes.channel_interval(),
        unrelayed_interval: config.probes.unrelayed_interval(),
        restart_delay: config.probes.restart_delay(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_healthy_path() {
    let config = assert_ok!(Config::from_toml(CONFIG));
    let path = assert_ok!(config.paths.get("hub-zone"));
    let ledger = FakeLedger::healthy(&path);
    *ledger.unrelayed.lock() = Ok(UnrelayedSequences {
        src: vec![21, 22, 23],
        dst: vec![8, 9],
    });
    let ledger = Arc::new(ledger);
    let registry = MetricsRegistry::new(&config.metrics.namespace, &config.metrics.subsystem);

    let supervisor = Supervisor::keep_alive(ledger.clone(), &registry, &path, None, &schedule(&config));
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(registry.get("channel_open").unwrap().get(), 1.0);
    assert_eq!(registry.get("unrelayed_sequences").unwrap().get(), 5.0);
    assert_eq!(registry.get("script_health_src").unwrap().get(), 1.0);
    assert_eq!(registry.get("script_health_dst").unwrap().get(), 1.0);
    assert!(registry.get("last_update_src").unwrap().get() > 0.0);
    assert_eq!(ledger.submissions.load(Ordering::SeqCst), 2);

    supervisor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_src_channel_query_error() {
    let config = assert_ok!(Config::from_toml(CONFIG));
    let path = assert_ok!(config.paths.get("hub-zone"));
    let ledger = Arc::new(FakeLedger::healthy(&path));
    *ledger.src_state.lock() = Err("connection refused".to_string());
    let registry = MetricsRegistry::new("GoZ", "relayer");

    let supervisor = Supervisor::keep_alive(ledger.clone(), &registry, &path, Some("hubclient"), &schedule(&config));
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(registry.get("channel_open").unwrap().get(), 0.0);

    // the next scheduled cycle still runs
    *ledger.src_state.lock() = Ok(ChannelState::Open);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(registry.get("channel_open").unwrap().get(), 1.0);

    // other probes are unaffected by the channel failure
    assert_eq!(registry.get("script_health").unwrap().get(), 1.0);
    assert_eq!(registry.get("unrelayed_sequences").unwrap().get(), 0.0);

    supervisor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_unrelayed_failure_is_sentinel() {
    let config = assert_ok!(Config::from_toml(CONFIG));
    let path = assert_ok!(config.paths.get("hub-zone"));
    let ledger = Arc::new(FakeLedger::healthy(&path));
    *ledger.unrelayed.lock() = Err("light client expired".to_string());
    let registry = MetricsRegistry::new("GoZ", "relayer");

    let supervisor = Supervisor::keep_alive(ledger.clone(), &registry, &path, None, &schedule(&config));
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(registry.get("unrelayed_sequences").unwrap().get(), -1.0);

    *ledger.unrelayed.lock() = Ok(UnrelayedSequences::default());
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(registry.get("unrelayed_sequences").unwrap().get(), 0.0);

    supervisor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_failing_updates_keep_health_down() {
    let config = assert_ok!(Config::from_toml(CONFIG));
    let path = assert_ok!(config.paths.get("hub-zone"));
    let mut ledger = FakeLedger::healthy(&path);
    ledger.fail_submissions_from = Some(1);
    let ledger = Arc::new(ledger);
    let registry = MetricsRegistry::new("GoZ", "relayer");

    let supervisor = Supervisor::keep_alive(ledger.clone(), &registry, &path, Some("hubclient"), &schedule(&config));
    tokio::time::sleep(Duration::from_millis(4_500)).await;

    assert_eq!(registry.get("script_health").unwrap().get(), 0.0);
    assert_eq!(registry.get("last_update").unwrap().get(), 0.0);
    // one attempt per restart delay: t = 0, 1, 2, 3, 4
    assert_eq!(ledger.submissions.load(Ordering::SeqCst), 5);
    // channel and backlog probes keep reporting
    assert_eq!(registry.get("channel_open").unwrap().get(), 1.0);

    supervisor.shutdown().await;
}
