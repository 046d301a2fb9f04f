//! Scrape endpoint tests over real sockets

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use relayer_keepalive::ledger::UnrelayedSequences;
use relayer_keepalive::metrics::{Exporter, MetricsRegistry, CONTENT_TYPE};
use relayer_keepalive::supervisor::Schedule;
use relayer_keepalive::{Config, Supervisor};

use crate::common::{FakeLedger, CONFIG};

async fn get(addr: SocketAddr, target: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {} HTTP/1.1\r\nHost: {}\r\nAccept: */*\r\n\r\n", target, addr);
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

fn body(response: &str) -> &str {
    response.split_once("\r\n\r\n").map(|(_, b)| b).unwrap_or("")
}

#[tokio::test]
async fn test_scrape_reflects_probes() {
    let config = Config::from_toml(CONFIG).unwrap();
    let path = config.paths.get("hub-zone").unwrap();
    let ledger = FakeLedger::healthy(&path);
    *ledger.unrelayed.lock() = Ok(UnrelayedSequences {
        src: vec![1, 2, 3],
        dst: vec![4, 5],
    });

    let registry = Arc::new(MetricsRegistry::new(
        &config.metrics.namespace,
        &config.metrics.subsystem,
    ));
    let exporter = Exporter::bind(config.metrics.bind_addr, registry.clone()).unwrap();
    let addr = exporter.local_addr().unwrap();
    let server = tokio::spawn(exporter.serve());

    let schedule = Schedule {
        update_interval: Duration::from_secs(5390),
        channel_interval: Duration::from_secs(3600),
        unrelayed_interval: Duration::from_secs(3600),
        restart_delay: Duration::from_secs(1),
    };
    let supervisor = Supervisor::keep_alive(Arc::new(ledger), &registry, &path, None, &schedule);

    // first cycles run immediately; wait for them to land
    for _ in 0..100 {
        if registry.get("unrelayed_sequences").map(|g| g.get()) == Some(5.0)
            && registry.get("channel_open").map(|g| g.get()) == Some(1.0)
            && registry.get("script_health_dst").map(|g| g.get()) == Some(1.0)
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let response = get(addr, "/metrics").await;
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.contains(CONTENT_TYPE));

    let first = body(&response).to_string();
    assert!(first.contains("GoZ_relayer_unrelayed_sequences 5"));
    assert!(first.contains("GoZ_relayer_channel_open 1"));
    assert!(first.contains("GoZ_relayer_script_health_src 1"));
    assert!(first.contains("GoZ_relayer_script_health_dst 1"));
    assert!(first.contains("# TYPE GoZ_relayer_last_update_src gauge"));

    // scraping between probe cycles is idempotent
    let second = get(addr, "/metrics").await;
    assert_eq!(first, body(&second));

    supervisor.shutdown().await;
    server.abort();
}

#[tokio::test]
async fn test_only_metrics_path_is_served() {
    let registry = Arc::new(MetricsRegistry::new("GoZ", "relayer"));
    let exporter = Exporter::bind("127.0.0.1:0".parse().unwrap(), registry).unwrap();
    let addr = exporter.local_addr().unwrap();
    let server = tokio::spawn(exporter.serve());

    assert!(get(addr, "/").await.starts_with("HTTP/1.1 404 Not Found"));
    assert!(get(addr, "/health").await.starts_with("HTTP/1.1 404 Not Found"));
    assert!(get(addr, "/metrics").await.starts_with("HTTP/1.1 200 OK"));

    server.abort();
}

#[tokio::test]
async fn test_bind_conflict_is_reported() {
    let registry = Arc::new(MetricsRegistry::new("GoZ", "relayer"));
    let first = Exporter::bind("127.0.0.1:0".parse().unwrap(), registry.clone()).unwrap();
    let addr = first.local_addr().unwrap();

    let err = Exporter::bind(addr, registry).err().unwrap();
    assert!(err.to_string().contains("Failed to bind metrics endpoint"));
}
