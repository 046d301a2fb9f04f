//! Gauge registry
//!
//! Gauges are created once at startup and handed to the probes that own
//! them. Each gauge keeps its last value in an atomic for cheap reads and
//! forwards every write to a Prometheus recorder used for exposition.

use dashmap::DashMap;
use metrics::{Key, KeyName, Level, Metadata, Recorder, SharedString};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Named last-write-wins value
pub struct Gauge {
    name: String,
    bits: AtomicU64,
    handle: metrics::Gauge,
}

impl Gauge {
    /// Full exposed name, including the registry prefix
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
        self.handle.set(value);
    }

    #[inline]
    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// Set to the current unix time in seconds
    pub fn set_to_current_time(&self) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        self.set(now);
    }
}

impl std::fmt::Debug for Gauge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gauge")
            .field("name", &self.name)
            .field("value", &self.get())
            .finish()
    }
}

/// Owns every gauge exposed by the process
pub struct MetricsRegistry {
    prefix: String,
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
    gauges: DashMap<String, Arc<Gauge>>,
}

impl MetricsRegistry {
    /// Create an empty registry whose gauges are named `<namespace>_<subsystem>_<name>`
    pub fn new(namespace: &str, subsystem: &str) -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        Self {
            prefix: format!("{}_{}_", namespace, subsystem),
            recorder,
            handle,
            gauges: DashMap::new(),
        }
    }

    /// Register a gauge, or return the existing one with the same name
    pub fn gauge(&self, name: &str, help: &str) -> Arc<Gauge> {
        let full_name = format!("{}{}", self.prefix, name);

        self.gauges
            .entry(full_name.clone())
            .or_insert_with(|| {
                self.recorder.describe_gauge(
                    KeyName::from(full_name.clone()),
                    None,
                    SharedString::from(help.to_string()),
                );

                let metadata = Metadata::new(module_path!(), Level::INFO, Some(module_path!()));
                let handle = self
                    .recorder
                    .register_gauge(&Key::from_name(full_name.clone()), &metadata);

                Arc::new(Gauge {
                    name: full_name,
                    bits: AtomicU64::new(0f64.to_bits()),
                    handle,
                })
            })
            .value()
            .clone()
    }

    /// Look up a gauge by its unprefixed name
    pub fn get(&self, name: &str) -> Option<Arc<Gauge>> {
        self.gauges
            .get(&format!("{}{}", self.prefix, name))
            .map(|g| g.value().clone())
    }

    /// Full names of every registered gauge, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.gauges.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.gauges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gauges.is_empty()
    }

    /// Render every gauge in the Prometheus text exposition format
    ///
    /// Families are emitted sorted by name, so output only changes when a
    /// gauge value does.
    pub fn render(&self) -> String {
        let exposition = self.handle.render();

        let mut families: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for line in exposition.lines().filter(|l| !l.trim().is_empty()) {
            families.entry(family_name(line)).or_default().push(line);
        }

        let mut output = String::with_capacity(exposition.len());
        for lines in families.values() {
            for line in lines {
                output.push_str(line);
                output.push('\n');
            }
            output.push('\n');
        }
        output
    }
}

/// Metric name an exposition line belongs to
///
/// `# HELP <name> ...` and `# TYPE <name> ...` carry it as their second
/// word; samples start with it.
fn family_name(line: &str) -> &str {
    match line.strip_prefix('#') {
        Some(comment) => comment.split_whitespace().nth(1).unwrap_or(""),
        None => line
            .split(|c: char| c == '{' || c.is_whitespace())
            .next()
            .unwrap_or(""),
    }
}
