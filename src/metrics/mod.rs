//! Metrics and observability
//!
//! Explicitly constructed gauge registry with a Prometheus scrape endpoint.

mod exporter;
pub mod gauges;
mod registry;

pub use exporter::{Exporter, CONTENT_TYPE};
pub use gauges::UpdateGauges;
pub use registry::{Gauge, MetricsRegistry};
