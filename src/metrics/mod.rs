//! Metrics for the normalization pipeline
//!
//! Metrics are recorded through the `metrics` facade. Nothing is exported
//! unless a recorder is installed, so library users and tests pay only for
//! the no-op calls. The binary installs a Prometheus recorder when
//! `CONFNORM_METRICS_ADDR` is set.

pub mod pipeline;

pub use pipeline::PipelineMetrics;

use std::net::SocketAddr;
use std::sync::Once;

use tracing::{info, warn};

/// Environment variable holding the Prometheus listen address
pub const METRICS_ADDR_ENV: &str = "CONFNORM_METRICS_ADDR";

static INIT: Once = Once::new();

/// Install the Prometheus recorder and HTTP listener.
///
/// Idempotent. Does nothing when `CONFNORM_METRICS_ADDR` is unset or does
/// not parse as a socket address. Must run inside a Tokio runtime.
pub fn init_metrics() {
    INIT.call_once(|| {
        let Ok(addr_str) = std::env::var(METRICS_ADDR_ENV) else {
            return;
        };
        let addr = match addr_str.parse::<SocketAddr>() {
            Ok(addr) => addr,
            Err(e) => {
                warn!("Invalid metrics addr '{}': {}", addr_str, e);
                return;
            }
        };

        match metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
        {
            Ok(()) => {
                PipelineMetrics::register_metrics();
                info!("📈 Prometheus exporter listening at http://{}/metrics", addr);
            }
            Err(e) => warn!("Failed to install Prometheus recorder: {}", e),
        }
    });
}

/// A named group of metrics that is pre-registered at startup
pub trait PhaseMetrics {
    fn register_metrics();

    fn phase_name() -> &'static str;

    fn metrics_documentation() -> Vec<MetricDoc>;
}

#[derive(Debug, Clone)]
pub struct MetricDoc {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub help: &'static str,
    pub labels: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
}

/// Build a metric name as `confnorm_{phase}_{name}`, with `_total` on counters
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("confnorm_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("confnorm_", $phase, "_", $name)
    };
}

pub(crate) use phase_metric;
