//! Metrics for the summary harvester.
//!
//! Metric names follow `summary_{phase}_{metric_name}` and are produced with
//! [`summary_metric!`] so the convention lives in one place.

pub mod summary;

pub use summary::SummaryMetrics;

use std::sync::Once;
use tracing::{info, warn};

static INIT: Once = Once::new();

/// Env var holding the listen address of the Prometheus exporter
pub const METRICS_ADDR_ENV: &str = "SUMMARY_METRICS_ADDR";

/// Installs the Prometheus recorder when `SUMMARY_METRICS_ADDR` is set.
///
/// Idempotent. Without the variable the `metrics` macros stay no-ops.
pub fn init_metrics() {
    INIT.call_once(|| {
        let addr_str = match std::env::var(METRICS_ADDR_ENV) {
            Ok(v) if !v.trim().is_empty() => v,
            _ => {
                info!("{} not set; metrics exporter disabled", METRICS_ADDR_ENV);
                return;
            }
        };

        let addr = match addr_str.parse::<std::net::SocketAddr>() {
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
                SummaryMetrics::describe();
                info!("Prometheus exporter listening at http://{}/metrics", addr);
            }
            Err(e) => warn!("Failed to install Prometheus recorder: {}", e),
        }
    });
}

/// Builds a metric name following `summary_{phase}_{name}[_total]`
macro_rules! summary_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("summary_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("summary_", $phase, "_", $name)
    };
}

pub(crate) use summary_metric;
