use std::time::Duration;

use prometheus::{
    HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::upstream::Operation;
use crate::{GatewayError, Result};

/// Counters and latencies exposed on `/metrics`
#[derive(Clone)]
pub struct GatewayMetrics {
    registry: Registry,
    logins: IntCounterVec,
    upstream_requests: IntCounterVec,
    upstream_duration: HistogramVec,
}

impl GatewayMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new_custom(Some("kubegate".to_string()), None)
            .map_err(metrics_error)?;

        let logins = IntCounterVec::new(
            Opts::new("logins_total", "Login attempts by outcome"),
            &["outcome"],
        )
        .map_err(metrics_error)?;

        let upstream_requests = IntCounterVec::new(
            Opts::new(
                "upstream_requests_total",
                "Calls to cluster agents by cluster, operation and outcome",
            ),
            &["cluster", "operation", "outcome"],
        )
        .map_err(metrics_error)?;

        let upstream_duration = HistogramVec::new(
            HistogramOpts::new(
                "upstream_duration_seconds",
                "Latency of calls to cluster agents",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["operation"],
        )
        .map_err(metrics_error)?;

        registry
            .register(Box::new(logins.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(upstream_requests.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(upstream_duration.clone()))
            .map_err(metrics_error)?;

        #[cfg(target_os = "linux")]
        registry
            .register(Box::new(prometheus::process_collector::ProcessCollector::for_self()))
            .map_err(metrics_error)?;

        Ok(Self {
            registry,
            logins,
            upstream_requests,
            upstream_duration,
        })
    }

    pub fn record_login(&self, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        self.logins.with_label_values(&[outcome]).inc();
    }

    pub fn record_upstream(
        &self,
        cluster: &str,
        operation: Operation,
        success: bool,
        elapsed: Duration,
    ) {
        let outcome = if success { "success" } else { "failure" };
        self.upstream_requests
            .with_label_values(&[cluster, operation.as_str(), outcome])
            .inc();
        self.upstream_duration
            .with_label_values(&[operation.as_str()])
            .observe(elapsed.as_secs_f64());
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn render(&self) -> Result<String> {
        TextEncoder::new()
            .encode_to_string(&self.registry.gather())
            .map_err(metrics_error)
    }
}

fn metrics_error(e: prometheus::Error) -> GatewayError {
    GatewayError::MetricsError(e.to_string())
}
