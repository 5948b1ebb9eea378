//! Application metrics using the metrics crate.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

static PROMETHEUS_HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

#[derive(Clone)]
pub struct MetricsState {
    handle: Option<PrometheusHandle>,
}

impl MetricsState {
    /// The recorder is process-global; only the first enabled state installs it.
    pub fn new(enabled: bool) -> Self {
        if !enabled {
            return Self::disabled();
        }

        let handle = PROMETHEUS_HANDLE.get_or_init(|| {
            PrometheusBuilder::new()
                .install_recorder()
                .map_err(|e| tracing::warn!(error = %e, "Prometheus recorder unavailable"))
                .ok()
        });

        Self {
            handle: handle.clone(),
        }
    }

    pub fn disabled() -> Self {
        Self { handle: None }
    }

    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(|h| h.render())
    }

    pub fn is_enabled(&self) -> bool {
        self.handle.is_some()
    }
}

pub async fn metrics_handler(State(state): State<MetricsState>) -> impl IntoResponse {
    match state.render() {
        Some(metrics) => (StatusCode::OK, metrics),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Metrics not enabled".to_string(),
        ),
    }
}

pub fn record_permission_check(granted: bool, duration: Duration) {
    counter!(
        "permission_checks_total",
        "granted" => granted.to_string()
    )
    .increment(1);

    histogram!("permission_check_duration_seconds").record(duration.as_secs_f64());
}

/// Counts a replacement of a role's permission set and the size it ended at.
pub fn record_role_permission_sync(operation: &'static str, linked: usize) {
    counter!("role_permission_syncs_total", "operation" => operation).increment(1);
    histogram!("role_permission_set_size").record(linked as f64);
}

pub fn record_request_latency(method: &str, path: &str, status: u16, duration: Duration) {
    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());
}
