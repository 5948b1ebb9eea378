//! Observability: structured logging and Prometheus metrics.

pub mod metrics;
pub mod tracing;

pub use metrics::{record_permission_check, record_role_permission_sync, MetricsState};
pub use tracing::init_telemetry;
