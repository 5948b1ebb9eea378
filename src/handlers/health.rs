//! Health check handlers.

use axum::{extract::State, http::StatusCode, Json};
use diesel::prelude::*;
use diesel_migrations::MigrationHarness;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::MIGRATIONS;
use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    #[schema(example = "hospice-rbac")]
    pub service: String,
    #[schema(example = "0.1.0")]
    pub version: String,
    #[schema(example = "2024-01-15T10:30:00Z")]
    pub timestamp: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadinessResponse {
    #[schema(example = "ready")]
    pub status: String,
    pub checks: ReadinessChecks,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadinessChecks {
    pub database: ComponentStatus,
    pub schema: ComponentStatus,
}

impl ReadinessChecks {
    fn all_up(&self) -> bool {
        self.database.is_up() && self.schema.is_up()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentStatus {
    #[schema(example = "up")]
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = 5)]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Pending migrations")]
    pub error: Option<String>,
}

impl ComponentStatus {
    pub fn up(latency_ms: u64) -> Self {
        Self {
            status: "up".to_string(),
            latency_ms: Some(latency_ms),
            error: None,
        }
    }

    pub fn down(error: impl Into<String>) -> Self {
        Self {
            status: "down".to_string(),
            latency_ms: None,
            error: Some(error.into()),
        }
    }

    pub fn is_up(&self) -> bool {
        self.status == "up"
    }
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Simple health check", content_type = "text/plain")
    )
)]
pub async fn health_check_simple() -> &'static str {
    "OK"
}

#[utoipa::path(
    get,
    path = "/health/status",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: state.service_name.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Database reachable and schema current", body = ReadinessResponse),
        (status = 503, description = "Service is not ready", body = ReadinessResponse)
    )
)]
pub async fn ready_check(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let checks = match state.db_pool.get() {
        Ok(mut conn) => ReadinessChecks {
            database: ping(&mut conn),
            schema: schema_status(&mut conn),
        },
        Err(e) => ReadinessChecks {
            database: ComponentStatus::down(format!("Failed to get connection: {}", e)),
            schema: ComponentStatus::down("Database unavailable"),
        },
    };

    let ready = checks.all_up();
    let response = ReadinessResponse {
        status: if ready { "ready" } else { "not_ready" }.to_string(),
        checks,
    };

    if ready {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

fn ping(conn: &mut crate::db::DbConnection) -> ComponentStatus {
    let start = std::time::Instant::now();
    match diesel::sql_query("SELECT 1").execute(conn) {
        Ok(_) => ComponentStatus::up(start.elapsed().as_millis() as u64),
        Err(e) => ComponentStatus::down(format!("Query failed: {}", e)),
    }
}

fn schema_status(conn: &mut crate::db::DbConnection) -> ComponentStatus {
    let start = std::time::Instant::now();
    match conn.has_pending_migration(MIGRATIONS) {
        Ok(false) => ComponentStatus::up(start.elapsed().as_millis() as u64),
        Ok(true) => ComponentStatus::down("Pending migrations"),
        Err(e) => ComponentStatus::down(format!("Migration check failed: {}", e)),
    }
}

#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive")
    )
)]
pub async fn live_check() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_connection;

    #[test]
    fn test_component_status_up() {
        let status = ComponentStatus::up(10);
        assert!(status.is_up());
        assert_eq!(status.latency_ms, Some(10));
        assert!(status.error.is_none());
    }

    #[test]
    fn test_component_status_down() {
        let status = ComponentStatus::down("Connection refused");
        assert!(!status.is_up());
        assert!(status.latency_ms.is_none());
        assert_eq!(status.error, Some("Connection refused".to_string()));
    }

    #[test]
    fn test_schema_status_after_migrations() {
        let mut conn = test_connection();
        assert!(schema_status(&mut conn).is_up());
        assert!(ping(&mut conn).is_up());
    }

    #[tokio::test]
    async fn test_health_check_simple() {
        assert_eq!(health_check_simple().await, "OK");
    }
}
