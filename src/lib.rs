//! Hospice RBAC - roles and permissions for hospice EHR staff.

pub mod authz;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod helpers;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod schema;
pub mod telemetry;

use axum::{
    http::StatusCode,
    middleware as axum_middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::Duration;

use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use config::AuthzConfig;
use error::ApiError;
use handlers::{health, permissions, roles, user_roles};
use middleware::{metrics_middleware, request_id_middleware};
use telemetry::MetricsState;

pub use config::Config;
pub use db::{create_db_pool, create_db_pool_with_url, run_pool_migrations, DbPool};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub authz: Arc<AuthzConfig>,
    pub service_name: Arc<str>,
    pub metrics: MetricsState,
}

impl AppState {
    pub fn new(db_pool: DbPool, config: &Config) -> Self {
        Self {
            db_pool,
            authz: Arc::new(config.authz.clone()),
            service_name: Arc::from(config.telemetry.service_name.as_str()),
            metrics: MetricsState::new(config.telemetry.metrics_enabled),
        }
    }
}

pub fn create_router(state: AppState, config: &Config) -> Router {
    let cors = build_cors_layer(config);
    let body_limit = RequestBodyLimitLayer::new(config.server.max_body_size);

    #[allow(deprecated)]
    let timeout = TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let metrics_state = state.metrics.clone();
    let health_routes = Router::new()
        .route("/health", get(health::health_check_simple))
        .route("/health/status", get(health::health_check))
        .route("/health/ready", get(health::ready_check))
        .route("/health/live", get(health::live_check))
        .route(
            "/metrics",
            get(telemetry::metrics::metrics_handler).with_state(metrics_state),
        )
        .with_state(state.clone());

    let role_routes = Router::new()
        .route("/roles", get(roles::list_roles))
        .route("/role/store", post(roles::create_role))
        .route("/role/{id}", get(roles::get_role).put(roles::update_role))
        .route("/roles/{id}", axum::routing::delete(roles::delete_role))
        .with_state(state.clone());

    let permission_routes = Router::new()
        .route("/permissions", get(permissions::list_permissions))
        .route("/permissions/names", get(permissions::list_permission_names))
        .route("/permissions/check", post(permissions::check_permission))
        .route("/permission/store", post(permissions::create_permission))
        .route(
            "/permission/{id}",
            get(permissions::get_permission).put(permissions::update_permission),
        )
        .route(
            "/permissions/{id}",
            axum::routing::delete(permissions::delete_permission),
        )
        .with_state(state.clone());

    let user_role_routes = Router::new()
        .route(
            "/users/{user_id}/roles",
            get(user_roles::list_user_roles).post(user_roles::assign_role),
        )
        .route(
            "/users/{user_id}/roles/{role_id}",
            axum::routing::delete(user_roles::revoke_role),
        )
        .route(
            "/users/{user_id}/permissions",
            get(user_roles::list_user_permissions),
        )
        .with_state(state);

    Router::new()
        .merge(openapi::swagger_router())
        .merge(health_routes)
        .merge(role_routes)
        .merge(permission_routes)
        .merge(user_role_routes)
        .fallback(fallback_handler)
        .layer(axum_middleware::from_fn(metrics_middleware))
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(timeout)
        .layer(body_limit)
        .layer(cors)
}

async fn fallback_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiError::new("Not found", "NOT_FOUND")),
    )
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    use axum::http::header::HeaderName;
    use axum::http::Method;

    let is_wildcard_origin = config.cors.allowed_origins.iter().any(|o| o == "*")
        || config.cors.allowed_origins.is_empty();

    let methods: Vec<Method> = config
        .cors
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();

    let headers: Vec<HeaderName> = config
        .cors
        .allowed_headers
        .iter()
        .filter_map(|h| h.parse().ok())
        .collect();

    let cors = match (is_wildcard_origin, config.cors.allow_credentials) {
        // Credentials cannot be combined with a literal `*`.
        (true, true) => CorsLayer::new().allow_origin(tower_http::cors::AllowOrigin::mirror_request()),
        (true, false) => CorsLayer::new().allow_origin(Any),
        (false, _) => {
            let origins: Vec<_> = config
                .cors
                .allowed_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new().allow_origin(origins)
        }
    };

    cors.allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(config.cors.allow_credentials)
        .max_age(Duration::from_secs(config.cors.max_age_secs))
}

pub fn init_tracing(config: &Config) {
    telemetry::init_telemetry(config);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[test]
    fn test_app_state_takes_authz_defaults_from_config() {
        let mut config = Config::default_for_testing();
        config.authz.default_guard_name = "api".to_string();
        let pool = create_db_pool_with_url(":memory:").unwrap();

        let state = AppState::new(pool, &config);
        assert_eq!(state.authz.default_guard_name, "api");
        assert_eq!(&*state.service_name, "hospice-rbac-test");
        assert!(!state.metrics.is_enabled());
    }

    #[test]
    fn test_build_cors_layer_wildcard() {
        let mut config = Config::default_for_testing();
        config.cors.allowed_origins = vec!["*".to_string()];
        let _ = build_cors_layer(&config);
    }

    #[test]
    fn test_build_cors_layer_specific_origins_with_credentials() {
        let mut config = Config::default_for_testing();
        config.cors.allowed_origins = vec!["https://chart.example-hospice.org".to_string()];
        config.cors.allow_credentials = true;
        let _ = build_cors_layer(&config);
    }
}
