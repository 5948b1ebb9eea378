//! Shared error handling utilities.

use axum::{http::StatusCode, Json};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::authz::AuthzError;
use crate::db::{DbPool, PooledConnection};

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    #[schema(example = "Role not found.")]
    pub error: String,
    #[schema(example = "ROLE_NOT_FOUND")]
    pub code: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }

    pub fn bad_request(
        error: impl Into<String>,
        code: impl Into<String>,
    ) -> (StatusCode, Json<Self>) {
        (StatusCode::BAD_REQUEST, Json(Self::new(error, code)))
    }

    pub fn not_found(
        error: impl Into<String>,
        code: impl Into<String>,
    ) -> (StatusCode, Json<Self>) {
        (StatusCode::NOT_FOUND, Json(Self::new(error, code)))
    }

    pub fn internal(error: impl Into<String>, code: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(Self::new(error, code)),
        )
    }

    pub fn db_error() -> (StatusCode, Json<Self>) {
        Self::internal("Database error", "DB_ERROR")
    }

    /// Translates a service failure into its HTTP form. Storage failures are
    /// logged here and reach the caller only as a generic 500.
    pub fn from_authz(err: AuthzError) -> (StatusCode, Json<Self>) {
        match err {
            AuthzError::Validation(message) => Self::bad_request(message, "VALIDATION_ERROR"),
            AuthzError::DuplicateName(entity) => Self::bad_request(
                AuthzError::DuplicateName(entity).to_string(),
                format!("{}_EXISTS", entity.code_prefix()),
            ),
            AuthzError::NotFound(entity) => Self::not_found(
                AuthzError::NotFound(entity).to_string(),
                format!("{}_NOT_FOUND", entity.code_prefix()),
            ),
            AuthzError::Persistence(e) => {
                error!(error = %e, "Database error");
                Self::db_error()
            }
            AuthzError::Pool(e) => {
                error!(error = %e, "Database connection error");
                Self::internal("Database connection error", "DB_CONNECTION_ERROR")
            }
        }
    }
}

pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

pub fn get_db_conn(pool: &DbPool) -> Result<PooledConnection, (StatusCode, Json<ApiError>)> {
    pool.get().map_err(|e| ApiError::from_authz(AuthzError::Pool(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::Entity;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let (status, Json(body)) =
            ApiError::from_authz(AuthzError::Validation("The name field is required.".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "VALIDATION_ERROR");
        assert_eq!(body.error, "The name field is required.");
    }

    #[test]
    fn test_duplicate_maps_to_bad_request() {
        let (status, Json(body)) =
            ApiError::from_authz(AuthzError::DuplicateName(Entity::Permission));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "PERMISSION_EXISTS");
        assert_eq!(body.error, "Permission already exists with this name.");
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let (status, Json(body)) = ApiError::from_authz(AuthzError::NotFound(Entity::Role));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.code, "ROLE_NOT_FOUND");
    }

    #[test]
    fn test_persistence_is_generic_500() {
        let (status, Json(body)) = ApiError::from_authz(AuthzError::Persistence(
            diesel::result::Error::RollbackTransaction,
        ));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.code, "DB_ERROR");
        assert_eq!(body.error, "Database error");
    }
}
