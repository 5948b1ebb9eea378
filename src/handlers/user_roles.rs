//! Handlers for granting roles to users and reading what those grants allow.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    authz::{user_roles, Entity},
    error::{get_db_conn, ApiError, ApiResult},
    handlers::MessageResponse,
    helpers::{json_body, path_param},
    models::{Permission, Role},
    AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignRoleRequest {
    #[schema(example = 3)]
    pub role_id: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserRolesResponse {
    pub user_id: i64,
    pub roles: Vec<Role>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserPermissionsResponse {
    pub user_id: i64,
    pub permissions: Vec<Permission>,
}

#[utoipa::path(
    post,
    path = "/users/{user_id}/roles",
    tag = "User Roles",
    params(("user_id" = i64, Path, description = "User ID")),
    request_body = AssignRoleRequest,
    responses(
        (status = 201, description = "Role granted; returns every role the user holds", body = UserRolesResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 404, description = "Role not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn assign_role(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<AssignRoleRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserRolesResponse>)> {
    let user_id = path_param(path, Entity::UserRole)?;
    let payload = json_body(payload)?;
    let mut conn = get_db_conn(&state.db_pool)?;

    let roles = user_roles::assign(&mut conn, user_id, payload.role_id)
        .map_err(ApiError::from_authz)?;

    Ok((StatusCode::CREATED, Json(UserRolesResponse { user_id, roles })))
}

#[utoipa::path(
    get,
    path = "/users/{user_id}/roles",
    tag = "User Roles",
    params(("user_id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Roles held by the user", body = UserRolesResponse),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn list_user_roles(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<UserRolesResponse>> {
    let user_id = path_param(path, Entity::UserRole)?;
    let mut conn = get_db_conn(&state.db_pool)?;
    let roles = user_roles::roles_for_user(&mut conn, user_id).map_err(ApiError::from_authz)?;
    Ok(Json(UserRolesResponse { user_id, roles }))
}

#[utoipa::path(
    delete,
    path = "/users/{user_id}/roles/{role_id}",
    tag = "User Roles",
    params(
        ("user_id" = i64, Path, description = "User ID"),
        ("role_id" = i32, Path, description = "Role ID")
    ),
    responses(
        (status = 200, description = "Role revoked", body = MessageResponse),
        (status = 404, description = "User does not hold the role", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn revoke_role(
    State(state): State<AppState>,
    path: Result<Path<(i64, i32)>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let (user_id, role_id) = path_param(path, Entity::UserRole)?;
    let mut conn = get_db_conn(&state.db_pool)?;
    user_roles::revoke(&mut conn, user_id, role_id).map_err(ApiError::from_authz)?;
    Ok(Json(MessageResponse::new("Role revoked successfully.")))
}

#[utoipa::path(
    get,
    path = "/users/{user_id}/permissions",
    tag = "User Roles",
    params(("user_id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Permissions granted through the user's roles", body = UserPermissionsResponse),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn list_user_permissions(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<UserPermissionsResponse>> {
    let user_id = path_param(path, Entity::UserRole)?;
    let mut conn = get_db_conn(&state.db_pool)?;
    let permissions =
        user_roles::permissions_for_user(&mut conn, user_id).map_err(ApiError::from_authz)?;
    Ok(Json(UserPermissionsResponse {
        user_id,
        permissions,
    }))
}
