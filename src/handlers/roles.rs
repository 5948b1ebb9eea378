//! Role management handlers.

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
    authz::{
        roles::{self, RoleInput},
        Entity,
    },
    error::{get_db_conn, ApiError, ApiResult},
    handlers::MessageResponse,
    helpers::{json_body, path_param},
    models::{Permission, Role, RoleWithPermissions},
    telemetry::record_role_permission_sync,
    AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRoleRequest {
    #[schema(example = "nurse")]
    pub name: Option<String>,
    #[schema(example = "web")]
    pub guard_name: Option<String>,
    /// Ids of the permissions the role grants.
    #[schema(example = json!([1, 4]))]
    pub permissions: Option<Vec<i32>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    #[schema(example = "hospice_nurse")]
    pub name: Option<String>,
    #[schema(example = "web")]
    pub guard_name: Option<String>,
    /// Replaces the role's whole permission set when present.
    #[schema(example = json!([1, 4, 7]))]
    pub permissions: Option<Vec<i32>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleCreatedResponse {
    pub role: Role,
    pub permissions: Vec<Permission>,
}

impl From<CreateRoleRequest> for RoleInput {
    fn from(req: CreateRoleRequest) -> Self {
        Self {
            name: req.name,
            guard_name: req.guard_name,
            permission_ids: req.permissions,
        }
    }
}

impl From<UpdateRoleRequest> for RoleInput {
    fn from(req: UpdateRoleRequest) -> Self {
        Self {
            name: req.name,
            guard_name: req.guard_name,
            permission_ids: req.permissions,
        }
    }
}

#[utoipa::path(
    get,
    path = "/roles",
    tag = "Roles",
    responses(
        (status = 200, description = "Every role with its permissions", body = [RoleWithPermissions]),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn list_roles(State(state): State<AppState>) -> ApiResult<Json<Vec<RoleWithPermissions>>> {
    let mut conn = get_db_conn(&state.db_pool)?;
    let all = roles::list(&mut conn).map_err(ApiError::from_authz)?;
    Ok(Json(all))
}

#[utoipa::path(
    post,
    path = "/role/store",
    tag = "Roles",
    request_body = CreateRoleRequest,
    responses(
        (status = 201, description = "Role created", body = RoleCreatedResponse),
        (status = 400, description = "Missing name, duplicate name or unknown permission", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn create_role(
    State(state): State<AppState>,
    payload: Result<Json<CreateRoleRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RoleCreatedResponse>)> {
    let input = RoleInput::from(json_body(payload)?);
    let mut conn = get_db_conn(&state.db_pool)?;

    let created = roles::create(&mut conn, &input, &state.authz.default_guard_name)
        .map_err(ApiError::from_authz)?;

    if input.permission_ids.is_some() {
        record_role_permission_sync("create", created.permissions.len());
    }

    Ok((
        StatusCode::CREATED,
        Json(RoleCreatedResponse {
            role: created.role,
            permissions: created.permissions,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/role/{id}",
    tag = "Roles",
    params(("id" = i32, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role with its permissions", body = RoleWithPermissions),
        (status = 404, description = "Role not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn get_role(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> ApiResult<Json<RoleWithPermissions>> {
    let id = path_param(path, Entity::Role)?;
    let mut conn = get_db_conn(&state.db_pool)?;
    let role = roles::get(&mut conn, id).map_err(ApiError::from_authz)?;
    Ok(Json(role))
}

#[utoipa::path(
    put,
    path = "/role/{id}",
    tag = "Roles",
    params(("id" = i32, Path, description = "Role ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = RoleWithPermissions),
        (status = 400, description = "Invalid name, duplicate name or unknown permission", body = ApiError),
        (status = 404, description = "Role not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn update_role(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateRoleRequest>, JsonRejection>,
) -> ApiResult<Json<RoleWithPermissions>> {
    let id = path_param(path, Entity::Role)?;
    let input = RoleInput::from(json_body(payload)?);
    let mut conn = get_db_conn(&state.db_pool)?;

    let updated = roles::update(&mut conn, id, &input).map_err(ApiError::from_authz)?;

    if input.permission_ids.is_some() {
        record_role_permission_sync("update", updated.permissions.len());
    }

    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/roles/{id}",
    tag = "Roles",
    params(("id" = i32, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role and its links deleted", body = MessageResponse),
        (status = 404, description = "Role not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn delete_role(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let id = path_param(path, Entity::Role)?;
    let mut conn = get_db_conn(&state.db_pool)?;
    roles::delete(&mut conn, id).map_err(ApiError::from_authz)?;
    Ok(Json(MessageResponse::new("Role deleted successfully.")))
}
