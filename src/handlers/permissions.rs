//! Permission management handlers.

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
        permissions::{self, PermissionInput},
        user_roles::{self, CheckReason},
        Entity,
    },
    error::{get_db_conn, ApiError, ApiResult},
    handlers::MessageResponse,
    helpers::{json_body, path_param},
    models::{Permission, PermissionWithRoles},
    telemetry::record_permission_check,
    AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePermissionRequest {
    #[schema(example = "view_patient")]
    pub name: Option<String>,
    #[schema(example = "web")]
    pub guard_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePermissionRequest {
    #[schema(example = "view_patient_chart")]
    pub name: Option<String>,
    #[schema(example = "web")]
    pub guard_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionResponse {
    pub permission: Permission,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckPermissionRequest {
    #[schema(example = 42)]
    pub user_id: i64,
    #[schema(example = "view_patient")]
    pub permission: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckPermissionResponse {
    pub allowed: bool,
    pub reason: CheckReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission: Option<Permission>,
}

impl From<CreatePermissionRequest> for PermissionInput {
    fn from(req: CreatePermissionRequest) -> Self {
        Self {
            name: req.name,
            guard_name: req.guard_name,
        }
    }
}

impl From<UpdatePermissionRequest> for PermissionInput {
    fn from(req: UpdatePermissionRequest) -> Self {
        Self {
            name: req.name,
            guard_name: req.guard_name,
        }
    }
}

#[utoipa::path(
    get,
    path = "/permissions",
    tag = "Permissions",
    responses(
        (status = 200, description = "Every permission, ordered by name", body = [Permission]),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn list_permissions(State(state): State<AppState>) -> ApiResult<Json<Vec<Permission>>> {
    let mut conn = get_db_conn(&state.db_pool)?;
    let perms = permissions::list(&mut conn).map_err(ApiError::from_authz)?;
    Ok(Json(perms))
}

#[utoipa::path(
    get,
    path = "/permissions/names",
    tag = "Permissions",
    responses(
        (status = 200, description = "Permission names, ordered", body = [String]),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn list_permission_names(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    let mut conn = get_db_conn(&state.db_pool)?;
    let names = permissions::list_names(&mut conn).map_err(ApiError::from_authz)?;
    Ok(Json(names))
}

#[utoipa::path(
    post,
    path = "/permission/store",
    tag = "Permissions",
    request_body = CreatePermissionRequest,
    responses(
        (status = 201, description = "Permission created", body = PermissionResponse),
        (status = 400, description = "Missing or duplicate name", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn create_permission(
    State(state): State<AppState>,
    payload: Result<Json<CreatePermissionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PermissionResponse>)> {
    let input = PermissionInput::from(json_body(payload)?);
    let mut conn = get_db_conn(&state.db_pool)?;

    let permission = permissions::create(&mut conn, &input, &state.authz.default_guard_name)
        .map_err(ApiError::from_authz)?;

    Ok((StatusCode::CREATED, Json(PermissionResponse { permission })))
}

#[utoipa::path(
    get,
    path = "/permission/{id}",
    tag = "Permissions",
    params(("id" = i32, Path, description = "Permission ID")),
    responses(
        (status = 200, description = "Permission with the roles granting it", body = PermissionWithRoles),
        (status = 404, description = "Permission not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn get_permission(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> ApiResult<Json<PermissionWithRoles>> {
    let id = path_param(path, Entity::Permission)?;
    let mut conn = get_db_conn(&state.db_pool)?;
    let permission = permissions::get(&mut conn, id).map_err(ApiError::from_authz)?;
    Ok(Json(permission))
}

#[utoipa::path(
    put,
    path = "/permission/{id}",
    tag = "Permissions",
    params(("id" = i32, Path, description = "Permission ID")),
    request_body = UpdatePermissionRequest,
    responses(
        (status = 200, description = "Permission updated", body = PermissionResponse),
        (status = 400, description = "Invalid or duplicate name", body = ApiError),
        (status = 404, description = "Permission not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn update_permission(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdatePermissionRequest>, JsonRejection>,
) -> ApiResult<Json<PermissionResponse>> {
    let id = path_param(path, Entity::Permission)?;
    let input = PermissionInput::from(json_body(payload)?);
    let mut conn = get_db_conn(&state.db_pool)?;

    let permission = permissions::update(&mut conn, id, &input).map_err(ApiError::from_authz)?;
    Ok(Json(PermissionResponse { permission }))
}

#[utoipa::path(
    delete,
    path = "/permissions/{id}",
    tag = "Permissions",
    params(("id" = i32, Path, description = "Permission ID")),
    responses(
        (status = 200, description = "Permission and its role links deleted", body = MessageResponse),
        (status = 404, description = "Permission not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn delete_permission(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let id = path_param(path, Entity::Permission)?;
    let mut conn = get_db_conn(&state.db_pool)?;
    permissions::delete(&mut conn, id).map_err(ApiError::from_authz)?;
    Ok(Json(MessageResponse::new("Permission deleted successfully.")))
}

#[utoipa::path(
    post,
    path = "/permissions/check",
    tag = "Permissions",
    request_body = CheckPermissionRequest,
    responses(
        (status = 200, description = "Permission check result", body = CheckPermissionResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn check_permission(
    State(state): State<AppState>,
    payload: Result<Json<CheckPermissionRequest>, JsonRejection>,
) -> ApiResult<Json<CheckPermissionResponse>> {
    let start = std::time::Instant::now();
    let payload = json_body(payload)?;

    if payload.permission.trim().is_empty() {
        return Err(ApiError::bad_request(
            "The permission field is required.",
            "VALIDATION_ERROR",
        ));
    }

    let mut conn = get_db_conn(&state.db_pool)?;
    let result = user_roles::check(&mut conn, payload.user_id, &payload.permission)
        .map_err(ApiError::from_authz)?;

    record_permission_check(result.allowed, start.elapsed());

    Ok(Json(CheckPermissionResponse {
        allowed: result.allowed,
        reason: result.reason,
        permission: result.permission,
    }))
}
