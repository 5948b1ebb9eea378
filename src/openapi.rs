//! OpenAPI document for the role and permission API, served through Swagger UI.

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiError;
use crate::handlers::{health, permissions, roles, user_roles, MessageResponse};
use crate::models::{Permission, PermissionWithRoles, Role, RoleWithPermissions};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Hospice RBAC API",
        version = "1.0.0",
        description = "Roles and permissions for hospice EHR staff.\n\n\
        ## Model\n\
        - A permission is a named capability such as `view_patient`.\n\
        - A role is a named set of permissions such as `nurse`.\n\
        - Users hold roles; a user may do anything one of their roles grants.\n\n\
        ## Role permission sets\n\
        Creating or updating a role with `permissions` replaces its whole set. \
        Omitting `permissions` on update leaves the set untouched; an empty list clears it.",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "/", description = "Current server")
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Roles", description = "Role catalogue and role permission sets"),
        (name = "Permissions", description = "Permission catalogue and permission checks"),
        (name = "User Roles", description = "Roles granted to users")
    ),
    paths(
        health::health_check_simple,
        health::health_check,
        health::ready_check,
        health::live_check,

        roles::list_roles,
        roles::create_role,
        roles::get_role,
        roles::update_role,
        roles::delete_role,

        permissions::list_permissions,
        permissions::list_permission_names,
        permissions::create_permission,
        permissions::get_permission,
        permissions::update_permission,
        permissions::delete_permission,
        permissions::check_permission,

        user_roles::assign_role,
        user_roles::list_user_roles,
        user_roles::revoke_role,
        user_roles::list_user_permissions,
    ),
    components(
        schemas(
            ApiError,
            MessageResponse,

            health::HealthResponse,
            health::ReadinessResponse,
            health::ReadinessChecks,
            health::ComponentStatus,

            Role,
            RoleWithPermissions,
            roles::CreateRoleRequest,
            roles::UpdateRoleRequest,
            roles::RoleCreatedResponse,

            Permission,
            PermissionWithRoles,
            permissions::CreatePermissionRequest,
            permissions::UpdatePermissionRequest,
            permissions::PermissionResponse,
            permissions::CheckPermissionRequest,
            permissions::CheckPermissionResponse,
            crate::authz::user_roles::CheckReason,

            user_roles::AssignRoleRequest,
            user_roles::UserRolesResponse,
            user_roles::UserPermissionsResponse,
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_router() -> Router {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}
