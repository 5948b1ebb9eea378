//! Role grants to users and the permission checks derived from them.
//!
//! Users are owned by another subsystem; `user_id` is taken at face value.

use diesel::prelude::*;
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use super::{permissions::find_by_name, roles::find_row, AuthzError, AuthzResult, Entity};
use crate::db::DbConnection;
use crate::models::{NewUserRole, Permission, Role};
use crate::schema::{permissions, role_has_permissions, roles, user_has_roles};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CheckReason {
    GrantedByRole,
    NotGranted,
    PermissionNotFound,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PermissionCheck {
    pub allowed: bool,
    pub reason: CheckReason,
    pub permission: Option<Permission>,
}

pub fn roles_for_user(conn: &mut DbConnection, user_id: i64) -> AuthzResult<Vec<Role>> {
    let held = user_has_roles::table
        .inner_join(roles::table)
        .filter(user_has_roles::user_id.eq(user_id))
        .order(roles::name.asc())
        .select(Role::as_select())
        .load(conn)?;
    Ok(held)
}

/// Union of the permissions granted through every role `user_id` holds.
pub fn permissions_for_user(conn: &mut DbConnection, user_id: i64) -> AuthzResult<Vec<Permission>> {
    let perms = permissions::table
        .inner_join(
            role_has_permissions::table.on(role_has_permissions::permission_id.eq(permissions::id)),
        )
        .inner_join(
            user_has_roles::table.on(user_has_roles::role_id.eq(role_has_permissions::role_id)),
        )
        .filter(user_has_roles::user_id.eq(user_id))
        .select(Permission::as_select())
        .distinct()
        .order(permissions::name.asc())
        .load(conn)?;
    Ok(perms)
}

/// Grants `role_id` to `user_id`. Granting a role the user already holds is a
/// no-op.
pub fn assign(conn: &mut DbConnection, user_id: i64, role_id: i32) -> AuthzResult<Vec<Role>> {
    let inserted = conn.immediate_transaction(|conn| -> AuthzResult<usize> {
        find_row(conn, role_id)?;

        let inserted = diesel::insert_or_ignore_into(user_has_roles::table)
            .values(&NewUserRole { user_id, role_id })
            .execute(conn)?;
        Ok(inserted)
    })?;

    if inserted > 0 {
        info!(user_id, role_id, "Assigned role to user");
    }
    roles_for_user(conn, user_id)
}

pub fn revoke(conn: &mut DbConnection, user_id: i64, role_id: i32) -> AuthzResult<()> {
    let deleted = diesel::delete(
        user_has_roles::table
            .filter(user_has_roles::user_id.eq(user_id))
            .filter(user_has_roles::role_id.eq(role_id)),
    )
    .execute(conn)?;

    if deleted == 0 {
        return Err(AuthzError::NotFound(Entity::UserRole));
    }

    info!(user_id, role_id, "Revoked role from user");
    Ok(())
}

pub fn check(
    conn: &mut DbConnection,
    user_id: i64,
    permission_name: &str,
) -> AuthzResult<PermissionCheck> {
    let Some(permission) = find_by_name(conn, permission_name.trim())? else {
        return Ok(PermissionCheck {
            allowed: false,
            reason: CheckReason::PermissionNotFound,
            permission: None,
        });
    };

    let granted = user_has_roles::table
        .inner_join(
            role_has_permissions::table.on(role_has_permissions::role_id.eq(user_has_roles::role_id)),
        )
        .filter(user_has_roles::user_id.eq(user_id))
        .filter(role_has_permissions::permission_id.eq(permission.id))
        .count()
        .get_result::<i64>(conn)?
        > 0;

    Ok(PermissionCheck {
        allowed: granted,
        reason: if granted {
            CheckReason::GrantedByRole
        } else {
            CheckReason::NotGranted
        },
        permission: Some(permission),
    })
}
