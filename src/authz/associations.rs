//! Link-table maintenance and the joined reads that resolve it.

use std::collections::{BTreeSet, HashMap};

use diesel::prelude::*;

use super::{AuthzError, AuthzResult};
use crate::db::DbConnection;
use crate::models::{NewRolePermission, Permission, Role};
use crate::schema::{permissions, role_has_permissions, roles, user_has_roles};

/// Permissions granted by each of `role_ids`, keyed by role id.
///
/// Roles with no links are absent from the map. Links whose permission row
/// is gone drop out of the inner join.
pub fn permissions_for_roles(
    conn: &mut DbConnection,
    role_ids: &[i32],
) -> AuthzResult<HashMap<i32, Vec<Permission>>> {
    if role_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(i32, Permission)> = role_has_permissions::table
        .inner_join(permissions::table)
        .filter(role_has_permissions::role_id.eq_any(role_ids))
        .order((role_has_permissions::role_id.asc(), permissions::name.asc()))
        .select((role_has_permissions::role_id, Permission::as_select()))
        .load(conn)?;

    let mut by_role: HashMap<i32, Vec<Permission>> = HashMap::new();
    for (role_id, permission) in rows {
        by_role.entry(role_id).or_default().push(permission);
    }
    Ok(by_role)
}

pub fn permissions_for_role(conn: &mut DbConnection, role_id: i32) -> AuthzResult<Vec<Permission>> {
    let perms = role_has_permissions::table
        .inner_join(permissions::table)
        .filter(role_has_permissions::role_id.eq(role_id))
        .order(permissions::name.asc())
        .select(Permission::as_select())
        .load(conn)?;
    Ok(perms)
}

pub fn roles_for_permission(conn: &mut DbConnection, permission_id: i32) -> AuthzResult<Vec<Role>> {
    let granted_by = role_has_permissions::table
        .inner_join(roles::table)
        .filter(role_has_permissions::permission_id.eq(permission_id))
        .order(roles::name.asc())
        .select(Role::as_select())
        .load(conn)?;
    Ok(granted_by)
}

/// Rejects any id in `ids` that does not name an existing permission.
pub fn ensure_permissions_exist(conn: &mut DbConnection, ids: &BTreeSet<i32>) -> AuthzResult<()> {
    if ids.is_empty() {
        return Ok(());
    }

    let found: BTreeSet<i32> = permissions::table
        .filter(permissions::id.eq_any(ids.iter().copied().collect::<Vec<_>>()))
        .select(permissions::id)
        .load::<i32>(conn)?
        .into_iter()
        .collect();

    let missing: Vec<String> = ids.difference(&found).map(|id| id.to_string()).collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AuthzError::Validation(format!(
            "Unknown permission id(s): {}.",
            missing.join(", ")
        )))
    }
}

/// Replaces the full permission set of `role_id` with `ids`.
///
/// Must run inside the caller's transaction; the delete and insert are only
/// atomic together there.
pub fn replace_role_permissions(
    conn: &mut DbConnection,
    role_id: i32,
    ids: &BTreeSet<i32>,
) -> AuthzResult<()> {
    ensure_permissions_exist(conn, ids)?;

    diesel::delete(role_has_permissions::table.filter(role_has_permissions::role_id.eq(role_id)))
        .execute(conn)?;

    if ids.is_empty() {
        return Ok(());
    }

    let links: Vec<NewRolePermission> = ids
        .iter()
        .map(|&permission_id| NewRolePermission {
            role_id,
            permission_id,
        })
        .collect();

    diesel::insert_into(role_has_permissions::table)
        .values(&links)
        .execute(conn)?;

    Ok(())
}

/// Counts of link rows removed when detaching a role or permission.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Detached {
    pub role_permissions: usize,
    pub user_roles: usize,
}

/// Removes every link that references `role_id`.
pub fn detach_role(conn: &mut DbConnection, role_id: i32) -> AuthzResult<Detached> {
    let role_permissions = diesel::delete(
        role_has_permissions::table.filter(role_has_permissions::role_id.eq(role_id)),
    )
    .execute(conn)?;

    let user_roles = diesel::delete(user_has_roles::table.filter(user_has_roles::role_id.eq(role_id)))
        .execute(conn)?;

    Ok(Detached {
        role_permissions,
        user_roles,
    })
}

/// Removes every role link that references `permission_id`.
pub fn detach_permission(conn: &mut DbConnection, permission_id: i32) -> AuthzResult<Detached> {
    let role_permissions = diesel::delete(
        role_has_permissions::table.filter(role_has_permissions::permission_id.eq(permission_id)),
    )
    .execute(conn)?;

    Ok(Detached {
        role_permissions,
        user_roles: 0,
    })
}
