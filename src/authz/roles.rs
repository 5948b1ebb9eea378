//! Role lifecycle, including replacement of a role's permission set.

use std::collections::BTreeSet;

use diesel::prelude::*;
use tracing::info;

use super::associations::{
    detach_role, permissions_for_role, permissions_for_roles, replace_role_permissions,
};
use super::{guard_or_default, required_name, AuthzError, AuthzResult, Entity};
use crate::db::DbConnection;
use crate::models::{NewRole, Role, RoleChangeset, RoleWithPermissions};
use crate::schema::roles;

#[derive(Debug, Default, Clone)]
pub struct RoleInput {
    pub name: Option<String>,
    pub guard_name: Option<String>,
    /// `None` leaves the current links alone; `Some` replaces them wholesale.
    pub permission_ids: Option<Vec<i32>>,
}

impl RoleInput {
    fn permission_set(&self) -> Option<BTreeSet<i32>> {
        self.permission_ids
            .as_ref()
            .map(|ids| ids.iter().copied().collect())
    }
}

pub fn list(conn: &mut DbConnection) -> AuthzResult<Vec<RoleWithPermissions>> {
    let all: Vec<Role> = roles::table
        .order(roles::name.asc())
        .select(Role::as_select())
        .load(conn)?;

    let ids: Vec<i32> = all.iter().map(|r| r.id).collect();
    let mut by_role = permissions_for_roles(conn, &ids)?;

    Ok(all
        .into_iter()
        .map(|role| RoleWithPermissions {
            permissions: by_role.remove(&role.id).unwrap_or_default(),
            role,
        })
        .collect())
}

fn find_by_name(conn: &mut DbConnection, name: &str) -> AuthzResult<Option<Role>> {
    let role = roles::table
        .filter(roles::name.eq(name))
        .select(Role::as_select())
        .first(conn)
        .optional()?;
    Ok(role)
}

pub(crate) fn find_row(conn: &mut DbConnection, id: i32) -> AuthzResult<Role> {
    roles::table
        .find(id)
        .select(Role::as_select())
        .first(conn)
        .optional()?
        .ok_or(AuthzError::NotFound(Entity::Role))
}

fn with_permissions(conn: &mut DbConnection, role: Role) -> AuthzResult<RoleWithPermissions> {
    let permissions = permissions_for_role(conn, role.id)?;
    Ok(RoleWithPermissions { role, permissions })
}

pub fn create(
    conn: &mut DbConnection,
    input: &RoleInput,
    default_guard: &str,
) -> AuthzResult<RoleWithPermissions> {
    let name = required_name(input.name.as_deref())?;
    let guard_name = guard_or_default(input.guard_name.as_deref(), default_guard);
    let permission_ids = input.permission_set();

    let created = conn.immediate_transaction(|conn| -> AuthzResult<RoleWithPermissions> {
        if find_by_name(conn, name)?.is_some() {
            return Err(AuthzError::DuplicateName(Entity::Role));
        }

        diesel::insert_into(roles::table)
            .values(&NewRole { name, guard_name })
            .execute(conn)
            .map_err(AuthzError::from_insert(Entity::Role))?;

        let role = find_by_name(conn, name)?.ok_or(AuthzError::NotFound(Entity::Role))?;

        if let Some(ids) = &permission_ids {
            replace_role_permissions(conn, role.id, ids)?;
        }

        with_permissions(conn, role)
    })?;

    info!(
        role_id = created.role.id,
        role_name = %created.role.name,
        permissions = created.permissions.len(),
        "Created role"
    );
    Ok(created)
}

pub fn get(conn: &mut DbConnection, id: i32) -> AuthzResult<RoleWithPermissions> {
    let role = find_row(conn, id)?;
    with_permissions(conn, role)
}

pub fn update(
    conn: &mut DbConnection,
    id: i32,
    input: &RoleInput,
) -> AuthzResult<RoleWithPermissions> {
    let name = match input.name.as_deref() {
        Some(n) => Some(required_name(Some(n))?),
        None => None,
    };
    let guard_name = input
        .guard_name
        .as_deref()
        .map(str::trim)
        .filter(|g| !g.is_empty());
    let permission_ids = input.permission_set();

    let updated = conn.immediate_transaction(|conn| -> AuthzResult<RoleWithPermissions> {
        let current = find_row(conn, id)?;

        if let Some(name) = name {
            if let Some(other) = find_by_name(conn, name)? {
                if other.id != current.id {
                    return Err(AuthzError::DuplicateName(Entity::Role));
                }
            }
        }

        diesel::update(roles::table.find(id))
            .set(&RoleChangeset {
                name,
                guard_name,
                updated_at: chrono::Utc::now().naive_utc(),
            })
            .execute(conn)
            .map_err(AuthzError::from_insert(Entity::Role))?;

        if let Some(ids) = &permission_ids {
            replace_role_permissions(conn, id, ids)?;
        }

        let role = find_row(conn, id)?;
        with_permissions(conn, role)
    })?;

    info!(
        role_id = id,
        role_name = %updated.role.name,
        replaced_permissions = permission_ids.is_some(),
        "Updated role"
    );
    Ok(updated)
}

pub fn delete(conn: &mut DbConnection, id: i32) -> AuthzResult<()> {
    let detached = conn.immediate_transaction(|conn| -> AuthzResult<_> {
        let detached = detach_role(conn, id)?;

        let deleted = diesel::delete(roles::table.find(id)).execute(conn)?;
        if deleted == 0 {
            return Err(AuthzError::NotFound(Entity::Role));
        }
        Ok(detached)
    })?;

    info!(
        role_id = id,
        unlinked_permissions = detached.role_permissions,
        unlinked_users = detached.user_roles,
        "Deleted role"
    );
    Ok(())
}
