//! Permission lifecycle.

use diesel::prelude::*;
use tracing::info;

use super::associations::{detach_permission, roles_for_permission};
use super::{guard_or_default, required_name, AuthzError, AuthzResult, Entity};
use crate::db::DbConnection;
use crate::models::{NewPermission, Permission, PermissionChangeset, PermissionWithRoles};
use crate::schema::permissions;

#[derive(Debug, Default, Clone)]
pub struct PermissionInput {
    pub name: Option<String>,
    pub guard_name: Option<String>,
}

pub fn list(conn: &mut DbConnection) -> AuthzResult<Vec<Permission>> {
    let perms = permissions::table
        .order(permissions::name.asc())
        .select(Permission::as_select())
        .load(conn)?;
    Ok(perms)
}

pub fn list_names(conn: &mut DbConnection) -> AuthzResult<Vec<String>> {
    let names = permissions::table
        .order(permissions::name.asc())
        .select(permissions::name)
        .load(conn)?;
    Ok(names)
}

pub(crate) fn find_by_name(conn: &mut DbConnection, name: &str) -> AuthzResult<Option<Permission>> {
    let permission = permissions::table
        .filter(permissions::name.eq(name))
        .select(Permission::as_select())
        .first(conn)
        .optional()?;
    Ok(permission)
}

fn find_row(conn: &mut DbConnection, id: i32) -> AuthzResult<Permission> {
    permissions::table
        .find(id)
        .select(Permission::as_select())
        .first(conn)
        .optional()?
        .ok_or(AuthzError::NotFound(Entity::Permission))
}

pub fn create(
    conn: &mut DbConnection,
    input: &PermissionInput,
    default_guard: &str,
) -> AuthzResult<Permission> {
    let name = required_name(input.name.as_deref())?;
    let guard_name = guard_or_default(input.guard_name.as_deref(), default_guard);

    let permission = conn.immediate_transaction(|conn| -> AuthzResult<Permission> {
        if find_by_name(conn, name)?.is_some() {
            return Err(AuthzError::DuplicateName(Entity::Permission));
        }

        diesel::insert_into(permissions::table)
            .values(&NewPermission { name, guard_name })
            .execute(conn)
            .map_err(AuthzError::from_insert(Entity::Permission))?;

        find_by_name(conn, name)?.ok_or(AuthzError::NotFound(Entity::Permission))
    })?;

    info!(permission_id = permission.id, name = %permission.name, "Created permission");
    Ok(permission)
}

pub fn get(conn: &mut DbConnection, id: i32) -> AuthzResult<PermissionWithRoles> {
    let permission = find_row(conn, id)?;
    let roles = roles_for_permission(conn, permission.id)?;
    Ok(PermissionWithRoles { permission, roles })
}

pub fn update(
    conn: &mut DbConnection,
    id: i32,
    input: &PermissionInput,
) -> AuthzResult<Permission> {
    let name = match input.name.as_deref() {
        Some(n) => Some(required_name(Some(n))?),
        None => None,
    };
    let guard_name = input
        .guard_name
        .as_deref()
        .map(str::trim)
        .filter(|g| !g.is_empty());

    let permission = conn.immediate_transaction(|conn| -> AuthzResult<Permission> {
        let current = find_row(conn, id)?;

        if let Some(name) = name {
            if let Some(other) = find_by_name(conn, name)? {
                if other.id != current.id {
                    return Err(AuthzError::DuplicateName(Entity::Permission));
                }
            }
        }

        diesel::update(permissions::table.find(id))
            .set(&PermissionChangeset {
                name,
                guard_name,
                updated_at: chrono::Utc::now().naive_utc(),
            })
            .execute(conn)
            .map_err(AuthzError::from_insert(Entity::Permission))?;

        find_row(conn, id)
    })?;

    info!(permission_id = id, name = %permission.name, "Updated permission");
    Ok(permission)
}

pub fn delete(conn: &mut DbConnection, id: i32) -> AuthzResult<()> {
    let detached = conn.immediate_transaction(|conn| -> AuthzResult<_> {
        let detached = detach_permission(conn, id)?;

        let deleted = diesel::delete(permissions::table.find(id)).execute(conn)?;
        if deleted == 0 {
            return Err(AuthzError::NotFound(Entity::Permission));
        }
        Ok(detached)
    })?;

    info!(
        permission_id = id,
        unlinked_roles = detached.role_permissions,
        "Deleted permission"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_connection;

    fn input(name: &str) -> PermissionInput {
        PermissionInput {
            name: Some(name.to_string()),
            guard_name: None,
        }
    }

    #[test]
    fn test_create_defaults_guard() {
        let mut conn = test_connection();
        let permission = create(&mut conn, &input("view_patient"), "web").unwrap();
        assert_eq!(permission.name, "view_patient");
        assert_eq!(permission.guard_name, "web");
    }

    #[test]
    fn test_create_rejects_missing_name() {
        let mut conn = test_connection();
        let err = create(&mut conn, &PermissionInput::default(), "web").unwrap_err();
        assert!(matches!(err, AuthzError::Validation(_)));
    }

    #[test]
    fn test_create_duplicate_name_regardless_of_guard() {
        let mut conn = test_connection();
        create(&mut conn, &input("x"), "web").unwrap();

        let err = create(
            &mut conn,
            &PermissionInput {
                name: Some("x".to_string()),
                guard_name: Some("api".to_string()),
            },
            "web",
        )
        .unwrap_err();
        assert!(matches!(err, AuthzError::DuplicateName(Entity::Permission)));
        assert_eq!(err.to_string(), "Permission already exists with this name.");
    }

    #[test]
    fn test_list_names_sorted() {
        let mut conn = test_connection();
        create(&mut conn, &input("write_notes"), "web").unwrap();
        create(&mut conn, &input("admit_patient"), "web").unwrap();

        assert_eq!(
            list_names(&mut conn).unwrap(),
            vec!["admit_patient".to_string(), "write_notes".to_string()]
        );
        assert_eq!(list(&mut conn).unwrap().len(), 2);
    }

    #[test]
    fn test_update_rename_to_own_name_is_allowed() {
        let mut conn = test_connection();
        let permission = create(&mut conn, &input("view_patient"), "web").unwrap();

        let updated = update(
            &mut conn,
            permission.id,
            &PermissionInput {
                name: Some("view_patient".to_string()),
                guard_name: Some("api".to_string()),
            },
        )
        .unwrap();
        assert_eq!(updated.name, "view_patient");
        assert_eq!(updated.guard_name, "api");
    }

    #[test]
    fn test_update_rename_to_taken_name_fails() {
        let mut conn = test_connection();
        create(&mut conn, &input("view_patient"), "web").unwrap();
        let other = create(&mut conn, &input("edit_patient"), "web").unwrap();

        let err = update(&mut conn, other.id, &input("view_patient")).unwrap_err();
        assert!(matches!(err, AuthzError::DuplicateName(Entity::Permission)));
    }

    #[test]
    fn test_update_missing_permission() {
        let mut conn = test_connection();
        let err = update(&mut conn, 404, &input("anything")).unwrap_err();
        assert!(matches!(err, AuthzError::NotFound(Entity::Permission)));
    }

    #[test]
    fn test_delete_missing_permission() {
        let mut conn = test_connection();
        let err = delete(&mut conn, 404).unwrap_err();
        assert!(matches!(err, AuthzError::NotFound(Entity::Permission)));
    }

    #[test]
    fn test_get_includes_roles() {
        let mut conn = test_connection();
        let permission = create(&mut conn, &input("view_patient"), "web").unwrap();
        crate::authz::roles::create(
            &mut conn,
            &crate::authz::roles::RoleInput {
                name: Some("nurse".to_string()),
                guard_name: None,
                permission_ids: Some(vec![permission.id]),
            },
            "web",
        )
        .unwrap();

        let resolved = get(&mut conn, permission.id).unwrap();
        assert_eq!(resolved.roles.len(), 1);
        assert_eq!(resolved.roles[0].name, "nurse");
    }
}
