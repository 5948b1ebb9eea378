use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Queryable, Selectable, Identifiable, Serialize, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::roles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Role {
    #[schema(example = 3)]
    pub id: i32,
    #[schema(example = "nurse")]
    pub name: String,
    #[schema(example = "web")]
    pub guard_name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::roles)]
pub struct NewRole<'a> {
    pub name: &'a str,
    pub guard_name: &'a str,
}

#[derive(Debug, Queryable, Selectable, Identifiable, Serialize, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::permissions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Permission {
    #[schema(example = 12)]
    pub id: i32,
    #[schema(example = "view_patient")]
    pub name: String,
    #[schema(example = "web")]
    pub guard_name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::permissions)]
pub struct NewPermission<'a> {
    pub name: &'a str,
    pub guard_name: &'a str,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::role_has_permissions)]
pub struct NewRolePermission {
    pub role_id: i32,
    pub permission_id: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::user_has_roles)]
pub struct NewUserRole {
    pub user_id: i64,
    pub role_id: i32,
}

/// A role together with the permissions it grants.
#[derive(Debug, Serialize, Clone, PartialEq, ToSchema)]
pub struct RoleWithPermissions {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<Permission>,
}

/// A permission together with the roles that grant it.
#[derive(Debug, Serialize, Clone, PartialEq, ToSchema)]
pub struct PermissionWithRoles {
    #[serde(flatten)]
    pub permission: Permission,
    pub roles: Vec<Role>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = crate::schema::roles)]
pub struct RoleChangeset<'a> {
    pub name: Option<&'a str>,
    pub guard_name: Option<&'a str>,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = crate::schema::permissions)]
pub struct PermissionChangeset<'a> {
    pub name: Option<&'a str>,
    pub guard_name: Option<&'a str>,
    pub updated_at: NaiveDateTime,
}
