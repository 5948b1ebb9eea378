//! Role/permission administration and the link tables that tie them together.
//!
//! Every function here takes an explicit connection. Writes that touch more
//! than one table run inside a single immediate transaction so the link
//! tables never point at missing rows and a role's permission set is never
//! left half-replaced.

pub mod associations;
pub mod permissions;
pub mod roles;
pub mod user_roles;

use std::fmt;

use diesel::result::{DatabaseErrorKind, Error as DieselError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Role,
    Permission,
    UserRole,
}

impl Entity {
    pub fn code_prefix(&self) -> &'static str {
        match self {
            Entity::Role => "ROLE",
            Entity::Permission => "PERMISSION",
            Entity::UserRole => "USER_ROLE",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Role => write!(f, "Role"),
            Entity::Permission => write!(f, "Permission"),
            Entity::UserRole => write!(f, "User role assignment"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} already exists with this name.")]
    DuplicateName(Entity),

    #[error("{0} not found.")]
    NotFound(Entity),

    #[error("database error: {0}")]
    Persistence(#[from] DieselError),

    #[error("database connection error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
}

pub type AuthzResult<T> = Result<T, AuthzError>;

impl AuthzError {
    pub(crate) fn name_required() -> Self {
        AuthzError::Validation("The name field is required.".to_string())
    }

    /// Maps a unique-constraint violation to a duplicate-name error for
    /// `entity`; every other database error passes through untouched.
    pub(crate) fn from_insert(entity: Entity) -> impl FnOnce(DieselError) -> Self {
        move |e| match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                AuthzError::DuplicateName(entity)
            }
            other => AuthzError::Persistence(other),
        }
    }
}

/// Trims a supplied name, rejecting absent or blank values.
pub(crate) fn required_name(name: Option<&str>) -> AuthzResult<&str> {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => Ok(n),
        _ => Err(AuthzError::name_required()),
    }
}

/// Resolves the guard for a new row, falling back to `default_guard`.
pub(crate) fn guard_or_default<'a>(guard: Option<&'a str>, default_guard: &'a str) -> &'a str {
    match guard.map(str::trim) {
        Some(g) if !g.is_empty() => g,
        _ => default_guard,
    }
}
