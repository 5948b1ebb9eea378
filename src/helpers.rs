//! Shared helper functions for handlers.

use axum::{
    extract::{
        path::ErrorKind,
        rejection::{JsonRejection, PathRejection},
        Path,
    },
    http::StatusCode,
    Json,
};

use crate::authz::{AuthzError, Entity};
use crate::error::ApiError;

/// Unwraps a JSON body, reporting malformed or mistyped input as a 400 in the
/// usual error shape instead of axum's plain-text rejection.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, (StatusCode, Json<ApiError>)> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text(), "INVALID_BODY"))
}

/// Unwraps path parameters. A well-formed integer too large for the id type
/// cannot name a stored row, so it is reported as `entity` not found; any
/// other unparseable segment is a 400 `INVALID_PATH`.
pub fn path_param<T>(
    path: Result<Path<T>, PathRejection>,
    entity: Entity,
) -> Result<T, (StatusCode, Json<ApiError>)> {
    let rejection = match path {
        Ok(Path(params)) => return Ok(params),
        Err(rejection) => rejection,
    };

    if let PathRejection::FailedToDeserializePathParams(err) = &rejection {
        let unparsed = match err.kind() {
            ErrorKind::ParseErrorAtKey { value, .. }
            | ErrorKind::ParseErrorAtIndex { value, .. }
            | ErrorKind::ParseError { value, .. } => Some(value.as_str()),
            _ => None,
        };
        if unparsed.is_some_and(is_integer_literal) {
            return Err(ApiError::from_authz(AuthzError::NotFound(entity)));
        }
    }

    Err(ApiError::bad_request(rejection.body_text(), "INVALID_PATH"))
}

fn is_integer_literal(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_literal_detection() {
        assert!(is_integer_literal("99999999999"));
        assert!(is_integer_literal("-99999999999"));
        assert!(!is_integer_literal("abc"));
        assert!(!is_integer_literal("12a"));
        assert!(!is_integer_literal("-"));
        assert!(!is_integer_literal(""));
    }

    #[test]
    fn test_path_param_passes_values_through() {
        let id = path_param(Ok(Path(7_i32)), Entity::Role).unwrap();
        assert_eq!(id, 7);
    }
}
