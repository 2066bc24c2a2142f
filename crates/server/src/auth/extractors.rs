use axum::{extract::FromRequestParts, http::request::Parts};
use shared_types::AppError;

use super::jwt::Claims;

/// Roles allowed to change result sheets.
pub const STAFF_ROLES: &[&str] = &["admin", "staff"];

pub fn is_staff_role(role: &str) -> bool {
    STAFF_ROLES.iter().any(|r| r.eq_ignore_ascii_case(role))
}

/// Extractor that requires authentication. Returns 401 if no valid token.
pub struct AuthRequired(pub Claims);

impl<S: Send + Sync> FromRequestParts<S> for AuthRequired {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthRequired)
            .ok_or_else(|| AppError::unauthorized("Authentication required"))
    }
}

/// Extractor for mutations: 401 if unauthenticated, 403 unless the role is
/// `admin` or `staff`.
pub struct StaffRequired(pub Claims);

impl<S: Send + Sync> FromRequestParts<S> for StaffRequired {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthRequired(claims) = AuthRequired::from_request_parts(parts, state).await?;
        if !is_staff_role(&claims.role) {
            return Err(AppError::forbidden("Staff role required"));
        }
        Ok(StaffRequired(claims))
    }
}
