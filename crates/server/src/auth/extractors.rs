use axum::{extract::FromRequestParts, http::request::Parts};
use shared_types::{AppError, UserRole};

use super::jwt::Claims;

/// Extractor that requires authentication. Returns 401 if no valid token.
#[derive(Debug)]
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

/// Extractor that optionally extracts auth claims. Never fails.
#[derive(Debug)]
pub struct MaybeAuth(pub Option<Claims>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuth(parts.extensions.get::<Claims>().cloned()))
    }
}

/// Extractor that requires authentication AND a specific role.
/// Returns 401 if unauthenticated, 403 if the user's role does not satisfy it.
///
/// Role constants:
/// - 1 = Client
/// - 2 = Maintenance
/// - 3 = Admin (satisfies all roles)
#[derive(Debug)]
pub struct RoleRequired<const ROLE: u8>(pub Claims);

pub type ClientRequired = RoleRequired<1>;
pub type MaintenanceRequired = RoleRequired<2>;
pub type AdminRequired = RoleRequired<3>;

pub(crate) fn required_role(role: u8) -> UserRole {
    match role {
        2 => UserRole::Maintenance,
        3 => UserRole::Admin,
        _ => UserRole::Client,
    }
}

impl<const ROLE: u8, S: Send + Sync> FromRequestParts<S> for RoleRequired<ROLE> {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<Claims>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized("Authentication required"))?;

        let required = required_role(ROLE);
        if !claims.user_role().satisfies(&required) {
            return Err(AppError::forbidden(format!(
                "{} role required",
                required.as_str()
            )));
        }

        Ok(RoleRequired(claims))
    }
}
