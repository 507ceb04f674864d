use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use crate::auth::jwt::JwtKeys;
use crate::error::ApiError;
use crate::users::repo_types::Role;

/// Authenticated identity extracted from the bearer token. Handlers receive
/// this as an explicit argument; nothing is stashed in request extensions.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden(
                "access denied: administrator privileges required",
            ))
        }
    }

    /// Allows the resource owner or an admin override.
    pub fn require_self_or_admin(&self, owner: Uuid) -> Result<(), ApiError> {
        if self.id == owner || self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden(
                "access denied: you may only act on your own resources",
            ))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::MissingToken)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::InvalidToken)?;

        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            ApiError::InvalidToken
        })?;

        Ok(AuthUser {
            id: claims.sub,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn require_admin_allows_admin_only() {
        assert!(user(Role::Admin).require_admin().is_ok());
        let err = user(Role::Visitor).require_admin().unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn self_or_admin_matrix() {
        let visitor = user(Role::Visitor);
        assert!(visitor.require_self_or_admin(visitor.id).is_ok());
        assert!(visitor.require_self_or_admin(Uuid::new_v4()).is_err());

        let admin = user(Role::Admin);
        assert!(admin.require_self_or_admin(Uuid::new_v4()).is_ok());
    }
}
