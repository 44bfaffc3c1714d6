//! Request extractors gating protected routes.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sea_orm::EntityTrait;

use crate::auth::jwt;
use crate::entities::user;
use crate::error::AppError;
use crate::state::AppState;

/// The caller behind a valid `Authorization: Bearer <token>` header, loaded
/// from the database. Add as a handler parameter to require authentication.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

/// Like [`AuthUser`], but additionally requires the `"admin"` role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub user::Model);

/// Resolve the bearer token on a request to a live account.
///
/// Soft-deleted accounts authenticate like unknown ones so a deleted user's
/// still-valid token reveals nothing.
async fn resolve_caller(parts: &Parts, state: &AppState) -> Result<user::Model, AppError> {
    let unauthorized = |msg: &str| AppError::Unauthorized(msg.to_string());

    let token = parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| unauthorized("Missing or malformed authorization header."))?;

    let claims = jwt::validate_token(token, &state.config.jwt_secret)
        .map_err(|_| unauthorized("Invalid or expired token."))?;
    let user_id: uuid::Uuid = claims
        .sub
        .parse()
        .map_err(|_| unauthorized("Invalid token subject."))?;

    let account = user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await?
        .filter(|u| u.deleted_at.is_none())
        .ok_or_else(|| unauthorized("User not found."))?;

    Ok(account)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_caller(parts, state).await.map(Self)
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let caller = resolve_caller(parts, state).await?;
        if caller.role != "admin" {
            return Err(AppError::Forbidden("Admin role required.".to_string()));
        }
        Ok(Self(caller))
    }
}
