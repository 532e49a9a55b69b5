use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use sea_orm::EntityTrait;

use crate::db::entities::prelude::User;
use crate::db::entities::user;
use crate::error::AppError;
use crate::services::security::decode_token;
use crate::state::AppState;

/// Extractor for authenticated users. Absence or invalidity of the bearer
/// token yields the fixed 401 `{"detail": ...}` payload.
pub struct AuthUser(pub user::Model);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or_else(|| {
                AppError::Unauthorized(
                    "Authentication credentials were not provided".to_string(),
                )
            })?;

        let claims = decode_token(&state.config.secret_key, token).map_err(|_| {
            AppError::Unauthorized("Given token not valid for any token type".to_string())
        })?;

        // Refresh tokens are only good for obtaining new tokens
        if claims.token_type.as_deref() == Some("refresh") {
            return Err(AppError::Unauthorized(
                "Given token not valid for any token type".to_string(),
            ));
        }

        let user_id: i64 = claims.sub.parse().map_err(|_| {
            AppError::Unauthorized("Given token not valid for any token type".to_string())
        })?;

        let user = User::find_by_id(user_id)
            .one(&state.db)
            .await
            .map_err(|e| AppError::Internal(format!("Database error: {}", e)))?
            .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

        Ok(AuthUser(user))
    }
}
