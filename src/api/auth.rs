use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};

use crate::db::entities::prelude::User;
use crate::db::entities::user;
use crate::error::{AppError, Result};
use crate::services::registration::{RegisterRequest, RegistrationService};
use crate::services::security::{create_access_token, create_refresh_token, verify_password};
use crate::state::AppState;

/// Create registration and login routes
pub fn auth_routes(state: AppState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .with_state(state)
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub refresh: String,
    pub access: String,
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

/// Register a new user, optionally redeeming a referral token.
///
/// A missing body is treated as all fields missing so the response carries
/// the per-field errors instead of a generic deserialization failure.
async fn register(
    State(state): State<AppState>,
    body: Option<Json<RegisterRequest>>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let request = body.map(|Json(r)| r).unwrap_or_default();

    let outcome = RegistrationService::new(&state.db, state.verifier.as_ref())
        .register(request)
        .await?;

    let message = if outcome.referred {
        "Successfully created a new user with referral code"
    } else {
        "Successfully created a new user without referral code"
    };

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": message })),
    ))
}

/// Authenticate and issue a refresh/access token pair.
async fn login(
    State(state): State<AppState>,
    body: Option<Json<LoginRequest>>,
) -> Result<Json<TokenPair>> {
    let login = body.map(|Json(r)| r).unwrap_or_default();

    let user: user::Model = User::find()
        .filter(user::Column::Username.eq(login.username.as_str()))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&login.password, &user.hashed_password) {
        return Err(AppError::InvalidCredentials);
    }

    Ok(Json(TokenPair {
        refresh: create_refresh_token(&state.config.secret_key, user.id)?,
        access: create_access_token(&state.config.secret_key, user.id)?,
    }))
}
