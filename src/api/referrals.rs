use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::extractors::AuthUser;
use crate::db::entities::referral_code;
use crate::error::Result;
use crate::services::codes::ReferralCodeService;
use crate::services::referrals::ReferralGraphService;
use crate::state::AppState;

/// Create referral-code and referral-info routes (all require auth)
pub fn referral_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/ref-code",
            get(get_referral_code)
                .post(create_referral_code)
                .delete(delete_referral_code),
        )
        .route("/ref-info", get(get_referral_info))
        .with_state(state)
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct CreateCodeRequest {
    pub expiry_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CodeResponse {
    pub user: i64,
    pub code: String,
    pub expiry_date: NaiveDate,
    pub is_active: bool,
}

impl From<referral_code::Model> for CodeResponse {
    fn from(model: referral_code::Model) -> Self {
        Self {
            user: model.user_id,
            code: model.code,
            expiry_date: model.expiry_date,
            is_active: model.is_active,
        }
    }
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

/// Email the caller their active referral code.
async fn get_referral_code(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<serde_json::Value>> {
    let code = ReferralCodeService::new(&state.db)
        .fetch_active(user.id)
        .await?;

    state.mailer.send_code(&user.email, &code.code).await?;

    Ok(Json(serde_json::json!({
        "message": "Referral code has been sent to the email"
    })))
}

/// Create a new referral code, superseding the caller's current one.
async fn create_referral_code(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Option<Json<CreateCodeRequest>>,
) -> Result<(StatusCode, Json<CodeResponse>)> {
    let request = body.map(|Json(r)| r).unwrap_or_default();

    let code = ReferralCodeService::new(&state.db)
        .create(user.id, request.expiry_date.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(code.into())))
}

/// Logically delete the caller's active referral code.
async fn delete_referral_code(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Response> {
    let snapshot = ReferralCodeService::new(&state.db)
        .deactivate_active(user.id)
        .await?;

    Ok((
        StatusCode::NO_CONTENT,
        Json(serde_json::json!({
            "message": "Code successfully delete",
            "code": CodeResponse::from(snapshot),
        })),
    )
        .into_response())
}

/// List usernames of the users the caller referred.
async fn get_referral_info(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<serde_json::Value>> {
    let referrals = ReferralGraphService::new(&state.db)
        .list_referrals(user.id)
        .await?;

    Ok(Json(serde_json::json!({ "referrals": referrals })))
}
