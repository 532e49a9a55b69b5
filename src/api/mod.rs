pub mod auth;
pub mod extractors;
pub mod referrals;

use axum::Router;

use crate::state::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(auth::auth_routes(state.clone()))
        .merge(referrals::referral_routes(state))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
