use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::Config;
use crate::services::{EmailVerifier, ReferralMailer};

/// Application state containing all shared resources. External collaborators
/// sit behind trait objects so tests can substitute them.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
    pub verifier: Arc<dyn EmailVerifier>,
    pub mailer: Arc<dyn ReferralMailer>,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        config: Arc<Config>,
        verifier: Arc<dyn EmailVerifier>,
        mailer: Arc<dyn ReferralMailer>,
    ) -> Self {
        Self {
            db,
            config,
            verifier,
            mailer,
        }
    }
}
