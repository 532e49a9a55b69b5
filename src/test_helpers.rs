//! Shared helpers for unit and handler tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

use crate::config::Config;
use crate::db::entities::{referral_code, user};
use crate::db::pool::SCHEMA_SQL;
use crate::error::Result;
use crate::services::security::hash_password;
use crate::services::{EmailVerifier, ReferralMailer};
use crate::state::AppState;

/// Create an in-memory database with the schema applied.
///
/// The pool is pinned to a single connection: every sqlite `:memory:`
/// connection is its own database, so a larger pool would hand out empty
/// databases for all but the first connection.
pub async fn create_test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);

    let db = Database::connect(options)
        .await
        .expect("connect to in-memory database");

    use sea_orm::ConnectionTrait;
    db.execute_unprepared(SCHEMA_SQL)
        .await
        .expect("apply schema");

    db
}

pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
    email: &str,
    password: &str,
) -> user::Model {
    user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        hashed_password: Set(hash_password(password).expect("hash password")),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert test user")
}

pub async fn create_test_code(
    db: &DatabaseConnection,
    user_id: i64,
    code: &str,
    is_active: bool,
) -> referral_code::Model {
    referral_code::ActiveModel {
        user_id: Set(user_id),
        code: Set(code.to_string()),
        expiry_date: Set((Utc::now() + Duration::days(30)).date_naive()),
        is_active: Set(is_active),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert test code")
}

/// Email verifier that returns a fixed verdict.
pub struct MockVerifier {
    verdict: bool,
}

impl MockVerifier {
    pub fn valid() -> Self {
        Self { verdict: true }
    }

    pub fn invalid() -> Self {
        Self { verdict: false }
    }
}

#[async_trait]
impl EmailVerifier for MockVerifier {
    async fn verify(&self, _email: &str) -> Result<bool> {
        Ok(self.verdict)
    }
}

/// Mailer that records every message instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ReferralMailer for RecordingMailer {
    async fn send_code(&self, recipient: &str, code: &str) -> Result<()> {
        self.sent
            .lock()
            .expect("mailer lock")
            .push((recipient.to_string(), code.to_string()));
        Ok(())
    }
}

pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        db_path: ":memory:".into(),
        secret_key: "test-secret".to_string(),
        hunter_api_key: "test-key".to_string(),
        verifier_timeout_secs: 1,
        smtp_host: "localhost".to_string(),
        smtp_port: 2525,
        smtp_username: String::new(),
        smtp_password: String::new(),
        email_from: "noreply@test.local".to_string(),
    }
}

/// Build a full application state over a fresh in-memory database, with the
/// email verifier stubbed to the given verdict and a recording mailer.
pub async fn test_state(email_verdict: bool) -> (AppState, Arc<RecordingMailer>) {
    let db = create_test_db().await;
    let verifier = if email_verdict {
        MockVerifier::valid()
    } else {
        MockVerifier::invalid()
    };
    let mailer = Arc::new(RecordingMailer::default());

    let state = AppState::new(
        db,
        Arc::new(test_config()),
        Arc::new(verifier),
        mailer.clone(),
    );
    (state, mailer)
}
