use std::env;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
///
/// Constructed once in `main` and handed to components through `AppState`;
/// nothing reads the environment after startup.
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,

    // Database
    pub db_path: PathBuf,

    // JWT signing
    pub secret_key: String,

    // Email verification API (hunter.io)
    pub hunter_api_key: String,
    pub verifier_timeout_secs: u64,

    // Outbound SMTP
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub email_from: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            // Server
            host: env::var("REFERRALD_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("REFERRALD_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),

            // Database
            db_path: PathBuf::from(
                env::var("REFERRALD_DB_PATH").unwrap_or_else(|_| "/data/referrald.db".to_string()),
            ),

            // JWT signing
            secret_key: env::var("REFERRALD_SECRET_KEY")
                .unwrap_or_else(|_| "insecure-dev-secret".to_string()),

            // Email verification API
            hunter_api_key: env::var("REFERRALD_HUNTER_API_KEY").unwrap_or_default(),
            verifier_timeout_secs: env::var("REFERRALD_VERIFIER_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),

            // Outbound SMTP
            smtp_host: env::var("REFERRALD_SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            smtp_port: env::var("REFERRALD_SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            smtp_username: env::var("REFERRALD_SMTP_USERNAME").unwrap_or_default(),
            smtp_password: env::var("REFERRALD_SMTP_PASSWORD").unwrap_or_default(),
            email_from: env::var("REFERRALD_EMAIL_FROM")
                .unwrap_or_else(|_| "noreply@localhost".to_string()),
        }
    }

    pub fn db_url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.db_path.display())
    }
}
