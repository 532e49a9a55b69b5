use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{AppError, Result};

/// External email-verification collaborator. Registration blocks on this
/// before any user row is created.
#[async_trait]
pub trait EmailVerifier: Send + Sync {
    /// Whether the address is deliverable according to the service.
    async fn verify(&self, email: &str) -> Result<bool>;
}

const HUNTER_API_URL: &str = "https://api.hunter.io/v2/email-verifier";

/// hunter.io email-verifier client. The request timeout is bounded at the
/// client level; a timed-out or failed call surfaces as a typed
/// `ExternalService` error rather than hanging the request.
pub struct HunterClient {
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct HunterResponse {
    data: HunterData,
}

#[derive(Debug, Deserialize)]
struct HunterData {
    #[serde(default)]
    status: String,
}

impl HunterClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { api_key, client })
    }
}

#[async_trait]
impl EmailVerifier for HunterClient {
    async fn verify(&self, email: &str) -> Result<bool> {
        let response = self
            .client
            .get(HUNTER_API_URL)
            .query(&[("email", email), ("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::ExternalService(format!("Email verification timed out: {}", e))
                } else {
                    AppError::ExternalService(format!("Email verification failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "Email verification API returned {}",
                response.status()
            )));
        }

        let body: HunterResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Malformed verifier response: {}", e)))?;

        tracing::debug!(status = %body.data.status, "Email verification result");
        Ok(body.data.status == "valid")
    }
}
