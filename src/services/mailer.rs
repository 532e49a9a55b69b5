use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::Config;
use crate::error::{AppError, Result};

/// Outbound transactional-email collaborator used by `GET /ref-code`.
#[async_trait]
pub trait ReferralMailer: Send + Sync {
    async fn send_code(&self, recipient: &str, code: &str) -> Result<()>;
}

/// SMTP mailer over an async STARTTLS transport.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    pub fn from_config(config: &Config) -> Result<Self> {
        let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        Ok(Self {
            transport,
            from_address: config.email_from.clone(),
        })
    }
}

#[async_trait]
impl ReferralMailer for SmtpMailer {
    async fn send_code(&self, recipient: &str, code: &str) -> Result<()> {
        let to = recipient
            .parse()
            .map_err(|_| AppError::Internal("Invalid recipient email address".to_string()))?;
        let from = self
            .from_address
            .parse()
            .map_err(|_| AppError::Internal("Invalid from email address".to_string()))?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject("Your referral code")
            .header(ContentType::TEXT_PLAIN)
            .body(format!("Your referral code is {}", code))
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| AppError::ExternalService(format!("Failed to send email: {}", e)))?;

        tracing::info!(recipient, "Sent referral code email");
        Ok(())
    }
}
