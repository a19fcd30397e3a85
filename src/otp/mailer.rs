//! OTP delivery

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{OnboardingError, Result};

/// Delivers a code to its email address out of band.
#[async_trait]
pub trait OtpMailer: Send + Sync {
    async fn send(&self, email: &str, code: &str) -> Result<()>;
}

/// Posts messages to a transactional mail HTTP endpoint.
pub struct HttpMailer {
    endpoint: String,
    api_token: Option<String>,
    sender: String,
    subject: String,
    http_client: Client,
}

impl HttpMailer {
    pub fn new(endpoint: String, api_token: Option<String>, sender: String, subject: String) -> Self {
        Self {
            endpoint,
            api_token,
            sender,
            subject,
            http_client: Client::new(),
        }
    }
}

#[async_trait]
impl OtpMailer for HttpMailer {
    async fn send(&self, email: &str, code: &str) -> Result<()> {
        let body = json!({
            "from": self.sender,
            "to": email,
            "subject": self.subject,
            "text": format!("Your one-time registration code is {}. It can be used once.", code),
        });

        let mut request = self.http_client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| OnboardingError::MailError(format!("Failed to reach mail endpoint: {}", e)))?;

        if !response.status().is_success() {
            return Err(OnboardingError::MailError(format!(
                "Mail endpoint returned {}",
                response.status()
            )));
        }

        info!(email, "OTP email dispatched");
        Ok(())
    }
}

/// Development mailer that only logs. Codes appear at debug level.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl OtpMailer for LogMailer {
    async fn send(&self, email: &str, code: &str) -> Result<()> {
        info!(email, "OTP delivery skipped (log mailer)");
        debug!(email, code, "OTP for local delivery");
        Ok(())
    }
}
