use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::mailer::OtpMailer;
use super::store::OtpStore;
use crate::error::ClientError;
use crate::registration::timeouts::bounded;
use crate::validation::EmailPolicy;

/// The `RequestOtp` operation: domain check, issue, deliver.
pub struct OtpService {
    policy: EmailPolicy,
    store: Arc<dyn OtpStore>,
    mailer: Arc<dyn OtpMailer>,
    store_timeout: Duration,
    mail_timeout: Duration,
}

impl OtpService {
    pub fn new(
        policy: EmailPolicy,
        store: Arc<dyn OtpStore>,
        mailer: Arc<dyn OtpMailer>,
        store_timeout: Duration,
        mail_timeout: Duration,
    ) -> Self {
        Self {
            policy,
            store,
            mailer,
            store_timeout,
            mail_timeout,
        }
    }

    /// Issue a code for `email` and hand it to the mailer. The code is never
    /// returned to the caller.
    pub async fn request_otp(&self, email: &str) -> Result<(), ClientError> {
        let email = self.policy.check(email).map_err(|e| {
            warn!(email, reason = %e, "OTP request rejected");
            e
        })?;

        let code = bounded("otp store issue", self.store_timeout, self.store.issue(&email))
            .await
            .map_err(|e| {
                error!(email = %email, error = %e, "Failed to issue OTP");
                ClientError::Infra
            })?;

        bounded("otp mail delivery", self.mail_timeout, self.mailer.send(&email, &code))
            .await
            .map_err(|e| {
                error!(email = %email, error = %e, "Failed to deliver OTP");
                ClientError::Infra
            })?;

        info!(email = %email, "OTP issued");
        Ok(())
    }
}
