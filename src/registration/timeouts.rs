use std::future::Future;
use std::time::Duration;

use crate::config::TimeoutConfig;
use crate::error::{OnboardingError, Result};

/// Upper bound for each collaborator call.
#[derive(Debug, Clone, Copy)]
pub struct StepTimeouts {
    pub otp_store: Duration,
    pub credential: Duration,
    pub admission: Duration,
    pub ledger: Duration,
}

impl Default for StepTimeouts {
    fn default() -> Self {
        Self {
            otp_store: Duration::from_secs(5),
            credential: Duration::from_secs(60),
            admission: Duration::from_secs(60),
            ledger: Duration::from_secs(5),
        }
    }
}

impl From<&TimeoutConfig> for StepTimeouts {
    fn from(config: &TimeoutConfig) -> Self {
        Self {
            otp_store: config.otp_store(),
            credential: config.credential(),
            admission: config.admission(),
            ledger: config.ledger(),
        }
    }
}

/// Run `fut`, turning an elapsed deadline into `OnboardingError::Timeout`.
pub async fn bounded<T, F>(operation: &str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(OnboardingError::Timeout(format!(
            "{} exceeded {:?}",
            operation, limit
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_passes_result_through() {
        let value = bounded("fast", Duration::from_secs(1), async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let result: Result<()> = bounded("slow", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        match result {
            Err(OnboardingError::Timeout(msg)) => assert!(msg.contains("slow")),
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
