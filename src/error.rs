use axum::http::StatusCode;
use thiserror::Error;

impl From<serde_json::Error> for OnboardingError {
    fn from(err: serde_json::Error) -> Self {
        Self::JournalError(format!("JSON serialization error: {}", err))
    }
}

impl From<sqlx::Error> for OnboardingError {
    fn from(err: sqlx::Error) -> Self {
        Self::DatabaseError(format!("Database error: {}", err))
    }
}

impl From<reqwest::Error> for OnboardingError {
    fn from(err: reqwest::Error) -> Self {
        Self::ChainError(format!("HTTP transport error: {}", err))
    }
}

impl From<std::io::Error> for OnboardingError {
    fn from(err: std::io::Error) -> Self {
        Self::JournalError(format!("I/O error: {}", err))
    }
}

impl From<config::ConfigError> for OnboardingError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

/// Infrastructure-level failures raised by collaborators.
///
/// These never reach a caller verbatim; the orchestrator and the OTP service
/// translate them into a [`ClientError`].
#[derive(Error, Debug)]
pub enum OnboardingError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Chain client error: {0}")]
    ChainError(String),

    #[error("Mail delivery error: {0}")]
    MailError(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Journal error: {0}")]
    JournalError(String),
}

pub type Result<T> = std::result::Result<T, OnboardingError>;

/// Caller-visible error taxonomy for the two request operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("email domain is not accepted")]
    InvalidDomain,

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("invalid or expired OTP")]
    OtpRejected,

    #[error("credential mint failed")]
    CredentialMintFailed,

    #[error("group admission failed")]
    GroupAdmissionFailed,

    #[error("ledger write failed")]
    LedgerWriteFailed { already_registered: bool },

    #[error("service temporarily unavailable")]
    Infra,
}

impl ClientError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ClientError::InvalidDomain => "invalid_domain",
            ClientError::Validation(_) => "validation_error",
            ClientError::OtpRejected => "otp_rejected",
            ClientError::CredentialMintFailed => "credential_mint_failed",
            ClientError::GroupAdmissionFailed => "group_admission_failed",
            ClientError::LedgerWriteFailed {
                already_registered: true,
            } => "already_registered",
            ClientError::LedgerWriteFailed { .. } => "ledger_write_failed",
            ClientError::Infra => "infra_error",
        }
    }

    /// Fixed user-facing text. Collaborator error details are never included.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::InvalidDomain => {
                "This email address is not eligible for registration.".to_string()
            }
            ClientError::Validation(detail) => format!("Invalid request: {}", detail),
            ClientError::OtpRejected => "Invalid or expired OTP.".to_string(),
            ClientError::CredentialMintFailed => {
                "Credential issuance failed. Your OTP has been used; please contact support before retrying."
                    .to_string()
            }
            ClientError::GroupAdmissionFailed => {
                "Group admission failed after your credential was issued. Please contact support."
                    .to_string()
            }
            ClientError::LedgerWriteFailed {
                already_registered: true,
            } => "This email address is already registered.".to_string(),
            ClientError::LedgerWriteFailed { .. } => {
                "Registration could not be recorded. Please contact support.".to_string()
            }
            ClientError::Infra => {
                "The service is temporarily unavailable. Please try again.".to_string()
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ClientError::InvalidDomain | ClientError::Validation(_) => StatusCode::BAD_REQUEST,
            ClientError::OtpRejected => StatusCode::UNAUTHORIZED,
            ClientError::LedgerWriteFailed {
                already_registered: true,
            } => StatusCode::CONFLICT,
            ClientError::CredentialMintFailed
            | ClientError::GroupAdmissionFailed
            | ClientError::LedgerWriteFailed { .. } => StatusCode::BAD_GATEWAY,
            ClientError::Infra => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Only infrastructure failures happen before any irreversible side effect.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Infra)
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::InvalidDomain | ClientError::Validation(_))
    }
}
