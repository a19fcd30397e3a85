use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::error::ClientError;

/// Progress through the registration flow. Ordered: each state implies all
/// earlier ones succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationState {
    Start,
    OtpVerified,
    CredentialIssued,
    GroupAdmitted,
    Recorded,
}

impl RegistrationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationState::Start => "start",
            RegistrationState::OtpVerified => "otp_verified",
            RegistrationState::CredentialIssued => "credential_issued",
            RegistrationState::GroupAdmitted => "group_admitted",
            RegistrationState::Recorded => "recorded",
        }
    }
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which half of group admission failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionPhase {
    Simulation,
    Write,
}

/// Terminal outcome of one registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Recorded {
        credential_tx: String,
        admission_tx: String,
    },
    /// Rejected before any collaborator was called.
    Invalid(ClientError),
    OtpRejected,
    /// The OTP store could not be reached; nothing changed.
    OtpStoreUnavailable,
    CredentialMintFailed {
        reference: Option<String>,
    },
    GroupAdmissionFailed {
        credential_tx: String,
        phase: AdmissionPhase,
        reference: Option<String>,
    },
    LedgerWriteFailed {
        credential_tx: String,
        admission_tx: String,
        already_registered: bool,
    },
}

impl RegistrationOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RegistrationOutcome::Recorded { .. } => "recorded",
            RegistrationOutcome::Invalid(_) => "invalid_request",
            RegistrationOutcome::OtpRejected => "otp_rejected",
            RegistrationOutcome::OtpStoreUnavailable => "otp_store_unavailable",
            RegistrationOutcome::CredentialMintFailed { .. } => "credential_mint_failed",
            RegistrationOutcome::GroupAdmissionFailed { .. } => "group_admission_failed",
            RegistrationOutcome::LedgerWriteFailed { .. } => "ledger_write_failed",
        }
    }

    /// Failures that left an irreversible side effect behind.
    pub fn requires_reconciliation(&self) -> bool {
        matches!(
            self,
            RegistrationOutcome::CredentialMintFailed { .. }
                | RegistrationOutcome::GroupAdmissionFailed { .. }
                | RegistrationOutcome::LedgerWriteFailed { .. }
        )
    }

    pub fn client_error(&self) -> Option<ClientError> {
        match self {
            RegistrationOutcome::Recorded { .. } => None,
            RegistrationOutcome::Invalid(err) => Some(err.clone()),
            RegistrationOutcome::OtpRejected => Some(ClientError::OtpRejected),
            RegistrationOutcome::OtpStoreUnavailable => Some(ClientError::Infra),
            RegistrationOutcome::CredentialMintFailed { .. } => {
                Some(ClientError::CredentialMintFailed)
            }
            RegistrationOutcome::GroupAdmissionFailed { .. } => {
                Some(ClientError::GroupAdmissionFailed)
            }
            RegistrationOutcome::LedgerWriteFailed {
                already_registered, ..
            } => Some(ClientError::LedgerWriteFailed {
                already_registered: *already_registered,
            }),
        }
    }

    pub fn credential_tx(&self) -> Option<&str> {
        match self {
            RegistrationOutcome::Recorded { credential_tx, .. }
            | RegistrationOutcome::GroupAdmissionFailed { credential_tx, .. }
            | RegistrationOutcome::LedgerWriteFailed { credential_tx, .. } => Some(credential_tx),
            RegistrationOutcome::CredentialMintFailed { reference } => reference.as_deref(),
            _ => None,
        }
    }

    pub fn admission_tx(&self) -> Option<&str> {
        match self {
            RegistrationOutcome::Recorded { admission_tx, .. }
            | RegistrationOutcome::LedgerWriteFailed { admission_tx, .. } => Some(admission_tx),
            RegistrationOutcome::GroupAdmissionFailed { reference, .. } => reference.as_deref(),
            _ => None,
        }
    }
}

/// Everything known about one attempt once it reached a terminal state.
#[derive(Debug, Clone)]
pub struct RegistrationReport {
    pub attempt_id: Uuid,
    pub email: String,
    pub address: String,
    /// Last state entered successfully.
    pub reached: RegistrationState,
    pub outcome: RegistrationOutcome,
}

impl RegistrationReport {
    pub fn into_result(self) -> Result<RegistrationReceipt, ClientError> {
        match self.outcome {
            RegistrationOutcome::Recorded {
                credential_tx,
                admission_tx,
            } => Ok(RegistrationReceipt {
                attempt_id: self.attempt_id,
                email: self.email,
                address: self.address,
                credential_tx,
                admission_tx,
            }),
            other => Err(other.client_error().unwrap_or(ClientError::Infra)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationReceipt {
    pub attempt_id: Uuid,
    pub email: String,
    pub address: String,
    pub credential_tx: String,
    pub admission_tx: String,
}
