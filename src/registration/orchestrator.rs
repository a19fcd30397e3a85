use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::state::{
    AdmissionPhase, RegistrationOutcome, RegistrationReceipt, RegistrationReport,
    RegistrationState,
};
use super::timeouts::{bounded, StepTimeouts};
use crate::chain::abi;
use crate::chain::{Address, CredentialIssuer, GroupAdmissionClient, Uint256};
use crate::error::ClientError;
use crate::ledger::{IncidentRecord, LedgerWrite, ReconciliationJournal, RegistrationLedger};
use crate::otp::OtpStore;
use crate::validation::{check_otp_format, EmailPolicy};

/// One `VerifyAndRegister` submission. Never stored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub email: String,
    pub otp: String,
    pub address: String,
    pub identity_commitment: String,
}

struct ValidatedRequest {
    email: String,
    otp: String,
    address: Address,
    identity_commitment: Uint256,
}

/// Where a flow stopped, with the collaborator detail kept out of the
/// caller-facing outcome.
struct Terminal {
    reached: RegistrationState,
    outcome: RegistrationOutcome,
    detail: String,
}

impl Terminal {
    fn new(reached: RegistrationState, outcome: RegistrationOutcome, detail: impl Into<String>) -> Self {
        Self {
            reached,
            outcome,
            detail: detail.into(),
        }
    }
}

pub struct RegistrationOrchestrator {
    policy: EmailPolicy,
    otp_store: Arc<dyn OtpStore>,
    issuer: Arc<dyn CredentialIssuer>,
    admission: Arc<dyn GroupAdmissionClient>,
    ledger: Arc<dyn RegistrationLedger>,
    journal: Option<Arc<ReconciliationJournal>>,
    role_id: Uint256,
    timeouts: StepTimeouts,
}

impl RegistrationOrchestrator {
    pub fn new(
        policy: EmailPolicy,
        otp_store: Arc<dyn OtpStore>,
        issuer: Arc<dyn CredentialIssuer>,
        admission: Arc<dyn GroupAdmissionClient>,
        ledger: Arc<dyn RegistrationLedger>,
        role_id: Uint256,
        timeouts: StepTimeouts,
    ) -> Self {
        Self {
            policy,
            otp_store,
            issuer,
            admission,
            ledger,
            journal: None,
            role_id,
            timeouts,
        }
    }

    pub fn with_journal(mut self, journal: Arc<ReconciliationJournal>) -> Self {
        self.journal = Some(journal);
        self
    }

    /// The `VerifyAndRegister` operation.
    pub async fn verify_and_register(
        &self,
        request: RegistrationRequest,
    ) -> Result<RegistrationReceipt, ClientError> {
        self.run(request).await.into_result()
    }

    /// Drive one attempt to a terminal state and report how far it got.
    pub async fn run(&self, request: RegistrationRequest) -> RegistrationReport {
        let attempt_id = Uuid::new_v4();

        let terminal = match self.validate(&request) {
            Ok(validated) => self.drive(attempt_id, &validated).await,
            Err(err) => {
                warn!(%attempt_id, email = %request.email, reason = %err, "Registration request rejected");
                Terminal::new(RegistrationState::Start, RegistrationOutcome::Invalid(err), "")
            }
        };

        let report = RegistrationReport {
            attempt_id,
            email: self.policy.check(&request.email).unwrap_or(request.email),
            address: request
                .address
                .parse::<Address>()
                .map(|a| a.to_string())
                .unwrap_or(request.address),
            reached: terminal.reached,
            outcome: terminal.outcome,
        };

        if report.outcome.requires_reconciliation() {
            self.record_incident(&report, &terminal.detail).await;
        }

        report
    }

    fn validate(&self, request: &RegistrationRequest) -> Result<ValidatedRequest, ClientError> {
        let email = self.policy.check(&request.email)?;
        let otp = check_otp_format(&request.otp)?;
        let address = request
            .address
            .parse::<Address>()
            .map_err(|e| ClientError::Validation(format!("address: {}", e)))?;
        let identity_commitment = request
            .identity_commitment
            .parse::<Uint256>()
            .map_err(|e| ClientError::Validation(format!("identityCommitment: {}", e)))?;

        Ok(ValidatedRequest {
            email,
            otp,
            address,
            identity_commitment,
        })
    }

    async fn drive(&self, attempt_id: Uuid, req: &ValidatedRequest) -> Terminal {
        let t = self.timeouts;

        // Start -> OtpVerified. A successful verify has already consumed the OTP.
        match bounded("otp verify", t.otp_store, self.otp_store.verify(&req.email, &req.otp)).await {
            Ok(true) => {
                info!(%attempt_id, email = %req.email, "OTP verified");
            }
            Ok(false) => {
                warn!(%attempt_id, email = %req.email, "OTP rejected");
                return Terminal::new(RegistrationState::Start, RegistrationOutcome::OtpRejected, "");
            }
            Err(e) => {
                error!(%attempt_id, email = %req.email, error = %e, "OTP store unavailable");
                return Terminal::new(
                    RegistrationState::Start,
                    RegistrationOutcome::OtpStoreUnavailable,
                    e.to_string(),
                );
            }
        }

        // OtpVerified -> CredentialIssued. Submission and confirmation are
        // bounded separately so a submitted hash is kept if the receipt never
        // arrives. A transport-level success still has to report a successful
        // on-chain status.
        let mint_tx = match bounded(
            "credential submit",
            t.credential,
            self.issuer.submit_mint(&req.address, &self.role_id),
        )
        .await
        {
            Ok(tx_hash) => tx_hash,
            Err(e) => {
                return Terminal::new(
                    RegistrationState::OtpVerified,
                    RegistrationOutcome::CredentialMintFailed { reference: None },
                    e.to_string(),
                );
            }
        };

        let credential_tx = match bounded(
            "credential confirm",
            t.credential,
            self.issuer.confirm(&mint_tx),
        )
        .await
        {
            Ok(outcome) if outcome.succeeded => outcome.reference,
            Ok(outcome) => {
                return Terminal::new(
                    RegistrationState::OtpVerified,
                    RegistrationOutcome::CredentialMintFailed {
                        reference: Some(outcome.reference),
                    },
                    "mint transaction reported failure status",
                );
            }
            Err(e) => {
                return Terminal::new(
                    RegistrationState::OtpVerified,
                    RegistrationOutcome::CredentialMintFailed {
                        reference: Some(mint_tx),
                    },
                    format!("mint submitted but not confirmed: {}", e),
                );
            }
        };
        info!(%attempt_id, address = %req.address, tx = %credential_tx, "Credential issued");

        // CredentialIssued -> GroupAdmitted: simulate, then write.
        let gate_data = abi::encode_uint256(&self.role_id);
        let prepared = match bounded(
            "group admission simulation",
            t.admission,
            self.admission.simulate(&req.identity_commitment, &gate_data),
        )
        .await
        {
            Ok(call) => call,
            Err(e) => {
                return Terminal::new(
                    RegistrationState::CredentialIssued,
                    RegistrationOutcome::GroupAdmissionFailed {
                        credential_tx,
                        phase: AdmissionPhase::Simulation,
                        reference: None,
                    },
                    e.to_string(),
                );
            }
        };

        let join_tx = match bounded(
            "group admission submit",
            t.admission,
            self.admission.submit(prepared),
        )
        .await
        {
            Ok(tx_hash) => tx_hash,
            Err(e) => {
                return Terminal::new(
                    RegistrationState::CredentialIssued,
                    RegistrationOutcome::GroupAdmissionFailed {
                        credential_tx,
                        phase: AdmissionPhase::Write,
                        reference: None,
                    },
                    e.to_string(),
                );
            }
        };

        let admission_tx = match bounded(
            "group admission confirm",
            t.admission,
            self.admission.confirm(&join_tx),
        )
        .await
        {
            Ok(outcome) if outcome.succeeded => outcome.reference,
            Ok(outcome) => {
                return Terminal::new(
                    RegistrationState::CredentialIssued,
                    RegistrationOutcome::GroupAdmissionFailed {
                        credential_tx,
                        phase: AdmissionPhase::Write,
                        reference: Some(outcome.reference),
                    },
                    "admission transaction reported failure status",
                );
            }
            Err(e) => {
                return Terminal::new(
                    RegistrationState::CredentialIssued,
                    RegistrationOutcome::GroupAdmissionFailed {
                        credential_tx,
                        phase: AdmissionPhase::Write,
                        reference: Some(join_tx),
                    },
                    format!("admission submitted but not confirmed: {}", e),
                );
            }
        };
        info!(%attempt_id, commitment = %req.identity_commitment, tx = %admission_tx, "Group admission complete");

        // GroupAdmitted -> Recorded. Both on-chain effects are final by now.
        let address = req.address.to_string();
        match bounded("ledger record", t.ledger, self.ledger.record(&req.email, &address)).await {
            Ok(LedgerWrite::Recorded) => {
                info!(%attempt_id, email = %req.email, address = %address, "Registration recorded");
                Terminal::new(
                    RegistrationState::Recorded,
                    RegistrationOutcome::Recorded {
                        credential_tx,
                        admission_tx,
                    },
                    "",
                )
            }
            Ok(LedgerWrite::AlreadyRegistered) => Terminal::new(
                RegistrationState::GroupAdmitted,
                RegistrationOutcome::LedgerWriteFailed {
                    credential_tx,
                    admission_tx,
                    already_registered: true,
                },
                "email already has a ledger entry",
            ),
            Err(e) => Terminal::new(
                RegistrationState::GroupAdmitted,
                RegistrationOutcome::LedgerWriteFailed {
                    credential_tx,
                    admission_tx,
                    already_registered: false,
                },
                e.to_string(),
            ),
        }
    }

    async fn record_incident(&self, report: &RegistrationReport, detail: &str) {
        let credential_tx = report.outcome.credential_tx().map(str::to_string);
        let admission_tx = report.outcome.admission_tx().map(str::to_string);

        error!(
            attempt_id = %report.attempt_id,
            outcome = report.outcome.label(),
            reached = %report.reached,
            email = %report.email,
            address = %report.address,
            credential_tx = credential_tx.as_deref().unwrap_or("-"),
            admission_tx = admission_tx.as_deref().unwrap_or("-"),
            detail,
            "Registration stopped after an irreversible step; manual reconciliation required"
        );

        let Some(journal) = &self.journal else {
            return;
        };

        let incident = IncidentRecord {
            attempt_id: report.attempt_id,
            outcome: report.outcome.label().to_string(),
            email: report.email.clone(),
            address: report.address.clone(),
            credential_tx,
            admission_tx,
            detail: detail.to_string(),
        };

        if let Err(e) = journal.append(incident).await {
            error!(attempt_id = %report.attempt_id, error = %e, "Failed to journal reconciliation incident");
        }
    }
}
