#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hats_onboarding::chain::{
    Address, ChainOutcome, CredentialIssuer, GroupAdmissionClient, PreparedCall, Uint256,
};
use hats_onboarding::clock::ManualClock;
use hats_onboarding::database::models::{OtpRecord, RegistrationLedgerEntry};
use hats_onboarding::database::Database;
use hats_onboarding::error::{OnboardingError, Result};
use hats_onboarding::ledger::{LedgerWrite, RegistrationLedger, SqliteLedger};
use hats_onboarding::otp::{CodeGenerator, MemoryOtpStore, OtpStore};
use hats_onboarding::registration::{RegistrationOrchestrator, RegistrationRequest, StepTimeouts};
use hats_onboarding::validation::EmailPolicy;

pub const DOMAIN: &str = "org.example";
pub const ALICE: &str = "alice@org.example";
pub const ALICE_ADDRESS: &str = "0xABC0000000000000000000000000000000000001";
pub const ALICE_COMMITMENT: &str = "0x123456789";
pub const HAT_ID: u64 = 42;

/// Fixed whole-millisecond start for manual clocks.
pub fn test_epoch() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
}

/// Setup an in-memory SQLite database with migrations applied
pub async fn setup_test_db() -> Database {
    let db = Database::new_in_memory()
        .await
        .expect("Failed to create test database");
    db.run_migrations().await.expect("Failed to run migrations");
    db
}

/// Scripted response for a mocked chain write.
#[derive(Debug, Clone)]
pub enum ChainBehavior {
    Succeed(String),
    /// Mined but reverted.
    Revert(String),
    /// Transport failure at submission.
    Error,
    /// Submission never answers; exercises the step timeout.
    Hang,
    /// Submitted, but the receipt never arrives.
    Unconfirmed(String),
}

impl ChainBehavior {
    async fn submit(&self) -> Result<String> {
        match self {
            ChainBehavior::Succeed(tx)
            | ChainBehavior::Revert(tx)
            | ChainBehavior::Unconfirmed(tx) => Ok(tx.clone()),
            ChainBehavior::Error => Err(OnboardingError::ChainError(
                "connection refused (node at 10.0.0.7:8545)".to_string(),
            )),
            ChainBehavior::Hang => hang().await,
        }
    }

    async fn confirm(&self, tx_hash: &str) -> Result<ChainOutcome> {
        match self {
            ChainBehavior::Succeed(_) => Ok(ChainOutcome::success(tx_hash)),
            ChainBehavior::Revert(_) => Ok(ChainOutcome::failure(tx_hash)),
            ChainBehavior::Unconfirmed(_) => hang().await,
            ChainBehavior::Error | ChainBehavior::Hang => Err(OnboardingError::ChainError(
                "nothing was submitted".to_string(),
            )),
        }
    }
}

async fn hang<T>() -> Result<T> {
    tokio::time::sleep(Duration::from_secs(3600)).await;
    Err(OnboardingError::ChainError("unreachable".to_string()))
}

pub struct MockIssuer {
    behavior: ChainBehavior,
    calls: AtomicUsize,
}

impl MockIssuer {
    pub fn new(behavior: ChainBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of mint submissions.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialIssuer for MockIssuer {
    async fn submit_mint(&self, _address: &Address, _role_id: &Uint256) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.behavior.submit().await
    }

    async fn confirm(&self, tx_hash: &str) -> Result<ChainOutcome> {
        self.behavior.confirm(tx_hash).await
    }
}

pub struct MockAdmission {
    simulate_fails: bool,
    write: ChainBehavior,
    simulate_calls: AtomicUsize,
    write_calls: AtomicUsize,
    last_data: std::sync::Mutex<Option<Vec<u8>>>,
}

impl MockAdmission {
    pub fn new(write: ChainBehavior) -> Self {
        Self {
            simulate_fails: false,
            write,
            simulate_calls: AtomicUsize::new(0),
            write_calls: AtomicUsize::new(0),
            last_data: std::sync::Mutex::new(None),
        }
    }

    pub fn failing_simulation() -> Self {
        Self {
            simulate_fails: true,
            ..Self::new(ChainBehavior::Succeed("0xunused".to_string()))
        }
    }

    pub fn simulate_calls(&self) -> usize {
        self.simulate_calls.load(Ordering::SeqCst)
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    /// Total admission activity of either kind.
    pub fn calls(&self) -> usize {
        self.simulate_calls() + self.write_calls()
    }

    pub fn last_data(&self) -> Option<Vec<u8>> {
        self.last_data.lock().unwrap().clone()
    }
}

#[async_trait]
impl GroupAdmissionClient for MockAdmission {
    async fn simulate(&self, identity_commitment: &Uint256, data: &[u8]) -> Result<PreparedCall> {
        self.simulate_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_data.lock().unwrap() = Some(data.to_vec());
        if self.simulate_fails {
            return Err(OnboardingError::ChainError(
                "execution reverted: not a wearer".to_string(),
            ));
        }
        Ok(PreparedCall {
            from: "0x2000000000000000000000000000000000000002".to_string(),
            to: "0x3000000000000000000000000000000000000003".to_string(),
            data: identity_commitment.to_string(),
        })
    }

    async fn submit(&self, _call: PreparedCall) -> Result<String> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.write.submit().await
    }

    async fn confirm(&self, tx_hash: &str) -> Result<ChainOutcome> {
        self.write.confirm(tx_hash).await
    }
}

/// OTP store that is down or unresponsive.
pub struct UnavailableOtpStore {
    hang: bool,
    verify_calls: AtomicUsize,
}

impl UnavailableOtpStore {
    pub fn failing() -> Self {
        Self {
            hang: false,
            verify_calls: AtomicUsize::new(0),
        }
    }

    pub fn hanging() -> Self {
        Self {
            hang: true,
            verify_calls: AtomicUsize::new(0),
        }
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    async fn outage<T>(&self) -> Result<T> {
        if self.hang {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Err(OnboardingError::DatabaseError(
            "unable to open database file".to_string(),
        ))
    }
}

#[async_trait]
impl OtpStore for UnavailableOtpStore {
    async fn issue(&self, _email: &str) -> Result<String> {
        self.outage().await
    }

    async fn verify(&self, _email: &str, _code: &str) -> Result<bool> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        self.outage().await
    }

    async fn lookup(&self, _email: &str) -> Result<Option<OtpRecord>> {
        self.outage().await
    }
}

/// Wraps the SQLite ledger to count writes or simulate an outage.
pub struct CountingLedger {
    inner: SqliteLedger,
    fail: bool,
    calls: AtomicUsize,
}

impl CountingLedger {
    pub fn new(db: &Database) -> Self {
        Self {
            inner: SqliteLedger::new(db.pool().clone()),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(db: &Database) -> Self {
        Self {
            fail: true,
            ..Self::new(db)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistrationLedger for CountingLedger {
    async fn record(&self, email: &str, address: &str) -> Result<LedgerWrite> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(OnboardingError::DatabaseError("disk I/O error".to_string()));
        }
        self.inner.record(email, address).await
    }

    async fn lookup(&self, email: &str) -> Result<Option<RegistrationLedgerEntry>> {
        self.inner.lookup(email).await
    }

    async fn list(&self, limit: i64) -> Result<Vec<RegistrationLedgerEntry>> {
        self.inner.list(limit).await
    }
}

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub otp_store: Arc<MemoryOtpStore>,
    pub issuer: Arc<MockIssuer>,
    pub admission: Arc<MockAdmission>,
    pub ledger: Arc<CountingLedger>,
    pub orchestrator: RegistrationOrchestrator,
}

pub fn test_timeouts() -> StepTimeouts {
    StepTimeouts {
        otp_store: Duration::from_millis(200),
        credential: Duration::from_millis(200),
        admission: Duration::from_millis(200),
        ledger: Duration::from_secs(1),
    }
}

pub async fn harness_with(issuer: MockIssuer, admission: MockAdmission, failing_ledger: bool) -> Harness {
    let db = setup_test_db().await;
    let clock = Arc::new(ManualClock::new(test_epoch()));
    let otp_store = Arc::new(MemoryOtpStore::new(
        CodeGenerator::new(4),
        chrono::Duration::minutes(10),
        clock.clone(),
    ));
    let issuer = Arc::new(issuer);
    let admission = Arc::new(admission);
    let ledger = Arc::new(if failing_ledger {
        CountingLedger::failing(&db)
    } else {
        CountingLedger::new(&db)
    });

    let orchestrator = orchestrator_with(
        otp_store.clone(),
        issuer.clone(),
        admission.clone(),
        ledger.clone(),
    );

    Harness {
        clock,
        otp_store,
        issuer,
        admission,
        ledger,
        orchestrator,
    }
}

pub fn orchestrator_with(
    otp_store: Arc<dyn OtpStore>,
    issuer: Arc<dyn CredentialIssuer>,
    admission: Arc<dyn GroupAdmissionClient>,
    ledger: Arc<dyn RegistrationLedger>,
) -> RegistrationOrchestrator {
    RegistrationOrchestrator::new(
        EmailPolicy::new(DOMAIN),
        otp_store,
        issuer,
        admission,
        ledger,
        Uint256::from_u64(HAT_ID),
        test_timeouts(),
    )
}

/// All collaborators succeed.
pub async fn happy_harness() -> Harness {
    harness_with(
        MockIssuer::new(ChainBehavior::Succeed("0xmint".to_string())),
        MockAdmission::new(ChainBehavior::Succeed("0xjoin".to_string())),
        false,
    )
    .await
}

pub fn alice_request(otp: &str) -> RegistrationRequest {
    RegistrationRequest {
        email: ALICE.to_string(),
        otp: otp.to_string(),
        address: ALICE_ADDRESS.to_string(),
        identity_commitment: ALICE_COMMITMENT.to_string(),
    }
}
