//! Wiring from configuration to live collaborators.

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::api::AppState;
use crate::chain::{
    Address, HatsCredentialIssuer, JsonRpcClient, SemaphoreGatekeeperClient, Uint256,
};
use crate::clock::SystemClock;
use crate::config::AppConfig;
use crate::database::Database;
use crate::error::{OnboardingError, Result};
use crate::ledger::{ReconciliationJournal, SqliteLedger};
use crate::otp::{CodeGenerator, HttpMailer, LogMailer, OtpMailer, OtpService, SqliteOtpStore};
use crate::registration::{RegistrationOrchestrator, StepTimeouts};
use crate::validation::EmailPolicy;

fn parse_address(name: &str, value: &str) -> Result<Address> {
    value
        .parse()
        .map_err(|e| OnboardingError::ConfigError(format!("{}: {}", name, e)))
}

pub fn build_state(config: &AppConfig, database: &Database) -> Result<AppState> {
    let policy = EmailPolicy::new(&config.otp.allowed_domain_suffix);

    let otp_store = Arc::new(SqliteOtpStore::new(
        database.pool().clone(),
        CodeGenerator::new(config.otp.code_length),
        config.otp_ttl(),
        Arc::new(SystemClock),
    ));

    let mailer: Arc<dyn OtpMailer> = match &config.mailer.endpoint {
        Some(endpoint) => Arc::new(HttpMailer::new(
            endpoint.clone(),
            config.mailer.api_token.clone(),
            config.mailer.sender.clone(),
            config.mailer.subject.clone(),
        )),
        None => {
            info!("No mail endpoint configured; OTPs will only be logged");
            Arc::new(LogMailer)
        }
    };

    let otp = OtpService::new(
        policy.clone(),
        otp_store.clone(),
        mailer,
        config.timeouts.otp_store(),
        config.timeouts.mail(),
    );

    let rpc = Arc::new(JsonRpcClient::new(
        config.chain.rpc_url.clone(),
        Duration::from_secs(config.chain.request_timeout_secs),
        Duration::from_millis(config.chain.receipt_poll_interval_ms),
    )?);
    let relayer = parse_address("chain.relayer_address", &config.chain.relayer_address)?;

    let issuer = Arc::new(HatsCredentialIssuer::new(
        rpc.clone(),
        parse_address("chain.hats_contract", &config.chain.hats_contract)?,
        relayer,
    ));
    let admission = Arc::new(SemaphoreGatekeeperClient::new(
        rpc,
        parse_address("chain.gatekeeper_contract", &config.chain.gatekeeper_contract)?,
        relayer,
        config.chain.admission_function.clone(),
    ));

    let hat_id: Uint256 = config
        .chain
        .hat_id
        .parse()
        .map_err(|e| OnboardingError::ConfigError(format!("chain.hat_id: {}", e)))?;

    let mut registration = RegistrationOrchestrator::new(
        policy,
        otp_store,
        issuer,
        admission,
        Arc::new(SqliteLedger::new(database.pool().clone())),
        hat_id,
        StepTimeouts::from(&config.timeouts),
    );

    if config.journal.enabled {
        let journal = ReconciliationJournal::open(&config.journal.path)?;
        registration = registration.with_journal(Arc::new(journal));
    }

    Ok(AppState {
        otp: Arc::new(otp),
        registration: Arc::new(registration),
    })
}
