use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::chain::types::{Address, Uint256};
use crate::error::{OnboardingError, Result};

const DEFAULT_CONFIG_PATH: &str = "config/onboarding";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database_url: String,
    pub otp: OtpConfig,
    pub chain: ChainConfig,
    pub mailer: MailerConfig,
    pub timeouts: TimeoutConfig,
    pub journal: JournalConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpConfig {
    pub ttl_secs: u64,
    pub code_length: usize,
    /// Institutional domain, e.g. `org.example`. Subdomains are accepted.
    pub allowed_domain_suffix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub rpc_url: String,
    /// Node-managed account that signs `eth_sendTransaction` calls.
    pub relayer_address: String,
    pub hats_contract: String,
    /// Hat minted to every registrant, decimal or 0x-prefixed hex.
    pub hat_id: String,
    pub gatekeeper_contract: String,
    pub admission_function: String,
    pub receipt_poll_interval_ms: u64,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailerConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_token: Option<String>,
    pub sender: String,
    pub subject: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    pub otp_store_secs: u64,
    pub ledger_secs: u64,
    pub mail_secs: u64,
    pub credential_secs: u64,
    pub admission_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalConfig {
    pub enabled: bool,
    pub path: String,
}

impl AppConfig {
    /// Load defaults, then `config/onboarding.toml` (or `ONBOARDING_CONFIG`),
    /// then `ONBOARDING__SECTION__KEY` environment overrides.
    pub fn load() -> Result<Self> {
        let path = env::var("ONBOARDING_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let config = Self::load_from(&path, true)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a specific file, optionally layering environment overrides.
    pub fn load_from(path: &str, with_env: bool) -> Result<Self> {
        let mut builder = Self::defaults()?.add_source(File::with_name(path).required(false));
        if with_env {
            builder = builder.add_source(Environment::with_prefix("ONBOARDING").separator("__"));
        }

        let config: AppConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        let builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000_i64)?
            .set_default("database_url", "sqlite://onboarding.db")?
            .set_default("otp.ttl_secs", 600_i64)?
            .set_default("otp.code_length", 6_i64)?
            .set_default("otp.allowed_domain_suffix", "org.example")?
            .set_default("chain.rpc_url", "http://127.0.0.1:8545")?
            .set_default(
                "chain.relayer_address",
                "0x0000000000000000000000000000000000000000",
            )?
            .set_default(
                "chain.hats_contract",
                "0x0000000000000000000000000000000000000000",
            )?
            .set_default("chain.hat_id", "0")?
            .set_default(
                "chain.gatekeeper_contract",
                "0x0000000000000000000000000000000000000000",
            )?
            .set_default("chain.admission_function", "joinGroup(uint256,bytes)")?
            .set_default("chain.receipt_poll_interval_ms", 1000_i64)?
            .set_default("chain.request_timeout_secs", 15_i64)?
            .set_default("mailer.sender", "no-reply@org.example")?
            .set_default("mailer.subject", "Your registration code")?
            .set_default("timeouts.otp_store_secs", 5_i64)?
            .set_default("timeouts.ledger_secs", 5_i64)?
            .set_default("timeouts.mail_secs", 10_i64)?
            .set_default("timeouts.credential_secs", 60_i64)?
            .set_default("timeouts.admission_secs", 60_i64)?
            .set_default("journal.enabled", true)?
            .set_default("journal.path", "data/reconciliation.jsonl")?;
        Ok(builder)
    }

    /// Reject configurations that would make the service misbehave at runtime.
    pub fn validate(&self) -> Result<()> {
        if self.otp.ttl_secs == 0 {
            return Err(OnboardingError::ConfigError(
                "otp.ttl_secs must be greater than zero".to_string(),
            ));
        }

        if !(4..=10).contains(&self.otp.code_length) {
            return Err(OnboardingError::ConfigError(format!(
                "otp.code_length must be between 4 and 10, got {}",
                self.otp.code_length
            )));
        }

        if self.otp.allowed_domain_suffix.trim().is_empty() {
            return Err(OnboardingError::ConfigError(
                "otp.allowed_domain_suffix must not be empty".to_string(),
            ));
        }

        let t = &self.timeouts;
        if [t.otp_store_secs, t.ledger_secs, t.mail_secs, t.credential_secs, t.admission_secs]
            .contains(&0)
        {
            return Err(OnboardingError::ConfigError(
                "all timeouts must be greater than zero".to_string(),
            ));
        }

        for (name, value) in [
            ("chain.relayer_address", &self.chain.relayer_address),
            ("chain.hats_contract", &self.chain.hats_contract),
            ("chain.gatekeeper_contract", &self.chain.gatekeeper_contract),
        ] {
            value.parse::<Address>().map_err(|e| {
                OnboardingError::ConfigError(format!("{} is not a valid address: {}", name, e))
            })?;
        }

        self.chain.hat_id.parse::<Uint256>().map_err(|e| {
            OnboardingError::ConfigError(format!("chain.hat_id is not a valid uint256: {}", e))
        })?;

        Ok(())
    }

    pub fn otp_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.otp.ttl_secs as i64)
    }
}

impl TimeoutConfig {
    pub fn otp_store(&self) -> Duration {
        Duration::from_secs(self.otp_store_secs)
    }

    pub fn ledger(&self) -> Duration {
        Duration::from_secs(self.ledger_secs)
    }

    pub fn mail(&self) -> Duration {
        Duration::from_secs(self.mail_secs)
    }

    pub fn credential(&self) -> Duration {
        Duration::from_secs(self.credential_secs)
    }

    pub fn admission(&self) -> Duration {
        Duration::from_secs(self.admission_secs)
    }
}
