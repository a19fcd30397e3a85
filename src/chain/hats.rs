//! Hat credential issuance

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::abi;
use super::rpc::{JsonRpcClient, TransactionRequest};
use super::types::{Address, ChainOutcome, Uint256};
use crate::error::Result;

/// Mints a role credential (hat) to an address.
///
/// Minting is two calls so the transaction hash survives a confirmation that
/// fails or never arrives: `submit_mint` returns the hash as soon as the node
/// accepts the transaction, `confirm` waits for its receipt.
#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    async fn submit_mint(&self, address: &Address, role_id: &Uint256) -> Result<String>;

    /// `Err` is a transport failure; a mined-but-reverted mint is
    /// `Ok(ChainOutcome { succeeded: false, .. })`.
    async fn confirm(&self, tx_hash: &str) -> Result<ChainOutcome>;

    async fn mint(&self, address: &Address, role_id: &Uint256) -> Result<ChainOutcome> {
        let tx_hash = self.submit_mint(address, role_id).await?;
        self.confirm(&tx_hash).await
    }
}

pub struct HatsCredentialIssuer {
    rpc: Arc<JsonRpcClient>,
    hats_contract: Address,
    relayer: Address,
}

impl HatsCredentialIssuer {
    pub fn new(rpc: Arc<JsonRpcClient>, hats_contract: Address, relayer: Address) -> Self {
        Self {
            rpc,
            hats_contract,
            relayer,
        }
    }
}

#[async_trait]
impl CredentialIssuer for HatsCredentialIssuer {
    async fn submit_mint(&self, address: &Address, role_id: &Uint256) -> Result<String> {
        let tx = TransactionRequest {
            from: self.relayer.to_string(),
            to: self.hats_contract.to_string(),
            data: abi::to_hex_data(&abi::encode_mint_hat(role_id, address)),
        };

        let tx_hash = self.rpc.send_transaction(&tx).await?;
        info!(tx = %tx_hash, wearer = %address, hat = %role_id, "Submitted hat mint");
        Ok(tx_hash)
    }

    async fn confirm(&self, tx_hash: &str) -> Result<ChainOutcome> {
        self.rpc.confirm(tx_hash).await
    }
}
