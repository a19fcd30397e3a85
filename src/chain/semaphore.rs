//! Semaphore group admission through a hat-gated gatekeeper contract.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use super::abi;
use super::rpc::{JsonRpcClient, TransactionRequest};
use super::types::{Address, ChainOutcome, PreparedCall, Uint256};
use crate::error::Result;

/// Adds an identity commitment to the gated group.
///
/// Admission is a read-only simulation that yields the exact call to send,
/// then the write, itself split into `submit` (returns the transaction hash)
/// and `confirm` (waits for the receipt).
#[async_trait]
pub trait GroupAdmissionClient: Send + Sync {
    async fn simulate(&self, identity_commitment: &Uint256, data: &[u8]) -> Result<PreparedCall>;

    async fn submit(&self, call: PreparedCall) -> Result<String>;

    async fn confirm(&self, tx_hash: &str) -> Result<ChainOutcome>;

    async fn write(&self, call: PreparedCall) -> Result<ChainOutcome> {
        let tx_hash = self.submit(call).await?;
        self.confirm(&tx_hash).await
    }

    async fn admit(&self, identity_commitment: &Uint256, data: &[u8]) -> Result<ChainOutcome> {
        let call = self.simulate(identity_commitment, data).await?;
        self.write(call).await
    }
}

pub struct SemaphoreGatekeeperClient {
    rpc: Arc<JsonRpcClient>,
    gatekeeper: Address,
    relayer: Address,
    function_signature: String,
}

impl SemaphoreGatekeeperClient {
    pub fn new(
        rpc: Arc<JsonRpcClient>,
        gatekeeper: Address,
        relayer: Address,
        function_signature: String,
    ) -> Self {
        Self {
            rpc,
            gatekeeper,
            relayer,
            function_signature,
        }
    }
}

#[async_trait]
impl GroupAdmissionClient for SemaphoreGatekeeperClient {
    async fn simulate(&self, identity_commitment: &Uint256, data: &[u8]) -> Result<PreparedCall> {
        let calldata =
            abi::encode_uint256_and_bytes(&self.function_signature, identity_commitment, data);
        let call = PreparedCall {
            from: self.relayer.to_string(),
            to: self.gatekeeper.to_string(),
            data: abi::to_hex_data(&calldata),
        };

        // A revert comes back as a JSON-RPC error and propagates from here.
        let returned = self.rpc.eth_call(&call.clone().into()).await?;
        debug!(commitment = %identity_commitment, returned = %returned, "Admission simulation passed");

        Ok(call)
    }

    async fn submit(&self, call: PreparedCall) -> Result<String> {
        let tx: TransactionRequest = call.into();
        let tx_hash = self.rpc.send_transaction(&tx).await?;
        info!(tx = %tx_hash, "Submitted group admission");
        Ok(tx_hash)
    }

    async fn confirm(&self, tx_hash: &str) -> Result<ChainOutcome> {
        self.rpc.confirm(tx_hash).await
    }
}
