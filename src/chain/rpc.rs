//! Ethereum JSON-RPC client
//!
//! Thin wrapper over the three node methods the adapters need. Transactions
//! are signed by the node's managed relayer account; this service never holds
//! key material.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use super::types::{ChainOutcome, PreparedCall};
use crate::error::{OnboardingError, Result};

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub from: String,
    pub to: String,
    pub data: String,
}

impl From<PreparedCall> for TransactionRequest {
    fn from(call: PreparedCall) -> Self {
        Self {
            from: call.from,
            to: call.to,
            data: call.data,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl TransactionReceipt {
    /// Post-Byzantium receipts carry `0x1` for success and `0x0` for a revert.
    pub fn succeeded(&self) -> bool {
        self.status.as_deref() == Some("0x1")
    }
}

pub struct JsonRpcClient {
    endpoint: String,
    http_client: Client,
    next_id: AtomicU64,
    poll_interval: Duration,
}

impl JsonRpcClient {
    pub fn new(endpoint: String, request_timeout: Duration, poll_interval: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| OnboardingError::ChainError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint,
            http_client,
            next_id: AtomicU64::new(1),
            poll_interval,
        })
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<Option<T>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, "JSON-RPC request");

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&RpcRequest {
                jsonrpc: "2.0",
                id,
                method,
                params,
            })
            .send()
            .await?
            .error_for_status()?;

        let body: RpcResponse<T> = response.json().await?;
        if let Some(err) = body.error {
            return Err(OnboardingError::ChainError(format!(
                "{} failed ({}): {}",
                method, err.code, err.message
            )));
        }

        Ok(body.result)
    }

    async fn required<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        self.request(method, params).await?.ok_or_else(|| {
            OnboardingError::ChainError(format!("{} returned an empty result", method))
        })
    }

    /// Execute a call against the latest block without submitting it.
    pub async fn eth_call(&self, tx: &TransactionRequest) -> Result<String> {
        self.required("eth_call", json!([tx, "latest"])).await
    }

    /// Submit a transaction for the node to sign; returns the transaction hash.
    pub async fn send_transaction(&self, tx: &TransactionRequest) -> Result<String> {
        self.required("eth_sendTransaction", json!([tx])).await
    }

    pub async fn transaction_receipt(&self, tx_hash: &str) -> Result<Option<TransactionReceipt>> {
        self.request("eth_getTransactionReceipt", json!([tx_hash]))
            .await
    }

    /// Poll until the transaction is mined. Callers bound this with a timeout.
    pub async fn wait_for_receipt(&self, tx_hash: &str) -> Result<TransactionReceipt> {
        loop {
            if let Some(receipt) = self.transaction_receipt(tx_hash).await? {
                return Ok(receipt);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Wait for a submitted transaction to be mined and report its status.
    /// A reverted transaction is `Ok` with `succeeded: false`.
    pub async fn confirm(&self, tx_hash: &str) -> Result<ChainOutcome> {
        let receipt = self.wait_for_receipt(tx_hash).await?;
        if receipt.succeeded() {
            Ok(ChainOutcome::success(receipt.transaction_hash))
        } else {
            warn!(tx = %tx_hash, status = ?receipt.status, "Transaction reverted");
            Ok(ChainOutcome::failure(receipt.transaction_hash))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> JsonRpcClient {
        JsonRpcClient::new(
            server.uri(),
            Duration::from_secs(5),
            Duration::from_millis(10),
        )
        .unwrap()
    }

    #[test]
    fn test_receipt_status() {
        let ok: TransactionReceipt = serde_json::from_value(json!({
            "transactionHash": "0xaa",
            "status": "0x1",
            "blockNumber": "0x10"
        }))
        .unwrap();
        assert!(ok.succeeded());

        let reverted: TransactionReceipt = serde_json::from_value(json!({
            "transactionHash": "0xaa",
            "status": "0x0"
        }))
        .unwrap();
        assert!(!reverted.succeeded());

        let pre_byzantium: TransactionReceipt =
            serde_json::from_value(json!({ "transactionHash": "0xaa" })).unwrap();
        assert!(!pre_byzantium.succeeded());
    }

    #[tokio::test]
    async fn test_rpc_error_surfaces_as_chain_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "eth_call" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": 3, "message": "execution reverted" }
            })))
            .mount(&server)
            .await;

        let tx = TransactionRequest {
            from: "0x01".to_string(),
            to: "0x02".to_string(),
            data: "0x".to_string(),
        };
        let err = client(&server).eth_call(&tx).await.unwrap_err();
        match err {
            OnboardingError::ChainError(msg) => assert!(msg.contains("execution reverted")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wait_for_receipt_returns_mined_receipt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(
                json!({ "method": "eth_getTransactionReceipt" }),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": { "transactionHash": "0xbeef", "status": "0x1" }
            })))
            .mount(&server)
            .await;

        let receipt = client(&server).wait_for_receipt("0xbeef").await.unwrap();
        assert_eq!(receipt.transaction_hash, "0xbeef");
        assert!(receipt.succeeded());
    }

    #[tokio::test]
    async fn test_http_failure_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        assert!(client(&server).transaction_receipt("0x1").await.is_err());
    }

    #[tokio::test]
    async fn test_pending_receipt_parses_as_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(
                json!({ "method": "eth_getTransactionReceipt" }),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": null
            })))
            .mount(&server)
            .await;

        let receipt = client(&server).transaction_receipt("0xpending").await.unwrap();
        assert!(receipt.is_none());
    }

    #[tokio::test]
    async fn test_confirm_reports_revert() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(
                json!({ "method": "eth_getTransactionReceipt" }),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": { "transactionHash": "0xdead", "status": "0x0" }
            })))
            .mount(&server)
            .await;

        let outcome = client(&server).confirm("0xdead").await.unwrap();
        assert_eq!(outcome, ChainOutcome::failure("0xdead"));
    }
}
