/// JSON-RPC client with ordered endpoint fallback
///
/// Endpoints are tried in configuration order. Only transport failures
/// (connection errors, timeouts, non-2xx HTTP) move on to the next endpoint;
/// a JSON-RPC error from a reachable node is returned as-is.
use super::types::{
    parse_signature_state, sum_token_account_amounts, JsonRpcRequest, JsonRpcResponse, RpcError,
    SignatureState,
};
use super::ChainRpc;
use crate::config::RpcConfig;
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

pub struct SolanaRpcClient {
    client: Client,
    endpoints: Vec<String>,
    request_timeout: Duration,
    confirm_timeout: Duration,
    poll_interval: Duration,
    next_id: AtomicU64,
}

impl SolanaRpcClient {
    pub fn new(config: &RpcConfig) -> Self {
        Self {
            client: Client::new(),
            endpoints: config
                .urls
                .iter()
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty())
                .collect(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            confirm_timeout: Duration::from_secs(config.confirm_timeout_secs),
            poll_interval: Duration::from_millis(config.confirm_poll_interval_ms.max(50)),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Execute one JSON-RPC call, falling back across endpoints
    pub async fn execute_raw(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, RpcError> {
        if self.endpoints.is_empty() {
            return Err(RpcError::NoEndpoints);
        }

        let mut last_error = RpcError::NoEndpoints;
        for endpoint in &self.endpoints {
            match self.call_endpoint(endpoint, method, &params).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_transport() => {
                    logger::warning(
                        LogTag::Rpc,
                        &format!("{} failed on {}: {}", method, endpoint, e),
                    );
                    last_error = e;
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error)
    }

    async fn call_endpoint(
        &self,
        endpoint: &str,
        method: &str,
        params: &serde_json::Value,
    ) -> Result<serde_json::Value, RpcError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let transport = |message: String| RpcError::Transport {
            endpoint: endpoint.to_string(),
            message,
        };

        let response = self
            .client
            .post(endpoint)
            .json(&request)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(transport(format!("HTTP {}", status)));
        }

        let body: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| RpcError::InvalidResponse(e.to_string()))?;

        body.into_result()
    }
}

#[async_trait]
impl ChainRpc for SolanaRpcClient {
    async fn get_balance(&self, address: &str) -> Result<u64, RpcError> {
        let result = self
            .execute_raw("getBalance", json!([address, { "commitment": "confirmed" }]))
            .await?;
        result
            .get("value")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| RpcError::InvalidResponse("getBalance without value".to_string()))
    }

    async fn get_token_account_balance(&self, owner: &str, mint: &str) -> Result<u64, RpcError> {
        let result = self
            .execute_raw(
                "getTokenAccountsByOwner",
                json!([
                    owner,
                    { "mint": mint },
                    { "encoding": "jsonParsed", "commitment": "confirmed" }
                ]),
            )
            .await?;
        sum_token_account_amounts(&result)
    }

    async fn send_raw_transaction(&self, signed_transaction: &str) -> Result<String, RpcError> {
        let result = self
            .execute_raw(
                "sendTransaction",
                json!([
                    signed_transaction,
                    {
                        "encoding": "base64",
                        "skipPreflight": false,
                        "preflightCommitment": "confirmed",
                        "maxRetries": 3
                    }
                ]),
            )
            .await?;

        let signature = result
            .as_str()
            .ok_or_else(|| RpcError::InvalidResponse("sendTransaction did not return a signature".to_string()))?
            .to_string();

        logger::debug(LogTag::Rpc, &format!("Transaction sent: {}", signature));
        Ok(signature)
    }

    async fn confirm_transaction(&self, signature: &str) -> Result<bool, RpcError> {
        let start = Instant::now();

        loop {
            if start.elapsed() >= self.confirm_timeout {
                logger::warning(
                    LogTag::Rpc,
                    &format!(
                        "Transaction {} not confirmed after {}s",
                        signature,
                        self.confirm_timeout.as_secs()
                    ),
                );
                return Ok(false);
            }

            let params = json!([[signature], { "searchTransactionHistory": false }]);
            match self.execute_raw("getSignatureStatuses", params).await {
                Ok(result) => match parse_signature_state(&result) {
                    SignatureState::Confirmed => {
                        logger::debug(
                            LogTag::Rpc,
                            &format!(
                                "Transaction {} confirmed in {}ms",
                                signature,
                                start.elapsed().as_millis()
                            ),
                        );
                        return Ok(true);
                    }
                    SignatureState::Failed(err) => {
                        return Err(RpcError::TransactionFailed(err));
                    }
                    SignatureState::Pending => {}
                },
                Err(e) => {
                    // transient, keep polling
                    logger::verbose(
                        LogTag::Rpc,
                        &format!("Status poll for {} failed: {}", signature, e),
                    );
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
