use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RpcError {
    #[error("No RPC endpoints configured")]
    NoEndpoints,

    #[error("{endpoint} unreachable: {message}")]
    Transport { endpoint: String, message: String },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),

    #[error("Transaction failed on-chain: {0}")]
    TransactionFailed(String),
}

impl RpcError {
    /// Worth trying the next endpoint
    pub fn is_transport(&self) -> bool {
        matches!(self, RpcError::Transport { .. })
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonRpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JsonRpcResponse {
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<JsonRpcErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JsonRpcErrorBody {
    pub code: i64,
    pub message: String,
}

impl JsonRpcResponse {
    pub fn into_result(self) -> Result<serde_json::Value, RpcError> {
        if let Some(error) = self.error {
            return Err(RpcError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        self.result
            .ok_or_else(|| RpcError::InvalidResponse("missing result".to_string()))
    }
}

/// Confirmation state of one signature, as read from getSignatureStatuses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureState {
    Pending,
    Confirmed,
    Failed(String),
}

pub(crate) fn parse_signature_state(result: &serde_json::Value) -> SignatureState {
    let status = match result
        .get("value")
        .and_then(|v| v.as_array())
        .and_then(|values| values.first())
    {
        Some(status) if !status.is_null() => status,
        _ => return SignatureState::Pending,
    };

    if let Some(err) = status.get("err") {
        if !err.is_null() {
            return SignatureState::Failed(serde_json::to_string(err).unwrap_or_default());
        }
    }

    match status.get("confirmationStatus").and_then(|v| v.as_str()) {
        Some("confirmed") | Some("finalized") => SignatureState::Confirmed,
        _ => SignatureState::Pending,
    }
}

/// Sum raw token amounts across every account returned by getTokenAccountsByOwner
pub(crate) fn sum_token_account_amounts(result: &serde_json::Value) -> Result<u64, RpcError> {
    let accounts = result
        .get("value")
        .and_then(|v| v.as_array())
        .ok_or_else(|| RpcError::InvalidResponse("missing token account list".to_string()))?;

    let mut total: u64 = 0;
    for account in accounts {
        let amount = account
            .pointer("/account/data/parsed/info/tokenAmount/amount")
            .and_then(|v| v.as_str())
            .ok_or_else(|| RpcError::InvalidResponse("token account without amount".to_string()))?
            .parse::<u64>()
            .map_err(|e| RpcError::InvalidResponse(format!("bad token amount: {}", e)))?;
        total = total.saturating_add(amount);
    }
    Ok(total)
}
