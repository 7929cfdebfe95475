//! Solana RPC access
//!
//! `ChainRpc` is the seam the orchestrator submits through; `SolanaRpcClient`
//! is the JSON-RPC implementation.

pub mod balance;
pub mod solana;
pub mod types;

pub use balance::fetch_input_balance;
pub use solana::SolanaRpcClient;
pub use types::{RpcError, SignatureState};

use async_trait::async_trait;

#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Native balance in lamports
    async fn get_balance(&self, address: &str) -> Result<u64, RpcError>;

    /// Total balance of `mint` held by `owner`, smallest units
    async fn get_token_account_balance(&self, owner: &str, mint: &str) -> Result<u64, RpcError>;

    /// Broadcast a signed base64 transaction and return its signature
    async fn send_raw_transaction(&self, signed_transaction: &str) -> Result<String, RpcError>;

    /// Poll until confirmed. `Ok(false)` means the timeout elapsed first.
    async fn confirm_transaction(&self, signature: &str) -> Result<bool, RpcError>;
}
