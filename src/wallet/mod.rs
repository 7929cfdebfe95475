//! Wallet adapter
//!
//! A `WalletProvider` is anything that can sign Solana transactions for the
//! user. On connect the adapter negotiates how a batch will be signed:
//! providers that can sign and broadcast a whole batch in one prompt get
//! `BatchSignAndSend`; everyone else signs all transactions up front and
//! the orchestrator submits them through RPC (`SignAllThenSubmit`).

pub mod keypair;

pub use keypair::KeypairWallet;

use crate::logger::{self, LogTag};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WalletError {
    #[error("Wallet is not connected")]
    NotConnected,

    #[error("User rejected the request: {0}")]
    Rejected(String),

    #[error("Wallet does not support {0}")]
    Unsupported(&'static str),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Optional operations a provider exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WalletCapabilities {
    pub sign_and_send_all: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SigningStrategy {
    /// One prompt signs and broadcasts the whole batch
    BatchSignAndSend,
    /// Sign every transaction, then submit and confirm one by one
    SignAllThenSubmit,
}

impl SigningStrategy {
    pub fn negotiate(capabilities: WalletCapabilities) -> Self {
        if capabilities.sign_and_send_all {
            SigningStrategy::BatchSignAndSend
        } else {
            SigningStrategy::SignAllThenSubmit
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SigningStrategy::BatchSignAndSend => "batch sign-and-send",
            SigningStrategy::SignAllThenSubmit => "sign all, then submit",
        }
    }
}

/// Signing backend. Transactions travel as base64-encoded bincode.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Connect and return the wallet's public key (base58)
    async fn connect(&self) -> Result<String, WalletError>;

    fn capabilities(&self) -> WalletCapabilities {
        WalletCapabilities::default()
    }

    async fn sign_transaction(&self, transaction: &str) -> Result<String, WalletError>;

    /// Sign a batch; the output order matches the input order
    async fn sign_all_transactions(
        &self,
        transactions: &[String],
    ) -> Result<Vec<String>, WalletError> {
        let mut signed = Vec::with_capacity(transactions.len());
        for transaction in transactions {
            signed.push(self.sign_transaction(transaction).await?);
        }
        Ok(signed)
    }

    /// Sign and broadcast a batch, returning one signature per transaction
    /// the wallet accepted. Fewer signatures than transactions is allowed.
    async fn sign_and_send_all_transactions(
        &self,
        _transactions: &[String],
    ) -> Result<Vec<String>, WalletError> {
        Err(WalletError::Unsupported("signAndSendAllTransactions"))
    }
}

/// A provider after a successful connect
pub struct ConnectedWallet {
    provider: Arc<dyn WalletProvider>,
    public_key: String,
    strategy: SigningStrategy,
}

impl std::fmt::Debug for ConnectedWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectedWallet")
            .field("provider", &self.provider.name())
            .field("public_key", &self.public_key)
            .field("strategy", &self.strategy)
            .finish()
    }
}

impl ConnectedWallet {
    pub async fn connect(provider: Arc<dyn WalletProvider>) -> Result<Self, WalletError> {
        let public_key = provider.connect().await?;
        if public_key.is_empty() {
            return Err(WalletError::NotConnected);
        }
        let strategy = SigningStrategy::negotiate(provider.capabilities());

        logger::info(
            LogTag::Wallet,
            &format!(
                "Connected {} wallet {} ({})",
                provider.name(),
                public_key,
                strategy.as_str()
            ),
        );

        Ok(Self {
            provider,
            public_key,
            strategy,
        })
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn strategy(&self) -> SigningStrategy {
        self.strategy
    }

    pub async fn sign_all(&self, transactions: &[String]) -> Result<Vec<String>, WalletError> {
        self.provider.sign_all_transactions(transactions).await
    }

    pub async fn sign_and_send_all(
        &self,
        transactions: &[String],
    ) -> Result<Vec<String>, WalletError> {
        self.provider
            .sign_and_send_all_transactions(transactions)
            .await
    }
}
