/// Local keypair wallet
///
/// Signs Jupiter's base64 VersionedTransactions with a keypair loaded from
/// config or a solana-keygen JSON file. It cannot broadcast on its own, so
/// batches always go through `SignAllThenSubmit`.
use super::{WalletError, WalletProvider};
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::VersionedTransaction;
use std::path::Path;

const KEYPAIR_LENGTH: usize = 64;

pub struct KeypairWallet {
    keypair: Keypair,
}

impl KeypairWallet {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    /// Parse a private key in base58 or `[1,2,...]` array form
    pub fn from_private_key(private_key: &str) -> Result<Self, WalletError> {
        let trimmed = private_key.trim();
        if trimmed.is_empty() {
            return Err(WalletError::InvalidKey(
                "no private key configured".to_string(),
            ));
        }

        let keypair = if trimmed.starts_with('[') && trimmed.ends_with(']') {
            load_keypair_from_array_format(trimmed)?
        } else {
            load_keypair_from_base58_format(trimmed)?
        };
        Ok(Self::new(keypair))
    }

    /// Load a solana-keygen JSON file (a 64-byte array)
    pub fn from_file(path: &Path) -> Result<Self, WalletError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            WalletError::InvalidKey(format!("cannot read {}: {}", path.display(), e))
        })?;
        let bytes: Vec<u8> = serde_json::from_str(&contents).map_err(|e| {
            WalletError::InvalidKey(format!("{} is not a keypair file: {}", path.display(), e))
        })?;
        Ok(Self::new(keypair_from_bytes(&bytes)?))
    }

    pub fn pubkey_string(&self) -> String {
        self.keypair.pubkey().to_string()
    }

    fn sign_versioned(&self, transaction: &str) -> Result<String, WalletError> {
        let tx_bytes = BASE64
            .decode(transaction)
            .map_err(|e| WalletError::Signing(format!("transaction is not base64: {}", e)))?;

        let mut transaction: VersionedTransaction = bincode::deserialize(&tx_bytes)
            .map_err(|e| WalletError::Signing(format!("cannot decode transaction: {}", e)))?;

        let pubkey = self.keypair.pubkey();
        let required = transaction.message.header().num_required_signatures as usize;
        let signer_index = transaction
            .message
            .static_account_keys()
            .iter()
            .take(required)
            .position(|key| *key == pubkey)
            .ok_or_else(|| {
                WalletError::Signing(format!("{} is not a required signer", pubkey))
            })?;

        if transaction.signatures.len() < required {
            transaction
                .signatures
                .resize(required, Signature::default());
        }

        let signature = self
            .keypair
            .sign_message(&transaction.message.serialize());
        transaction.signatures[signer_index] = signature;

        let signed = bincode::serialize(&transaction)
            .map_err(|e| WalletError::Signing(format!("cannot encode transaction: {}", e)))?;

        logger::verbose(
            LogTag::Wallet,
            &format!("Signed transaction {}", signature),
        );

        Ok(BASE64.encode(signed))
    }
}

#[async_trait]
impl WalletProvider for KeypairWallet {
    fn name(&self) -> &str {
        "Keypair"
    }

    async fn connect(&self) -> Result<String, WalletError> {
        Ok(self.pubkey_string())
    }

    async fn sign_transaction(&self, transaction: &str) -> Result<String, WalletError> {
        self.sign_versioned(transaction)
    }
}

fn keypair_from_bytes(bytes: &[u8]) -> Result<Keypair, WalletError> {
    if bytes.len() != KEYPAIR_LENGTH {
        return Err(WalletError::InvalidKey(format!(
            "Invalid private key length: expected {} bytes, got {}",
            KEYPAIR_LENGTH,
            bytes.len()
        )));
    }
    Keypair::from_bytes(bytes)
        .map_err(|e| WalletError::InvalidKey(format!("Failed to create keypair: {}", e)))
}

fn load_keypair_from_array_format(private_key: &str) -> Result<Keypair, WalletError> {
    let inner = private_key.trim_start_matches('[').trim_end_matches(']');

    let bytes: Vec<u8> = inner
        .split(',')
        .map(|s| s.trim().parse::<u8>())
        .collect::<Result<_, _>>()
        .map_err(|e| WalletError::InvalidKey(format!("Failed to parse private key array: {}", e)))?;

    keypair_from_bytes(&bytes)
}

fn load_keypair_from_base58_format(private_key: &str) -> Result<Keypair, WalletError> {
    let decoded = bs58::decode(private_key)
        .into_vec()
        .map_err(|e| WalletError::InvalidKey(format!("Failed to decode base58 private key: {}", e)))?;

    keypair_from_bytes(&decoded)
}
