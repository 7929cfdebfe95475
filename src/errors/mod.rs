/// Crate-level error type for cartswap
///
/// Per-collaborator errors (`AggregatorError`, `WalletError`, `RpcError`,
/// `CartError`) live next to their modules and end up in swap outcomes;
/// this type covers the ambient failures: config, IO, parsing and HTTP.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CartSwapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for CartSwapError {
    fn from(err: reqwest::Error) -> Self {
        CartSwapError::Http(format!("HTTP request failed: {}", err))
    }
}

impl From<toml::de::Error> for CartSwapError {
    fn from(err: toml::de::Error) -> Self {
        CartSwapError::Config(err.to_string())
    }
}

impl CartSwapError {
    pub fn parse_error(message: impl Into<String>) -> Self {
        CartSwapError::Parse(message.into())
    }
}
