/// Swap aggregator interface
///
/// The resolver and orchestrator only talk to this trait; `JupiterAggregator`
/// is the production implementation and tests plug in scripted ones.
use super::types::{AggregatorError, QuoteRequest, QuoteResponse, Route};
use crate::config::SwapsConfig;
use async_trait::async_trait;

/// Flags forwarded to the transaction build call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Wrap native SOL into WSOL (and unwrap after) inside the transaction
    pub wrap_native_currency: bool,
    pub use_shared_accounts: bool,
}

impl BuildOptions {
    pub fn from_config(config: &SwapsConfig) -> Self {
        Self {
            wrap_native_currency: config.wrap_and_unwrap_sol,
            use_shared_accounts: config.use_shared_accounts,
        }
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self::from_config(&SwapsConfig::default())
    }
}

#[async_trait]
pub trait SwapAggregator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Ask for candidate routes; an empty response is a valid answer
    async fn get_quote(&self, request: &QuoteRequest) -> Result<QuoteResponse, AggregatorError>;

    /// Build an unsigned, base64-encoded transaction for a route
    async fn build_transaction(
        &self,
        route: &Route,
        user_public_key: &str,
        options: BuildOptions,
    ) -> Result<String, AggregatorError>;
}
