/// Swap pipeline types: quotes, routes, per-token outcomes and the batch report
use crate::fees::FeeBreakdown;
use crate::tokens::{InputCurrency, TokenIdentity};
use crate::wallet::SigningStrategy;
use serde::Serialize;
use thiserror::Error;

// =============================================================================
// QUOTES AND ROUTES
// =============================================================================

/// One quote request sent to the aggregator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteRequest {
    pub input_mint: String,
    pub output_mint: String,
    /// Input amount in the input token's smallest unit
    pub amount: u64,
    pub slippage_bps: u16,
}

/// A candidate path returned by the aggregator
#[derive(Debug, Clone, PartialEq)]
pub struct RouteCandidate {
    pub out_amount: u64,
    pub price_impact_pct: f64,
    /// Human-readable hops, e.g. "Raydium → Orca"
    pub route_label: String,
    /// Raw aggregator payload, handed back unchanged to the build step
    pub raw: serde_json::Value,
}

/// Every candidate the aggregator offered for one request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteResponse {
    pub candidates: Vec<RouteCandidate>,
}

impl QuoteResponse {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(candidate: RouteCandidate) -> Self {
        Self {
            candidates: vec![candidate],
        }
    }
}

/// A viable route, sufficient to request a transaction build
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub input_mint: String,
    pub output_mint: String,
    pub in_amount: u64,
    pub out_amount: u64,
    pub price_impact_pct: f64,
    pub slippage_bps: u16,
    pub route_label: String,
    pub raw_quote: serde_json::Value,
}

/// Failure talking to the swap aggregator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregatorError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Parse(String),
}

// =============================================================================
// OUTCOMES
// =============================================================================

/// Final status of one token's swap in a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SwapStatus {
    Completed,
    NoRoute,
    QuoteError,
    BuildError,
    SignError,
    SubmitError,
}

/// What the user can do about an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OutcomeCategory {
    /// Swap landed
    Succeeded,
    /// Pick a different token
    NoRouteAvailable,
    /// Retry or check the wallet
    Failed,
}

impl SwapStatus {
    pub fn category(&self) -> OutcomeCategory {
        match self {
            SwapStatus::Completed => OutcomeCategory::Succeeded,
            SwapStatus::NoRoute => OutcomeCategory::NoRouteAvailable,
            SwapStatus::QuoteError
            | SwapStatus::BuildError
            | SwapStatus::SignError
            | SwapStatus::SubmitError => OutcomeCategory::Failed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SwapStatus::Completed => "Completed",
            SwapStatus::NoRoute => "No route",
            SwapStatus::QuoteError => "Quote error",
            SwapStatus::BuildError => "Build error",
            SwapStatus::SignError => "Sign error",
            SwapStatus::SubmitError => "Submit error",
        }
    }
}

impl std::fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of one token's swap attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwapOutcome {
    pub token: TokenIdentity,
    pub status: SwapStatus,
    pub detail: String,
    /// Input spent on this leg, smallest units
    pub input_amount: u64,
    /// Quoted output, when a route was found
    pub expected_output: Option<u64>,
    /// Transaction signature, when the wallet or RPC returned one
    pub signature: Option<String>,
}

impl SwapOutcome {
    pub fn failed(
        token: TokenIdentity,
        status: SwapStatus,
        detail: impl Into<String>,
        input_amount: u64,
    ) -> Self {
        Self {
            token,
            status,
            detail: detail.into(),
            input_amount,
            expected_output: None,
            signature: None,
        }
    }

    pub fn completed(
        token: TokenIdentity,
        input_amount: u64,
        expected_output: u64,
        signature: impl Into<String>,
    ) -> Self {
        let signature = signature.into();
        Self {
            token,
            status: SwapStatus::Completed,
            detail: format!("Confirmed: {}", signature),
            input_amount,
            expected_output: Some(expected_output),
            signature: Some(signature),
        }
    }

    pub fn with_expected_output(mut self, expected_output: u64) -> Self {
        self.expected_output = Some(expected_output);
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == SwapStatus::Completed
    }
}

/// Counts per user-facing category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeBreakdown {
    pub succeeded: usize,
    pub no_route: usize,
    pub failed: usize,
}

/// Everything a caller needs to render the result of one cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub input_currency: InputCurrency,
    pub gross_amount: f64,
    pub fee: FeeBreakdown,
    /// One entry per attempted token, in cart order
    pub outcomes: Vec<SwapOutcome>,
    /// Tokens equal to the input currency, never attempted
    pub skipped: Vec<TokenIdentity>,
    /// Signing path used, if any transaction reached the wallet
    pub strategy: Option<SigningStrategy>,
}

impl BatchReport {
    pub fn completed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_completed()).count()
    }

    pub fn is_full_success(&self) -> bool {
        !self.outcomes.is_empty() && self.completed_count() == self.outcomes.len()
    }

    pub fn outcome_for(&self, mint: &str) -> Option<&SwapOutcome> {
        self.outcomes.iter().find(|o| o.token.mint == mint)
    }

    pub fn breakdown(&self) -> OutcomeBreakdown {
        let mut breakdown = OutcomeBreakdown::default();
        for outcome in &self.outcomes {
            match outcome.status.category() {
                OutcomeCategory::Succeeded => breakdown.succeeded += 1,
                OutcomeCategory::NoRouteAvailable => breakdown.no_route += 1,
                OutcomeCategory::Failed => breakdown.failed += 1,
            }
        }
        breakdown
    }
}

// =============================================================================
// CYCLE STATE
// =============================================================================

/// Where the orchestrator is in its current (or last) cycle
///
/// `NoValidInput` covers both a rejected amount and a rejected allocation
/// snapshot; `NothingToSwap` is a valid allocation with no eligible leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CycleState {
    Idle,
    BuildingQuotes,
    AwaitingSignature,
    Submitting,
    Completed,
    AllFailed,
    NoValidInput,
    NothingToSwap,
}

/// A cycle that did not produce at least one completed swap
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CycleError {
    #[error("Invalid input amount: {reason}")]
    NoValidInput { reason: String },

    #[error("Invalid allocation: {reason}")]
    InvalidAllocation { reason: String },

    #[error("Nothing to swap: no token in the cart has a positive weight")]
    EmptyAllocation,

    #[error("A batch swap is already in progress")]
    Busy,

    #[error("All {} swaps failed", .0.outcomes.len())]
    AllFailed(BatchReport),
}
