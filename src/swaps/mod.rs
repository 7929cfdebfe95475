//! Swap pipeline
//!
//! - `router`: the aggregator trait every quote and build goes through
//! - `jupiter`: Jupiter implementation of that trait
//! - `resolver`: collapses a quote answer into route / no route / error
//! - `orchestrator`: runs one batch cycle across the whole cart

pub mod jupiter;
pub mod orchestrator;
pub mod resolver;
pub mod router;
pub mod types;

pub use jupiter::JupiterAggregator;
pub use orchestrator::{BatchRequest, BatchSwapOrchestrator, OrchestratorSettings};
pub use resolver::{QuoteResolver, Resolution};
pub use router::{BuildOptions, SwapAggregator};
pub use types::{
    AggregatorError, BatchReport, CycleError, CycleState, OutcomeBreakdown, OutcomeCategory,
    QuoteRequest, QuoteResponse, Route, RouteCandidate, SwapOutcome, SwapStatus,
};
