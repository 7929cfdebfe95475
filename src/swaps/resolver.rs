/// Quote resolution: turns an aggregator answer into a single outcome
///
/// Exactly one of `Route`, `NoRouteFound` or `QuoteError` comes back for
/// every request. The resolver never retries.
use super::router::SwapAggregator;
use super::types::{AggregatorError, QuoteRequest, QuoteResponse, Route, RouteCandidate};
use crate::logger::{self, LogTag};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Route(Route),
    NoRouteFound { reason: String },
    QuoteError { message: String },
}

pub struct QuoteResolver {
    aggregator: Arc<dyn SwapAggregator>,
    slippage_bps: u16,
}

impl QuoteResolver {
    pub fn new(aggregator: Arc<dyn SwapAggregator>, slippage_bps: u16) -> Self {
        Self {
            aggregator,
            slippage_bps,
        }
    }

    pub fn slippage_bps(&self) -> u16 {
        self.slippage_bps
    }

    pub async fn resolve(&self, input_mint: &str, output_mint: &str, amount: u64) -> Resolution {
        let request = QuoteRequest {
            input_mint: input_mint.to_string(),
            output_mint: output_mint.to_string(),
            amount,
            slippage_bps: self.slippage_bps,
        };

        let result = self.aggregator.get_quote(&request).await;
        let resolution = classify(&request, result);

        match &resolution {
            Resolution::Route(route) => logger::debug(
                LogTag::Quote,
                &format!(
                    "Route for {}: {} out via {}",
                    output_mint, route.out_amount, route.route_label
                ),
            ),
            Resolution::NoRouteFound { reason } => logger::info(
                LogTag::Quote,
                &format!("No route for {}: {}", output_mint, reason),
            ),
            Resolution::QuoteError { message } => logger::warning(
                LogTag::Quote,
                &format!(
                    "{} quote for {} failed: {}",
                    self.aggregator.name(),
                    output_mint,
                    message
                ),
            ),
        }

        resolution
    }
}

/// Pick the best candidate, or explain why there is none
///
/// Candidates with a zero output are ignored; ties keep the first one offered.
pub fn classify(
    request: &QuoteRequest,
    result: Result<QuoteResponse, AggregatorError>,
) -> Resolution {
    let response = match result {
        Ok(response) => response,
        Err(e) => {
            return Resolution::QuoteError {
                message: e.to_string(),
            }
        }
    };

    if response.candidates.is_empty() {
        return Resolution::NoRouteFound {
            reason: "aggregator returned no routes".to_string(),
        };
    }

    let best = response
        .candidates
        .into_iter()
        .filter(|candidate| candidate.out_amount > 0)
        .fold(None, |best: Option<RouteCandidate>, candidate| {
            match best {
                Some(current) if current.out_amount >= candidate.out_amount => Some(current),
                _ => Some(candidate),
            }
        });

    match best {
        Some(candidate) => Resolution::Route(Route {
            input_mint: request.input_mint.clone(),
            output_mint: request.output_mint.clone(),
            in_amount: request.amount,
            out_amount: candidate.out_amount,
            price_impact_pct: candidate.price_impact_pct,
            slippage_bps: request.slippage_bps,
            route_label: candidate.route_label,
            raw_quote: candidate.raw,
        }),
        None => Resolution::NoRouteFound {
            reason: "every route quotes a zero output".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swaps::router::BuildOptions;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    fn request() -> QuoteRequest {
        QuoteRequest {
            input_mint: "In".to_string(),
            output_mint: "Out".to_string(),
            amount: 1_000,
            slippage_bps: 50,
        }
    }

    fn candidate(out_amount: u64, label: &str) -> RouteCandidate {
        RouteCandidate {
            out_amount,
            price_impact_pct: 0.1,
            route_label: label.to_string(),
            raw: serde_json::json!({ "label": label }),
        }
    }

    #[test]
    fn test_aggregator_error_is_quote_error() {
        let resolution = classify(
            &request(),
            Err(AggregatorError::Transport("connection reset".to_string())),
        );
        match resolution {
            Resolution::QuoteError { message } => assert!(message.contains("connection reset")),
            other => panic!("expected QuoteError, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_response_is_no_route() {
        let resolution = classify(&request(), Ok(QuoteResponse::empty()));
        assert!(matches!(resolution, Resolution::NoRouteFound { .. }));
    }

    #[test]
    fn test_zero_output_candidates_are_no_route() {
        let response = QuoteResponse {
            candidates: vec![candidate(0, "A"), candidate(0, "B")],
        };
        assert!(matches!(
            classify(&request(), Ok(response)),
            Resolution::NoRouteFound { .. }
        ));
    }

    #[test]
    fn test_best_candidate_wins() {
        let response = QuoteResponse {
            candidates: vec![candidate(10, "A"), candidate(30, "B"), candidate(30, "C")],
        };
        match classify(&request(), Ok(response)) {
            Resolution::Route(route) => {
                assert_eq!(route.out_amount, 30);
                assert_eq!(route.route_label, "B");
                assert_eq!(route.in_amount, 1_000);
                assert_eq!(route.slippage_bps, 50);
                assert_eq!(route.raw_quote["label"], "B");
            }
            other => panic!("expected Route, got {:?}", other),
        }
    }

    struct RecordingAggregator {
        seen: Mutex<Vec<QuoteRequest>>,
    }

    #[async_trait]
    impl SwapAggregator for RecordingAggregator {
        fn name(&self) -> &'static str {
            "Recording"
        }

        async fn get_quote(
            &self,
            request: &QuoteRequest,
        ) -> Result<QuoteResponse, AggregatorError> {
            self.seen.lock().push(request.clone());
            Ok(QuoteResponse::single(candidate(42, "Direct")))
        }

        async fn build_transaction(
            &self,
            _route: &Route,
            _user_public_key: &str,
            _options: BuildOptions,
        ) -> Result<String, AggregatorError> {
            Err(AggregatorError::Parse("not used".to_string()))
        }
    }

    #[tokio::test]
    async fn test_resolve_forwards_request() {
        let aggregator = Arc::new(RecordingAggregator {
            seen: Mutex::new(Vec::new()),
        });
        let resolver = QuoteResolver::new(aggregator.clone(), 75);

        let resolution = resolver.resolve("In", "Out", 500).await;
        assert!(matches!(resolution, Resolution::Route(ref r) if r.out_amount == 42));

        let seen = aggregator.seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].amount, 500);
        assert_eq!(seen[0].slippage_bps, 75);
        assert_eq!(seen[0].output_mint, "Out");
    }
}
