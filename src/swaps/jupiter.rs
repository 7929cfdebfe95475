/// Jupiter aggregator client
/// Quotes via /swap/v1/quote, unsigned transactions via /swap/v1/swap
use super::router::{BuildOptions, SwapAggregator};
use super::types::{AggregatorError, QuoteRequest, QuoteResponse, Route, RouteCandidate};
use crate::config::SwapsConfig;
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Error codes Jupiter uses when a pair simply has no liquidity path
const NO_ROUTE_MARKERS: &[&str] = &[
    "COULD_NOT_FIND_ANY_ROUTE",
    "TOKEN_NOT_TRADABLE",
    "NO_ROUTES_FOUND",
];

// ============================================================================
// API TYPES
// ============================================================================

#[derive(Debug, Serialize)]
struct JupiterQuoteRequest {
    #[serde(rename = "inputMint")]
    input_mint: String,
    #[serde(rename = "outputMint")]
    output_mint: String,
    amount: String,
    #[serde(rename = "slippageBps")]
    slippage_bps: u16,
    #[serde(rename = "swapMode")]
    swap_mode: &'static str,
}

#[derive(Debug, Deserialize)]
struct JupiterQuoteResponse {
    #[serde(rename = "outAmount")]
    out_amount: String,
    #[serde(rename = "priceImpactPct", default)]
    price_impact_pct: Option<String>,
    #[serde(rename = "routePlan", default)]
    route_plan: Vec<RoutePlanStep>,
}

#[derive(Debug, Deserialize)]
struct RoutePlanStep {
    #[serde(rename = "swapInfo")]
    swap_info: SwapInfo,
}

#[derive(Debug, Deserialize)]
struct SwapInfo {
    label: Option<String>,
}

#[derive(Debug, Serialize)]
struct JupiterSwapRequest<'a> {
    #[serde(rename = "userPublicKey")]
    user_public_key: &'a str,
    #[serde(rename = "quoteResponse")]
    quote_response: &'a serde_json::Value,
    #[serde(rename = "wrapAndUnwrapSol")]
    wrap_and_unwrap_sol: bool,
    #[serde(rename = "useSharedAccounts")]
    use_shared_accounts: bool,
    #[serde(rename = "dynamicComputeUnitLimit")]
    dynamic_compute_unit_limit: bool,
    #[serde(
        rename = "prioritizationFeeLamports",
        skip_serializing_if = "Option::is_none"
    )]
    prioritization_fee_lamports: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct JupiterSwapResponse {
    #[serde(rename = "swapTransaction")]
    swap_transaction: String,
}

// ============================================================================
// RESPONSE HANDLING
// ============================================================================

/// Build route plan summary from Jupiter response
fn build_route_label(route_plan: &[RoutePlanStep]) -> String {
    if route_plan.is_empty() {
        return "Direct".to_string();
    }

    route_plan
        .iter()
        .map(|step| {
            step.swap_info
                .label
                .clone()
                .unwrap_or_else(|| "Unknown".to_string())
        })
        .collect::<Vec<_>>()
        .join(" → ")
}

fn is_no_route_body(body: &str) -> bool {
    NO_ROUTE_MARKERS.iter().any(|marker| body.contains(marker))
}

/// Turn a successful quote body into candidates
///
/// Jupiter answers with a single best route. A body that cannot be read as
/// a quote, or whose output amount is missing or unparsable, counts as "no
/// candidates" rather than an error.
fn parse_quote_body(body: &str) -> QuoteResponse {
    let raw: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            logger::warning(
                LogTag::Quote,
                &format!("Jupiter quote body is not JSON, treating as no route: {}", e),
            );
            return QuoteResponse::empty();
        }
    };

    let parsed: JupiterQuoteResponse = match serde_json::from_value(raw.clone()) {
        Ok(parsed) => parsed,
        Err(e) => {
            logger::warning(
                LogTag::Quote,
                &format!("Jupiter quote body has unexpected shape: {}", e),
            );
            return QuoteResponse::empty();
        }
    };

    let out_amount = match parsed.out_amount.parse::<u64>() {
        Ok(amount) => amount,
        Err(_) => {
            logger::warning(
                LogTag::Quote,
                &format!("Jupiter quote has invalid outAmount '{}'", parsed.out_amount),
            );
            return QuoteResponse::empty();
        }
    };

    let price_impact_pct = parsed
        .price_impact_pct
        .as_deref()
        .and_then(|value| value.parse::<f64>().ok())
        .unwrap_or(0.0);

    QuoteResponse::single(RouteCandidate {
        out_amount,
        price_impact_pct,
        route_label: build_route_label(&parsed.route_plan),
        raw,
    })
}

fn map_send_error(e: reqwest::Error, timeout_secs: u64) -> AggregatorError {
    if e.is_timeout() {
        AggregatorError::Timeout { secs: timeout_secs }
    } else {
        AggregatorError::Transport(e.to_string())
    }
}

// ============================================================================
// JUPITER AGGREGATOR
// ============================================================================

pub struct JupiterAggregator {
    client: Client,
    api_base: String,
    api_key: String,
    quote_timeout_secs: u64,
    build_timeout_secs: u64,
    dynamic_compute_unit_limit: bool,
    priority_fee_lamports: u64,
}

impl JupiterAggregator {
    pub fn new(config: &SwapsConfig) -> Self {
        Self {
            client: Client::new(),
            api_base: config.jupiter.api_base.trim_end_matches('/').to_string(),
            api_key: config.jupiter.api_key.clone(),
            quote_timeout_secs: config.quote_timeout_secs,
            build_timeout_secs: config.build_timeout_secs,
            dynamic_compute_unit_limit: config.jupiter.dynamic_compute_unit_limit,
            priority_fee_lamports: config.jupiter.priority_fee_lamports,
        }
    }

    fn with_api_key(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.is_empty() {
            builder
        } else {
            builder.header("x-api-key", &self.api_key)
        }
    }
}

#[async_trait]
impl SwapAggregator for JupiterAggregator {
    fn name(&self) -> &'static str {
        "Jupiter"
    }

    async fn get_quote(&self, request: &QuoteRequest) -> Result<QuoteResponse, AggregatorError> {
        let start = Instant::now();
        let quote_req = JupiterQuoteRequest {
            input_mint: request.input_mint.clone(),
            output_mint: request.output_mint.clone(),
            amount: request.amount.to_string(),
            slippage_bps: request.slippage_bps,
            swap_mode: "ExactIn",
        };

        logger::debug(
            LogTag::Quote,
            &format!(
                "Jupiter quote request: {} {} → {} (slippage: {}bps)",
                request.amount, request.input_mint, request.output_mint, request.slippage_bps
            ),
        );

        let url = format!("{}/swap/v1/quote", self.api_base);
        let response = self
            .with_api_key(self.client.get(&url))
            .query(&quote_req)
            .timeout(Duration::from_secs(self.quote_timeout_secs))
            .send()
            .await
            .map_err(|e| map_send_error(e, self.quote_timeout_secs))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| map_send_error(e, self.quote_timeout_secs))?;

        if !status.is_success() {
            if status.is_client_error() && is_no_route_body(&body) {
                logger::debug(
                    LogTag::Quote,
                    &format!("Jupiter has no route for {}: {}", request.output_mint, body),
                );
                return Ok(QuoteResponse::empty());
            }
            return Err(AggregatorError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let quote = parse_quote_body(&body);
        logger::verbose(
            LogTag::Quote,
            &format!(
                "Jupiter quote for {} returned {} candidate(s) in {}ms",
                request.output_mint,
                quote.candidates.len(),
                start.elapsed().as_millis()
            ),
        );
        Ok(quote)
    }

    async fn build_transaction(
        &self,
        route: &Route,
        user_public_key: &str,
        options: BuildOptions,
    ) -> Result<String, AggregatorError> {
        let swap_req = JupiterSwapRequest {
            user_public_key,
            quote_response: &route.raw_quote,
            wrap_and_unwrap_sol: options.wrap_native_currency,
            use_shared_accounts: options.use_shared_accounts,
            dynamic_compute_unit_limit: self.dynamic_compute_unit_limit,
            prioritization_fee_lamports: (self.priority_fee_lamports > 0)
                .then_some(self.priority_fee_lamports),
        };

        logger::debug(
            LogTag::Swap,
            &format!(
                "Jupiter swap build: user={}, {} → {}, route: {}",
                user_public_key, route.input_mint, route.output_mint, route.route_label
            ),
        );

        let url = format!("{}/swap/v1/swap", self.api_base);
        let response = self
            .with_api_key(self.client.post(&url))
            .header("Content-Type", "application/json")
            .json(&swap_req)
            .timeout(Duration::from_secs(self.build_timeout_secs))
            .send()
            .await
            .map_err(|e| map_send_error(e, self.build_timeout_secs))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown".to_string());
            return Err(AggregatorError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| map_send_error(e, self.build_timeout_secs))?;
        let swap_response: JupiterSwapResponse = serde_json::from_str(&body).map_err(|e| {
            AggregatorError::Parse(format!("Jupiter swap response parse failed: {}", e))
        })?;

        if swap_response.swap_transaction.is_empty() {
            return Err(AggregatorError::Parse(
                "Jupiter returned an empty swapTransaction".to_string(),
            ));
        }

        Ok(swap_response.swap_transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JupiterConfig;
    use crate::testing::StubServer;

    fn aggregator_for(stub: &StubServer) -> JupiterAggregator {
        JupiterAggregator::new(&SwapsConfig {
            jupiter: JupiterConfig {
                api_base: stub.url.clone(),
                api_key: "test-key".to_string(),
                ..JupiterConfig::default()
            },
            quote_timeout_secs: 5,
            build_timeout_secs: 5,
            ..SwapsConfig::default()
        })
    }

    fn quote_request() -> QuoteRequest {
        QuoteRequest {
            input_mint: "So11111111111111111111111111111111111111112".to_string(),
            output_mint: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".to_string(),
            amount: 1_000_000,
            slippage_bps: 300,
        }
    }

    #[tokio::test]
    async fn test_quote_status_mapping() {
        let no_route = StubServer::start(
            400,
            r#"{"error":"Could not find any route","errorCode":"COULD_NOT_FIND_ANY_ROUTE"}"#,
        )
        .await;
        let quote = aggregator_for(&no_route).get_quote(&quote_request()).await.unwrap();
        assert!(quote.candidates.is_empty());

        let server_error = StubServer::start(500, r#"{"error":"internal"}"#).await;
        let err = aggregator_for(&server_error)
            .get_quote(&quote_request())
            .await
            .unwrap_err();
        assert!(matches!(err, AggregatorError::Http { status: 500, .. }), "{:?}", err);

        let rate_limited = StubServer::start(429, r#"{"error":"Rate limit exceeded"}"#).await;
        let err = aggregator_for(&rate_limited)
            .get_quote(&quote_request())
            .await
            .unwrap_err();
        assert!(matches!(err, AggregatorError::Http { status: 429, .. }), "{:?}", err);
    }

    #[tokio::test]
    async fn test_quote_request_shape() {
        let stub = StubServer::start(200, r#"{"outAmount":"151234","routePlan":[]}"#).await;
        let quote = aggregator_for(&stub).get_quote(&quote_request()).await.unwrap();
        assert_eq!(quote.candidates[0].out_amount, 151234);

        let request = stub.last_request().unwrap();
        assert!(request.starts_with("GET /swap/v1/quote?"));
        assert!(request.contains("amount=1000000"));
        assert!(request.contains("slippageBps=300"));
        assert!(request.contains("swapMode=ExactIn"));
        assert!(request.to_lowercase().contains("x-api-key: test-key"));
    }

    #[tokio::test]
    async fn test_build_transaction_returns_payload() {
        let stub = StubServer::start(200, r#"{"swapTransaction":"AQID","lastValidBlockHeight":1}"#).await;
        let route = Route {
            input_mint: quote_request().input_mint,
            output_mint: quote_request().output_mint,
            in_amount: 1_000_000,
            out_amount: 151234,
            price_impact_pct: 0.0,
            slippage_bps: 300,
            route_label: "Direct".to_string(),
            raw_quote: serde_json::json!({"outAmount": "151234"}),
        };

        let payload = aggregator_for(&stub)
            .build_transaction(&route, "User111", BuildOptions::default())
            .await
            .unwrap();
        assert_eq!(payload, "AQID");

        let request = stub.last_request().unwrap();
        assert!(request.starts_with("POST /swap/v1/swap"));
        assert!(request.contains("\"userPublicKey\":\"User111\""));
        assert!(request.contains("\"quoteResponse\":{\"outAmount\":\"151234\"}"));

        let failing = StubServer::start(502, "bad gateway").await;
        let err = aggregator_for(&failing)
            .build_transaction(&route, "User111", BuildOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AggregatorError::Http { status: 502, .. }));
    }

    #[test]
    fn test_parse_quote_body_extracts_candidate() {
        let body = r#"{
            "inputMint": "So11111111111111111111111111111111111111112",
            "inAmount": "1000000",
            "outputMint": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
            "outAmount": "151234",
            "priceImpactPct": "0.0012",
            "routePlan": [
                {"swapInfo": {"ammKey": "a", "label": "Raydium"}},
                {"swapInfo": {"ammKey": "b", "label": "Orca"}}
            ],
            "contextSlot": 1
        }"#;

        let quote = parse_quote_body(body);
        assert_eq!(quote.candidates.len(), 1);
        let candidate = &quote.candidates[0];
        assert_eq!(candidate.out_amount, 151234);
        assert!((candidate.price_impact_pct - 0.0012).abs() < 1e-12);
        assert_eq!(candidate.route_label, "Raydium → Orca");
        // extra fields survive for the build step
        assert_eq!(candidate.raw["contextSlot"], 1);
    }

    #[test]
    fn test_malformed_quote_body_is_empty() {
        assert!(parse_quote_body("<html>bad gateway</html>").candidates.is_empty());
        assert!(parse_quote_body(r#"{"foo": 1}"#).candidates.is_empty());
        assert!(parse_quote_body(r#"{"outAmount": "abc"}"#).candidates.is_empty());
    }

    #[test]
    fn test_missing_route_plan_is_direct() {
        let quote = parse_quote_body(r#"{"outAmount": "10"}"#);
        assert_eq!(quote.candidates[0].route_label, "Direct");
        assert_eq!(quote.candidates[0].price_impact_pct, 0.0);
    }

    #[test]
    fn test_no_route_markers() {
        assert!(is_no_route_body(
            r#"{"error":"Could not find any route","errorCode":"COULD_NOT_FIND_ANY_ROUTE"}"#
        ));
        assert!(is_no_route_body(r#"{"errorCode":"TOKEN_NOT_TRADABLE"}"#));
        assert!(!is_no_route_body(r#"{"error":"Rate limit exceeded"}"#));
    }

    #[test]
    fn test_swap_request_serialization() {
        let quote = serde_json::json!({"outAmount": "10"});
        let request = JupiterSwapRequest {
            user_public_key: "User111",
            quote_response: &quote,
            wrap_and_unwrap_sol: true,
            use_shared_accounts: false,
            dynamic_compute_unit_limit: true,
            prioritization_fee_lamports: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["userPublicKey"], "User111");
        assert_eq!(value["wrapAndUnwrapSol"], true);
        assert_eq!(value["useSharedAccounts"], false);
        assert_eq!(value["quoteResponse"]["outAmount"], "10");
        assert!(value.get("prioritizationFeeLamports").is_none());
    }
}
