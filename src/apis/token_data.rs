/// Token metadata and price client
///
/// Talks to the caching proxy (`/api/token-metadata`, `/api/token-prices`)
/// and keeps a local TTL cache in front of it, so repeated cart renders do
/// not hit the network. Only mints missing from the cache are requested.
use super::client::{build_client, RateLimiter};
use crate::cache::{CacheConfig, TtlCache};
use crate::config::TokensConfig;
use crate::errors::CartSwapError;
use crate::logger::{self, LogTag};
use crate::tokens::{short_mint, TokenIdentity};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenMetadata {
    #[serde(alias = "address")]
    pub mint: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "logoURI", alias = "logoUri", alias = "logo_uri")]
    pub logo_uri: Option<String>,
    #[serde(default)]
    pub decimals: Option<u8>,
}

impl TokenMetadata {
    pub fn into_identity(self) -> TokenIdentity {
        let symbol = if self.symbol.is_empty() {
            short_mint(&self.mint)
        } else {
            self.symbol
        };
        let name = if self.name.is_empty() {
            symbol.clone()
        } else {
            self.name
        };

        let mut identity = TokenIdentity::new(self.mint, symbol, name);
        if let Some(logo) = self.logo_uri.filter(|logo| !logo.is_empty()) {
            identity = identity.with_logo(logo);
        }
        if let Some(decimals) = self.decimals {
            identity = identity.with_decimals(decimals);
        }
        identity
    }
}

pub struct TokenDataClient {
    http: Client,
    limiter: RateLimiter,
    base_url: String,
    metadata: TtlCache<String, TokenMetadata>,
    prices: TtlCache<String, f64>,
}

impl TokenDataClient {
    pub fn new(config: &TokensConfig) -> Result<Self, CartSwapError> {
        let http = build_client(config.request_timeout_secs)?;
        let (metadata_cache, price_cache) = CacheConfig::from_tokens_config(config);

        Ok(Self {
            http,
            limiter: RateLimiter::new(config.max_requests_per_minute),
            base_url: config.proxy_base_url.trim_end_matches('/').to_string(),
            metadata: TtlCache::new(metadata_cache),
            prices: TtlCache::new(price_cache),
        })
    }

    /// Metadata for every mint the proxy knows; unknown mints are absent
    pub async fn get_metadata(
        &self,
        mints: &[String],
    ) -> Result<HashMap<String, TokenMetadata>, CartSwapError> {
        let (mut found, missing) = split_cached(mints, |mint| self.metadata.get(mint));

        if !missing.is_empty() {
            let body = self.fetch("/api/token-metadata", &missing).await?;
            let fetched: Vec<TokenMetadata> = serde_json::from_str(&body).map_err(|e| {
                CartSwapError::parse_error(format!("token metadata response: {}", e))
            })?;

            logger::debug(
                LogTag::Tokens,
                &format!(
                    "Fetched metadata for {}/{} mints",
                    fetched.len(),
                    missing.len()
                ),
            );

            for metadata in fetched {
                self.metadata.insert(metadata.mint.clone(), metadata.clone());
                found.insert(metadata.mint.clone(), metadata);
            }
        }

        Ok(found)
    }

    /// USD prices for display; mints without a price are absent
    pub async fn get_prices(&self, mints: &[String]) -> Result<HashMap<String, f64>, CartSwapError> {
        let (mut found, missing) = split_cached(mints, |mint| self.prices.get(mint));

        if !missing.is_empty() {
            let body = self.fetch("/api/token-prices", &missing).await?;
            let fetched = parse_price_map(&body)?;

            logger::debug(
                LogTag::Tokens,
                &format!("Fetched {} prices for {} mints", fetched.len(), missing.len()),
            );

            for (mint, price) in fetched {
                self.prices.insert(mint.clone(), price);
                found.insert(mint, price);
            }
        }

        Ok(found)
    }

    /// Identity for a mint being added to the cart
    ///
    /// Explicit symbol/name win over proxy data; if the proxy is unreachable
    /// the shortened mint is used so the add still goes through.
    pub async fn resolve_identity(
        &self,
        mint: &str,
        symbol: Option<String>,
        name: Option<String>,
    ) -> TokenIdentity {
        let fetched = match self.get_metadata(&[mint.to_string()]).await {
            Ok(mut map) => map.remove(mint),
            Err(e) => {
                logger::warning(
                    LogTag::Tokens,
                    &format!("Metadata lookup for {} failed: {}", mint, e),
                );
                None
            }
        };

        let base = fetched.unwrap_or_else(|| TokenMetadata {
            mint: mint.to_string(),
            symbol: String::new(),
            name: String::new(),
            logo_uri: None,
            decimals: None,
        });

        TokenMetadata {
            symbol: symbol.unwrap_or(base.symbol),
            name: name.unwrap_or(base.name),
            ..base
        }
        .into_identity()
    }

    async fn fetch(&self, path: &str, mints: &[String]) -> Result<String, CartSwapError> {
        self.limiter.acquire().await;

        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .query(&[("mints", mints.join(","))])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(CartSwapError::Http(format!(
                "{} returned {}: {}",
                path, status, body
            )));
        }
        Ok(body)
    }
}

/// Cached values plus the deduplicated list of mints still to fetch
fn split_cached<V>(
    mints: &[String],
    lookup: impl Fn(&String) -> Option<V>,
) -> (HashMap<String, V>, Vec<String>) {
    let mut found = HashMap::new();
    let mut missing: Vec<String> = Vec::new();

    for mint in mints {
        if found.contains_key(mint) || missing.contains(mint) {
            continue;
        }
        match lookup(mint) {
            Some(value) => {
                found.insert(mint.clone(), value);
            }
            None => missing.push(mint.clone()),
        }
    }

    if !found.is_empty() {
        logger::verbose(
            LogTag::Cache,
            &format!("{} cache hits, {} misses", found.len(), missing.len()),
        );
    }
    (found, missing)
}

/// Accepts `{mint: 1.23}` as well as `{mint: {"price": 1.23}}`
fn parse_price_map(body: &str) -> Result<HashMap<String, f64>, CartSwapError> {
    let raw: HashMap<String, serde_json::Value> = serde_json::from_str(body)
        .map_err(|e| CartSwapError::parse_error(format!("token price response: {}", e)))?;

    Ok(raw
        .into_iter()
        .filter_map(|(mint, value)| {
            let price = value
                .as_f64()
                .or_else(|| value.get("price").and_then(|p| p.as_f64()))
                .or_else(|| value.get("usdPrice").and_then(|p| p.as_f64()))?;
            (price.is_finite() && price >= 0.0).then_some((mint, price))
        })
        .collect())
}
