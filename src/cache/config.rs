/// Cache configuration per entity type
///
/// - Token metadata: long TTL, names and logos rarely change
/// - Token prices: short TTL, display only
use crate::config::TokensConfig;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Time-to-live for cached entries
    pub ttl: Duration,

    /// Maximum number of entries (oldest evicted when exceeded)
    pub capacity: usize,
}

impl CacheConfig {
    /// Token metadata cache (7 days)
    pub fn token_metadata() -> Self {
        Self::from_tokens_config(&TokensConfig::default()).0
    }

    /// Token price cache (5 minutes)
    pub fn token_prices() -> Self {
        Self::from_tokens_config(&TokensConfig::default()).1
    }

    /// Metadata and price cache settings from the `[tokens]` section
    pub fn from_tokens_config(config: &TokensConfig) -> (Self, Self) {
        (
            Self::custom(config.metadata_ttl_secs, config.cache_capacity),
            Self::custom(config.price_ttl_secs, config.cache_capacity),
        )
    }

    /// Custom configuration
    pub fn custom(ttl_secs: u64, capacity: usize) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_secs),
            capacity: capacity.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(
            CacheConfig::token_metadata().ttl,
            Duration::from_secs(7 * 24 * 60 * 60)
        );
        assert_eq!(CacheConfig::token_prices().ttl, Duration::from_secs(300));
        assert_eq!(CacheConfig::custom(1, 0).capacity, 1);
    }
}
