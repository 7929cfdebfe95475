/// Configuration schemas - all config structures defined once with defaults
///
/// Each struct is defined using the config_struct! macro which provides:
/// - Single-source definition (no repetition)
/// - Embedded defaults
/// - Serde support
use crate::config_struct;

// ============================================================================
// CART CONFIGURATION
// ============================================================================

config_struct! {
    /// Allocation cart limits and weight precision
    pub struct CartConfig {
        /// Maximum number of tokens in one cart
        max_items: usize = 20,

        /// Decimal places kept on every weight after normalization
        weight_decimals: u32 = 4,
    }
}

// ============================================================================
// FEES CONFIGURATION
// ============================================================================

config_struct! {
    /// Platform fee withheld from the gross input amount
    pub struct FeesConfig {
        enabled: bool = false,
        /// Percentage of the gross amount (1.0 = 1%)
        fee_percent: f64 = 1.0,
    }
}

// ============================================================================
// SWAPS CONFIGURATION
// ============================================================================

config_struct! {
    /// Jupiter aggregator settings
    pub struct JupiterConfig {
        /// API base URL (quote and swap endpoints are appended)
        api_base: String = "https://lite-api.jup.ag".to_string(),

        /// Optional API key sent as x-api-key (portal.jup.ag)
        api_key: String = String::new(),

        dynamic_compute_unit_limit: bool = true,
        priority_fee_lamports: u64 = 1_000,
    }
}

config_struct! {
    /// Swap execution settings
    pub struct SwapsConfig {
        /// Slippage tolerance sent with every quote (300 = 3%)
        slippage_bps: u16 = 300,

        /// Let the aggregator wrap/unwrap native SOL
        wrap_and_unwrap_sol: bool = true,

        /// Route through the aggregator's shared token accounts
        use_shared_accounts: bool = true,

        quote_timeout_secs: u64 = 15,
        build_timeout_secs: u64 = 30,

        jupiter: JupiterConfig = JupiterConfig::default(),
    }
}

// ============================================================================
// RPC CONFIGURATION
// ============================================================================

config_struct! {
    /// RPC endpoint configuration
    pub struct RpcConfig {
        /// Endpoints tried in order until one answers
        urls: Vec<String> = vec!["https://api.mainnet-beta.solana.com".to_string()],

        request_timeout_secs: u64 = 20,
        confirm_timeout_secs: u64 = 60,
        confirm_poll_interval_ms: u64 = 500,
    }
}

// ============================================================================
// TOKENS CONFIGURATION
// ============================================================================

config_struct! {
    /// Token metadata/price proxy client
    pub struct TokensConfig {
        /// Base URL of the caching proxy serving /api/token-metadata and /api/token-prices
        proxy_base_url: String = "http://localhost:3001".to_string(),

        /// Metadata changes rarely (7 days)
        metadata_ttl_secs: u64 = 7 * 24 * 60 * 60,

        /// Prices go stale quickly (5 minutes)
        price_ttl_secs: u64 = 5 * 60,

        cache_capacity: usize = 5000,
        request_timeout_secs: u64 = 15,

        /// Client-side rate limit towards the proxy (0 = unlimited)
        max_requests_per_minute: usize = 120,
    }
}

// ============================================================================
// WALLET CONFIGURATION
// ============================================================================

config_struct! {
    /// Local signing wallet
    pub struct WalletConfig {
        /// Private key (base58 or [1,2,...] array format); empty = use --keypair
        private_key: String = String::new(),
    }
}

// ============================================================================
// ROOT CONFIGURATION
// ============================================================================

config_struct! {
    /// Root configuration, one section per subsystem
    pub struct Config {
        cart: CartConfig = CartConfig::default(),
        fees: FeesConfig = FeesConfig::default(),
        swaps: SwapsConfig = SwapsConfig::default(),
        rpc: RpcConfig = RpcConfig::default(),
        tokens: TokensConfig = TokensConfig::default(),
        wallet: WalletConfig = WalletConfig::default(),
    }
}
