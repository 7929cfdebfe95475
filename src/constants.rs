/// Global constants used across cartswap
///
/// This module contains system-wide constants that are not configurable
/// and are used across multiple modules.

// ============================================================================
// SOLANA BLOCKCHAIN CONSTANTS
// ============================================================================

/// SOL token mint address (wrapped SOL / WSOL)
pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// Number of decimal places for SOL token
pub const SOL_DECIMALS: u8 = 9;

/// Lamports per SOL (10^9)
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// USDC mint address
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

/// Number of decimal places for USDC
pub const USDC_DECIMALS: u8 = 6;

/// SPL Token program (used as a filter for token account lookups)
pub const SPL_TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGqPDpbQR2PrXTrbRk7mz7";

// ============================================================================
// CART CONSTANTS
// ============================================================================

/// Target sum of all weights in a non-empty cart
pub const WEIGHT_TOTAL: f64 = 100.0;

/// Accepted drift between the weight sum and [`WEIGHT_TOTAL`]
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.02;
