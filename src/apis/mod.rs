//! External HTTP APIs (token metadata/price proxy)

pub mod client;
pub mod token_data;

pub use client::{build_client, RateLimiter};
pub use token_data::{TokenDataClient, TokenMetadata};
