//! In-memory caches for token metadata and prices

pub mod config;
pub mod storage;

pub use config::CacheConfig;
pub use storage::TtlCache;
