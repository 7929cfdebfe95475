//! Configuration system
//!
//! `schemas` declares every section with its defaults through
//! [`config_struct!`](crate::config_struct); `utils` owns the global instance
//! and the load/reload/save helpers.

pub mod macros;
pub mod schemas;
pub mod utils;

pub use schemas::{
    CartConfig, Config, FeesConfig, JupiterConfig, RpcConfig, SwapsConfig, TokensConfig,
    WalletConfig,
};
pub use utils::{
    get_config_clone, load_config_from_path, parse_config, replace_config, save_config,
    with_config,
};
