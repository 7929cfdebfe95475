use super::schemas::Config;
/// Configuration utilities - loading, saving and access helpers
use crate::errors::CartSwapError;
use crate::logger::{self, LogTag};
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::RwLock;

/// Global configuration instance
///
/// This is the single source of truth for all configuration values.
/// Reads before `load_config_from_path` see the schema defaults.
pub static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

fn config_lock() -> &'static RwLock<Config> {
    CONFIG.get_or_init(|| RwLock::new(Config::default()))
}

/// Parse a TOML document into a Config, missing fields take their defaults
pub fn parse_config(contents: &str) -> Result<Config, CartSwapError> {
    Ok(toml::from_str::<Config>(contents)?)
}

/// Load configuration from a specific file path
///
/// If the file doesn't exist, the schema defaults are used.
pub fn load_config_from_path(path: &Path) -> Result<(), CartSwapError> {
    let config = if path.exists() {
        let contents = std::fs::read_to_string(path)?;
        let config = parse_config(&contents)?;
        logger::info(
            LogTag::Config,
            &format!("Loaded configuration from {}", path.display()),
        );
        config
    } else {
        logger::warning(
            LogTag::Config,
            &format!("Config file '{}' not found, using default values", path.display()),
        );
        Config::default()
    };

    replace_config(config)
}


/// Atomically replace the active configuration
pub fn replace_config(config: Config) -> Result<(), CartSwapError> {
    let mut guard = config_lock()
        .write()
        .map_err(|e| CartSwapError::Config(format!("Failed to acquire config write lock: {}", e)))?;
    *guard = config;
    Ok(())
}

/// Execute a function with read access to the configuration
///
/// This is the recommended way to read configuration values.
///
/// # Example
/// ```
/// use cartswap::config::with_config;
///
/// let max_items = with_config(|cfg| cfg.cart.max_items);
/// let slippage = with_config(|cfg| cfg.swaps.slippage_bps);
/// ```
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&Config) -> R,
{
    // A poisoned lock still holds a fully written Config
    let guard = match config_lock().read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    f(&guard)
}

/// Get a clone of the entire configuration
///
/// Useful when config values are needed across await points.
pub fn get_config_clone() -> Config {
    with_config(|cfg| cfg.clone())
}

/// Save the current configuration to disk as pretty TOML
pub fn save_config(path: &Path) -> Result<(), CartSwapError> {
    let config_str = with_config(|cfg| toml::to_string_pretty(cfg))
        .map_err(|e| CartSwapError::Config(format!("Failed to serialize config: {}", e)))?;

    std::fs::write(path, config_str)?;
    Ok(())
}
