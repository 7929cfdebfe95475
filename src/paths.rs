//! Centralized path resolution for cartswap
//!
//! All file and directory paths are resolved through this module so the CLI,
//! the config loader and the cart persistence agree on locations.
//!
//! ## Directory Structure
//!
//! ```text
//! <data dir>/cartswap/
//! ├── data/
//! │ ├── config.toml
//! │ └── cart.json
//! └── logs/
//!   └── cartswap_<date>.log
//! ```

use once_cell::sync::Lazy;
use std::path::PathBuf;

/// Lazy-initialized base directory (thread-safe)
static BASE_DIRECTORY: Lazy<PathBuf> = Lazy::new(resolve_base_directory);

/// Resolves the base directory for all cartswap data
///
/// Uses platform-specific application data locations:
/// - macOS: ~/Library/Application Support/cartswap
/// - Windows: %LOCALAPPDATA%\cartswap
/// - Linux: $XDG_DATA_HOME/cartswap (fallback ~/.local/share/cartswap)
fn resolve_base_directory() -> PathBuf {
    const APP_DIR: &str = "cartswap";

    if let Some(dir) = dirs::data_local_dir() {
        return dir.join(APP_DIR);
    }

    if let Some(dir) = dirs::data_dir() {
        return dir.join(APP_DIR);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(APP_DIR);
    }

    PathBuf::from(APP_DIR)
}

/// Returns the base directory for all cartswap data
pub fn get_base_directory() -> PathBuf {
    BASE_DIRECTORY.clone()
}

pub fn get_data_directory() -> PathBuf {
    get_base_directory().join("data")
}

pub fn get_logs_directory() -> PathBuf {
    get_base_directory().join("logs")
}

pub fn get_config_path() -> PathBuf {
    get_data_directory().join("config.toml")
}

/// Cart snapshot written after every cart mutation
pub fn get_cart_path() -> PathBuf {
    get_data_directory().join("cart.json")
}

/// Ensure all required directories exist
///
/// Must run before the logger is initialized, the file sink needs `logs/`.
pub fn ensure_all_directories() -> Result<(), String> {
    for dir in [get_data_directory(), get_logs_directory()] {
        std::fs::create_dir_all(&dir)
            .map_err(|e| format!("Failed to create directory {}: {}", dir.display(), e))?;
    }
    Ok(())
}
