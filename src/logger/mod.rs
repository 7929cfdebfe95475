//! Structured logging system for cartswap
//!
//! This module provides a small, ergonomic logging API with:
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Per-subsystem debug control via `--debug <tag>`
//! - Dual output: colored console + file persistence
//!
//! ## Usage
//!
//! ```rust
//! use cartswap::logger::{self, LogTag};
//!
//! logger::error(LogTag::Rpc, "All RPC endpoints failed");
//! logger::warning(LogTag::Quote, "No route for BONK");
//! logger::info(LogTag::Swap, "Batch completed: 3/4 swaps confirmed");
//! logger::debug(LogTag::Cart, "Weights: ..."); // Only with --debug cart
//! ```
//!
//! ## Initialization
//!
//! Call once at startup, after the CLI flags are parsed:
//! ```rust,no_run
//! cartswap::logger::init(&["swap".to_string()], false);
//! ```

mod config;
mod core;
mod file;
mod format;
mod levels;
mod tags;

pub use config::{
    get_logger_config, init_from_flags, update_logger_config, LoggerConfig,
};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger system
///
/// This must be called once at application startup, before any logging occurs.
/// It will:
/// 1. Configure per-tag debug modes from the parsed flags
/// 2. Initialize the file logging sink
pub fn init(debug_tags: &[String], verbose: bool) {
    config::init_from_flags(debug_tags, verbose);
    file::init_file_logging();
}

/// Log at ERROR level (always shown, critical issues)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (important issues)
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level (detailed diagnostics)
///
/// Debug logs are ONLY shown when `--debug <tag>` is provided for the tag.
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (very detailed tracing)
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}

/// Force flush all pending log writes
///
/// Call this during shutdown to ensure all logs are written to disk.
pub fn flush() {
    file::flush_file_logging();
}
