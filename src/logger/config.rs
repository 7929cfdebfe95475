/// Logger runtime configuration
///
/// Holds the minimum level and the set of tags with debug output enabled.
/// Populated once at startup from the CLI flags, readable from any thread.
use super::levels::LogLevel;
use super::tags::LogTag;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Messages above this level are dropped
    pub min_level: LogLevel,
    /// Debug keys of tags with debug output enabled
    pub debug_tags: HashSet<String>,
    /// Write to the log file in addition to the console
    pub file_logging: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
            file_logging: true,
        }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

pub fn get_logger_config() -> LoggerConfig {
    LOGGER_CONFIG.read().clone()
}

pub fn update_logger_config<F>(f: F)
where
    F: FnOnce(&mut LoggerConfig),
{
    f(&mut LOGGER_CONFIG.write());
}

/// Configure debug tags and verbosity from parsed CLI flags
///
/// Unknown tag names are ignored; `all` enables every tag.
pub fn init_from_flags(debug_tags: &[String], verbose: bool) {
    update_logger_config(|config| {
        for raw in debug_tags {
            if raw.eq_ignore_ascii_case("all") {
                for tag in LogTag::ALL {
                    config.debug_tags.insert(tag.to_debug_key());
                }
                continue;
            }
            if let Some(tag) = LogTag::from_debug_key(raw) {
                config.debug_tags.insert(tag.to_debug_key());
            }
        }

        if !config.debug_tags.is_empty() && config.min_level < LogLevel::Debug {
            config.min_level = LogLevel::Debug;
        }
        if verbose {
            config.min_level = LogLevel::Verbose;
        }
    });
}

impl LoggerConfig {
    pub fn is_debug_enabled_for_tag(&self, tag: &LogTag) -> bool {
        self.debug_tags.contains(&tag.to_debug_key()) || self.min_level == LogLevel::Verbose
    }
}
