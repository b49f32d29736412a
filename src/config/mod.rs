//! Monitor Configuration Module
//!
//! Service endpoint, classification thresholds and view defaults loaded from
//! TOML, with built-in values for everything left out.
//!
//! ## Loading Order
//!
//! 1. `SUNGAI_CONFIG` environment variable (path to TOML file)
//! 2. `sungai_watch.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! The binary calls `config::init()` once at startup. Library components
//! take explicit values instead of reading the global.
//!
//! ```ignore
//! config::init(MonitorConfig::load());
//! let registry = config::get().thresholds.to_registry();
//! ```

mod monitor_config;
pub mod validation;

pub use monitor_config::*;

use std::sync::OnceLock;

static MONITOR_CONFIG: OnceLock<MonitorConfig> = OnceLock::new();

/// Initialize the global monitor configuration. Later calls are ignored.
pub fn init(config: MonitorConfig) {
    if MONITOR_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// The global monitor configuration, or the built-in defaults if `init()`
/// has not run.
pub fn get() -> &'static MonitorConfig {
    MONITOR_CONFIG.get_or_init(|| {
        tracing::warn!("config::get() called before config::init(), using defaults");
        MonitorConfig::default()
    })
}

pub fn is_initialized() -> bool {
    MONITOR_CONFIG.get().is_some()
}
