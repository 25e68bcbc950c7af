//! Configuration management for the gateway

mod env_loader;
mod environment;
mod file_loader;
mod gateway_config;
mod loader;
mod logging_config;

pub mod timeouts;

pub use env_loader::{apply_env_overrides, load_from_env};
pub use environment::RuntimeEnvironment;
pub use file_loader::{ConfigOverlay, load_from_file};
pub use gateway_config::{
    DEFAULT_FAILURE_COOLDOWN_MS, DEFAULT_MAX_FALLBACK_HISTORY, GatewayConfig, ProviderSettings,
};
pub use loader::ConfigLoader;
pub use logging_config::{LogFormat, LoggingConfig};
pub use timeouts::TimeoutConfig;

use crate::error::GatewayResult;
use std::path::Path;

/// Load configuration from an optional file plus the process environment
pub fn load_config(path: Option<&Path>) -> GatewayResult<GatewayConfig> {
    let loader = ConfigLoader::new().with_env();
    match path {
        Some(path) => loader.with_file(path).load(),
        None => loader.load(),
    }
}
