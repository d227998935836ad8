//! Environment variable helpers.
//!
//! Used by the configuration loader to let `FIELDOPS_*` variables override
//! file settings.

use crate::error::{ApiError, Result};

/// Get an environment variable as a string.
pub fn get_env(key: &str) -> Result<String> {
    std::env::var(key).map_err(|e| {
        ApiError::ConfigError(format!("Environment variable '{}' not found: {}", key, e))
    })
}

/// Get a non-empty environment variable, if set.
pub fn get_env_opt(key: &str) -> Option<String> {
    get_env(key).ok().filter(|v| !v.trim().is_empty())
}
