//! Configuration management for the fieldops client
//!
//! Supports dual-location configuration:
//! - User-level: ~/.fieldops/fieldops.toml
//! - Project-level: ./.fieldops/fieldops.toml
//!
//! Project-level config overrides user-level config; `FIELDOPS_API_URL` and
//! `FIELDOPS_WS_URL` override both.

mod init;
mod loader;
mod schema;

pub use init::{create_default_config_file, init_config_directories, init_project_config};
pub use loader::{ConfigLoader, CONFIG_DIR, CONFIG_FILE};
pub use schema::{
    ApiConfig, ChatSection, FieldopsConfig, StorageConfig, UiConfig, API_URL_ENV, WS_URL_ENV,
};

use crate::Result;

/// Load configuration from both locations with project config taking precedence
pub async fn load_config() -> Result<FieldopsConfig> {
    ConfigLoader::new().load().await
}
