//! Configuration schema for the fieldops client

use crate::{FieldopsError, Result};
use fieldops_chat::ChatConfig;
use fieldops_http::ClientConfig;
use fieldops_session::FileStore;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding `api.base_url`
pub const API_URL_ENV: &str = "FIELDOPS_API_URL";

/// Environment variable overriding `chat.ws_url`
pub const WS_URL_ENV: &str = "FIELDOPS_WS_URL";

/// Main fieldops configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FieldopsConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub chat: ChatSection,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub ui: UiConfig,
}

/// REST API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL relative endpoint paths are joined to
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Retries for connect errors and 5xx answers
    pub max_retries: u32,

    /// Initial retry delay in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/".to_string(),
            timeout_seconds: 30,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

/// Live chat configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSection {
    /// WebSocket endpoint; the access token is appended as `?token=`
    pub ws_url: String,

    /// Messages per history page
    pub history_page_size: u32,
}

impl Default for ChatSection {
    fn default() -> Self {
        let defaults = ChatConfig::default();
        Self {
            ws_url: defaults.ws_url,
            history_page_size: defaults.history_page_size,
        }
    }
}

/// Durable storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage file; `~/.fieldops/storage.json` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Show timestamps in chat output
    pub show_timestamps: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            show_timestamps: true,
        }
    }
}

impl FieldopsConfig {
    /// Build a config from TOML layers, later layers taking precedence key
    /// by key. Keys no layer sets keep their defaults.
    pub fn from_layers<I>(layers: I) -> Result<Self>
    where
        I: IntoIterator<Item = toml::Table>,
    {
        let mut merged = toml::Table::new();
        for layer in layers {
            merge_tables(&mut merged, layer);
        }
        let config: FieldopsConfig = toml::Value::Table(merged).try_into()?;
        Ok(config)
    }

    /// Apply `FIELDOPS_API_URL` / `FIELDOPS_WS_URL` from the environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(fieldops_http::get_env_opt);
    }

    /// Apply overrides from any variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV) {
            self.api.base_url = url;
        }
        if let Some(url) = lookup(WS_URL_ENV) {
            self.chat.ws_url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(FieldopsError::Config("api.base_url is empty".to_string()));
        }
        if self.chat.ws_url.trim().is_empty() {
            return Err(FieldopsError::Config("chat.ws_url is empty".to_string()));
        }
        if self.chat.history_page_size == 0 {
            return Err(FieldopsError::Config(
                "chat.history_page_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// HTTP transport settings
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.api.base_url.clone())
            .with_timeout(Duration::from_secs(self.api.timeout_seconds))
            .with_max_retries(self.api.max_retries)
            .with_retry_delay(Duration::from_millis(self.api.retry_delay_ms))
            .with_user_agent(format!("fieldops/{}", crate::version::VERSION))
    }

    /// Chat synchronizer settings
    pub fn chat_config(&self) -> ChatConfig {
        ChatConfig {
            ws_url: self.chat.ws_url.clone(),
            history_page_size: self.chat.history_page_size,
            ..ChatConfig::default()
        }
    }

    pub fn storage_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(FileStore::default_path)
    }
}

/// Deep-merge `overlay` into `base`. Nested tables merge recursively;
/// any other value in `overlay` replaces the one in `base`.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FieldopsConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:8000/api/");
        assert_eq!(config.chat.ws_url, "ws://localhost:8000/ws/chat/");
        assert_eq!(config.chat.history_page_size, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_layers_merge_key_by_key() {
        let user: toml::Table = toml::from_str(
            r#"
            [api]
            base_url = "https://fieldops.example.com/api/"
            max_retries = 5

            [chat]
            history_page_size = 50

            [storage]
            path = "/tmp/base.json"
            "#,
        )
        .unwrap();
        let project: toml::Table = toml::from_str(
            r#"
            [api]
            max_retries = 0

            [ui]
            show_timestamps = false
            "#,
        )
        .unwrap();

        let config = FieldopsConfig::from_layers([user, project]).unwrap();

        assert_eq!(config.api.base_url, "https://fieldops.example.com/api/");
        assert_eq!(config.api.max_retries, 0);
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.chat.history_page_size, 50);
        assert_eq!(config.storage.path, Some(PathBuf::from("/tmp/base.json")));
        assert!(!config.ui.show_timestamps);
        assert_eq!(config.ui.log_level, "warn");
    }

    #[test]
    fn test_no_layers_is_default() {
        let config = FieldopsConfig::from_layers(Vec::new()).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8000/api/");
        assert_eq!(config.chat.history_page_size, 20);
    }

    #[test]
    fn test_partial_section_uses_defaults() {
        let config: FieldopsConfig = toml::from_str(
            r#"
            [api]
            base_url = "https://fieldops.example.com/api/"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://fieldops.example.com/api/");
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.ui.log_level, "warn");
    }

    #[test]
    fn test_overrides() {
        let mut config = FieldopsConfig::default();
        config.apply_overrides(|key| match key {
            API_URL_ENV => Some("http://10.0.0.5:8000/api/".to_string()),
            _ => None,
        });

        assert_eq!(config.api.base_url, "http://10.0.0.5:8000/api/");
        assert_eq!(config.chat.ws_url, "ws://localhost:8000/ws/chat/");
    }

    #[test]
    fn test_validate_rejects_zero_page_size() {
        let mut config = FieldopsConfig::default();
        config.chat.history_page_size = 0;
        assert!(matches!(config.validate(), Err(FieldopsError::Config(_))));
    }

    #[test]
    fn test_derived_settings() {
        let mut config = FieldopsConfig::default();
        config.api.base_url = "https://ops.example/api/".to_string();
        config.api.timeout_seconds = 5;
        config.api.max_retries = 0;
        config.api.retry_delay_ms = 250;
        config.chat.history_page_size = 10;

        let client = config.client_config();
        assert_eq!(client.base_url, "https://ops.example/api/");
        assert_eq!(client.timeout, Duration::from_secs(5));
        assert_eq!(client.max_retries, 0);
        assert_eq!(client.retry_delay, Duration::from_millis(250));
        assert!(client.default_headers.is_empty());
        assert!(client.user_agent.unwrap().starts_with("fieldops/"));
        assert_eq!(config.chat_config().initial_cursor(), "messages/?limit=10");
    }
}
