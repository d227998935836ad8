//! Configuration loader with dual-location support

use crate::config::schema::FieldopsConfig;
use crate::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Config directory name, both under the home and the project directory
pub const CONFIG_DIR: &str = ".fieldops";

/// Config file name inside [`CONFIG_DIR`]
pub const CONFIG_FILE: &str = "fieldops.toml";

/// Configuration loader that handles both user and project configs
pub struct ConfigLoader {
    user_config_path: PathBuf,
    project_config_path: PathBuf,
}

impl ConfigLoader {
    /// Loader for `~/.fieldops/fieldops.toml` and `./.fieldops/fieldops.toml`
    pub fn new() -> Self {
        Self {
            user_config_path: Self::user_config_path(),
            project_config_path: Self::project_config_path(),
        }
    }

    /// Loader over explicit paths
    pub fn with_paths(user: impl Into<PathBuf>, project: impl Into<PathBuf>) -> Self {
        Self {
            user_config_path: user.into(),
            project_config_path: project.into(),
        }
    }

    fn user_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR)
            .join(CONFIG_FILE)
    }

    fn project_config_path() -> PathBuf {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(CONFIG_DIR)
            .join(CONFIG_FILE)
    }

    /// Defaults, then the user file, then the project file, then the
    /// environment. Files merge key by key; missing files are skipped and
    /// unreadable ones are errors.
    pub async fn load(&self) -> Result<FieldopsConfig> {
        let mut layers = Vec::new();
        for path in [&self.user_config_path, &self.project_config_path] {
            if let Some(layer) = self.read_layer(path).await? {
                layers.push(layer);
            }
        }

        let mut config = FieldopsConfig::from_layers(layers)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    async fn read_layer(&self, path: &Path) -> Result<Option<toml::Table>> {
        if !path.exists() {
            debug!("No config at {}", path.display());
            return Ok(None);
        }
        let content = fs::read_to_string(path).await?;
        let layer: toml::Table = toml::from_str(&content)?;
        debug!("Loaded config from {}", path.display());
        Ok(Some(layer))
    }

    pub fn get_user_config_path(&self) -> &Path {
        &self.user_config_path
    }

    pub fn get_project_config_path(&self) -> &Path {
        &self.project_config_path
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
