//! Configuration initialization and directory setup

use crate::config::loader::{CONFIG_DIR, CONFIG_FILE};
use crate::Result;
use std::path::{Path, PathBuf};
use tokio::fs;

const DEFAULT_CONFIG: &str = r#"# fieldops configuration
#
# Project-level config (./.fieldops/fieldops.toml) overrides user-level
# config (~/.fieldops/fieldops.toml). FIELDOPS_API_URL and FIELDOPS_WS_URL
# override both.

[api]
base_url = "http://localhost:8000/api/"
timeout_seconds = 30
max_retries = 3
retry_delay_ms = 1000         # doubled after every retry

[chat]
ws_url = "ws://localhost:8000/ws/chat/"
history_page_size = 20

[storage]
# path = "/home/me/.fieldops/storage.json"

[ui]
log_level = "warn"            # trace, debug, info, warn, error
show_timestamps = true
"#;

/// Create `~/.fieldops` if missing.
pub async fn init_config_directories() -> Result<()> {
    if let Some(home) = dirs::home_dir() {
        let user_dir = home.join(CONFIG_DIR);
        if !user_dir.exists() {
            fs::create_dir_all(&user_dir).await?;
            tracing::info!("Created user config directory: {}", user_dir.display());
        }
    }
    Ok(())
}

/// Write the commented default config file to `path`.
pub async fn create_default_config_file(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).await?;
    }
    fs::write(path, DEFAULT_CONFIG).await?;
    Ok(())
}

/// Create `<root>/.fieldops/fieldops.toml` unless it already exists.
/// Returns the path either way.
pub async fn init_project_config(root: &Path) -> Result<PathBuf> {
    let config_path = root.join(CONFIG_DIR).join(CONFIG_FILE);
    if config_path.exists() {
        tracing::info!("Keeping existing config {}", config_path.display());
        return Ok(config_path);
    }

    create_default_config_file(&config_path).await?;
    Ok(config_path)
}
