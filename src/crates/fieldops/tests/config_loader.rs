//! Configuration loading across the user and project files

use fieldops::config::CONFIG_FILE;
use fieldops::{ConfigLoader, FieldopsError};
use tempfile::TempDir;
use tokio::fs;

fn paths(dir: &TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
    (
        dir.path().join("user").join(CONFIG_FILE),
        dir.path().join("project").join(CONFIG_FILE),
    )
}

#[tokio::test]
async fn missing_files_give_defaults() {
    let dir = TempDir::new().unwrap();
    let (user, project) = paths(&dir);

    let config = ConfigLoader::with_paths(user, project).load().await.unwrap();
    assert_eq!(config.chat.history_page_size, 20);
    assert_eq!(config.ui.log_level, "warn");
}

#[tokio::test]
async fn project_overrides_user() {
    let dir = TempDir::new().unwrap();
    let (user, project) = paths(&dir);
    fs::create_dir_all(user.parent().unwrap()).await.unwrap();
    fs::create_dir_all(project.parent().unwrap()).await.unwrap();

    fs::write(
        &user,
        "[chat]\nhistory_page_size = 50\n\n[storage]\npath = \"/tmp/user-storage.json\"\n",
    )
    .await
    .unwrap();
    fs::write(&project, "[chat]\nhistory_page_size = 10\n").await.unwrap();

    let config = ConfigLoader::with_paths(user, project).load().await.unwrap();
    assert_eq!(config.chat.history_page_size, 10);
    assert_eq!(
        config.storage_path(),
        std::path::PathBuf::from("/tmp/user-storage.json")
    );
}

#[tokio::test]
async fn malformed_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let (user, project) = paths(&dir);
    fs::create_dir_all(user.parent().unwrap()).await.unwrap();
    fs::write(&user, "[chat\nhistory_page_size = ").await.unwrap();

    let err = ConfigLoader::with_paths(user, project).load().await.unwrap_err();
    assert!(matches!(err, FieldopsError::Toml(_)));
}

#[tokio::test]
async fn invalid_values_fail_validation() {
    let dir = TempDir::new().unwrap();
    let (user, project) = paths(&dir);
    fs::create_dir_all(project.parent().unwrap()).await.unwrap();
    fs::write(&project, "[chat]\nhistory_page_size = 0\n").await.unwrap();

    let err = ConfigLoader::with_paths(user, project).load().await.unwrap_err();
    assert!(matches!(err, FieldopsError::Config(_)));
}

#[tokio::test]
async fn project_keeps_user_sections_it_does_not_mention() {
    let dir = TempDir::new().unwrap();
    let (user, project) = paths(&dir);
    fs::create_dir_all(user.parent().unwrap()).await.unwrap();
    fs::create_dir_all(project.parent().unwrap()).await.unwrap();

    fs::write(
        &user,
        "[api]\nmax_retries = 7\ntimeout_seconds = 5\n\n[chat]\nhistory_page_size = 50\n",
    )
    .await
    .unwrap();
    fs::write(&project, "[ui]\nlog_level = \"debug\"\n\n[api]\ntimeout_seconds = 60\n")
        .await
        .unwrap();

    let config = ConfigLoader::with_paths(user, project).load().await.unwrap();
    assert_eq!(config.api.max_retries, 7);
    assert_eq!(config.api.timeout_seconds, 60);
    assert_eq!(config.chat.history_page_size, 50);
    assert_eq!(config.ui.log_level, "debug");
    assert!(config.ui.show_timestamps);
}
