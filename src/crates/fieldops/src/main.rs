//! fieldops - CLI entry point

use anyhow::Context;
use clap::Parser;
use fieldops::cli::handlers;
use fieldops::cli::{Cli, Commands};
use fieldops::{App, ConfigLoader, FieldopsConfig};
use tokio::io::BufReader;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded = ConfigLoader::new().load().await;
    let (mut config, load_error) = match loaded {
        Ok(config) => (config, None),
        Err(e) => (FieldopsConfig::default(), Some(e)),
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }

    init_logging(&cli, &config);
    if let Some(e) = load_error {
        warn!("Failed to load config: {}, using defaults", e);
    }
    debug!("Starting fieldops version {}", fieldops::version::VERSION);

    match cli.command {
        Commands::Init => {
            fieldops::config::init_config_directories().await?;
            let root = std::env::current_dir().context("cannot determine current directory")?;
            let path = fieldops::config::init_project_config(&root).await?;
            println!("Config file: {}", path.display());
            return Ok(());
        }
        Commands::Config => {
            show_config(&config)?;
            return Ok(());
        }
        _ => {}
    }

    let app = App::build(config)?;
    app.start_and_wait().await?;

    let output = match cli.command {
        Commands::Init | Commands::Config => return Ok(()),
        Commands::Login { username, password } => {
            handlers::handle_login(&app, &username, password).await?
        }
        Commands::Logout => handlers::handle_logout(&app).await?,
        Commands::Whoami => handlers::handle_whoami(&app).await?,
        Commands::Register {
            username,
            email,
            first_name,
            last_name,
            password,
        } => {
            let request =
                handlers::register_request(username, email, first_name, last_name, password)?;
            handlers::handle_register(&app, request).await?
        }
        Commands::Route { target } => handlers::handle_route(&app, &target).await?,
        Commands::History { pages } => handlers::handle_history(&app, pages).await?,
        Commands::Chat => {
            let stdin = BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            handlers::run_chat(&app, stdin, &mut stdout).await?;
            return Ok(());
        }
        Commands::Prefs {
            locale,
            theme,
            toggle_theme,
        } => handlers::handle_prefs(&app, locale, theme, toggle_theme).await?,
    };

    println!("{}", output);
    Ok(())
}

/// `RUST_LOG` wins, then `--verbose`, then `ui.log_level` from the config.
fn init_logging(cli: &Cli, config: &FieldopsConfig) {
    let default_level = if cli.verbose {
        "debug"
    } else {
        config.ui.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn show_config(config: &FieldopsConfig) -> anyhow::Result<()> {
    let config_toml = toml::to_string_pretty(config)?;

    println!("Current Configuration:");
    println!("=====================");
    println!("{}", config_toml);

    let loader = ConfigLoader::new();
    println!("Config Locations:");
    println!("  User:    {}", loader.get_user_config_path().display());
    println!("  Project: {}", loader.get_project_config_path().display());
    println!("  Storage: {}", config.storage_path().display());

    Ok(())
}
