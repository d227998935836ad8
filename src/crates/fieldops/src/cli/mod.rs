//! Command-line interface for the fieldops client

pub mod handlers;
pub mod output;

use clap::{Parser, Subcommand};

/// fieldops - field service client
#[derive(Parser, Debug)]
#[command(name = "fieldops")]
#[command(version = crate::version::VERSION)]
#[command(long_version = crate::version::VERSION_INFO)]
#[command(about = "Session and chat client for the fieldops service platform", long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// API base URL (overrides config)
    #[arg(long, global = true, env = "FIELDOPS_API_URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create ./.fieldops/fieldops.toml with defaults
    Init,
    /// Show the effective configuration
    Config,
    /// Log in and store the access token
    Login {
        username: String,
        /// Password; prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Log out and forget the stored token
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Create an account
    Register {
        username: String,
        email: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        /// Password; prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Check whether a screen may be opened (name or path)
    Route {
        #[arg(value_name = "NAME_OR_PATH")]
        target: String,
    },
    /// Print chat history
    History {
        /// Pages to load, newest first
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Join the live chat. `/more` loads older messages, `/quit` leaves.
    Chat,
    /// Show or change locale and theme
    Prefs {
        /// pl or en
        #[arg(long)]
        locale: Option<String>,
        /// light or dark
        #[arg(long, conflicts_with = "toggle_theme")]
        theme: Option<String>,
        #[arg(long)]
        toggle_theme: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login() {
        let cli = Cli::try_parse_from(["fieldops", "login", "jan", "--password", "pw"]).unwrap();
        match cli.command {
            Commands::Login { username, password } => {
                assert_eq!(username, "jan");
                assert_eq!(password.as_deref(), Some("pw"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_history_default_pages() {
        let cli = Cli::try_parse_from(["fieldops", "-v", "history"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::History { pages: 1 }));
    }

    #[test]
    fn test_theme_conflicts_with_toggle() {
        assert!(Cli::try_parse_from(["fieldops", "prefs", "--theme", "dark", "--toggle-theme"]).is_err());
    }

    #[test]
    fn test_command_required() {
        assert!(Cli::try_parse_from(["fieldops"]).is_err());
    }
}
