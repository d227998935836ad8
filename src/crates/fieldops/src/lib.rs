//! fieldops client
//!
//! Command-line front end over the session manager and chat synchronizer:
//! - **config**: dual-location TOML configuration
//! - **app**: service wiring (HTTP client, session, route guard, chat, preferences)
//! - **cli**: argument parsing, command handlers and output formatting

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod version;

pub use app::App;
pub use config::{load_config, ConfigLoader, FieldopsConfig};
pub use error::{FieldopsError, Result};
