//! CLI command handlers
//!
//! Each handler drives the services of an [`App`] and returns the text to
//! print. The interactive chat writes directly to the given output.

use super::output::{
    format_decision, format_event, format_message, format_preferences, format_profile,
};
use crate::app::App;
use crate::error::{FieldopsError, Result};
use fieldops_chat::{ChatEvent, ConnectionState};
use fieldops_session::{Locale, RegisterRequest, Theme};
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::timeout;
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

fn prompt_password(password: Option<String>) -> Result<String> {
    match password {
        Some(password) => Ok(password),
        None => Ok(rpassword::prompt_password("Password: ")?),
    }
}

/// Failure text for the user: the session's display string when it set one
fn session_failure(app: &App, err: impl Into<FieldopsError>) -> FieldopsError {
    match app.session.error() {
        Some(message) => FieldopsError::Command(message),
        None => err.into(),
    }
}

pub async fn handle_login(app: &App, username: &str, password: Option<String>) -> Result<String> {
    let password = prompt_password(password)?;
    if let Err(e) = app.session.login(username, &password).await {
        return Err(session_failure(app, e));
    }

    let name = app
        .session
        .user()
        .map(|u| u.display_name())
        .unwrap_or_else(|| username.to_string());
    Ok(format!("Logged in as {}", name))
}

pub async fn handle_logout(app: &App) -> Result<String> {
    if !app.session.is_authenticated() {
        return Ok("Not logged in".to_string());
    }
    app.session.logout().await;
    Ok("Logged out".to_string())
}

pub async fn handle_whoami(app: &App) -> Result<String> {
    if !app.session.is_authenticated() {
        return Ok("Not logged in".to_string());
    }

    match app.session.require_user().await {
        Ok(profile) => Ok(format_profile(&profile)),
        Err(e) if e.is_unauthorized() => Err(FieldopsError::Command(
            "Session expired, please log in again".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

pub async fn handle_register(app: &App, request: RegisterRequest) -> Result<String> {
    let username = request.username.clone();
    if let Err(e) = app.session.register(&request).await {
        return Err(session_failure(app, e));
    }
    Ok(format!(
        "Account {} created. Log in once an administrator activates it.",
        username
    ))
}

/// Read the password for `register` if it was not passed.
pub fn register_request(
    username: String,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    password: Option<String>,
) -> Result<RegisterRequest> {
    Ok(RegisterRequest {
        username,
        email,
        password: prompt_password(password)?,
        first_name,
        last_name,
    })
}

pub async fn handle_route(app: &App, target: &str) -> Result<String> {
    let decision = app.guard.navigate(target).await?;
    Ok(format_decision(target, &decision))
}

pub async fn handle_history(app: &App, pages: u32) -> Result<String> {
    if !app.session.is_authenticated() {
        return Err(FieldopsError::Command("Not logged in".to_string()));
    }

    for _ in 0..pages.max(1) {
        if !app.chat.has_more_history() {
            break;
        }
        app.chat.fetch_history().await?;
    }

    let show_timestamps = app.config.ui.show_timestamps;
    let messages = app.chat.messages();
    if messages.is_empty() {
        return Ok("No messages".to_string());
    }
    Ok(messages
        .iter()
        .map(|m| format_message(m, show_timestamps))
        .collect::<Vec<_>>()
        .join("\n"))
}

pub async fn handle_prefs(
    app: &App,
    locale: Option<String>,
    theme: Option<String>,
    toggle_theme: bool,
) -> Result<String> {
    if let Some(locale) = locale {
        app.preferences.set_locale(locale.parse::<Locale>()?).await?;
    }
    if let Some(theme) = theme {
        app.preferences.set_theme(theme.parse::<Theme>()?).await?;
    }
    if toggle_theme {
        app.preferences.toggle_theme().await?;
    }

    let locale = app.preferences.locale().await?;
    let theme = app.preferences.theme().await?;
    Ok(format_preferences(locale, theme))
}

/// Interactive chat over `input` until `/quit`, end of input or the
/// connection closing.
pub async fn run_chat<R, W>(app: &App, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut events = app
        .chat
        .take_events()
        .ok_or_else(|| FieldopsError::Command("Chat is already running".to_string()))?;
    let show_timestamps = app.config.ui.show_timestamps;

    app.chat.connect()?;
    let watcher = app.chat.follow_session();
    let state = timeout(
        CONNECT_TIMEOUT,
        app.chat
            .wait_for_state(|s| !matches!(s, ConnectionState::Absent | ConnectionState::Connecting)),
    )
    .await;
    let state = match state {
        Ok(state) => state,
        Err(_) => {
            watcher.abort();
            app.chat.disconnect();
            return Err(FieldopsError::Command("Timed out connecting to chat".to_string()));
        }
    };

    if !state.is_open() {
        watcher.abort();
        return Err(FieldopsError::Command("Could not connect to chat".to_string()));
    }

    if let Err(e) = app.chat.fetch_history().await {
        writeln!(out, "Could not load history: {}", e)?;
    }
    // Live frames that landed during the fetch are part of this dump
    let shown = app.chat.messages();
    for message in &shown {
        writeln!(out, "{}", format_message(message, show_timestamps))?;
    }
    let shown_tail = shown.last().map(|m| m.id);

    let mut lines = input.lines();
    loop {
        tokio::select! {
            biased;

            event = events.recv() => {
                let event = match event {
                    Some(event) => event,
                    None => break,
                };
                match &event {
                    ChatEvent::HistoryLoaded { .. } => continue,
                    ChatEvent::MessageReceived(m) if shown_tail.is_some_and(|tail| m.id <= tail) => {
                        continue
                    }
                    _ => {}
                }
                if let Some(line) = format_event(&event, show_timestamps) {
                    writeln!(out, "{}", line)?;
                }
                if event == ChatEvent::StateChanged(ConnectionState::Closed) {
                    break;
                }
            }
            line = lines.next_line() => {
                let line = match line? {
                    Some(line) => line,
                    None => break,
                };
                match line.trim() {
                    "" => {}
                    "/quit" => break,
                    "/more" => {
                        if !app.chat.has_more_history() {
                            writeln!(out, "-- no more history --")?;
                            continue;
                        }
                        match app.chat.fetch_history().await {
                            Ok(added) => {
                                for message in app.chat.messages().iter().take(added) {
                                    writeln!(out, "{}", format_message(message, show_timestamps))?;
                                }
                            }
                            Err(e) => writeln!(out, "Could not load history: {}", e)?,
                        }
                    }
                    text => {
                        if let Err(e) = app.chat.send_message(text) {
                            writeln!(out, "Not sent: {}", e)?;
                        }
                    }
                }
            }
        }
    }

    app.chat.disconnect();
    if timeout(
        CLOSE_TIMEOUT,
        app.chat
            .wait_for_state(|s| matches!(s, ConnectionState::Closed | ConnectionState::Absent)),
    )
    .await
    .is_err()
    {
        debug!("Chat did not acknowledge close in time");
    }
    watcher.abort();
    Ok(())
}
