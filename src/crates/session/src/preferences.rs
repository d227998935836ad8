//! Locale and theme preferences persisted next to the session token

use crate::error::{Result, SessionError};
use crate::storage::{KeyValueStore, LOCALE_KEY, THEME_KEY};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    Pl,
    En,
}

impl Locale {
    pub const SUPPORTED: [Locale; 2] = [Locale::Pl, Locale::En];

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::Pl => "pl",
            Locale::En => "en",
        }
    }

    /// Pick a locale from a system language tag such as `en_US.UTF-8`.
    /// Unsupported or missing tags fall back to Polish.
    pub fn detect(lang: Option<&str>) -> Locale {
        lang.and_then(|tag| tag.get(..2))
            .and_then(|prefix| prefix.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pl" => Ok(Locale::Pl),
            "en" => Ok(Locale::En),
            other => Err(SessionError::InvalidPreference(format!(
                "unsupported locale '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(&self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(SessionError::InvalidPreference(format!(
                "unsupported theme '{}'",
                other
            ))),
        }
    }
}

/// Reads and writes UI preferences through the shared key-value store.
/// Unsupported stored values are treated as unset.
pub struct Preferences {
    storage: Arc<dyn KeyValueStore>,
}

impl Preferences {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Stored locale, or one detected from `LANG` when none is stored.
    pub async fn locale(&self) -> Result<Locale> {
        if let Some(stored) = self.storage.get(LOCALE_KEY).await? {
            match stored.parse() {
                Ok(locale) => return Ok(locale),
                Err(_) => debug!("Ignoring stored locale '{}'", stored),
            }
        }
        Ok(Locale::detect(std::env::var("LANG").ok().as_deref()))
    }

    pub async fn set_locale(&self, locale: Locale) -> Result<()> {
        self.storage.set(LOCALE_KEY, locale.as_str()).await
    }

    pub async fn theme(&self) -> Result<Theme> {
        let stored = self.storage.get(THEME_KEY).await?;
        Ok(stored.and_then(|s| s.parse().ok()).unwrap_or_default())
    }

    pub async fn set_theme(&self, theme: Theme) -> Result<()> {
        self.storage.set(THEME_KEY, theme.as_str()).await
    }

    /// Flip between light and dark; returns the new theme.
    pub async fn toggle_theme(&self) -> Result<Theme> {
        let theme = self.theme().await?.toggled();
        self.set_theme(theme).await?;
        Ok(theme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_locale_detect() {
        assert_eq!(Locale::detect(Some("en_US.UTF-8")), Locale::En);
        assert_eq!(Locale::detect(Some("pl_PL.UTF-8")), Locale::Pl);
        assert_eq!(Locale::detect(Some("de_DE.UTF-8")), Locale::Pl);
        assert_eq!(Locale::detect(Some("C")), Locale::Pl);
        assert_eq!(Locale::detect(None), Locale::Pl);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("fr".parse::<Locale>().is_err());
        assert!("blue".parse::<Theme>().is_err());
        assert_eq!("DARK".parse::<Theme>().unwrap(), Theme::Dark);
    }

    #[tokio::test]
    async fn test_theme_defaults_and_toggle() {
        let store = MemoryStore::new();
        let prefs = Preferences::new(Arc::new(store.clone()));

        assert_eq!(prefs.theme().await.unwrap(), Theme::Light);
        assert_eq!(prefs.toggle_theme().await.unwrap(), Theme::Dark);
        assert_eq!(store.peek(THEME_KEY), Some("dark".to_string()));
        assert_eq!(prefs.toggle_theme().await.unwrap(), Theme::Light);
    }

    #[tokio::test]
    async fn test_unsupported_stored_theme_is_ignored() {
        let store = MemoryStore::new();
        store.set(THEME_KEY, "sepia").await.unwrap();
        let prefs = Preferences::new(Arc::new(store));

        assert_eq!(prefs.theme().await.unwrap(), Theme::Light);
    }

    #[tokio::test]
    async fn test_stored_locale_wins() {
        let store = MemoryStore::new();
        let prefs = Preferences::new(Arc::new(store));

        prefs.set_locale(Locale::En).await.unwrap();
        assert_eq!(prefs.locale().await.unwrap(), Locale::En);
    }
}
