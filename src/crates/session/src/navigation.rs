//! Navigation collaborator
//!
//! The session never renders anything; it tells a [`Navigator`] where the
//! user should go. `push` is an in-app transition, `hard_redirect` a full
//! reload that drops every piece of per-session state.

use parking_lot::Mutex;
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Screens the application knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteName {
    Login,
    Register,
    Home,
    Devices,
    Clients,
    Tickets,
    Technicians,
    Certifications,
    Reports,
    Chat,
    Company,
    Settings,
    Unauthorized,
}

impl RouteName {
    pub const ALL: [RouteName; 13] = [
        RouteName::Login,
        RouteName::Register,
        RouteName::Home,
        RouteName::Devices,
        RouteName::Clients,
        RouteName::Tickets,
        RouteName::Technicians,
        RouteName::Certifications,
        RouteName::Reports,
        RouteName::Chat,
        RouteName::Company,
        RouteName::Settings,
        RouteName::Unauthorized,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteName::Login => "login",
            RouteName::Register => "register",
            RouteName::Home => "home",
            RouteName::Devices => "devices",
            RouteName::Clients => "clients",
            RouteName::Tickets => "tickets",
            RouteName::Technicians => "technicians",
            RouteName::Certifications => "certifications",
            RouteName::Reports => "reports",
            RouteName::Chat => "chat",
            RouteName::Company => "company",
            RouteName::Settings => "settings",
            RouteName::Unauthorized => "unauthorized",
        }
    }
}

impl fmt::Display for RouteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RouteName::ALL
            .iter()
            .copied()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown route name: {}", s))
    }
}

/// Where to go, plus the path to return to after login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTarget {
    pub route: RouteName,
    pub redirect: Option<String>,
}

impl NavigationTarget {
    pub fn route(route: RouteName) -> Self {
        Self {
            route,
            redirect: None,
        }
    }

    pub fn with_redirect(mut self, path: impl Into<String>) -> Self {
        self.redirect = Some(path.into());
        self
    }
}

impl fmt::Display for NavigationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.redirect {
            Some(path) => write!(f, "{} (redirect={})", self.route, path),
            None => write!(f, "{}", self.route),
        }
    }
}

/// Soft or hard transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    Soft,
    Hard,
}

/// Routing collaborator consumed by the session and the route guard
pub trait Navigator: Send + Sync {
    /// In-app route change
    fn push(&self, target: NavigationTarget);

    /// Full reload to `target`; no reactive state survives it
    fn hard_redirect(&self, target: NavigationTarget);
}

/// Navigator that only logs, used by the command-line front end
#[derive(Debug, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn push(&self, target: NavigationTarget) {
        info!("Navigate to {}", target);
    }

    fn hard_redirect(&self, target: NavigationTarget) {
        info!("Hard redirect to {}", target);
    }
}

/// Navigator that keeps the full history
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    history: Mutex<Vec<(NavigationKind, NavigationTarget)>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<(NavigationKind, NavigationTarget)> {
        self.history.lock().clone()
    }

    pub fn last(&self) -> Option<(NavigationKind, NavigationTarget)> {
        self.history.lock().last().cloned()
    }

    pub fn clear(&self) {
        self.history.lock().clear();
    }
}

impl Navigator for RecordingNavigator {
    fn push(&self, target: NavigationTarget) {
        self.history.lock().push((NavigationKind::Soft, target));
    }

    fn hard_redirect(&self, target: NavigationTarget) {
        self.history.lock().push((NavigationKind::Hard, target));
    }
}
