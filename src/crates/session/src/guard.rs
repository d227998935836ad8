//! Route table and navigation guard

use crate::error::{Result, SessionError};
use crate::manager::SessionManager;
use crate::navigation::{NavigationTarget, Navigator, RouteName};
use std::sync::Arc;
use tracing::{debug, warn};

/// Access requirements attached to a route
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub requires_auth: bool,
    pub requires_admin: bool,
    /// Only reachable while logged out (login, register)
    pub auth_only: bool,
}

impl RouteMeta {
    pub fn public() -> Self {
        Self::default()
    }

    pub fn authenticated() -> Self {
        Self {
            requires_auth: true,
            ..Self::default()
        }
    }

    pub fn admin() -> Self {
        Self {
            requires_auth: true,
            requires_admin: true,
            auth_only: false,
        }
    }

    pub fn guest() -> Self {
        Self {
            auth_only: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub name: RouteName,
    pub path: String,
    pub meta: RouteMeta,
}

impl Route {
    pub fn new(name: RouteName, path: impl Into<String>, meta: RouteMeta) -> Self {
        Self {
            name,
            path: path.into(),
            meta,
        }
    }

    fn matches(&self, path: &str) -> bool {
        if self.path == "/" {
            return path == "/";
        }
        path == self.path || path.starts_with(&format!("{}/", self.path))
    }
}

/// Known routes, looked up by name or path
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn by_name(&self, name: RouteName) -> Option<&Route> {
        self.routes.iter().find(|r| r.name == name)
    }

    /// Exact match first, then the route owning the path prefix
    /// (`/tickets/12` belongs to `tickets`).
    pub fn by_path(&self, path: &str) -> Option<&Route> {
        let path = normalize_path(path);
        self.routes
            .iter()
            .filter(|r| r.matches(&path))
            .max_by_key(|r| r.path.len())
    }

    /// Resolve either a route name or a path.
    pub fn resolve(&self, name_or_path: &str) -> Result<&Route> {
        let found = if name_or_path.starts_with('/') {
            self.by_path(name_or_path)
        } else {
            name_or_path
                .parse::<RouteName>()
                .ok()
                .and_then(|name| self.by_name(name))
        };
        found.ok_or_else(|| SessionError::UnknownRoute(name_or_path.to_string()))
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        use RouteName::*;

        Self::new(vec![
            Route::new(Login, "/login", RouteMeta::guest()),
            Route::new(Register, "/register", RouteMeta::guest()),
            Route::new(Home, "/", RouteMeta::authenticated()),
            Route::new(Devices, "/devices", RouteMeta::authenticated()),
            Route::new(Clients, "/clients", RouteMeta::authenticated()),
            Route::new(Tickets, "/tickets", RouteMeta::authenticated()),
            Route::new(Technicians, "/technicians", RouteMeta::authenticated()),
            Route::new(Certifications, "/certifications", RouteMeta::authenticated()),
            Route::new(Reports, "/reports", RouteMeta::authenticated()),
            Route::new(Chat, "/chat", RouteMeta::authenticated()),
            Route::new(Company, "/company", RouteMeta::admin()),
            Route::new(Settings, "/settings", RouteMeta::admin()),
            Route::new(Unauthorized, "/unauthorized", RouteMeta::public()),
        ])
    }
}

fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or("");
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// Outcome of a guard check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(NavigationTarget),
}

/// Gates navigation on the session state
pub struct RouteGuard {
    session: Arc<SessionManager>,
    navigator: Arc<dyn Navigator>,
    routes: RouteTable,
}

impl RouteGuard {
    pub fn new(
        session: Arc<SessionManager>,
        navigator: Arc<dyn Navigator>,
        routes: RouteTable,
    ) -> Self {
        Self {
            session,
            navigator,
            routes,
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Decide whether `route` may be entered. `full_path` is what the user
    /// asked for and is carried along when redirecting to login.
    pub async fn check(&self, route: &Route, full_path: &str) -> GuardDecision {
        let authenticated = self.session.is_authenticated();

        if authenticated && route.meta.auth_only {
            debug!("{} is for guests only, redirecting home", route.name);
            return GuardDecision::Redirect(NavigationTarget::route(RouteName::Home));
        }

        if route.meta.requires_auth && !authenticated {
            debug!("{} requires login", route.name);
            return GuardDecision::Redirect(
                NavigationTarget::route(RouteName::Login).with_redirect(full_path),
            );
        }

        if route.meta.requires_admin {
            if self.session.user().is_none() {
                if let Err(e) = self.session.fetch_user().await {
                    warn!("Profile load during route check failed: {}", e);
                }
            }
            if !self.session.is_admin() {
                debug!("{} requires an administrator", route.name);
                return GuardDecision::Redirect(NavigationTarget::route(RouteName::Unauthorized));
            }
        }

        GuardDecision::Allow
    }

    /// Resolve `name_or_path`, run the guard and hand the result to the
    /// navigator.
    pub async fn navigate(&self, name_or_path: &str) -> Result<GuardDecision> {
        let route = self.routes.resolve(name_or_path)?.clone();
        let full_path = if name_or_path.starts_with('/') {
            name_or_path.to_string()
        } else {
            route.path.clone()
        };

        let decision = self.check(&route, &full_path).await;
        match &decision {
            GuardDecision::Allow => self.navigator.push(NavigationTarget::route(route.name)),
            GuardDecision::Redirect(target) => self.navigator.push(target.clone()),
        }

        Ok(decision)
    }
}
