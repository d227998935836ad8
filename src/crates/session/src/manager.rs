//! Session manager
//!
//! Owns the access token and the current user profile, keeps the API
//! client's default credential in step with them and publishes a
//! [`SessionSnapshot`] after every change.

use crate::error::{Result, SessionError};
use crate::navigation::{NavigationTarget, Navigator, RouteName};
use crate::profile::{LoginRequest, RegisterRequest, TokenResponse, UserProfile};
use crate::storage::{KeyValueStore, ACCESS_TOKEN_KEY};
use async_trait::async_trait;
use fieldops_http::{ApiClient, ApiRequest, UnauthorizedHandler};
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Shown when a failed login carries no usable server message
pub const LOGIN_FAILED_MESSAGE: &str = "Invalid username or password.";

/// Shown when the session is invalidated while a login completes
pub const SESSION_ENDED_MESSAGE: &str = "Session ended, please log in again.";

/// Shown when a failed registration carries no usable server message
pub const REGISTER_FAILED_MESSAGE: &str = "Registration failed.";

/// Relative paths of the authentication endpoints
#[derive(Debug, Clone)]
pub struct AuthEndpoints {
    pub login: String,
    pub register: String,
    pub profile: String,
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            login: "login/".to_string(),
            register: "register/".to_string(),
            profile: "users/me/".to_string(),
        }
    }
}

/// Observable view of the session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub authenticated: bool,
    pub user: Option<UserProfile>,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct SessionState {
    access_token: Option<String>,
    user: Option<UserProfile>,
    error: Option<String>,
    // Bumped whenever the token changes; stale profile fetches compare it
    generation: u64,
}

impl SessionState {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            authenticated: self.access_token.is_some(),
            user: self.user.clone(),
            error: self.error.clone(),
        }
    }
}

/// Process-wide session. Construct once at startup and share the `Arc`.
pub struct SessionManager {
    api: Arc<ApiClient>,
    storage: Arc<dyn KeyValueStore>,
    navigator: Arc<dyn Navigator>,
    endpoints: AuthEndpoints,
    state: RwLock<SessionState>,
    updates: watch::Sender<SessionSnapshot>,
}

impl SessionManager {
    /// Create the session and register it as the API client's 401 handler.
    pub fn new(
        api: Arc<ApiClient>,
        storage: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
        endpoints: AuthEndpoints,
    ) -> Arc<Self> {
        let (updates, _) = watch::channel(SessionSnapshot::default());
        let manager = Arc::new(Self {
            api,
            storage,
            navigator,
            endpoints,
            state: RwLock::new(SessionState::default()),
            updates,
        });

        manager
            .api
            .set_unauthorized_handler(Arc::new(LogoutOnUnauthorized {
                session: Arc::downgrade(&manager),
            }));

        manager
    }

    /// Restore a persisted token. When one exists it becomes the default
    /// credential and the profile is fetched on a background task, whose
    /// handle is returned. Profile failures are logged only.
    pub async fn initialize(self: &Arc<Self>) -> Result<Option<JoinHandle<()>>> {
        let token = match self.storage.get(ACCESS_TOKEN_KEY).await? {
            Some(token) if !token.is_empty() => token,
            _ => {
                debug!("No persisted access token");
                return Ok(None);
            }
        };

        {
            let mut state = self.state.write();
            state.access_token = Some(token.clone());
            state.user = None;
            state.generation += 1;
        }
        self.api.set_bearer(token);
        self.publish();
        info!("Restored persisted session");

        let session = Arc::clone(self);
        Ok(Some(tokio::spawn(async move {
            if let Err(e) = session.fetch_user().await {
                warn!("Failed to load user profile: {}", e);
            }
        })))
    }

    /// Exchange credentials for an access token.
    ///
    /// On success the token is persisted and installed, the profile is
    /// loaded and the user lands on `home`. On failure `error` holds a
    /// display string and the token state is unchanged. If the new token is
    /// rejected while the profile loads, the session is already logged out
    /// and the login fails.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response: TokenResponse = match self.api.post(&self.endpoints.login, &request).await
        {
            Ok(response) => response,
            Err(e) => {
                let message = e.user_message(LOGIN_FAILED_MESSAGE);
                warn!("Login failed for {}: {}", username, message);
                self.set_error(Some(message));
                return Err(e.into());
            }
        };

        self.storage.set(ACCESS_TOKEN_KEY, &response.access).await?;
        let generation = {
            let mut state = self.state.write();
            state.access_token = Some(response.access.clone());
            state.user = None;
            state.error = None;
            state.generation += 1;
            state.generation
        };
        self.api.set_bearer(response.access);
        self.publish();
        info!("Logged in as {}", username);

        let fetched = self.fetch_user().await;

        // A 401 on the profile request already logged out and redirected
        if self.state.read().generation != generation {
            warn!("Session for {} ended while loading the profile", username);
            self.set_error(Some(SESSION_ENDED_MESSAGE.to_string()));
            return Err(match fetched {
                Err(e) => e,
                Ok(_) => SessionError::NotAuthenticated,
            });
        }
        if let Err(e) = fetched {
            warn!("Failed to load user profile after login: {}", e);
        }

        self.navigator.push(NavigationTarget::route(RouteName::Home));
        Ok(())
    }

    /// Create an account. Field errors are flattened into `error`.
    pub async fn register(&self, request: &RegisterRequest) -> Result<()> {
        let outcome = match ApiRequest::post_json(&self.endpoints.register, request) {
            Ok(req) => self.api.send(req).await.map(|_| ()),
            Err(e) => Err(e),
        };

        if let Err(e) = outcome {
            let message = e.flattened_message(REGISTER_FAILED_MESSAGE);
            warn!("Registration failed for {}: {}", request.username, message);
            self.set_error(Some(message));
            return Err(e.into());
        }

        self.set_error(None);
        info!("Registered {}", request.username);
        self.navigator.push(NavigationTarget::route(RouteName::Login));
        Ok(())
    }

    /// Refresh the profile. Returns `None` without a token, or when the
    /// token changed while the request was in flight.
    pub async fn fetch_user(&self) -> Result<Option<UserProfile>> {
        let generation = {
            let state = self.state.read();
            if state.access_token.is_none() {
                return Ok(None);
            }
            state.generation
        };

        let profile: UserProfile = self.api.get(&self.endpoints.profile).await?;

        {
            let mut state = self.state.write();
            if state.generation != generation || state.access_token.is_none() {
                debug!("Discarding profile fetched for a previous session");
                return Ok(None);
            }
            state.user = Some(profile.clone());
        }
        self.publish();
        debug!("Loaded profile for {}", profile.username);

        Ok(Some(profile))
    }

    /// End the session and hard-navigate to `login`.
    ///
    /// Memory and the API credential are cleared before the first await, so
    /// requests issued concurrently already go out without a token.
    pub async fn logout(&self) {
        {
            let mut state = self.state.write();
            state.access_token = None;
            state.user = None;
            state.error = None;
            state.generation += 1;
        }
        self.api.clear_bearer();
        self.publish();

        if let Err(e) = self.storage.remove(ACCESS_TOKEN_KEY).await {
            warn!("Failed to remove persisted token: {}", e);
        }

        info!("Logged out");
        self.navigator
            .hard_redirect(NavigationTarget::route(RouteName::Login));
    }

    /// Like [`SessionManager::fetch_user`] but fails without a token.
    pub async fn require_user(&self) -> Result<UserProfile> {
        if let Some(user) = self.user() {
            return Ok(user);
        }
        self.fetch_user()
            .await?
            .ok_or(SessionError::NotAuthenticated)
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().access_token.is_some()
    }

    pub fn is_activated(&self) -> bool {
        self.state
            .read()
            .user
            .as_ref()
            .map(UserProfile::is_activated)
            .unwrap_or(false)
    }

    pub fn is_admin(&self) -> bool {
        self.state
            .read()
            .user
            .as_ref()
            .map(UserProfile::is_admin)
            .unwrap_or(false)
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.state.read().user.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.state.read().error.clone()
    }

    /// Current token, for collaborators that authenticate out of band
    /// (the chat connection).
    pub fn access_token(&self) -> Option<String> {
        self.state.read().access_token.clone()
    }

    /// Clear the last login/registration failure.
    pub fn clear_error(&self) {
        self.set_error(None);
    }

    /// Receive a snapshot after every session change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.updates.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.read().snapshot()
    }

    fn set_error(&self, error: Option<String>) {
        self.state.write().error = error;
        self.publish();
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        self.updates.send_replace(snapshot);
    }
}

/// Bridges the API client's 401 hook to [`SessionManager::logout`].
struct LogoutOnUnauthorized {
    session: Weak<SessionManager>,
}

#[async_trait]
impl UnauthorizedHandler for LogoutOnUnauthorized {
    async fn on_unauthorized(&self) {
        if let Some(session) = self.session.upgrade() {
            session.logout().await;
        }
    }
}
