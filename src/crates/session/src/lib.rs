//! Session management for fieldops.
//!
//! The [`SessionManager`] owns the access token and the current user, keeps
//! the API client's bearer credential in step with them, and logs the user
//! out whenever the server answers `401`. The [`RouteGuard`] decides which
//! screens the current session may enter.
//!
//! ```rust,ignore
//! let api = Arc::new(ApiClient::new(Arc::new(ReqwestTransport::new(config)?)));
//! let storage = Arc::new(FileStore::new(FileStore::default_path()));
//! let session = SessionManager::new(api, storage, navigator, AuthEndpoints::default());
//! session.initialize().await?;
//! session.login("alice", "secret").await?;
//! ```

pub mod error;
pub mod guard;
pub mod manager;
pub mod navigation;
pub mod preferences;
pub mod profile;
pub mod storage;

pub use error::{Result, SessionError};
pub use guard::{GuardDecision, Route, RouteGuard, RouteMeta, RouteTable};
pub use manager::{
    AuthEndpoints, SessionManager, SessionSnapshot, LOGIN_FAILED_MESSAGE, REGISTER_FAILED_MESSAGE,
    SESSION_ENDED_MESSAGE,
};
pub use navigation::{
    NavigationKind, NavigationTarget, Navigator, RecordingNavigator, RouteName, TracingNavigator,
};
pub use preferences::{Locale, Preferences, Theme};
pub use profile::{LoginRequest, RegisterRequest, TechnicianProfile, TokenResponse, UserProfile};
pub use storage::{
    FileStore, KeyValueStore, MemoryStore, ACCESS_TOKEN_KEY, LOCALE_KEY, THEME_KEY,
};
