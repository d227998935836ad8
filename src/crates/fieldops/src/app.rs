//! Application root: builds the services once and wires them together

use crate::config::FieldopsConfig;
use crate::Result;
use fieldops_chat::{ChatConnector, ChatSynchronizer, WsConnector};
use fieldops_http::{ApiClient, ReqwestTransport, Transport};
use fieldops_session::{
    AuthEndpoints, FileStore, KeyValueStore, Navigator, Preferences, RouteGuard, RouteTable,
    SessionManager, TracingNavigator,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

pub struct App {
    pub config: FieldopsConfig,
    pub api: Arc<ApiClient>,
    pub session: Arc<SessionManager>,
    pub guard: RouteGuard,
    pub chat: Arc<ChatSynchronizer>,
    pub preferences: Preferences,
}

impl App {
    /// Production wiring: reqwest transport, file storage, WebSocket chat.
    pub fn build(config: FieldopsConfig) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(config.client_config())?);
        let storage = Arc::new(FileStore::new(config.storage_path()));
        debug!("Using storage {}", config.storage_path().display());

        Ok(Self::with_parts(
            config,
            transport,
            storage,
            Arc::new(TracingNavigator),
            Arc::new(WsConnector::new()),
        ))
    }

    /// Wire the services over the given collaborators.
    pub fn with_parts(
        config: FieldopsConfig,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
        connector: Arc<dyn ChatConnector>,
    ) -> Self {
        let api = Arc::new(ApiClient::new(transport));
        let session = SessionManager::new(
            api.clone(),
            storage.clone(),
            navigator.clone(),
            AuthEndpoints::default(),
        );
        let guard = RouteGuard::new(session.clone(), navigator, RouteTable::default());
        let chat = ChatSynchronizer::new(
            api.clone(),
            session.clone(),
            connector,
            config.chat_config(),
        );
        let preferences = Preferences::new(storage);

        Self {
            config,
            api,
            session,
            guard,
            chat,
            preferences,
        }
    }

    /// Restore the persisted session. The returned handle finishes once the
    /// profile fetch is done.
    pub async fn start(&self) -> Result<Option<JoinHandle<()>>> {
        Ok(self.session.initialize().await?)
    }

    /// [`App::start`] and wait for the profile.
    pub async fn start_and_wait(&self) -> Result<()> {
        if let Some(handle) = self.start().await? {
            if let Err(e) = handle.await {
                debug!("Profile task ended abnormally: {}", e);
            }
        }
        Ok(())
    }
}
