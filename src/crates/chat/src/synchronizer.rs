//! Chat synchronizer
//!
//! Merges the live connection and the paginated history endpoint into one
//! timeline. Connection tasks and history requests are tagged with the
//! connection id / reset epoch they started under, so results that land
//! after a reconnect or a session reset are dropped.

use crate::connector::{ChatConnector, ConnectionHandle, Inbound, Outbound};
use crate::error::{ChatError, Result};
use crate::message::{HistoryPage, Message, OutboundFrame};
use crate::state::{ConnectionEvent, ConnectionState};
use crate::timeline::Timeline;
use fieldops_http::{ApiClient, ApiRequest};
use fieldops_session::SessionManager;
use parking_lot::Mutex;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Endpoints and paging for the chat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// WebSocket endpoint, without the token
    pub ws_url: String,
    /// History endpoint relative to the API base
    pub messages_path: String,
    pub history_page_size: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://localhost:8000/ws/chat/".to_string(),
            messages_path: "messages/".to_string(),
            history_page_size: 20,
        }
    }
}

impl ChatConfig {
    /// First history page requested after a reset
    pub fn initial_cursor(&self) -> String {
        format!("{}?limit={}", self.messages_path, self.history_page_size)
    }

    /// `ws_url` with the access token as `token` query parameter
    pub fn connection_url(&self, token: &str) -> Result<String> {
        let mut url = Url::parse(&self.ws_url)
            .map_err(|e| ChatError::InvalidUrl(format!("{}: {}", self.ws_url, e)))?;
        url.query_pairs_mut().append_pair("token", token);
        Ok(url.to_string())
    }
}

/// Timeline and connection changes, delivered in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    StateChanged(ConnectionState),
    MessageReceived(Message),
    HistoryLoaded { added: usize, has_more: bool },
}

struct ChatInner {
    state: ConnectionState,
    outbound: Option<mpsc::UnboundedSender<Outbound>>,
    connection_id: u64,
    timeline: Timeline,
    next_cursor: Option<String>,
    is_loading_history: bool,
    epoch: u64,
}

pub struct ChatSynchronizer {
    api: Arc<ApiClient>,
    session: Arc<SessionManager>,
    connector: Arc<dyn ChatConnector>,
    config: ChatConfig,
    inner: Mutex<ChatInner>,
    state_tx: watch::Sender<ConnectionState>,
    // Present only while a subscriber holds the receiver
    events_tx: Mutex<Option<mpsc::UnboundedSender<ChatEvent>>>,
}

impl ChatSynchronizer {
    pub fn new(
        api: Arc<ApiClient>,
        session: Arc<SessionManager>,
        connector: Arc<dyn ChatConnector>,
        config: ChatConfig,
    ) -> Arc<Self> {
        let (state_tx, _) = watch::channel(ConnectionState::Absent);
        let inner = ChatInner {
            state: ConnectionState::Absent,
            outbound: None,
            connection_id: 0,
            timeline: Timeline::new(),
            next_cursor: Some(config.initial_cursor()),
            is_loading_history: false,
            epoch: 0,
        };

        Arc::new(Self {
            api,
            session,
            connector,
            config,
            inner: Mutex::new(inner),
            state_tx,
            events_tx: Mutex::new(None),
        })
    }

    /// Open the live connection. A no-op, leaving the timeline untouched,
    /// while connecting, open or closing. Otherwise resets the timeline and
    /// history cursor before connecting.
    pub fn connect(self: &Arc<Self>) -> Result<()> {
        let (connection_id, url) = {
            let mut inner = self.inner.lock();
            if inner.state.transition(ConnectionEvent::Connect).is_none() {
                debug!("Chat is {}, ignoring connect", inner.state);
                return Ok(());
            }

            self.reset(&mut inner);

            let token = match self.session.access_token() {
                Some(token) => token,
                None => {
                    error!("Cannot connect chat: no access token");
                    return Err(ChatError::NotAuthenticated);
                }
            };
            let url = self.config.connection_url(&token)?;

            if !self.apply(&mut inner, ConnectionEvent::Connect) {
                return Ok(());
            }
            inner.connection_id += 1;
            (inner.connection_id, url)
        };

        info!("Connecting chat to {}", self.config.ws_url);
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run_connection(connection_id, url).await });
        Ok(())
    }

    /// Close the live connection. The state moves to `Closing` and to
    /// `Closed` once the peer acknowledges.
    pub fn disconnect(&self) {
        let mut inner = self.inner.lock();
        if !self.apply(&mut inner, ConnectionEvent::Disconnect) {
            debug!("Chat not connected, nothing to disconnect");
            return;
        }
        if let Some(outbound) = inner.outbound.as_ref() {
            let _ = outbound.send(Outbound::Close);
        }
        info!("Disconnecting chat");
    }

    /// Send a message over the open connection. Content is trimmed and
    /// must be 1 to 1024 characters long. Nothing is queued.
    pub fn send_message(&self, content: &str) -> Result<()> {
        let frame = OutboundFrame::new(content)?;
        let text = serde_json::to_string(&frame)?;

        let inner = self.inner.lock();
        let outbound = match (inner.state.is_open(), inner.outbound.as_ref()) {
            (true, Some(outbound)) => outbound,
            _ => {
                error!("Cannot send message, chat connection is {}", inner.state);
                return Err(ChatError::NotConnected);
            }
        };
        outbound
            .send(Outbound::Text(text))
            .map_err(|_| ChatError::NotConnected)
    }

    /// Load the next older history page and prepend it. Concurrent calls
    /// and calls after the last page are ignored. Returns how many
    /// messages were added.
    pub async fn fetch_history(&self) -> Result<usize> {
        let (cursor, epoch) = {
            let mut inner = self.inner.lock();
            if inner.is_loading_history {
                debug!("History already loading");
                return Ok(0);
            }
            let cursor = match inner.next_cursor.clone() {
                Some(cursor) => cursor,
                None => return Ok(0),
            };
            inner.is_loading_history = true;
            (cursor, inner.epoch)
        };

        debug!("Fetching chat history from {}", cursor);
        let result = self.api.send(ApiRequest::get(&cursor)).await;

        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            debug!("Discarding history page from before a reset");
            return Ok(0);
        }
        inner.is_loading_history = false;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                error!("Failed to fetch message history: {}", e);
                return Err(e.into());
            }
        };

        let page = match HistoryPage::parse(&response.body) {
            Ok(page) => page,
            Err(e) => {
                warn!("Received invalid response from message history API: {}", e);
                inner.next_cursor = None;
                return Ok(0);
            }
        };

        let results: Vec<Message> = page
            .results
            .into_iter()
            .filter(|m| {
                let valid = m.has_valid_id();
                if !valid {
                    warn!("Dropping history message with invalid id {}", m.id);
                }
                valid
            })
            .collect();
        let received = results.len();
        let added = inner.timeline.prepend_page(results);
        if added < received {
            debug!("Skipped {} already known messages", received - added);
        }

        inner.next_cursor = page.next;
        let has_more = inner.next_cursor.is_some();
        self.emit(ChatEvent::HistoryLoaded { added, has_more });
        Ok(added)
    }

    /// Empty the timeline and rewind the history cursor.
    pub fn clear_chat_state(&self) {
        let mut inner = self.inner.lock();
        self.reset(&mut inner);
    }

    /// Disconnect and clear whenever the session logs out.
    pub fn follow_session(self: &Arc<Self>) -> JoinHandle<()> {
        let mut updates = self.session.subscribe();
        let this = Arc::clone(self);

        tokio::spawn(async move {
            let mut authenticated = updates.borrow_and_update().authenticated;
            while updates.changed().await.is_ok() {
                let now = updates.borrow_and_update().authenticated;
                if authenticated && !now {
                    info!("Session ended, closing chat");
                    this.disconnect();
                    this.clear_chat_state();
                }
                authenticated = now;
            }
        })
    }

    /// Subscribe to the event stream. Events start flowing from this call
    /// on; `None` while another subscriber still holds its receiver.
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<ChatEvent>> {
        let mut events_tx = self.events_tx.lock();
        if events_tx.as_ref().is_some_and(|tx| !tx.is_closed()) {
            return None;
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *events_tx = Some(tx);
        Some(rx)
    }

    /// Watch connection state changes.
    pub fn state_updates(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Wait until the connection state satisfies `pred`.
    pub async fn wait_for_state<F>(&self, pred: F) -> ConnectionState
    where
        F: Fn(ConnectionState) -> bool,
    {
        let mut updates = self.state_updates();
        let result = match updates.wait_for(|s| pred(*s)).await {
            Ok(state) => *state,
            Err(_) => self.state(),
        };
        result
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.lock().state
    }

    pub fn messages(&self) -> Vec<Message> {
        self.inner.lock().timeline.messages().to_vec()
    }

    pub fn next_cursor(&self) -> Option<String> {
        self.inner.lock().next_cursor.clone()
    }

    pub fn has_more_history(&self) -> bool {
        self.inner.lock().next_cursor.is_some()
    }

    pub fn is_loading_history(&self) -> bool {
        self.inner.lock().is_loading_history
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    async fn run_connection(self: Arc<Self>, connection_id: u64, url: String) {
        let handle = match self.connector.connect(&url).await {
            Ok(handle) => handle,
            Err(e) => {
                error!("Chat connection failed: {}", e);
                let mut inner = self.inner.lock();
                if inner.connection_id == connection_id {
                    self.apply(&mut inner, ConnectionEvent::Failed);
                }
                return;
            }
        };
        let ConnectionHandle {
            outbound,
            mut inbound,
        } = handle;

        {
            let mut inner = self.inner.lock();
            if inner.connection_id != connection_id {
                let _ = outbound.send(Outbound::Close);
                return;
            }
            match inner.state {
                ConnectionState::Connecting => {
                    inner.outbound = Some(outbound);
                    self.apply(&mut inner, ConnectionEvent::Accepted);
                    info!("Chat connected");
                }
                ConnectionState::Closing => {
                    // disconnect() arrived during the handshake
                    let _ = outbound.send(Outbound::Close);
                }
                _ => {
                    let _ = outbound.send(Outbound::Close);
                    return;
                }
            }
        }

        while let Some(event) = inbound.recv().await {
            match event {
                Inbound::Text(text) => self.handle_frame(connection_id, &text),
                Inbound::Closed => break,
                Inbound::Error(e) => {
                    error!("Chat connection error: {}", e);
                    break;
                }
            }
        }

        let mut inner = self.inner.lock();
        if inner.connection_id == connection_id {
            let event = if inner.state == ConnectionState::Closing {
                ConnectionEvent::CloseAck
            } else {
                ConnectionEvent::RemoteClosed
            };
            self.apply(&mut inner, event);
            info!("Chat connection closed");
        }
    }

    fn handle_frame(&self, connection_id: u64, text: &str) {
        let message = match Message::parse_frame(text) {
            Ok(message) => message,
            Err(e) => {
                error!("Failed to parse incoming message: {}", e);
                return;
            }
        };

        let mut inner = self.inner.lock();
        if inner.connection_id != connection_id {
            return;
        }
        let id = message.id;
        if inner.timeline.append(message.clone()) {
            self.emit(ChatEvent::MessageReceived(message));
        } else {
            debug!("Ignoring duplicate message {}", id);
        }
    }

    /// Deliver to the subscriber, if any. Nothing is buffered without one.
    fn emit(&self, event: ChatEvent) {
        let mut events_tx = self.events_tx.lock();
        let delivered = match events_tx.as_ref() {
            Some(tx) => tx.send(event).is_ok(),
            None => return,
        };
        if !delivered {
            debug!("Chat event subscriber gone");
            *events_tx = None;
        }
    }

    fn reset(&self, inner: &mut ChatInner) {
        inner.timeline.clear();
        inner.next_cursor = Some(self.config.initial_cursor());
        inner.is_loading_history = false;
        inner.epoch += 1;
    }

    fn apply(&self, inner: &mut ChatInner, event: ConnectionEvent) -> bool {
        match inner.state.transition(event) {
            Some(next) => {
                debug!("Chat {} --{:?}--> {}", inner.state, event, next);
                inner.state = next;
                if next == ConnectionState::Closed {
                    inner.outbound = None;
                }
                self.state_tx.send_replace(next);
                self.emit(ChatEvent::StateChanged(next));
                true
            }
            None => {
                debug!("Chat ignoring {:?} while {}", event, inner.state);
                false
            }
        }
    }
}
