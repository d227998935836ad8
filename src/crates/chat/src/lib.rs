//! Live chat for fieldops.
//!
//! [`ChatSynchronizer`] keeps one ordered, de-duplicated timeline fed by
//! two sources: a WebSocket delivering new messages and a paginated REST
//! endpoint delivering older ones on demand.
//!
//! ```rust,ignore
//! let chat = ChatSynchronizer::new(api, session, Arc::new(WsConnector::new()), ChatConfig::default());
//! let mut events = chat.take_events().unwrap();
//! chat.connect()?;
//! chat.fetch_history().await?;
//! chat.send_message("hello")?;
//! ```

pub mod connector;
pub mod error;
pub mod message;
pub mod state;
pub mod synchronizer;
pub mod timeline;

pub use connector::{ChatConnector, ConnectionHandle, Inbound, Outbound, WsConnector};
pub use error::{ChatError, Result};
pub use message::{HistoryPage, Message, OutboundFrame, MAX_MESSAGE_CHARS};
pub use state::{ConnectionEvent, ConnectionState};
pub use synchronizer::{ChatConfig, ChatEvent, ChatSynchronizer};
pub use timeline::Timeline;
