//! Real-time transport seam
//!
//! A [`ChatConnector`] opens one duplex connection and hands back a pair of
//! channels. Writes go through [`Outbound`]; everything the peer does comes
//! back as [`Inbound`] events, in order, ending with `Closed` or `Error`.

use crate::error::{ChatError, Result};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tracing::{debug, warn};

/// Frames queued for the writer task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    /// Send a close frame and stop writing
    Close,
}

/// What the reader task observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Text(String),
    Closed,
    Error(String),
}

/// Channels of one established connection
pub struct ConnectionHandle {
    pub outbound: mpsc::UnboundedSender<Outbound>,
    pub inbound: mpsc::UnboundedReceiver<Inbound>,
}

#[async_trait]
pub trait ChatConnector: Send + Sync {
    /// Open a connection; resolves once the handshake succeeded.
    async fn connect(&self, url: &str) -> Result<ConnectionHandle>;
}

/// WebSocket connector over `tokio-tungstenite`
#[derive(Debug, Default, Clone)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChatConnector for WsConnector {
    async fn connect(&self, url: &str) -> Result<ConnectionHandle> {
        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| ChatError::Connection(format!("WebSocket handshake failed: {}", e)))?;

        let (mut write, mut read) = ws_stream.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Outbound>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<Inbound>();

        // Writer: drains the outbound queue until Close or all senders drop
        tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                match frame {
                    Outbound::Text(text) => {
                        if let Err(e) = write.send(WsMessage::Text(text)).await {
                            warn!("WebSocket write failed: {}", e);
                            return;
                        }
                    }
                    Outbound::Close => break,
                }
            }
            if let Err(e) = write.send(WsMessage::Close(None)).await {
                debug!("Close frame not sent: {}", e);
            }
        });

        // Reader
        tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(WsMessage::Text(text)) => {
                        if in_tx.send(Inbound::Text(text)).is_err() {
                            return;
                        }
                    }
                    Ok(WsMessage::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        let _ = in_tx.send(Inbound::Error(e.to_string()));
                        return;
                    }
                }
            }
            let _ = in_tx.send(Inbound::Closed);
        });

        Ok(ConnectionHandle {
            outbound: out_tx,
            inbound: in_rx,
        })
    }
}
