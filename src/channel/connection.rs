use crate::types::constants::WS_CLOSE_NORMAL;
use crate::types::{OutboundMessage, RealtimeError, Result};
use crate::websocket::WsSink;
use futures::SinkExt;
use tokio::sync::RwLock;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    Closing,
    Closed,
}

/// Owns the socket write half and the state the socket reports.
pub struct ConnectionManager {
    ws_write: RwLock<Option<WsSink>>,
    state: RwLock<ConnectionState>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            ws_write: RwLock::new(None),
            state: RwLock::new(ConnectionState::Idle),
        }
    }

    /// Gets the current connection state
    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Sets the connection state
    pub async fn set_state(&self, new_state: ConnectionState) {
        let mut state = self.state.write().await;
        *state = new_state;
    }

    /// Checks if currently connected
    pub async fn is_connected(&self) -> bool {
        *self.state.read().await == ConnectionState::Open
    }

    /// Moves to `Connecting` unless a socket is already live.
    ///
    /// Returns `false` when the caller must not open another socket.
    pub async fn begin_connect(&self) -> bool {
        let mut state = self.state.write().await;
        match *state {
            ConnectionState::Idle | ConnectionState::Closed => {
                *state = ConnectionState::Connecting;
                true
            }
            ConnectionState::Connecting | ConnectionState::Open | ConnectionState::Closing => {
                false
            }
        }
    }

    /// Sets the WebSocket write sink (called after successful connection)
    pub async fn set_writer(&self, writer: WsSink) {
        let mut ws = self.ws_write.write().await;
        *ws = Some(writer);
    }

    /// Sends a message through the WebSocket connection.
    ///
    /// A failed write means the socket is gone; the state is flipped to
    /// `Closed` so the readiness poll picks it up.
    pub async fn send_message(&self, msg: &OutboundMessage) -> Result<()> {
        if !self.is_connected().await {
            return Err(RealtimeError::NotConnected);
        }

        let message = Message::Text(msg.to_frame()?);

        let mut ws_guard = self.ws_write.write().await;
        let Some(ws) = ws_guard.as_mut() else {
            return Err(RealtimeError::NotConnected);
        };

        if let Err(e) = ws.send(message).await {
            *ws_guard = None;
            drop(ws_guard);
            self.set_state(ConnectionState::Closed).await;
            return Err(e.into());
        }

        Ok(())
    }

    /// Records that the socket went away without a local close
    pub async fn mark_closed(&self) {
        self.clear_writer().await;
        self.set_state(ConnectionState::Closed).await;
    }

    /// Closes the WebSocket connection gracefully with a normal (1000) close frame
    pub async fn close(&self) -> Result<()> {
        {
            let mut state = self.state.write().await;
            match *state {
                ConnectionState::Idle | ConnectionState::Closed => return Ok(()),
                _ => *state = ConnectionState::Closing,
            }
        }

        let writer = self.ws_write.write().await.take();
        let result = match writer {
            Some(mut ws) => {
                let frame = CloseFrame {
                    code: CloseCode::from(WS_CLOSE_NORMAL),
                    reason: "".into(),
                };
                if let Err(e) = ws.send(Message::Close(Some(frame))).await {
                    tracing::debug!("Close frame not sent: {}", e);
                }
                ws.close().await.map_err(RealtimeError::from)
            }
            None => Ok(()),
        };

        self.set_state(ConnectionState::Closed).await;
        result
    }

    /// Clears the writer (used during disconnect)
    pub async fn clear_writer(&self) {
        let mut ws = self.ws_write.write().await;
        *ws = None;
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
