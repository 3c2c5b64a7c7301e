use super::{
    ChannelState, ChannelStatus, ConnectionManager, ConnectionState, RealtimeChannelBuilder,
    RealtimeChannelOptions, StatusNotifier,
};
use crate::endpoint::EndpointConfig;
use crate::infrastructure::{HeartbeatManager, LivenessMonitor};
use crate::messaging::MessageRouter;
use crate::types::{InboundMessage, Result};
use crate::websocket::{Connector, Transport, WsStream};
use futures::{SinkExt, StreamExt};
use std::sync::{Arc, Weak};
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

/// A self-healing connection to the order/menu event feed.
///
/// `RealtimeChannel` keeps exactly one socket open to the feed, reconnects
/// with exponential backoff when it drops, pings on a fixed interval, and
/// hands every application message to the callback given at construction.
/// `pong` frames are consumed internally.
///
/// The handle is cheap to clone; all clones drive the same socket. Call
/// [`close()`](Self::close) when the owner goes away, otherwise the
/// background tasks keep the channel alive.
///
/// # Example
///
/// ```no_run
/// use food_realtime_rs::{MessageKind, RealtimeChannel};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let channel = RealtimeChannel::open(
///     "ws://localhost:8000/socket.io/",
///     Default::default(),
///     |message| match message.kind {
///         MessageKind::NewOrder => println!("new order: {}", message.data),
///         MessageKind::MenuUpdate => println!("menu changed"),
///         _ => {}
///     },
/// )?;
///
/// // ...
/// channel.close().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RealtimeChannel {
    pub(crate) url: String,
    pub(crate) options: RealtimeChannelOptions,
    pub(crate) connector: Arc<dyn Connector>,

    // Socket write half and reported state
    pub(crate) connection: Arc<ConnectionManager>,

    pub(crate) router: Arc<MessageRouter>,

    // Socket-level transitions, consumed by the reconnection watcher
    pub(crate) lifecycle: Arc<watch::Sender<ConnectionState>>,

    // Owner-facing health
    pub(crate) status: Arc<StatusNotifier>,

    // Consolidated mutable state
    pub(crate) state: Arc<RwLock<ChannelState>>,
}

/// Non-owning handle held by the reconnection watcher. Once every
/// [`RealtimeChannel`] clone is gone the state drops, its tasks are aborted
/// and the watcher stops.
pub(crate) struct WeakRealtimeChannel {
    url: String,
    options: RealtimeChannelOptions,
    connector: Arc<dyn Connector>,
    connection: Weak<ConnectionManager>,
    router: Weak<MessageRouter>,
    lifecycle: Weak<watch::Sender<ConnectionState>>,
    status: Weak<StatusNotifier>,
    state: Weak<RwLock<ChannelState>>,
}

impl WeakRealtimeChannel {
    pub(crate) fn upgrade(&self) -> Option<RealtimeChannel> {
        Some(RealtimeChannel {
            url: self.url.clone(),
            options: self.options.clone(),
            connector: Arc::clone(&self.connector),
            connection: self.connection.upgrade()?,
            router: self.router.upgrade()?,
            lifecycle: self.lifecycle.upgrade()?,
            status: self.status.upgrade()?,
            state: self.state.upgrade()?,
        })
    }
}

impl RealtimeChannel {
    /// Creates a channel and starts connecting in the background.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// Connection failures never surface here; they are retried according
    /// to `options` and reported through [`status()`](Self::status).
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::UrlParse`](crate::RealtimeError::UrlParse) or
    /// [`RealtimeError::Config`](crate::RealtimeError::Config) if the URL or
    /// options are unusable.
    pub fn open<F>(
        url: impl Into<String>,
        options: RealtimeChannelOptions,
        on_message: F,
    ) -> Result<Self>
    where
        F: Fn(InboundMessage) + Send + Sync + 'static,
    {
        Ok(RealtimeChannelBuilder::new(url, options)?.open(on_message))
    }

    /// Same as [`open()`](Self::open), with the URL derived from `config`.
    /// Must be called from within a tokio runtime.
    pub fn open_endpoint<F>(
        config: &EndpointConfig,
        options: RealtimeChannelOptions,
        on_message: F,
    ) -> Result<Self>
    where
        F: Fn(InboundMessage) + Send + Sync + 'static,
    {
        Ok(RealtimeChannelBuilder::from_endpoint(config, options)?.open(on_message))
    }

    pub fn builder(
        url: impl Into<String>,
        options: RealtimeChannelOptions,
    ) -> Result<RealtimeChannelBuilder> {
        RealtimeChannelBuilder::new(url, options)
    }

    pub(crate) fn downgrade(&self) -> WeakRealtimeChannel {
        WeakRealtimeChannel {
            url: self.url.clone(),
            options: self.options.clone(),
            connector: Arc::clone(&self.connector),
            connection: Arc::downgrade(&self.connection),
            router: Arc::downgrade(&self.router),
            lifecycle: Arc::downgrade(&self.lifecycle),
            status: Arc::downgrade(&self.status),
            state: Arc::downgrade(&self.state),
        }
    }

    /// Set connection state and notify the watcher
    async fn set_state(&self, new_state: ConnectionState) {
        self.connection.set_state(new_state).await;
        self.lifecycle.send_replace(new_state);
    }

    /// Opens a socket unless one is already open or connecting.
    ///
    /// A failed handshake is handed to the reconnect scheduler; nothing is
    /// returned to the caller.
    pub async fn connect(&self) {
        {
            let state = self.state.read().await;
            if state.closed {
                tracing::debug!("Channel closed, ignoring connect");
                return;
            }
            if !self.connection.begin_connect().await {
                tracing::debug!("Socket already open or connecting, ignoring connect");
                return;
            }
            self.lifecycle.send_replace(ConnectionState::Connecting);
            self.status.publish(ChannelStatus::Connecting);
        }

        tracing::info!("Attempting to connect to {}", self.url);

        let closed = wait_closed(self.status.subscribe());
        let attempt = tokio::select! {
            result = self.connector.connect(&self.url) => result,
            _ = closed => {
                tracing::debug!("Channel closed during handshake");
                return;
            }
        };

        match attempt {
            Ok(transport) => self.on_open(transport).await,
            Err(e) => {
                tracing::warn!("Connection attempt failed: {}", e);
                self.set_state(ConnectionState::Closed).await;
            }
        }
    }

    async fn on_open(&self, transport: Transport) {
        let Transport { mut sink, stream } = transport;

        let mut state = self.state.write().await;
        if state.closed {
            drop(state);
            tracing::debug!("Channel closed during handshake, dropping socket");
            let _ = sink.close().await;
            return;
        }

        state.policy.reset();
        state.cancel_reconnect();
        state.task_manager.abort_all();

        self.connection.set_writer(sink).await;
        self.connection.set_state(ConnectionState::Open).await;

        // Open must be published before the reader can report a close
        self.lifecycle.send_replace(ConnectionState::Open);
        self.status.publish(ChannelStatus::Open);

        let reader = self.spawn_reader(stream);
        state.task_manager.track(reader);

        let heartbeat = HeartbeatManager::new(Arc::downgrade(&self.connection))
            .with_interval(self.options.heartbeat_interval())
            .spawn();
        state.task_manager.track(heartbeat);

        let liveness =
            LivenessMonitor::new(Arc::downgrade(&self.connection), Arc::clone(&self.lifecycle))
                .with_interval(self.options.liveness_interval())
                .spawn();
        state.task_manager.track(liveness);
        drop(state);

        tracing::info!("WebSocket connection established");
    }

    /// Reads frames in arrival order until the socket ends
    fn spawn_reader(&self, mut stream: WsStream) -> JoinHandle<()> {
        let router = Arc::clone(&self.router);
        let connection = Arc::clone(&self.connection);
        let lifecycle = Arc::clone(&self.lifecycle);

        tokio::spawn(async move {
            tracing::debug!("Starting read task");
            while let Some(msg_result) = stream.next().await {
                match msg_result {
                    Ok(Message::Text(text)) => {
                        router.route_text(&text);
                    }
                    Ok(Message::Close(frame)) => {
                        if let Some(close_frame) = frame {
                            tracing::info!(
                                "Server closed connection: code={:?}, reason='{}'",
                                close_frame.code,
                                close_frame.reason
                            );
                        } else {
                            tracing::info!("Server closed connection without close frame");
                        }
                        break;
                    }
                    Ok(Message::Binary(data)) => {
                        tracing::warn!(
                            "Ignoring unexpected binary message ({} bytes)",
                            data.len()
                        );
                    }
                    Ok(Message::Ping(data)) => {
                        tracing::debug!("Received ping ({} bytes)", data.len());
                    }
                    Ok(Message::Pong(data)) => {
                        tracing::debug!("Received pong ({} bytes)", data.len());
                    }
                    Ok(Message::Frame(_)) => {
                        tracing::debug!("Received raw frame (internal)");
                    }
                    Err(e) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                }
            }

            tracing::info!("WebSocket connection closed");
            connection.mark_closed().await;
            lifecycle.send_replace(ConnectionState::Closed);
        })
    }

    /// Stops the socket tasks and schedules the next attempt, or gives up
    /// once the retry budget is spent.
    pub(crate) async fn handle_disconnect(&self) {
        let mut state = self.state.write().await;
        if state.closed || state.exhausted || state.reconnect_task.is_some() {
            return;
        }
        if self.connection.state().await != ConnectionState::Closed {
            return;
        }

        state.task_manager.abort_all();
        self.connection.clear_writer().await;

        if state.policy.is_exhausted() {
            state.exhausted = true;
            let attempts = state.policy.attempts();
            tracing::error!(
                "Max reconnection attempts ({}) reached, giving up",
                attempts
            );
            self.status.publish(ChannelStatus::Exhausted { attempts });
            return;
        }

        let delay = state.policy.scheduled_delay();
        let attempt = state.policy.attempts() + 1;
        let channel = self.clone();
        state.reconnect_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            channel.fire_reconnect().await;
        }));

        tracing::info!(
            "Reconnecting in {:?} (attempt {}/{})",
            delay,
            attempt,
            state.policy.max_attempts()
        );
        self.status
            .publish(ChannelStatus::Reconnecting { attempt, delay });
    }

    async fn fire_reconnect(&self) {
        {
            let mut state = self.state.write().await;
            if state.closed {
                return;
            }
            // Detach rather than abort: this is the task holding the handle
            state.reconnect_task = None;
            state.policy.record_attempt();
            tracing::info!(
                "Attempting to reconnect (attempt {}/{})",
                state.policy.attempts(),
                state.policy.max_attempts()
            );
        }
        self.connect().await;
    }

    /// Starts a fresh reconnect cycle, typically after
    /// [`ChannelStatus::Exhausted`].
    pub async fn retry(&self) {
        {
            let mut state = self.state.write().await;
            if state.closed {
                return;
            }
            state.exhausted = false;
            state.policy.reset();
            state.cancel_reconnect();
        }
        tracing::info!("Manual retry requested");
        self.connect().await;
    }

    /// Tears the channel down.
    ///
    /// Cancels the reconnect, heartbeat and liveness timers and closes the
    /// socket if one is open or connecting. Calling it again does nothing.
    pub async fn close(&self) {
        {
            let mut state = self.state.write().await;
            if state.closed {
                return;
            }
            state.closed = true;
            state.cancel_reconnect();
            state.task_manager.abort_all();
        }

        tracing::info!("Closing realtime channel");
        if let Err(e) = self.connection.close().await {
            tracing::warn!("Error while closing socket: {}", e);
        }

        self.status.publish(ChannelStatus::Closed);
        self.lifecycle.send_replace(ConnectionState::Closed);
    }

    /// Checks whether the socket is currently open.
    pub async fn is_connected(&self) -> bool {
        self.connection.is_connected().await
    }

    pub async fn connection_state(&self) -> ConnectionState {
        self.connection.state().await
    }

    /// Current owner-facing status
    pub fn status(&self) -> ChannelStatus {
        self.status.current()
    }

    /// Receiver that observes every status transition
    pub fn status_receiver(&self) -> watch::Receiver<ChannelStatus> {
        self.status.subscribe()
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

async fn wait_closed(mut rx: watch::Receiver<ChannelStatus>) {
    loop {
        let closed = *rx.borrow_and_update() == ChannelStatus::Closed;
        if closed {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
