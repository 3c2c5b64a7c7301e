use super::{ChannelState, ConnectionManager, ConnectionState, RealtimeChannel, StatusCallback, StatusNotifier};
use crate::endpoint::EndpointConfig;
use crate::infrastructure::ReconnectPolicy;
use crate::messaging::MessageRouter;
use crate::types::constants::{
    HEARTBEAT_INTERVAL, INITIAL_RECONNECT_DELAY, LIVENESS_INTERVAL, MAX_RECONNECT_ATTEMPTS,
    MAX_RECONNECT_DELAY, RECONNECT_JITTER,
};
use crate::types::{InboundMessage, RealtimeError, Result};
use crate::websocket::{Connector, WebSocketFactory};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use url::Url;

/// Tuning for a [`RealtimeChannel`]. Durations are in milliseconds; `None`
/// means the default.
#[derive(Clone, Default)]
pub struct RealtimeChannelOptions {
    /// First reconnect delay. Default: 1000.
    pub initial_reconnect_delay: Option<u64>,
    /// Ceiling for the doubling delay. Default: 30000.
    pub max_reconnect_delay: Option<u64>,
    /// Scheduled reconnects before giving up. Default: 10.
    pub max_reconnect_attempts: Option<u32>,
    /// Fraction of each delay to randomize by, `0.0` disables. Default: 0.2.
    pub reconnect_jitter: Option<f64>,
    /// Ping period while open. Default: 30000.
    pub heartbeat_interval: Option<u64>,
    /// Readiness poll period while open. Default: 5000.
    pub liveness_interval: Option<u64>,
    /// Called on every status transition, including the terminal one.
    pub on_status_change: Option<StatusCallback>,
}

impl std::fmt::Debug for RealtimeChannelOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeChannelOptions")
            .field("initial_reconnect_delay", &self.initial_reconnect_delay)
            .field("max_reconnect_delay", &self.max_reconnect_delay)
            .field("max_reconnect_attempts", &self.max_reconnect_attempts)
            .field("reconnect_jitter", &self.reconnect_jitter)
            .field("heartbeat_interval", &self.heartbeat_interval)
            .field("liveness_interval", &self.liveness_interval)
            .field("on_status_change", &self.on_status_change.is_some())
            .finish()
    }
}

impl RealtimeChannelOptions {
    pub(crate) fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::new(
            Duration::from_millis(self.initial_reconnect_delay.unwrap_or(INITIAL_RECONNECT_DELAY)),
            Duration::from_millis(self.max_reconnect_delay.unwrap_or(MAX_RECONNECT_DELAY)),
            self.max_reconnect_attempts.unwrap_or(MAX_RECONNECT_ATTEMPTS),
        )
        .with_jitter(self.reconnect_jitter.unwrap_or(RECONNECT_JITTER))
    }

    pub(crate) fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval.unwrap_or(HEARTBEAT_INTERVAL))
    }

    pub(crate) fn liveness_interval(&self) -> Duration {
        Duration::from_millis(self.liveness_interval.unwrap_or(LIVENESS_INTERVAL))
    }

    fn validate(&self) -> Result<()> {
        if self.heartbeat_interval == Some(0) || self.liveness_interval == Some(0) {
            return Err(RealtimeError::Config(
                "heartbeat and liveness intervals must be non-zero".to_string(),
            ));
        }
        if self.initial_reconnect_delay.unwrap_or(INITIAL_RECONNECT_DELAY)
            > self.max_reconnect_delay.unwrap_or(MAX_RECONNECT_DELAY)
        {
            return Err(RealtimeError::Config(
                "initial reconnect delay exceeds the maximum".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for RealtimeChannel that handles initialization
pub struct RealtimeChannelBuilder {
    url: String,
    options: RealtimeChannelOptions,
    connector: Arc<dyn Connector>,
}

impl RealtimeChannelBuilder {
    /// Create a new builder for a `ws://` or `wss://` endpoint
    pub fn new(url: impl Into<String>, options: RealtimeChannelOptions) -> Result<Self> {
        let url = url.into();

        let parsed = Url::parse(&url)?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(RealtimeError::Config(format!(
                "unsupported scheme '{}', expected ws or wss",
                parsed.scheme()
            )));
        }
        options.validate()?;

        Ok(Self {
            url,
            options,
            connector: Arc::new(WebSocketFactory),
        })
    }

    /// Parts already checked by [`new()`](Self::new)
    pub(crate) fn validated(
        url: String,
        options: RealtimeChannelOptions,
        connector: Option<Arc<dyn Connector>>,
    ) -> Self {
        Self {
            url,
            options,
            connector: connector.unwrap_or_else(|| Arc::new(WebSocketFactory)),
        }
    }

    /// Create a builder for the feed URL derived from `config`
    pub fn from_endpoint(config: &EndpointConfig, options: RealtimeChannelOptions) -> Result<Self> {
        Self::new(config.websocket_url()?, options)
    }

    /// Replace the socket factory
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    /// Build the channel and spawn its lifecycle watcher. Does not connect.
    /// Must be called from within a tokio runtime.
    pub fn build<F>(self, on_message: F) -> RealtimeChannel
    where
        F: Fn(InboundMessage) + Send + Sync + 'static,
    {
        let (lifecycle_tx, lifecycle_rx) = watch::channel(ConnectionState::Idle);
        let policy = self.options.reconnect_policy();
        let status = StatusNotifier::new(self.options.on_status_change.clone());

        let channel = RealtimeChannel {
            url: self.url,
            options: self.options,
            connector: self.connector,
            connection: Arc::new(ConnectionManager::new()),
            router: Arc::new(MessageRouter::new(Arc::new(on_message))),
            lifecycle: Arc::new(lifecycle_tx),
            status: Arc::new(status),
            state: Arc::new(RwLock::new(ChannelState::new(policy))),
        };

        // Spawn reconnection watcher task
        let watcher = channel.downgrade();
        tokio::spawn(async move {
            let mut rx = lifecycle_rx;

            while rx.changed().await.is_ok() {
                let state = *rx.borrow_and_update();

                let Some(channel) = watcher.upgrade() else {
                    break;
                };
                if channel.state.read().await.closed {
                    break;
                }

                if state == ConnectionState::Closed {
                    channel.handle_disconnect().await;
                }
            }
            tracing::debug!("Reconnection watcher task finished");
        });

        channel
    }

    /// Build the channel and start connecting in the background.
    /// Must be called from within a tokio runtime.
    pub fn open<F>(self, on_message: F) -> RealtimeChannel
    where
        F: Fn(InboundMessage) + Send + Sync + 'static,
    {
        let channel = self.build(on_message);
        let channel_for_connect = channel.clone();
        tokio::spawn(async move {
            channel_for_connect.connect().await;
        });
        channel
    }
}
