use super::{ChannelStatus, RealtimeChannel, RealtimeChannelBuilder, RealtimeChannelOptions};
use crate::endpoint::EndpointConfig;
use crate::messaging::MessageCallback;
use crate::types::{InboundMessage, Result};
use crate::websocket::Connector;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::watch;

struct SharedState {
    listeners: BTreeMap<u64, MessageCallback>,
    next_id: u64,
    channel: Option<RealtimeChannel>,
    // Bumped per opened channel; a channel still closing cannot fan out
    generation: u64,
}

fn lock(state: &Mutex<SharedState>) -> MutexGuard<'_, SharedState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One feed connection fanned out to any number of listeners.
///
/// The socket opens with the first [`subscribe()`](Self::subscribe) and is
/// closed when the last [`Subscription`] goes away, so independent features
/// (order grid, order tracker, live menu) share a single transport.
#[derive(Clone)]
pub struct SharedChannel {
    url: String,
    options: RealtimeChannelOptions,
    connector: Option<Arc<dyn Connector>>,
    state: Arc<Mutex<SharedState>>,
}

impl SharedChannel {
    pub fn new(url: impl Into<String>, options: RealtimeChannelOptions) -> Result<Self> {
        let url = url.into();
        // Validate eagerly so later subscribes cannot fail
        RealtimeChannelBuilder::new(url.clone(), options.clone())?;

        Ok(Self {
            url,
            options,
            connector: None,
            state: Arc::new(Mutex::new(SharedState {
                listeners: BTreeMap::new(),
                next_id: 0,
                channel: None,
                generation: 0,
            })),
        })
    }

    pub fn from_endpoint(config: &EndpointConfig, options: RealtimeChannelOptions) -> Result<Self> {
        Self::new(config.websocket_url()?, options)
    }

    /// Replace the socket factory used for the underlying channel
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Registers a listener, opening the transport if this is the first one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(InboundMessage) + Send + Sync + 'static,
    {
        let mut state = lock(&self.state);
        let id = state.next_id;
        state.next_id += 1;
        state.listeners.insert(id, Arc::new(callback));

        if state.channel.is_none() {
            tracing::debug!("First subscriber, opening shared channel");
            state.generation += 1;
            state.channel = Some(self.open_channel(state.generation));
        }

        Subscription {
            id: Some(id),
            state: Arc::clone(&self.state),
        }
    }

    fn open_channel(&self, generation: u64) -> RealtimeChannel {
        let builder = RealtimeChannelBuilder::validated(
            self.url.clone(),
            self.options.clone(),
            self.connector.clone(),
        );

        let listeners = Arc::downgrade(&self.state);
        builder.open(move |message| fan_out(&listeners, generation, message))
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.state).listeners.len()
    }

    /// The underlying channel, while at least one subscriber exists
    pub fn channel(&self) -> Option<RealtimeChannel> {
        lock(&self.state).channel.clone()
    }

    pub fn status_receiver(&self) -> Option<watch::Receiver<ChannelStatus>> {
        lock(&self.state)
            .channel
            .as_ref()
            .map(|channel| channel.status_receiver())
    }
}

fn fan_out(state: &Weak<Mutex<SharedState>>, generation: u64, message: InboundMessage) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let listeners: Vec<MessageCallback> = {
        let state = lock(&state);
        if state.generation != generation {
            tracing::debug!("Dropping frame from a replaced shared channel");
            return;
        }
        state.listeners.values().cloned().collect()
    };

    for listener in listeners {
        listener(message.clone());
    }
}

/// A listener registration on a [`SharedChannel`].
///
/// Dropping it unsubscribes; use [`unsubscribe()`](Self::unsubscribe) to
/// wait for the transport to close when this was the last listener.
pub struct Subscription {
    id: Option<u64>,
    state: Arc<Mutex<SharedState>>,
}

impl Subscription {
    pub async fn unsubscribe(mut self) {
        if let Some(channel) = self.detach() {
            channel.close().await;
        }
    }

    /// Removes the listener; hands back the channel if nobody is left
    fn detach(&mut self) -> Option<RealtimeChannel> {
        let id = self.id.take()?;
        let mut state = lock(&self.state);
        state.listeners.remove(&id);

        if state.listeners.is_empty() {
            tracing::debug!("Last subscriber left, closing shared channel");
            state.channel.take()
        } else {
            None
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(channel) = self.detach() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { channel.close().await });
            }
            Err(_) => tracing::warn!("Subscription dropped outside a runtime, channel left open"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MessageKind;
    use crate::channel::ConnectionState;
    use crate::websocket::mock::{MockConnector, Outcome};
    use std::time::Duration;
    use tokio::time::{sleep, timeout};

    const URL: &str = "ws://localhost:8000/socket.io/";

    fn shared(connector: Arc<MockConnector>) -> SharedChannel {
        SharedChannel::new(URL, Default::default())
            .unwrap()
            .with_connector(connector)
    }

    fn collector() -> (
        Arc<Mutex<Vec<InboundMessage>>>,
        impl Fn(InboundMessage) + Send + Sync + 'static,
    ) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        (received, move |message| sink.lock().unwrap().push(message))
    }

    async fn wait_open(shared: &SharedChannel) {
        let mut rx = shared.status_receiver().unwrap();
        timeout(Duration::from_secs(60), async {
            loop {
                let open = *rx.borrow_and_update() == ChannelStatus::Open;
                if open {
                    return;
                }
                rx.changed().await.unwrap();
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_socket_for_many_listeners() {
        let (connector, mut mock) = MockConnector::new(vec![], Outcome::Accept);
        let shared = shared(connector);

        let (grid, grid_cb) = collector();
        let (menu, menu_cb) = collector();
        let _grid_sub = shared.subscribe(grid_cb);
        let _menu_sub = shared.subscribe(menu_cb);
        assert_eq!(shared.subscriber_count(), 2);

        let server = mock.next_server().await;
        wait_open(&shared).await;
        server.send_text(r#"{"type":"menu-update","data":[{"ProductID":3}]}"#);

        timeout(Duration::from_secs(5), async {
            while menu.lock().unwrap().is_empty() || grid.lock().unwrap().is_empty() {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        assert_eq!(grid.lock().unwrap()[0].kind, MessageKind::MenuUpdate);
        assert_eq!(menu.lock().unwrap()[0], grid.lock().unwrap()[0]);
        assert_eq!(mock.connect_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_unsubscribe_closes_transport() {
        let (connector, mut mock) = MockConnector::new(vec![], Outcome::Accept);
        let shared = shared(connector);

        let (_, first_cb) = collector();
        let (_, second_cb) = collector();
        let first = shared.subscribe(first_cb);
        let second = shared.subscribe(second_cb);
        let _server = mock.next_server().await;
        wait_open(&shared).await;
        let channel = shared.channel().unwrap();

        first.unsubscribe().await;
        assert_eq!(channel.status(), ChannelStatus::Open);
        assert!(shared.channel().is_some());

        second.unsubscribe().await;
        assert_eq!(channel.status(), ChannelStatus::Closed);
        assert!(shared.channel().is_none());
        assert_eq!(shared.subscriber_count(), 0);

        // A later subscriber gets a fresh transport
        let (_, third_cb) = collector();
        let _third = shared.subscribe(third_cb);
        let _server = mock.next_server().await;
        assert_eq!(mock.connect_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_subscription_closes_channel() {
        let (connector, mut mock) = MockConnector::new(vec![], Outcome::Accept);
        let shared = shared(connector);

        let (_, cb) = collector();
        let subscription = shared.subscribe(cb);
        let _server = mock.next_server().await;
        wait_open(&shared).await;
        let channel = shared.channel().unwrap();

        drop(subscription);
        let mut rx = channel.status_receiver();
        timeout(Duration::from_secs(5), async {
            loop {
                let closed = *rx.borrow_and_update() == ChannelStatus::Closed;
                if closed {
                    return;
                }
                rx.changed().await.unwrap();
            }
        })
        .await
        .unwrap();
        assert_eq!(channel.connection_state().await, ConnectionState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replaced_channel_cannot_reach_new_listeners() {
        let (connector, _mock) = MockConnector::new(vec![], Outcome::Hang);
        let shared = shared(connector);

        let (_, first_cb) = collector();
        let first = shared.subscribe(first_cb);
        let stale_generation = lock(&shared.state).generation;

        // Resubscribe before the spawned close of the old channel has run
        drop(first);
        let (received, second_cb) = collector();
        let _second = shared.subscribe(second_cb);
        let current_generation = lock(&shared.state).generation;
        assert_ne!(stale_generation, current_generation);

        let weak = Arc::downgrade(&shared.state);
        let frame = InboundMessage::new(MessageKind::NewOrder, serde_json::json!({"OrderID": 7}));
        fan_out(&weak, stale_generation, frame.clone());
        assert!(received.lock().unwrap().is_empty());

        fan_out(&weak, current_generation, frame.clone());
        assert_eq!(*received.lock().unwrap(), vec![frame]);
    }
}
