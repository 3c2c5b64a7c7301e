use crate::channel::ConnectionManager;
use crate::types::constants::HEARTBEAT_INTERVAL;
use crate::types::message::OutboundMessage;
use std::sync::Weak;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

/// Sends `{"type":"ping"}` on a fixed interval so idle proxies keep the
/// socket open. Replies are not tracked.
pub struct HeartbeatManager {
    interval: Duration,
    connection: Weak<ConnectionManager>,
}

impl HeartbeatManager {
    pub fn new(connection: Weak<ConnectionManager>) -> Self {
        Self {
            interval: Duration::from_millis(HEARTBEAT_INTERVAL),
            connection,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Spawns the heartbeat task. The first ping goes out one full interval
    /// after the call.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval_timer = time::interval_at(Instant::now() + self.interval, self.interval);
            interval_timer.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

            loop {
                interval_timer.tick().await;

                let connection = match self.connection.upgrade() {
                    Some(conn) => conn,
                    None => {
                        // Channel dropped, exit heartbeat task
                        break;
                    }
                };

                if !connection.is_connected().await {
                    tracing::debug!("Skipping heartbeat, socket not open");
                    continue;
                }

                match connection.send_message(&OutboundMessage::Ping).await {
                    Ok(_) => tracing::debug!("Sent heartbeat ping"),
                    Err(e) => tracing::warn!("[Heartbeat] Failed to send: {}", e),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ConnectionState;
    use futures::channel::mpsc;
    use futures::{FutureExt, SinkExt, StreamExt};
    use std::sync::Arc;
    use tokio_tungstenite::tungstenite::{Error as WsError, Message};

    async fn open_connection() -> (Arc<ConnectionManager>, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded::<Message>();
        let connection = Arc::new(ConnectionManager::new());
        connection
            .set_writer(Box::pin(tx.sink_map_err(|_| WsError::ConnectionClosed)))
            .await;
        connection.set_state(ConnectionState::Open).await;
        (connection, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_pings_every_interval() {
        let (connection, mut rx) = open_connection().await;
        let started = Instant::now();

        let handle = HeartbeatManager::new(Arc::downgrade(&connection))
            .with_interval(Duration::from_secs(30))
            .spawn();

        let first = rx.next().await.unwrap();
        assert_eq!(first, Message::Text(r#"{"type":"ping"}"#.to_string()));
        assert!(started.elapsed() >= Duration::from_secs(30));

        rx.next().await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(60));

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ping_while_not_open() {
        let (connection, mut rx) = open_connection().await;
        connection.set_state(ConnectionState::Connecting).await;

        let handle = HeartbeatManager::new(Arc::downgrade(&connection))
            .with_interval(Duration::from_secs(30))
            .spawn();

        time::sleep(Duration::from_secs(95)).await;
        assert!(rx.next().now_or_never().is_none(), "no frame should have been sent");
        assert!(!handle.is_finished());

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_exits_when_connection_dropped() {
        let (connection, _rx) = open_connection().await;
        let handle = HeartbeatManager::new(Arc::downgrade(&connection))
            .with_interval(Duration::from_secs(1))
            .spawn();

        drop(connection);
        time::sleep(Duration::from_secs(2)).await;
        assert!(handle.is_finished());
    }
}
