use crate::channel::{ConnectionManager, ConnectionState};
use crate::types::constants::LIVENESS_INTERVAL;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

/// Polls the state the socket reports and raises a disconnect when it reads
/// `Closed` without a close event having been delivered.
pub struct LivenessMonitor {
    interval: Duration,
    connection: Weak<ConnectionManager>,
    lifecycle: Arc<watch::Sender<ConnectionState>>,
}

impl LivenessMonitor {
    pub fn new(
        connection: Weak<ConnectionManager>,
        lifecycle: Arc<watch::Sender<ConnectionState>>,
    ) -> Self {
        Self {
            interval: Duration::from_millis(LIVENESS_INTERVAL),
            connection,
            lifecycle,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval_timer = time::interval_at(Instant::now() + self.interval, self.interval);
            interval_timer.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

            loop {
                interval_timer.tick().await;

                let Some(connection) = self.connection.upgrade() else {
                    break;
                };

                if connection.state().await == ConnectionState::Closed {
                    tracing::info!("Connection lost, attempting to reconnect...");
                    self.lifecycle.send_replace(ConnectionState::Closed);
                    break;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_reports_silently_closed_socket() {
        let connection = Arc::new(ConnectionManager::new());
        connection.set_state(ConnectionState::Open).await;

        let (tx, mut rx) = watch::channel(ConnectionState::Open);
        let started = Instant::now();
        let handle = LivenessMonitor::new(Arc::downgrade(&connection), Arc::new(tx))
            .with_interval(Duration::from_secs(5))
            .spawn();

        time::sleep(Duration::from_secs(12)).await;
        assert!(!rx.has_changed().unwrap(), "open socket must not be reported");

        connection.set_state(ConnectionState::Closed).await;
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), ConnectionState::Closed);
        assert!(started.elapsed() >= Duration::from_secs(15));

        time::sleep(Duration::from_millis(1)).await;
        assert!(handle.is_finished());
    }
}
