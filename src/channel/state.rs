use crate::infrastructure::{ReconnectPolicy, TaskManager};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Health of a channel as seen by its owner
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelStatus {
    /// Created, nothing attempted yet
    Idle,
    /// Handshake in progress
    Connecting,
    /// Socket open, messages flowing
    Open,
    /// Socket lost; the next attempt is scheduled after `delay`
    Reconnecting { attempt: u32, delay: Duration },
    /// Retry budget spent. No further automatic attempts.
    Exhausted { attempts: u32 },
    /// Torn down by the owner
    Closed,
}

impl ChannelStatus {
    /// The channel will not recover on its own from this status
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Exhausted { .. } | Self::Closed)
    }
}

/// Owner callback for status transitions
pub type StatusCallback = Arc<dyn Fn(ChannelStatus) + Send + Sync + 'static>;

/// Publishes status to a watch channel and the optional owner callback
pub struct StatusNotifier {
    tx: watch::Sender<ChannelStatus>,
    callback: Option<StatusCallback>,
}

impl StatusNotifier {
    pub fn new(callback: Option<StatusCallback>) -> Self {
        let (tx, _rx) = watch::channel(ChannelStatus::Idle);
        Self { tx, callback }
    }

    pub fn publish(&self, status: ChannelStatus) {
        tracing::debug!("Channel status: {:?}", status);
        self.tx.send_replace(status.clone());
        if let Some(callback) = &self.callback {
            callback(status);
        }
    }

    pub fn current(&self) -> ChannelStatus {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ChannelStatus> {
        self.tx.subscribe()
    }
}

/// Consolidated mutable state for RealtimeChannel
pub struct ChannelState {
    /// Backoff progression for reconnects
    pub policy: ReconnectPolicy,

    /// Reader, heartbeat and liveness tasks of the current socket
    pub task_manager: TaskManager,

    /// Pending reconnect timer (if any)
    pub reconnect_task: Option<JoinHandle<()>>,

    /// Set by `close()`; nothing restarts afterwards
    pub closed: bool,

    /// Set once the retry budget is spent
    pub exhausted: bool,
}

impl ChannelState {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            task_manager: TaskManager::new(),
            reconnect_task: None,
            closed: false,
            exhausted: false,
        }
    }

    /// Cancel the pending reconnect timer
    pub fn cancel_reconnect(&mut self) {
        if let Some(task) = self.reconnect_task.take() {
            task.abort();
        }
    }
}

impl Default for ChannelState {
    fn default() -> Self {
        Self::new(ReconnectPolicy::default())
    }
}
