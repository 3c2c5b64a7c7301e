//! In-memory connector used by the channel tests.

use super::{Connector, Transport};
use crate::types::{RealtimeError, Result};
use futures::channel::mpsc as fmpsc;
use futures::future::BoxFuture;
use futures::{SinkExt, StreamExt};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Handshake fails
    Fail,
    /// Handshake succeeds and a `ServerEnd` is handed to the test
    Accept,
    /// Handshake never completes
    Hang,
}

/// Server side of an accepted in-memory socket
pub struct ServerEnd {
    pub to_client: fmpsc::UnboundedSender<std::result::Result<Message, WsError>>,
    pub from_client: fmpsc::UnboundedReceiver<Message>,
}

impl ServerEnd {
    pub fn send_text(&self, text: &str) {
        let _ = self
            .to_client
            .unbounded_send(Ok(Message::Text(text.to_string())));
    }

    pub async fn next_text(&mut self) -> Option<String> {
        while let Some(message) = self.from_client.next().await {
            if let Message::Text(text) = message {
                return Some(text);
            }
        }
        None
    }
}

pub struct MockConnector {
    script: Mutex<VecDeque<Outcome>>,
    fallback: Outcome,
    attempts: mpsc::UnboundedSender<Instant>,
    servers: mpsc::UnboundedSender<ServerEnd>,
    count: Arc<AtomicUsize>,
}

pub struct MockHandle {
    pub attempts: mpsc::UnboundedReceiver<Instant>,
    pub servers: mpsc::UnboundedReceiver<ServerEnd>,
    count: Arc<AtomicUsize>,
}

impl MockHandle {
    pub fn connect_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub async fn next_attempt(&mut self) -> Instant {
        self.attempts.recv().await.expect("connector dropped")
    }

    pub async fn next_server(&mut self) -> ServerEnd {
        self.servers.recv().await.expect("connector dropped")
    }
}

impl MockConnector {
    /// Plays `script` in order, then repeats `fallback` forever.
    pub fn new(script: Vec<Outcome>, fallback: Outcome) -> (Arc<Self>, MockHandle) {
        let (attempts_tx, attempts_rx) = mpsc::unbounded_channel();
        let (servers_tx, servers_rx) = mpsc::unbounded_channel();
        let count = Arc::new(AtomicUsize::new(0));

        let connector = Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            attempts: attempts_tx,
            servers: servers_tx,
            count: Arc::clone(&count),
        });
        let handle = MockHandle {
            attempts: attempts_rx,
            servers: servers_rx,
            count,
        };
        (connector, handle)
    }
}

impl Connector for MockConnector {
    fn connect(&self, _url: &str) -> BoxFuture<'static, Result<Transport>> {
        self.count.fetch_add(1, Ordering::SeqCst);
        let _ = self.attempts.send(Instant::now());

        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);

        match outcome {
            Outcome::Fail => Box::pin(async {
                Err(RealtimeError::WebSocket(WsError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                ))))
            }),
            Outcome::Hang => Box::pin(futures::future::pending()),
            Outcome::Accept => {
                let (client_tx, server_rx) = fmpsc::unbounded::<Message>();
                let (server_tx, client_rx) =
                    fmpsc::unbounded::<std::result::Result<Message, WsError>>();

                let _ = self.servers.send(ServerEnd {
                    to_client: server_tx,
                    from_client: server_rx,
                });

                let sink = client_tx.sink_map_err(|_| WsError::ConnectionClosed);
                Box::pin(async move { Ok(Transport::new(sink, client_rx)) })
            }
        }
    }
}
