use crate::types::Result;
use futures::future::BoxFuture;
use futures::{Sink, Stream, StreamExt};
use std::pin::Pin;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

/// Write half of a socket
pub type WsSink = Pin<Box<dyn Sink<Message, Error = WsError> + Send + Sync>>;

/// Read half of a socket
pub type WsStream = Pin<Box<dyn Stream<Item = std::result::Result<Message, WsError>> + Send>>;

/// An established socket, split into its two halves
pub struct Transport {
    pub sink: WsSink,
    pub stream: WsStream,
}

impl Transport {
    pub fn new<S, R>(sink: S, stream: R) -> Self
    where
        S: Sink<Message, Error = WsError> + Send + Sync + 'static,
        R: Stream<Item = std::result::Result<Message, WsError>> + Send + 'static,
    {
        Self {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        }
    }
}

/// Opens sockets to the event feed
pub trait Connector: Send + Sync + 'static {
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<Transport>>;
}

/// WebSocket factory for creating WebSocket connections
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketFactory;

impl Connector for WebSocketFactory {
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<Transport>> {
        let url = url.to_string();
        Box::pin(async move {
            tracing::debug!("Creating WebSocket connection to: {}", url);
            let (ws_stream, response) = connect_async(url.as_str()).await?;
            tracing::debug!("Handshake completed with status {}", response.status());

            let (write_half, read_half) = ws_stream.split();
            Ok(Transport::new(write_half, read_half))
        })
    }
}
