// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Message transport underneath the WebSocket adapter.
//!
//! The adapter speaks [`ClientMessage`]/[`ServerMessage`] pairs through a
//! [`Transport`], so its request/response handling can be tested against a
//! scripted transport without sockets.

use std::future::Future;
use std::pin::Pin;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{FutureExt, SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use ts_core::protocol::{ClientMessage, ServerMessage};

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    #[error("malformed message: {0}")]
    Malformed(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Boxed future returned by transport operations.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = TransportResult<T>> + Send + 'a>>;

/// Bidirectional message channel to a remote store.
pub trait Transport: Send + Sync {
    fn connect(&mut self, url: &str) -> TransportFuture<'_, ()>;

    fn disconnect(&mut self) -> TransportFuture<'_, ()>;

    fn send(&mut self, msg: ClientMessage) -> TransportFuture<'_, ()>;

    /// Next message from the server, or `None` once the connection closed.
    fn recv(&mut self) -> TransportFuture<'_, Option<ServerMessage>>;

    /// A message that already arrived, without waiting for one.
    ///
    /// Returns `Ok(None)` when nothing is queued and `ConnectionClosed`
    /// once the connection is gone.
    fn try_recv(&mut self) -> TransportResult<Option<ServerMessage>>;

    fn is_connected(&self) -> bool;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct Connection {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
}

/// Transport over a tokio-tungstenite WebSocket.
#[derive(Default)]
pub struct WebSocketTransport {
    conn: Option<Connection>,
}

impl WebSocketTransport {
    pub fn new() -> Self {
        WebSocketTransport { conn: None }
    }
}

impl Transport for WebSocketTransport {
    fn connect(&mut self, url: &str) -> TransportFuture<'_, ()> {
        let url = url.to_string();
        Box::pin(async move {
            let (ws, _) = tokio_tungstenite::connect_async(&url)
                .await
                .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
            let (sink, stream) = ws.split();
            self.conn = Some(Connection { sink, stream });
            Ok(())
        })
    }

    fn disconnect(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            if let Some(mut conn) = self.conn.take() {
                // Best effort; the peer may already be gone.
                let _ = conn.sink.close().await;
            }
            Ok(())
        })
    }

    fn send(&mut self, msg: ClientMessage) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            let json = msg.to_json().map_err(|e| TransportError::Malformed(e.to_string()))?;
            let conn = self.conn.as_mut().ok_or(TransportError::ConnectionClosed)?;
            let sent = match conn.sink.send(Message::Text(json.into())).await {
                Ok(()) => conn.sink.flush().await,
                Err(e) => Err(e),
            };
            if let Err(e) = sent {
                self.conn = None;
                return Err(TransportError::SendFailed(e.to_string()));
            }
            Ok(())
        })
    }

    fn recv(&mut self) -> TransportFuture<'_, Option<ServerMessage>> {
        Box::pin(async move {
            let conn = self.conn.as_mut().ok_or(TransportError::ConnectionClosed)?;
            loop {
                match conn.stream.next().await {
                    Some(Ok(Message::Text(text))) => {
                        return ServerMessage::from_json(&text)
                            .map(Some)
                            .map_err(|e| TransportError::Malformed(e.to_string()));
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        self.conn = None;
                        return Ok(None);
                    }
                    // Pings are answered by tungstenite; binary frames are not part of the protocol.
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        self.conn = None;
                        return Err(TransportError::ReceiveFailed(e.to_string()));
                    }
                }
            }
        })
    }

    fn try_recv(&mut self) -> TransportResult<Option<ServerMessage>> {
        let conn = self.conn.as_mut().ok_or(TransportError::ConnectionClosed)?;
        loop {
            match conn.stream.next().now_or_never() {
                None => return Ok(None),
                Some(Some(Ok(Message::Text(text)))) => {
                    return ServerMessage::from_json(&text)
                        .map(Some)
                        .map_err(|e| TransportError::Malformed(e.to_string()));
                }
                Some(Some(Ok(Message::Close(_)))) | Some(None) => {
                    self.conn = None;
                    return Err(TransportError::ConnectionClosed);
                }
                Some(Some(Ok(_))) => continue,
                Some(Some(Err(e))) => {
                    self.conn = None;
                    return Err(TransportError::ReceiveFailed(e.to_string()));
                }
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.conn.is_some()
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
pub(crate) mod tests;
