// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket server implementation.
//!
//! Handles client connections, request routing, and change fanout to the
//! scopes each connection subscribed to.

use std::collections::HashSet;
use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::error::RecvError;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use ts_core::protocol::{ClientMessage, ServerMessage};

use crate::state::ServerState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Bind `addr` and serve until the accept loop fails.
pub async fn run(addr: SocketAddr, state: ServerState) -> Result<(), BoxError> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on: {}", listener.local_addr()?);
    serve(listener, state).await
}

/// Accept connections on an already bound listener.
pub async fn serve(listener: TcpListener, state: ServerState) -> Result<(), BoxError> {
    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let state = state.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }
}

/// Handle a single WebSocket connection.
pub(crate) async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: ServerState,
) -> Result<(), BoxError> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    info!("New WebSocket connection from: {}", peer_addr);

    let (mut ws_sink, mut ws_stream) = ws_stream.split();
    let mut broadcast_rx = state.subscribe();
    let mut scopes = HashSet::new();

    loop {
        tokio::select! {
            msg = ws_stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = match handle_client_message(&text, &state, &mut scopes).await {
                            Ok(response) => response,
                            Err(e) => ServerMessage::error(e.to_string()),
                        };
                        ws_sink.send(Message::Text(response.to_json()?.into())).await?;
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client {} disconnected", peer_addr);
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        ws_sink.send(Message::Pong(data)).await?;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!("WebSocket error from {}: {}", peer_addr, e);
                        break;
                    }
                    None => {
                        info!("Client {} stream ended", peer_addr);
                        break;
                    }
                }
            }

            broadcast = broadcast_rx.recv() => {
                match broadcast {
                    Ok(msg) => {
                        if !wants(&scopes, &msg) {
                            continue;
                        }
                        let json = msg.to_json()?;
                        if let Err(e) = ws_sink.send(Message::Text(json.into())).await {
                            warn!("Failed to send notification to {}: {}", peer_addr, e);
                            break;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        warn!("Client {} lagged by {} notifications", peer_addr, n);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    info!("Connection closed: {}", peer_addr);
    Ok(())
}

/// True if a broadcast should reach a connection subscribed to `scopes`.
fn wants(scopes: &HashSet<String>, msg: &ServerMessage) -> bool {
    match msg {
        ServerMessage::Changed { scope } => scopes.contains(scope),
        _ => false,
    }
}

/// Process a client message and return its response.
pub(crate) async fn handle_client_message(
    text: &str,
    state: &ServerState,
    scopes: &mut HashSet<String>,
) -> Result<ServerMessage, BoxError> {
    let msg = ClientMessage::from_json(text)?;
    debug!("Received message: {:?}", msg);

    let response = match msg {
        ClientMessage::Push { records } => {
            let results = state.push(&records).await?;
            debug!("Push response: {} results", results.len());
            ServerMessage::PushResponse { results }
        }

        ClientMessage::Pull { since, limit } => {
            let page = state.pull(since.as_ref(), limit).await?;
            debug!(
                "Pull response: {} records, next cursor {}",
                page.records.len(),
                page.next_cursor
            );
            ServerMessage::PullResponse {
                records: page.records,
                next_cursor: page.next_cursor,
                has_more: page.has_more,
            }
        }

        ClientMessage::FetchScope { scope, since } => {
            let records = state.fetch_scope(&scope, since).await?;
            debug!("Scope response: {} records in {}", records.len(), scope);
            ServerMessage::ScopeResponse { scope, records }
        }

        ClientMessage::Subscribe { scope } => {
            scopes.insert(scope.clone());
            ServerMessage::Subscribed { scope }
        }

        ClientMessage::Unsubscribe { scope } => {
            scopes.remove(&scope);
            ServerMessage::Unsubscribed { scope }
        }

        ClientMessage::Ping { id } => {
            debug!("Ping received: {}", id);
            ServerMessage::Pong { id }
        }
    };

    Ok(response)
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
