// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! [`RemoteSyncAdapter`] over the ts-remote WebSocket protocol.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use ts_core::protocol::{ClientMessage, PushStatus, ServerMessage};
use ts_core::{Cursor, RemoteRecord};

use super::adapter::{
    AdapterError, AdapterFuture, PullBatch, PushOutcome, PushRejection, RemoteSyncAdapter,
};
use super::transport::{Transport, TransportError, WebSocketTransport};

/// Default number of changes requested per pull page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Request/response client for a ts-remote server.
///
/// The connection is opened lazily on the first call and reopened after it
/// drops, so a remote that comes back is picked up by the next sync pass.
/// Subscriptions live on the server per connection, so every new connection
/// registers the subscribed scopes again before anything else is sent.
pub struct WebSocketAdapter<T: Transport = WebSocketTransport> {
    url: String,
    transport: T,
    page_size: u32,
    /// A request was sent but its reply never read (the call was cancelled).
    in_flight: bool,
    subscriptions: BTreeSet<String>,
    /// Scopes announced as changed and not yet handed out.
    changed: BTreeSet<String>,
}

impl WebSocketAdapter<WebSocketTransport> {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_transport(url, WebSocketTransport::new())
    }
}

impl<T: Transport> WebSocketAdapter<T> {
    pub fn with_transport(url: impl Into<String>, transport: T) -> Self {
        WebSocketAdapter {
            url: url.into(),
            transport,
            page_size: DEFAULT_PAGE_SIZE,
            in_flight: false,
            subscriptions: BTreeSet::new(),
            changed: BTreeSet::new(),
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Close the connection, if one is open.
    pub async fn close(&mut self) {
        let _ = self.transport.disconnect().await;
        self.in_flight = false;
    }

    async fn request(&mut self, msg: ClientMessage) -> Result<ServerMessage, AdapterError> {
        if self.in_flight {
            // The reply to a cancelled request may still be queued on this connection.
            self.close().await;
        }
        let reused = self.transport.is_connected();
        match self.exchange(msg.clone()).await {
            Err(AdapterError::Unreachable(reason)) if reused => {
                debug!(reason, "stale connection, reconnecting");
                self.close().await;
                self.exchange(msg).await
            }
            other => other,
        }
    }

    async fn exchange(&mut self, msg: ClientMessage) -> Result<ServerMessage, AdapterError> {
        if !self.transport.is_connected() {
            self.connect(Some(&msg)).await?;
        }
        self.round_trip(msg).await
    }

    /// Open the connection and register the subscribed scopes on it.
    ///
    /// `pending` is the request about to be sent; a subscribe for the same
    /// scope is not sent twice.
    async fn connect(&mut self, pending: Option<&ClientMessage>) -> Result<(), AdapterError> {
        self.transport.connect(&self.url).await.map_err(map_transport)?;
        debug!(url = %self.url, "connected to remote");

        let scopes: Vec<String> = self
            .subscriptions
            .iter()
            .filter(|scope| {
                !matches!(pending, Some(ClientMessage::Subscribe { scope: s }) if s == *scope)
            })
            .cloned()
            .collect();
        for scope in scopes {
            match self.round_trip(ClientMessage::Subscribe { scope: scope.clone() }).await? {
                ServerMessage::Subscribed { .. } => debug!(scope, "subscription restored"),
                other => warn!(scope, reply = reply_name(&other), "subscription not restored"),
            }
        }
        Ok(())
    }

    async fn round_trip(&mut self, msg: ClientMessage) -> Result<ServerMessage, AdapterError> {
        self.in_flight = true;
        if let Err(e) = self.transport.send(msg).await {
            self.close().await;
            return Err(map_transport(e));
        }

        loop {
            match self.transport.recv().await {
                Ok(Some(ServerMessage::Changed { scope })) => {
                    debug!(scope, "remote change notification");
                    self.changed.insert(scope);
                }
                Ok(Some(reply)) => {
                    self.in_flight = false;
                    return Ok(reply);
                }
                Ok(None) => {
                    self.close().await;
                    return Err(AdapterError::Unreachable("connection closed".to_string()));
                }
                Err(e) => {
                    self.close().await;
                    return Err(map_transport(e));
                }
            }
        }
    }
}

fn map_transport(err: TransportError) -> AdapterError {
    match err {
        TransportError::Malformed(e) => AdapterError::Protocol(e),
        other => AdapterError::Unreachable(other.to_string()),
    }
}

fn reply_name(msg: &ServerMessage) -> &'static str {
    match msg {
        ServerMessage::PushResponse { .. } => "push_response",
        ServerMessage::PullResponse { .. } => "pull_response",
        ServerMessage::ScopeResponse { .. } => "scope_response",
        ServerMessage::Subscribed { .. } => "subscribed",
        ServerMessage::Unsubscribed { .. } => "unsubscribed",
        ServerMessage::Changed { .. } => "changed",
        ServerMessage::Pong { .. } => "pong",
        ServerMessage::Error { .. } => "error",
    }
}

fn unexpected(expected: &str, reply: ServerMessage) -> AdapterError {
    match reply {
        ServerMessage::Error { message } => AdapterError::Rejected(message),
        other => AdapterError::Protocol(format!(
            "expected {expected}, got {}",
            reply_name(&other)
        )),
    }
}

impl<T: Transport> RemoteSyncAdapter for WebSocketAdapter<T> {
    fn push_pending(&mut self, records: Vec<RemoteRecord>) -> AdapterFuture<'_, PushOutcome> {
        Box::pin(async move {
            let mut outcome = PushOutcome::default();
            if records.is_empty() {
                return Ok(outcome);
            }
            let results = match self.request(ClientMessage::Push { records }).await? {
                ServerMessage::PushResponse { results } => results,
                other => return Err(unexpected("push_response", other)),
            };
            for result in results {
                match result.status {
                    PushStatus::Accepted => outcome.succeeded.push(result.id),
                    PushStatus::Superseded => {
                        outcome.failed.push((result.id, PushRejection::Superseded))
                    }
                    PushStatus::Rejected { reason, retryable } => outcome
                        .failed
                        .push((result.id, PushRejection::Rejected { reason, retryable })),
                }
            }
            Ok(outcome)
        })
    }

    fn pull_changes(&mut self, since: Option<Cursor>) -> AdapterFuture<'_, PullBatch> {
        Box::pin(async move {
            let limit = self.page_size;
            match self.request(ClientMessage::Pull { since, limit }).await? {
                ServerMessage::PullResponse { records, next_cursor, has_more } => {
                    Ok(PullBatch { records, next_cursor, has_more })
                }
                other => Err(unexpected("pull_response", other)),
            }
        })
    }

    fn fetch_latest_since(
        &mut self,
        scope: &str,
        since: Option<DateTime<Utc>>,
    ) -> AdapterFuture<'_, Vec<RemoteRecord>> {
        let scope = scope.to_string();
        Box::pin(async move {
            let msg = ClientMessage::FetchScope { scope: scope.clone(), since };
            match self.request(msg).await? {
                ServerMessage::ScopeResponse { scope: got, records } if got == scope => Ok(records),
                other => Err(unexpected("scope_response", other)),
            }
        })
    }

    fn setup_subscription(&mut self, scope: &str) -> AdapterFuture<'_, ()> {
        let scope = scope.to_string();
        Box::pin(async move {
            // Kept even if this request fails, so the next connection registers it.
            self.subscriptions.insert(scope.clone());
            let result = match self.request(ClientMessage::Subscribe { scope: scope.clone() }).await
            {
                Ok(ServerMessage::Subscribed { scope: got }) if got == scope => Ok(()),
                Ok(other) => Err(unexpected("subscribed", other)),
                Err(e) => Err(e),
            };
            if let Err(AdapterError::Rejected(_)) = result {
                self.subscriptions.remove(&scope);
            }
            result
        })
    }

    fn teardown_subscription(&mut self, scope: &str) -> AdapterFuture<'_, ()> {
        let scope = scope.to_string();
        Box::pin(async move {
            self.subscriptions.remove(&scope);
            self.changed.remove(&scope);
            match self.request(ClientMessage::Unsubscribe { scope: scope.clone() }).await? {
                ServerMessage::Unsubscribed { scope: got } if got == scope => Ok(()),
                other => Err(unexpected("unsubscribed", other)),
            }
        })
    }

    fn changed_scopes(&mut self) -> AdapterFuture<'_, Vec<String>> {
        Box::pin(async move {
            if self.in_flight {
                self.close().await;
            }
            if !self.transport.is_connected() {
                if self.subscriptions.is_empty() {
                    return Ok(Vec::new());
                }
                self.connect(None).await?;
                // Nothing was announced while the connection was down.
                self.changed.extend(self.subscriptions.iter().cloned());
            }

            loop {
                match self.transport.try_recv() {
                    Ok(Some(ServerMessage::Changed { scope })) => {
                        debug!(scope, "remote change notification");
                        self.changed.insert(scope);
                    }
                    Ok(Some(other)) => {
                        debug!(reply = reply_name(&other), "unsolicited message ignored")
                    }
                    Ok(None) => break,
                    Err(e) => {
                        debug!(error = %e, "connection lost while idle");
                        self.close().await;
                        break;
                    }
                }
            }

            let changed = std::mem::take(&mut self.changed);
            Ok(changed.into_iter().filter(|s| self.subscriptions.contains(s)).collect())
        })
    }
}

#[cfg(test)]
#[path = "ws_adapter_tests.rs"]
mod tests;
