//! Reload broadcasting to connected browser tabs.
//!
//! [`ChangeBroadcaster`] is the registry of open event-stream connections.
//! Each connection holds a [`Subscription`]; dropping it (the client went
//! away and axum dropped the response stream) removes the connection from the
//! registry.
//!
//! [`ReloadDebouncer`] sits between the filesystem watcher and the
//! broadcaster: every raw change restarts a fixed quiet window, and one
//! reload is broadcast once the window elapses without further changes.

use crate::serve::inject::RELOAD_MESSAGE;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Messages buffered per client before further reloads are dropped for it.
const CLIENT_BUFFER: usize = 16;

/// Registry of subscribed reload connections.
#[derive(Debug, Default)]
pub struct ChangeBroadcaster {
    clients: RwLock<HashMap<usize, mpsc::Sender<String>>>,
    next_client_id: AtomicUsize,
}

/// Shared broadcaster handle.
pub type SharedBroadcaster = Arc<ChangeBroadcaster>;

impl ChangeBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection.
    ///
    /// The returned [`Subscription`] unregisters the connection when dropped.
    pub fn subscribe(self: &Arc<Self>) -> (Subscription, mpsc::Receiver<String>) {
        let id = self.next_client_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(CLIENT_BUFFER);
        self.clients.write().insert(id, tx);
        tracing::debug!("Reload client {} subscribed", id);

        let subscription = Subscription {
            id,
            broadcaster: Arc::clone(self),
        };
        (subscription, rx)
    }

    /// Remove a connection. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: usize) {
        if self.clients.write().remove(&id).is_some() {
            tracing::debug!("Reload client {} disconnected", id);
        }
    }

    /// Number of currently subscribed connections.
    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    /// Send one reload message to every subscribed connection.
    ///
    /// A connection that is gone is removed; it never prevents delivery to
    /// the others. Returns how many connections the message was queued for.
    pub fn broadcast_reload(&self) -> usize {
        let clients: Vec<(usize, mpsc::Sender<String>)> = self
            .clients
            .read()
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        let mut delivered = 0;
        let mut closed = Vec::new();

        for (id, tx) in clients {
            match tx.try_send(RELOAD_MESSAGE.to_string()) {
                Ok(()) => delivered += 1,
                // A full buffer already holds a pending reload.
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::debug!("Reload client {} is backed up, skipping", id);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => closed.push(id),
            }
        }

        for id in closed {
            tracing::warn!("Reload client {} closed before delivery", id);
            self.unsubscribe(id);
        }

        tracing::info!("Reload sent to {} client(s)", delivered);
        delivered
    }
}

/// Membership of one connection in the broadcaster.
#[derive(Debug)]
pub struct Subscription {
    id: usize,
    broadcaster: SharedBroadcaster,
}

impl Subscription {
    pub fn id(&self) -> usize {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.broadcaster.unsubscribe(self.id);
    }
}

/// Coalesces bursts of filesystem changes into single reload broadcasts.
#[derive(Debug, Clone)]
pub struct ReloadDebouncer {
    tx: mpsc::UnboundedSender<()>,
}

impl ReloadDebouncer {
    /// Start the debounce loop on the current tokio runtime.
    ///
    /// The loop ends once every `ReloadDebouncer` handle is dropped.
    pub fn spawn(broadcaster: SharedBroadcaster, window: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_debounce(rx, broadcaster, window));
        Self { tx }
    }

    /// Record one raw filesystem change.
    pub fn on_change(&self) {
        let _ = self.tx.send(());
    }
}

async fn run_debounce(
    mut rx: mpsc::UnboundedReceiver<()>,
    broadcaster: SharedBroadcaster,
    window: Duration,
) {
    while rx.recv().await.is_some() {
        let mut coalesced = 1usize;
        loop {
            match tokio::time::timeout(window, rx.recv()).await {
                Ok(Some(())) => coalesced += 1,
                Ok(None) => {
                    broadcaster.broadcast_reload();
                    return;
                }
                Err(_) => break,
            }
        }
        tracing::debug!("Coalesced {} change(s) into one reload", coalesced);
        broadcaster.broadcast_reload();
    }
}
