//! Connection Registry
//!
//! Process-wide store of live connections and the two-way mapping between
//! user identity and connection. All operations are safe under concurrent
//! invocation from any number of connection tasks; the registry is the only
//! shared mutable state in the gateway.

use std::sync::Arc;

use axum::extract::ws::Message;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::shared::error::RegisterError;

/// Transport-owned handle to a single connection.
///
/// The connection task owns the receiving half of the channel and forwards
/// queued frames to the socket; the registry and dispatcher hold `Arc`
/// references and only ever push onto the queue, so no send here blocks.
#[derive(Debug)]
pub struct ConnectionHandle {
    id: String,
    sender: mpsc::UnboundedSender<Message>,
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl ConnectionHandle {
    /// Create a handle plus the receiver its connection task drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = Self {
            id: Uuid::new_v4().to_string(),
            sender,
        };
        (handle, receiver)
    }

    /// Process-unique connection identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the connection is still accepting writes.
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Queue a frame for delivery. Silently drops if the connection is
    /// closing or closed; returns whether the frame was queued.
    pub fn send(&self, message: Message) -> bool {
        if self.is_open() {
            self.sender.send(message).is_ok()
        } else {
            false
        }
    }
}

/// Registry of all live connections and user-identity bindings.
///
/// Invariant: at most one live (user -> connection) pair per identity, and
/// `by_user[u]` points at connection `c` iff `user_of[c.id] == u`.
/// `count`/`snapshot_users` are weakly consistent: they reflect some registry
/// state during the call, not a value frozen for a whole broadcast.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// All connections currently accepting writes, by connection id
    connections: DashMap<String, Arc<ConnectionHandle>>,
    /// User identity -> connection
    by_user: DashMap<String, Arc<ConnectionHandle>>,
    /// Connection id -> user identity, used for cleanup on disconnect
    user_of: DashMap<String, String>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to the live set.
    pub fn insert(&self, handle: Arc<ConnectionHandle>) {
        self.connections.insert(handle.id().to_string(), handle);
    }

    /// Remove a connection from the live set.
    pub fn remove(&self, connection_id: &str) -> Option<Arc<ConnectionHandle>> {
        self.connections
            .remove(connection_id)
            .map(|(_, handle)| handle)
    }

    /// Bind a user identity to a connection.
    ///
    /// The existence check and the insertion of both mapping entries happen
    /// under the `by_user` entry lock, so concurrent attempts for the same
    /// identity serialize and exactly one succeeds. A losing attempt mutates
    /// nothing.
    pub fn bind_user(
        &self,
        handle: &Arc<ConnectionHandle>,
        user_id: &str,
    ) -> Result<(), RegisterError> {
        match self.by_user.entry(user_id.to_string()) {
            Entry::Occupied(_) => Err(RegisterError::UserExists(user_id.to_string())),
            Entry::Vacant(slot) => {
                self.user_of
                    .insert(handle.id().to_string(), user_id.to_string());
                slot.insert(Arc::clone(handle));
                Ok(())
            }
        }
    }

    /// Remove the user binding for a connection, returning the identity that
    /// was bound. No-op if the connection never registered.
    pub fn unbind(&self, connection_id: &str) -> Option<String> {
        let (_, user_id) = self.user_of.remove(connection_id)?;
        self.by_user.remove(&user_id);
        Some(user_id)
    }

    /// Look up the connection a user identity is bound to.
    pub fn connection_for_user(&self, user_id: &str) -> Option<Arc<ConnectionHandle>> {
        self.by_user.get(user_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Look up the user identity bound to a connection.
    pub fn user_for_connection(&self, connection_id: &str) -> Option<String> {
        self.user_of.get(connection_id).map(|entry| entry.value().clone())
    }

    /// Sorted snapshot of currently registered user identities.
    pub fn snapshot_users(&self) -> Vec<String> {
        let mut users: Vec<String> = self.by_user.iter().map(|e| e.key().clone()).collect();
        users.sort();
        users
    }

    /// Number of live connections.
    pub fn count(&self) -> usize {
        self.connections.len()
    }

    /// Visit every live connection.
    pub fn for_each_connection(&self, mut visit: impl FnMut(&Arc<ConnectionHandle>)) {
        for entry in self.connections.iter() {
            visit(entry.value());
        }
    }

    /// Drop every entry. Only used during shutdown, after close frames have
    /// been queued to all connections.
    pub fn clear(&self) {
        self.connections.clear();
        self.by_user.clear();
        self.user_of.clear();
    }
}
