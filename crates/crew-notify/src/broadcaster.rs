//! Registry of live connections keyed by user, with best-effort fan-out.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crew_core::message::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::connection::{Connection, ConnectionId};

/// Counts from one [`Broadcaster::send`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendReport {
    /// Connections a write was attempted on.
    pub attempted: usize,
    pub delivered: usize,
    /// Connections removed because the write failed.
    pub dropped: usize,
}

/// Process-wide notification registry. Cheap to clone; clones share state.
///
/// Each user maps to zero or more connections. The map is sharded so that
/// registrations and sends for different users do not contend.
#[derive(Debug, Clone, Default)]
pub struct Broadcaster {
    registry: Arc<DashMap<String, Vec<Connection>>>,
    next_id: Arc<AtomicU64>,
}

impl Broadcaster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a connection with an id unique to this broadcaster, and the
    /// receiver its writer task should drain. `buffer` is clamped to at least 1.
    ///
    /// The connection is not registered until [`Broadcaster::register`].
    #[must_use]
    pub fn connect(&self, buffer: usize) -> (Connection, mpsc::Receiver<Message>) {
        Connection::channel(self.next_id.fetch_add(1, Ordering::Relaxed), buffer)
    }

    /// Add a connection for `user_id`. Existing connections are kept.
    pub fn register(&self, user_id: &str, connection: Connection) -> ConnectionId {
        let id = connection.id();
        self.registry
            .entry(user_id.to_string())
            .or_default()
            .push(connection);
        tracing::debug!(user = user_id, connection = %id, "connection registered");
        id
    }

    /// Remove one connection. Returns whether it was still registered.
    pub fn unregister(&self, user_id: &str, connection_id: ConnectionId) -> bool {
        let removed = self
            .registry
            .get_mut(user_id)
            .is_some_and(|mut connections| {
                let before = connections.len();
                connections.retain(|c| c.id() != connection_id);
                connections.len() != before
            });
        self.registry.remove_if(user_id, |_, v| v.is_empty());
        if removed {
            tracing::debug!(user = user_id, connection = %connection_id, "connection unregistered");
        }
        removed
    }

    /// Write `message` to every live connection of every distinct recipient.
    ///
    /// Writes never block. A connection whose write fails is dropped from the
    /// registry; the recipient's other connections are unaffected.
    pub fn send<S: AsRef<str>>(&self, message: &Message, recipients: &[S]) -> SendReport {
        let mut report = SendReport::default();
        let mut seen = HashSet::new();

        for recipient in recipients {
            let user_id: &str = recipient.as_ref();
            if !seen.insert(user_id) {
                continue;
            }
            let emptied = match self.registry.get_mut(user_id) {
                Some(mut connections) => {
                    connections.retain(|connection| {
                        report.attempted += 1;
                        match connection.try_deliver(message) {
                            Ok(()) => {
                                report.delivered += 1;
                                true
                            }
                            Err(error) => {
                                report.dropped += 1;
                                tracing::debug!(
                                    user = user_id,
                                    connection = %connection.id(),
                                    %error,
                                    "dropping connection after failed write"
                                );
                                false
                            }
                        }
                    });
                    connections.is_empty()
                }
                None => false,
            };
            if emptied {
                self.registry.remove_if(user_id, |_, v| v.is_empty());
            }
        }

        tracing::trace!(
            kind = %message.kind,
            subject = %message.subject_id,
            attempted = report.attempted,
            delivered = report.delivered,
            dropped = report.dropped,
            "message sent"
        );
        report
    }

    /// Live connections registered for `user_id`.
    #[must_use]
    pub fn connection_count(&self, user_id: &str) -> usize {
        self.registry.get(user_id).map_or(0, |c| c.len())
    }

    /// Users with at least one registered connection.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.registry.len()
    }
}
