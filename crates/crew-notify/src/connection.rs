//! A single live client connection as seen by the broadcaster.

use crew_core::message::Message;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::error::NotifyError;

/// Handle for one connection, unique within the [`Broadcaster`](crate::Broadcaster) that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Sending half of a bounded channel drained by the socket's writer task.
///
/// Dropping the last `Connection` for a channel closes it, which tells the
/// writer task to shut the socket.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    sender: mpsc::Sender<Message>,
}

impl Connection {
    /// `buffer` is clamped to at least 1.
    pub(crate) fn channel(id: u64, buffer: usize) -> (Self, mpsc::Receiver<Message>) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        (
            Self {
                id: ConnectionId(id),
                sender,
            },
            receiver,
        )
    }

    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a message without waiting.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Full` if the writer is behind, or
    /// `NotifyError::Closed` if the writer task has exited.
    pub fn try_deliver(&self, message: &Message) -> Result<(), NotifyError> {
        self.sender.try_send(message.clone()).map_err(|e| match e {
            TrySendError::Full(_) => NotifyError::Full,
            TrySendError::Closed(_) => NotifyError::Closed,
        })
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
