use thiserror::Error;

/// Why a write to a single connection failed.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum NotifyError {
    /// The socket's writer task has gone away.
    #[error("connection closed")]
    Closed,

    /// The socket is not draining; its outbound buffer is full.
    #[error("connection buffer full")]
    Full,
}
