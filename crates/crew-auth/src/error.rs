use chrono::{DateTime, Utc};
use thiserror::Error;

/// Why a credential was rejected or could not be produced.
///
/// The variants exist for server-side logging only. Callers of the HTTP API
/// always see the same unauthorized response regardless of which one fired.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("no credential supplied")]
    MissingCredential,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token integrity tag does not match")]
    BadIntegrityTag,

    #[error("token expired at {valid_until}")]
    Expired { valid_until: DateTime<Utc> },

    #[error("invalid secret key: {0}")]
    InvalidKey(String),

    #[error("failed to generate key material: {0}")]
    KeyGeneration(String),
}
