//! # crew-auth
//!
//! Identity verification for the Crew collaboration backend.
//!
//! An identity token asserts a user id and display name until some instant,
//! protected by an HMAC-SHA256 tag under a process-wide [`SecretKey`].
//! [`TokenVerifier`] checks the tag and expiry and hands back a
//! [`crew_core::identity::VerifiedIdentity`]. [`TokenIssuer`] mints tokens for
//! operator tooling and tests.

pub mod credential;
pub mod error;
pub mod key;
pub mod token;

use chrono::{DateTime, Utc};
use crew_core::identity::VerifiedIdentity;

pub use error::AuthError;
pub use key::SecretKey;
pub use token::{IdentityToken, TokenIssuer, TokenVerifier};

/// Resolve a bearer header into a verified identity.
///
/// Logs the rejection reason at debug level; callers should surface only a
/// uniform unauthorized outcome.
///
/// # Errors
///
/// Returns any [`AuthError`] raised while extracting or verifying the token.
pub fn authenticate_bearer(
    verifier: &TokenVerifier,
    header: Option<&str>,
    now: DateTime<Utc>,
) -> Result<VerifiedIdentity, AuthError> {
    let result = credential::bearer_token(header).and_then(|raw| verifier.verify_at(raw, now));
    match &result {
        Ok(identity) => tracing::debug!(user = %identity.user_id, "identity verified"),
        Err(error) => tracing::debug!(%error, "identity rejected"),
    }
    result
}
