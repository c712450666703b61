use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Authenticated user identity with the integrity tag already stripped.
///
/// Produced by `crew-auth` after token verification, consumed by the request
/// pipeline and the service layer. Never carries key material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VerifiedIdentity {
    /// Opaque user id (token `sub`).
    pub user_id: String,
    /// Display name asserted by the identity provider.
    pub display_name: String,
    /// Instant after which the token stops being accepted.
    pub valid_until: DateTime<Utc>,
}
