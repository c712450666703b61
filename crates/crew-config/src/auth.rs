//! Identity token configuration.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Smallest accepted secret key, in bytes.
pub const MIN_SECRET_KEY_BYTES: usize = 32;

const fn default_token_ttl_secs() -> i64 {
    60 * 60 * 24
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Hex-encoded HMAC key used to sign and verify identity tokens.
    #[serde(default)]
    pub secret_key: String,

    /// Lifetime of tokens minted by `crewd token issue`.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            token_ttl_secs: default_token_ttl_secs(),
        }
    }
}

impl AuthConfig {
    /// Check if a secret key has been provided.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.secret_key.is_empty()
    }

    /// Decode the hex secret key and enforce the minimum length.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotConfigured` if no key is set, or
    /// `ConfigError::InvalidValue` if it is not hex or too short.
    pub fn secret_key_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        if !self.is_configured() {
            return Err(ConfigError::NotConfigured {
                section: "auth".into(),
            });
        }
        let bytes = hex::decode(self.secret_key.trim()).map_err(|e| ConfigError::InvalidValue {
            field: "auth.secret_key".into(),
            reason: format!("must be hex-encoded: {e}"),
        })?;
        if bytes.len() < MIN_SECRET_KEY_BYTES {
            return Err(ConfigError::InvalidValue {
                field: "auth.secret_key".into(),
                reason: format!(
                    "must decode to at least {MIN_SECRET_KEY_BYTES} bytes, got {}",
                    bytes.len()
                ),
            });
        }
        Ok(bytes)
    }
}
