//! Process-wide HMAC key material.

use std::fmt;
use std::sync::Arc;

use crate::error::AuthError;

/// Length of keys produced by [`SecretKey::generate`].
pub const GENERATED_KEY_BYTES: usize = 32;

/// Shared, read-only secret used to tag and verify identity tokens.
///
/// Cloning is cheap; all clones share the same bytes. The `Debug` output never
/// contains the key.
#[derive(Clone)]
pub struct SecretKey(Arc<[u8]>);

impl SecretKey {
    /// Wrap raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidKey` if `bytes` is empty.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AuthError> {
        if bytes.is_empty() {
            return Err(AuthError::InvalidKey("key must not be empty".into()));
        }
        Ok(Self(Arc::from(bytes)))
    }

    /// Decode a hex-encoded key.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidKey` if the string is not valid hex or empty.
    pub fn from_hex(s: &str) -> Result<Self, AuthError> {
        let bytes = hex::decode(s.trim()).map_err(|e| AuthError::InvalidKey(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Generate a fresh random key from the OS RNG.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::KeyGeneration` if the OS RNG is unavailable.
    pub fn generate() -> Result<Self, AuthError> {
        let mut bytes = [0u8; GENERATED_KEY_BYTES];
        getrandom::fill(&mut bytes).map_err(|e| AuthError::KeyGeneration(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("len", &self.0.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_differ() {
        let a = SecretKey::generate().unwrap();
        let b = SecretKey::generate().unwrap();
        assert_eq!(a.as_bytes().len(), GENERATED_KEY_BYTES);
        assert_ne!(a.to_hex(), b.to_hex());
    }

    #[test]
    fn hex_roundtrip() {
        let key = SecretKey::generate().unwrap();
        let decoded = SecretKey::from_hex(&key.to_hex()).unwrap();
        assert_eq!(decoded.as_bytes(), key.as_bytes());
    }

    #[test]
    fn rejects_empty_and_invalid_hex() {
        assert!(SecretKey::from_hex("").is_err());
        assert!(SecretKey::from_hex("not hex").is_err());
    }

    #[test]
    fn debug_does_not_leak_key() {
        let key = SecretKey::from_bytes(&[0xab; 4]).unwrap();
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("ab"));
        assert!(rendered.contains("len"));
    }
}
