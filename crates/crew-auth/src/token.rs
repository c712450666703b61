//! Identity tokens: issuance, wire encoding, and verification.
//!
//! Wire form is `base64url(claims_json) "." base64url(tag)` without padding,
//! where `tag = HMAC-SHA256(key, encode(display_name, subject, valid_until))`.
//! `encode` length-prefixes each string so bytes cannot migrate between fields.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use crew_core::identity::VerifiedIdentity;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::AuthError;
use crate::key::SecretKey;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    name: String,
    exp: i64,
}

/// A signed identity assertion, as produced by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityToken {
    pub subject: String,
    pub display_name: String,
    pub valid_until: DateTime<Utc>,
    integrity_tag: Vec<u8>,
}

impl IdentityToken {
    /// Encode for transport in a bearer header or query parameter.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Malformed` if the claims cannot be serialized.
    pub fn to_wire(&self) -> Result<String, AuthError> {
        let claims = Claims {
            sub: self.subject.clone(),
            name: self.display_name.clone(),
            exp: self.valid_until.timestamp(),
        };
        let json = serde_json::to_vec(&claims).map_err(|e| AuthError::Malformed(e.to_string()))?;
        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(json),
            URL_SAFE_NO_PAD.encode(&self.integrity_tag)
        ))
    }

    /// Parse the wire form without checking the tag or expiry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Malformed` if the structure or encoding is invalid.
    pub fn from_wire(raw: &str) -> Result<Self, AuthError> {
        let (claims_part, tag_part) = raw
            .trim()
            .split_once('.')
            .ok_or_else(|| AuthError::Malformed("missing tag separator".into()))?;
        if tag_part.contains('.') {
            return Err(AuthError::Malformed("unexpected extra segment".into()));
        }

        let claims_json = URL_SAFE_NO_PAD
            .decode(claims_part)
            .map_err(|e| AuthError::Malformed(format!("claims base64: {e}")))?;
        let claims: Claims = serde_json::from_slice(&claims_json)
            .map_err(|e| AuthError::Malformed(format!("claims json: {e}")))?;
        let integrity_tag = URL_SAFE_NO_PAD
            .decode(tag_part)
            .map_err(|e| AuthError::Malformed(format!("tag base64: {e}")))?;
        let valid_until = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| AuthError::Malformed("exp out of range".into()))?;

        Ok(Self {
            subject: claims.sub,
            display_name: claims.name,
            valid_until,
            integrity_tag,
        })
    }
}

fn tag_input(display_name: &str, subject: &str, valid_until: i64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(display_name.len() + subject.len() + 16);
    for field in [display_name, subject] {
        let len = u32::try_from(field.len()).unwrap_or(u32::MAX);
        buf.extend_from_slice(&len.to_be_bytes());
        buf.extend_from_slice(field.as_bytes());
    }
    buf.extend_from_slice(&valid_until.to_be_bytes());
    buf
}

fn new_mac(key: &SecretKey) -> Result<HmacSha256, AuthError> {
    HmacSha256::new_from_slice(key.as_bytes()).map_err(|e| AuthError::InvalidKey(e.to_string()))
}

/// Mints identity tokens. Stands in for the identity provider in tooling and tests.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    key: SecretKey,
}

impl TokenIssuer {
    #[must_use]
    pub const fn new(key: SecretKey) -> Self {
        Self { key }
    }

    /// Issue a token for `subject`, valid until `valid_until` (second precision).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidKey` if the key is unusable for HMAC.
    pub fn issue(
        &self,
        subject: &str,
        display_name: &str,
        valid_until: DateTime<Utc>,
    ) -> Result<IdentityToken, AuthError> {
        let exp = valid_until.timestamp();
        let mut mac = new_mac(&self.key)?;
        mac.update(&tag_input(display_name, subject, exp));
        Ok(IdentityToken {
            subject: subject.to_string(),
            display_name: display_name.to_string(),
            valid_until: DateTime::from_timestamp(exp, 0).unwrap_or(valid_until),
            integrity_tag: mac.finalize().into_bytes().to_vec(),
        })
    }
}

/// Verifies identity tokens against the process-wide key.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    key: SecretKey,
}

impl TokenVerifier {
    #[must_use]
    pub const fn new(key: SecretKey) -> Self {
        Self { key }
    }

    /// Verify a wire token against the current time.
    ///
    /// # Errors
    ///
    /// See [`TokenVerifier::verify_at`].
    pub fn verify(&self, raw: &str) -> Result<VerifiedIdentity, AuthError> {
        self.verify_at(raw, Utc::now())
    }

    /// Verify a wire token as of `now`.
    ///
    /// The integrity tag is checked (in constant time) before expiry so that a
    /// forged token never reports anything about its claimed lifetime.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Malformed`, `AuthError::BadIntegrityTag`, or
    /// `AuthError::Expired`.
    pub fn verify_at(&self, raw: &str, now: DateTime<Utc>) -> Result<VerifiedIdentity, AuthError> {
        let token = IdentityToken::from_wire(raw)?;
        self.check(&token, now)
    }

    /// Verify an already-parsed token as of `now`, stripping its tag.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::BadIntegrityTag` or `AuthError::Expired`.
    pub fn check(
        &self,
        token: &IdentityToken,
        now: DateTime<Utc>,
    ) -> Result<VerifiedIdentity, AuthError> {
        let mut mac = new_mac(&self.key)?;
        mac.update(&tag_input(
            &token.display_name,
            &token.subject,
            token.valid_until.timestamp(),
        ));
        mac.verify_slice(&token.integrity_tag)
            .map_err(|_| AuthError::BadIntegrityTag)?;

        if now >= token.valid_until {
            return Err(AuthError::Expired {
                valid_until: token.valid_until,
            });
        }

        Ok(VerifiedIdentity {
            user_id: token.subject.clone(),
            display_name: token.display_name.clone(),
            valid_until: token.valid_until,
        })
    }
}
