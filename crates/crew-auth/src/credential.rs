//! Pull raw credentials out of transport headers.

use crate::error::AuthError;

/// Subprotocol marker a browser client sends ahead of its token, since
/// browsers cannot set an `Authorization` header on a websocket upgrade.
pub const WS_BEARER_PROTOCOL: &str = "bearer";

/// Extract the token from an `Authorization: Bearer <token>` header value.
///
/// The scheme is matched case-insensitively.
///
/// # Errors
///
/// Returns `AuthError::MissingCredential` when the header is absent or blank,
/// and `AuthError::Malformed` when another scheme is used.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.map(str::trim).unwrap_or_default();
    if value.is_empty() || value.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MissingCredential);
    }
    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(|| AuthError::Malformed("authorization header has no scheme".into()))?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::Malformed(format!("unsupported scheme {scheme}")));
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }
    Ok(token)
}

/// Extract the token from a `Sec-WebSocket-Protocol: bearer, <token>` value.
///
/// Returns `None` unless the first listed protocol is [`WS_BEARER_PROTOCOL`]
/// and a non-empty token follows it.
#[must_use]
pub fn websocket_protocol_token(header: Option<&str>) -> Option<&str> {
    let mut parts = header?.split(',').map(str::trim);
    if parts.next()? != WS_BEARER_PROTOCOL {
        return None;
    }
    parts.next().filter(|t| !t.is_empty())
}
