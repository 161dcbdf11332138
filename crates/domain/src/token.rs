//! Token types and JWT claim extraction.
//!
//! Tokens are decoded without signature verification: the client holds no
//! key, it only needs the claims and the expiry. Anything that does not look
//! like a well-formed, unexpired JWT is treated as "no token".

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Storage slot holding the access token.
pub const ACCESS_TOKEN_SLOT: &str = "__memorizerAccess";

/// Storage slot holding the refresh token.
pub const REFRESH_TOKEN_SLOT: &str = "__memorizerRefresh";

/// Access/refresh token pair as issued by the account service.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Short-lived JWT carrying the user claims.
    pub access_token: String,
    /// Long-lived JWT used to obtain a new pair.
    pub refresh_token: String,
}

impl TokenPair {
    /// Creates a token pair.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &token_preview(&self.access_token))
            .field("refresh_token", &token_preview(&self.refresh_token))
            .finish()
    }
}

/// Whatever is currently persisted in durable storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredTokens {
    /// Persisted access token, if any.
    pub access_token: Option<String>,
    /// Persisted refresh token, if any.
    pub refresh_token: Option<String>,
}

impl StoredTokens {
    /// Returns true if neither slot holds a value.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

impl From<TokenPair> for StoredTokens {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: Some(pair.access_token),
            refresh_token: Some(pair.refresh_token),
        }
    }
}

/// Claims carried by an access token.
///
/// Only obtainable by decoding a token, so a `UserClaims` value always
/// describes a token that was well-formed and unexpired when decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserClaims {
    user: serde_json::Value,
    exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat: Option<i64>,
}

impl UserClaims {
    /// The `user` claim, forwarded verbatim from the token.
    #[must_use]
    pub const fn user(&self) -> &serde_json::Value {
        &self.user
    }

    /// Expiry, seconds since the Unix epoch.
    #[must_use]
    pub const fn exp(&self) -> i64 {
        self.exp
    }

    /// Issue time, seconds since the Unix epoch, when present.
    #[must_use]
    pub const fn issued_at(&self) -> Option<i64> {
        self.iat
    }

    /// Returns true if the claims are expired at `now` (epoch seconds).
    #[must_use]
    pub const fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }

    /// Seconds remaining until expiry at `now`; negative once expired.
    #[must_use]
    pub const fn seconds_until_expiry(&self, now: i64) -> i64 {
        self.exp - now
    }
}

/// Claims common to every token the service issues.
#[derive(Debug, Deserialize)]
struct ExpiryClaims {
    exp: i64,
}

/// Decodes the payload segment of a JWT into `T`.
fn decode_payload<T: for<'de> Deserialize<'de>>(token: &str) -> Result<T, DecodeError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(DecodeError::Empty);
    }

    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::Segments(segments.len()));
    }

    // Some encoders keep the padding; URL_SAFE_NO_PAD rejects it.
    let payload = segments[1].trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| DecodeError::Base64)?;

    serde_json::from_slice(&bytes).map_err(|e| DecodeError::Claims(e.to_string()))
}

/// Decodes an access token into its claims, checking expiry against `now`
/// (seconds since the Unix epoch).
///
/// # Errors
///
/// Returns why the token is unusable: empty, malformed, missing claims, or
/// expired (`exp <= now`).
pub fn decode_claims(token: &str, now: i64) -> Result<UserClaims, DecodeError> {
    let claims: UserClaims = decode_payload(token)?;
    if claims.user.is_null() {
        return Err(DecodeError::Claims("`user` claim is null".to_string()));
    }
    if claims.is_expired_at(now) {
        return Err(DecodeError::Expired { exp: claims.exp });
    }
    Ok(claims)
}

/// Reads only the `exp` claim of a token, checking it against `now`.
///
/// Refresh tokens carry no `user` claim, so they go through this instead of
/// [`decode_claims`].
///
/// # Errors
///
/// Same conditions as [`decode_claims`], minus the `user` requirement.
pub fn decode_expiry(token: &str, now: i64) -> Result<i64, DecodeError> {
    let claims: ExpiryClaims = decode_payload(token)?;
    if now >= claims.exp {
        return Err(DecodeError::Expired { exp: claims.exp });
    }
    Ok(claims.exp)
}

/// Short, log-safe preview of a token (first 8 chars + `...`).
#[must_use]
pub fn token_preview(token: &str) -> String {
    if token.len() > 12 {
        format!("{}...", token.get(..8).unwrap_or_default())
    } else {
        "***".to_string()
    }
}
