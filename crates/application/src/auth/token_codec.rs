//! Access token decoding with expiry checking.

use std::fmt;
use std::sync::Arc;

use memorizer_domain::{DecodeError, UserClaims, decode_claims, decode_expiry};

use crate::ports::Clock;

/// Decodes tokens into claims and checks them against a clock.
///
/// Malformed or expired input is "no token", never an error: [`decode`]
/// returns `None`. [`try_decode`] keeps the reason for diagnostics.
///
/// [`decode`]: TokenCodec::decode
/// [`try_decode`]: TokenCodec::try_decode
#[derive(Clone)]
pub struct TokenCodec {
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    /// Creates a codec reading time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Current time in seconds since the Unix epoch.
    #[must_use]
    pub fn now(&self) -> i64 {
        self.clock.timestamp()
    }

    /// Decodes an access token, returning `None` for absent, empty,
    /// malformed or expired tokens.
    #[must_use]
    pub fn decode(&self, token: Option<&str>) -> Option<UserClaims> {
        token.and_then(|t| self.try_decode(t).ok())
    }

    /// Decodes an access token, explaining why it is unusable.
    ///
    /// # Errors
    ///
    /// Returns the [`DecodeError`] describing the first problem found.
    pub fn try_decode(&self, token: &str) -> Result<UserClaims, DecodeError> {
        decode_claims(token, self.now())
    }

    /// Expiry of a token that only needs `exp` (refresh tokens), or `None`
    /// if absent, malformed or expired.
    #[must_use]
    pub fn decode_expiry(&self, token: Option<&str>) -> Option<i64> {
        token.and_then(|t| decode_expiry(t, self.now()).ok())
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("now", &self.now())
            .finish()
    }
}
