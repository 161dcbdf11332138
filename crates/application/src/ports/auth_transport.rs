//! Authentication transport port

use async_trait::async_trait;
use memorizer_domain::{AuthError, AuthKind, Credentials, TokenPair};

/// Port for the account service's authentication endpoints.
///
/// Implementations normalize every failure (no response, malformed
/// response, server-reported error) into an [`AuthError`]; transport
/// library errors never reach the caller.
#[async_trait]
pub trait AuthTransport: Send + Sync {
    /// Signs in or signs up with the given credentials.
    ///
    /// # Errors
    ///
    /// Returns the normalized failure.
    async fn authenticate(
        &self,
        kind: AuthKind,
        credentials: &Credentials,
    ) -> Result<TokenPair, AuthError>;

    /// Exchanges a refresh token for a new token pair.
    ///
    /// # Errors
    ///
    /// Returns the normalized failure.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;

    /// Invalidates the session server-side.
    ///
    /// # Errors
    ///
    /// Returns the normalized failure.
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}
