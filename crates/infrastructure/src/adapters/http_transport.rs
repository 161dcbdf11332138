//! Account service transport using reqwest.
//!
//! Talks to the four account endpoints and normalizes every outcome into
//! a [`TokenPair`] or an [`AuthError`]. Raw reqwest errors never leave this
//! module.

use std::time::Duration;

use async_trait::async_trait;
use memorizer_application::ports::AuthTransport;
use memorizer_domain::{AuthError, AuthKind, Credentials, ErrorValue, TokenPair};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// Path of the account API below the base URL.
pub const API_PREFIX: &str = "api/account/";

/// Success body of the token-issuing endpoints.
///
/// The service answers `{tokens: {...}}`. Some gateways wrap bodies in
/// `data`, so that shape is accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TokenEnvelope {
    Bare { tokens: TokenPair },
    Wrapped { data: TokensBody },
}

#[derive(Debug, Deserialize)]
struct TokensBody {
    tokens: TokenPair,
}

impl TokenEnvelope {
    fn into_pair(self) -> TokenPair {
        match self {
            Self::Bare { tokens } | Self::Wrapped { data: TokensBody { tokens } } => tokens,
        }
    }
}

/// Error body of the account service.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// [`AuthTransport`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpAuthTransport {
    client: Client,
    base_url: Url,
}

impl HttpAuthTransport {
    /// Creates a transport for the service at `base_url`.
    ///
    /// Every request is bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Transport`] if the HTTP client cannot be built.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, AuthError> {
        let client = Client::builder()
            .user_agent(concat!("memorizer-auth/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::transport(format!("could not build HTTP client: {e}")))?;

        Ok(Self::with_client(client, base_url))
    }

    /// Creates a transport with a custom reqwest client.
    #[must_use]
    pub fn with_client(client: Client, mut base_url: Url) -> Self {
        // Joining relative paths keeps any prefix only with a trailing slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { client, base_url }
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, name: &str) -> Result<Url, AuthError> {
        self.base_url
            .join(API_PREFIX)
            .and_then(|api| api.join(name))
            .map_err(|e| AuthError::transport(format!("invalid endpoint URL: {e}")))
    }

    /// Maps reqwest errors to [`AuthError`].
    fn map_error(error: &reqwest::Error) -> AuthError {
        if error.is_timeout() {
            return AuthError::transport("request timed out");
        }
        if error.is_connect() {
            let host = error
                .url()
                .and_then(Url::host_str)
                .unwrap_or("unknown")
                .to_string();
            return AuthError::transport(format!("could not connect to {host}"));
        }
        if error.is_decode() || error.is_body() {
            return AuthError::malformed(format!("could not read response body: {error}"));
        }
        AuthError::transport(error.to_string())
    }

    /// Turns a non-2xx response into an error.
    async fn error_from(response: Response) -> AuthError {
        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return Self::map_error(&e),
        };
        Self::error_from_body(status, &body)
    }

    fn error_from_body(status: StatusCode, body: &str) -> AuthError {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody {
                error: Some(error),
            }) if !error.is_null() => AuthError::Server {
                status: Some(status.as_u16()),
                error: ErrorValue::new(error),
            },
            _ => AuthError::malformed(format!("HTTP {status} without an error body")),
        }
    }

    async fn token_pair(response: Response) -> Result<TokenPair, AuthError> {
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        let body = response.text().await.map_err(|e| Self::map_error(&e))?;
        serde_json::from_str::<TokenEnvelope>(&body)
            .map(TokenEnvelope::into_pair)
            .map_err(|e| AuthError::malformed(format!("unexpected token response: {e}")))
    }
}

#[async_trait]
impl AuthTransport for HttpAuthTransport {
    async fn authenticate(
        &self,
        kind: AuthKind,
        credentials: &Credentials,
    ) -> Result<TokenPair, AuthError> {
        let url = self.endpoint(kind.endpoint())?;
        debug!(%url, login = credentials.login(), "POST credentials");

        let response = self
            .client
            .post(url)
            .json(credentials)
            .send()
            .await
            .map_err(|e| Self::map_error(&e))?;

        Self::token_pair(response).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let url = self.endpoint("tokens")?;
        debug!(%url, "POST refresh token");

        let response = self
            .client
            .post(url)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(|e| Self::map_error(&e))?;

        Self::token_pair(response).await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let url = self.endpoint("signout")?;
        debug!(%url, "POST sign-out");

        let response = self
            .client
            .post(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| Self::map_error(&e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from(response).await)
        }
    }
}
