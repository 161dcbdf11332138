//! Session lifecycle orchestration.
//!
//! The manager owns the session and is the only writer. Every operation
//! follows the same shape:
//!
//! 1. take a ticket and mark the session as loading (synchronously, before
//!    the first await),
//! 2. talk to the account service,
//! 3. apply store and session effects, but only if no newer operation has
//!    started in the meantime.
//!
//! Starting an operation supersedes all earlier ones. A superseded
//! operation persists nothing, leaves the session alone and returns
//! [`AuthError::Superseded`].

use std::sync::Arc;

use memorizer_domain::{
    AuthError, AuthKind, Credentials, Session, TokenPair, UserClaims, token_preview,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::options::{RefreshFailurePolicy, SessionOptions};
use super::publisher::{SessionPublisher, SessionSubscription};
use crate::auth::TokenCodec;
use crate::ports::{AuthTransport, Clock, TokenStore};

/// What [`SessionManager::bootstrap`] ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum BootstrapOutcome {
    /// No usable tokens were stored.
    Anonymous,
    /// The stored access token was restored; no refresh was attempted.
    Restored,
    /// The session was refreshed with a new token pair.
    Refreshed,
    /// The background refresh failed and the policy was applied.
    RefreshFailed {
        /// The refresh failure, never surfaced in the session.
        error: AuthError,
        /// Whether a signed-in session survived the failure.
        session_kept: bool,
    },
    /// A newer operation started before the restore finished.
    Superseded,
}

/// Proof that an operation was the latest one when it started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ticket(u64);

/// Orchestrates sign-in, sign-up, sign-out, refresh and restore.
pub struct SessionManager {
    transport: Arc<dyn AuthTransport>,
    store: Arc<dyn TokenStore>,
    codec: TokenCodec,
    options: SessionOptions,
    publisher: SessionPublisher,
    generation: Mutex<u64>,
}

impl SessionManager {
    /// Creates a manager with an empty session and default options.
    #[must_use]
    pub fn new(
        transport: Arc<dyn AuthTransport>,
        store: Arc<dyn TokenStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transport,
            store,
            codec: TokenCodec::new(clock),
            options: SessionOptions::default(),
            publisher: SessionPublisher::new(),
            generation: Mutex::new(0),
        }
    }

    /// Replaces the options.
    #[must_use]
    pub const fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Options in effect.
    #[must_use]
    pub const fn options(&self) -> SessionOptions {
        self.options
    }

    /// Read-only view for consumers.
    #[must_use]
    pub fn publisher(&self) -> SessionPublisher {
        self.publisher.clone()
    }

    /// Copy of the current session.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.publisher.snapshot()
    }

    /// Async subscription to session changes.
    #[must_use]
    pub fn subscribe(&self) -> SessionSubscription {
        self.publisher.subscribe()
    }

    /// Codec used to validate tokens.
    #[must_use]
    pub const fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Claims of the signed-in user, checking expiry first.
    ///
    /// An access token that expired since it was stored drops the identity
    /// from the session (durable storage is left for the next bootstrap).
    pub fn current_user(&self) -> Option<UserClaims> {
        let now = self.codec.now();
        let mut user = None;
        self.publisher.update(|session| {
            let expired = match session.current_user() {
                Some(claims) if claims.is_expired_at(now) => true,
                Some(claims) => {
                    user = Some(claims.clone());
                    false
                }
                None => false,
            };
            if expired {
                debug!("access token expired, dropping in-memory session");
                session.clear_identity();
            }
        });
        user
    }

    /// Signs in an existing account.
    ///
    /// # Errors
    ///
    /// Returns the failure, which is also recorded in `Session::error`
    /// (except [`AuthError::Superseded`]).
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<UserClaims, AuthError> {
        self.authenticate(AuthKind::SignIn, credentials).await
    }

    /// Creates an account and signs it in.
    ///
    /// # Errors
    ///
    /// Same as [`sign_in`](Self::sign_in).
    pub async fn sign_up(&self, credentials: &Credentials) -> Result<UserClaims, AuthError> {
        self.authenticate(AuthKind::SignUp, credentials).await
    }

    async fn authenticate(
        &self,
        kind: AuthKind,
        credentials: &Credentials,
    ) -> Result<UserClaims, AuthError> {
        let ticket = self.begin();
        debug!(%kind, login = credentials.login(), "authentication started");

        if let Err(e) = credentials.validate() {
            return self.fail(ticket, e.into());
        }

        let outcome = self
            .transport
            .authenticate(kind, credentials)
            .await
            .and_then(|pair| self.decode_pair(pair));

        match outcome {
            Ok((pair, claims)) => {
                self.establish(ticket, pair, claims.clone())?;
                info!(%kind, login = credentials.login(), "signed in");
                Ok(claims)
            }
            Err(e) => {
                debug!(%kind, error = %e, "authentication failed");
                self.fail(ticket, e)
            }
        }
    }

    /// Signs out.
    ///
    /// The local session is only cleared once the server confirms. Without
    /// an access token there is nothing to revoke and the local state is
    /// cleared directly.
    ///
    /// # Errors
    ///
    /// Returns the failure, which is also recorded in `Session::error`
    /// (except [`AuthError::Superseded`]). The user stays signed in.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let ticket = self.begin();
        let access_token = self.snapshot().access_token().map(str::to_owned);

        let result = match &access_token {
            Some(token) => self.transport.sign_out(token).await,
            None => Ok(()),
        };

        if let Err(e) = result {
            debug!(error = %e, "sign-out failed");
            return self.fail(ticket, e);
        }

        self.guarded(ticket, || {
            if let Err(e) = self.store.clear() {
                let error = AuthError::storage(e.to_string());
                self.publisher.mutate(|session| session.fail(error.clone()));
                return Err(error);
            }
            self.publisher.mutate(|session| {
                session.clear_identity();
                session.is_loading = false;
            });
            Ok(())
        })??;
        info!("signed out");
        Ok(())
    }

    /// Exchanges the stored refresh token for a new pair, in the
    /// foreground: loading and errors are surfaced like a sign-in.
    ///
    /// # Errors
    ///
    /// [`AuthError::MissingRefreshToken`] if no unexpired refresh token is
    /// stored, otherwise the transport failure.
    pub async fn refresh(&self) -> Result<UserClaims, AuthError> {
        let ticket = self.begin();

        let refresh_token = match self.store.load() {
            Ok(stored) => stored
                .refresh_token
                .filter(|token| self.codec.decode_expiry(Some(token)).is_some()),
            Err(e) => return self.fail(ticket, AuthError::storage(e.to_string())),
        };
        let Some(refresh_token) = refresh_token else {
            return self.fail(ticket, AuthError::MissingRefreshToken);
        };

        let outcome = self
            .transport
            .refresh(&refresh_token)
            .await
            .and_then(|pair| self.decode_pair(pair));

        match outcome {
            Ok((pair, claims)) => {
                self.establish(ticket, pair, claims.clone())?;
                debug!("session refreshed");
                Ok(claims)
            }
            Err(e) => self.fail(ticket, e),
        }
    }

    /// Restores the session from durable storage on start-up.
    ///
    /// A valid stored access token is restored immediately and loading is
    /// cleared before any network I/O. If the stored refresh token is still
    /// valid, a refresh follows; its failure is never surfaced and is
    /// handled according to [`RefreshFailurePolicy`]. With nothing restored,
    /// the session stays loading until that refresh resolves.
    pub async fn bootstrap(&self) -> BootstrapOutcome {
        let ticket = self.begin();

        let stored = self.store.load().unwrap_or_else(|e| {
            warn!(error = %e, "could not read stored tokens, starting anonymous");
            memorizer_domain::StoredTokens::default()
        });

        let restored = stored.access_token.as_deref().and_then(|token| {
            self.codec
                .decode(Some(token))
                .map(|claims| (token.to_owned(), claims))
        });
        let was_restored = restored.is_some();
        let refresh_token = stored
            .refresh_token
            .filter(|token| self.codec.decode_expiry(Some(token)).is_some());
        let settled = was_restored || refresh_token.is_none();

        let restore = self.guarded(ticket, || {
            self.publisher.mutate(|session| {
                if let Some((token, claims)) = restored {
                    session.authenticate(token, claims);
                }
                if settled {
                    session.is_loading = false;
                }
            });
        });
        if restore.is_err() {
            return BootstrapOutcome::Superseded;
        }
        if was_restored {
            debug!("session restored from storage");
        }

        let Some(refresh_token) = refresh_token else {
            return if was_restored {
                BootstrapOutcome::Restored
            } else {
                BootstrapOutcome::Anonymous
            };
        };

        let outcome = self
            .transport
            .refresh(&refresh_token)
            .await
            .and_then(|pair| self.decode_pair(pair));

        match outcome {
            Ok((pair, claims)) => match self.apply_refresh(ticket, pair, claims) {
                Ok(()) => BootstrapOutcome::Refreshed,
                Err(AuthError::Superseded) => BootstrapOutcome::Superseded,
                Err(error) => {
                    warn!(error = %error, "could not persist refreshed tokens");
                    BootstrapOutcome::RefreshFailed {
                        error,
                        session_kept: self.snapshot().is_authenticated(),
                    }
                }
            },
            Err(error) => self.on_background_refresh_failure(ticket, error),
        }
    }

    fn on_background_refresh_failure(&self, ticket: Ticket, error: AuthError) -> BootstrapOutcome {
        let policy = self.options.refresh_failure_policy;
        let applied = self.guarded(ticket, || {
            warn!(error = %error, "background token refresh failed");
            match policy {
                RefreshFailurePolicy::KeepStaleSession => {
                    self.publisher.mutate(|session| session.is_loading = false);
                }
                RefreshFailurePolicy::SignOut => {
                    if let Err(e) = self.store.clear() {
                        warn!(error = %e, "could not clear stored tokens");
                    }
                    self.publisher.mutate(|session| {
                        session.clear_identity();
                        session.is_loading = false;
                    });
                }
            }
        });
        if applied.is_err() {
            return BootstrapOutcome::Superseded;
        }

        BootstrapOutcome::RefreshFailed {
            error,
            session_kept: policy == RefreshFailurePolicy::KeepStaleSession
                && self.snapshot().is_authenticated(),
        }
    }

    /// Applies a background refresh. Ends loading but never sets an error.
    fn apply_refresh(
        &self,
        ticket: Ticket,
        pair: TokenPair,
        claims: UserClaims,
    ) -> Result<(), AuthError> {
        self.guarded(ticket, || {
            if let Err(e) = self.store.save(&pair) {
                self.publisher.mutate(|session| session.is_loading = false);
                return Err(AuthError::storage(e.to_string()));
            }
            self.publisher.mutate(|session| {
                session.authenticate(pair.access_token, claims);
                session.is_loading = false;
            });
            Ok(())
        })??;
        debug!("session refreshed in background");
        Ok(())
    }

    /// Starts an operation, superseding all earlier ones.
    fn begin(&self) -> Ticket {
        let ticket = {
            let mut generation = self.generation.lock();
            *generation += 1;
            self.publisher.mutate(Session::begin_loading);
            Ticket(*generation)
        };
        self.publisher.notify();
        ticket
    }

    /// Runs `effects` while holding the generation lock if `ticket` is still
    /// the latest operation. Listeners are notified after the lock is
    /// released.
    fn guarded<T>(&self, ticket: Ticket, effects: impl FnOnce() -> T) -> Result<T, AuthError> {
        let result = {
            let generation = self.generation.lock();
            if *generation != ticket.0 {
                debug!(
                    ticket = ticket.0,
                    latest = *generation,
                    "operation superseded, result discarded"
                );
                return Err(AuthError::Superseded);
            }
            effects()
        };
        self.publisher.notify();
        Ok(result)
    }

    /// Decodes the access token of a freshly issued pair.
    ///
    /// The server is trusted to issue decodable tokens, so failure here is
    /// reported like a transport error.
    fn decode_pair(&self, pair: TokenPair) -> Result<(TokenPair, UserClaims), AuthError> {
        match self.codec.try_decode(&pair.access_token) {
            Ok(claims) => Ok((pair, claims)),
            Err(e) => {
                warn!(
                    token = %token_preview(&pair.access_token),
                    error = %e,
                    "server issued an undecodable access token"
                );
                Err(e.into())
            }
        }
    }

    /// Persists the pair and signs the user in, ending the operation.
    fn establish(
        &self,
        ticket: Ticket,
        pair: TokenPair,
        claims: UserClaims,
    ) -> Result<(), AuthError> {
        self.guarded(ticket, || {
            if let Err(e) = self.store.save(&pair) {
                let error = AuthError::storage(e.to_string());
                self.publisher.mutate(|session| session.fail(error.clone()));
                return Err(error);
            }
            self.publisher.mutate(|session| {
                session.authenticate(pair.access_token, claims);
                session.is_loading = false;
            });
            Ok(())
        })?
    }

    /// Ends the operation with an error, leaving the identity unchanged.
    fn fail<T>(&self, ticket: Ticket, error: AuthError) -> Result<T, AuthError> {
        self.guarded(ticket, || {
            self.publisher.mutate(|session| session.fail(error.clone()));
        })?;
        Err(error)
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("options", &self.options)
            .field("session", &self.snapshot())
            .finish_non_exhaustive()
    }
}
