//! Session state types for UI binding.
//!
//! The session is a plain record of `(current_user, access_token,
//! is_loading, error)`. The derived [`SessionPhase`] lets the UI show:
//! - `Anonymous`: nobody signed in, show the sign-in form
//! - `Loading`: an operation is in flight, show a spinner
//! - `Authenticated`: a user is signed in
//! - `Error`: the last operation failed, show the message

use crate::error::AuthError;
use crate::token::UserClaims;

/// Authentication state observed by the UI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    current_user: Option<UserClaims>,
    access_token: Option<String>,
    /// True while the latest authentication operation is in flight.
    pub is_loading: bool,
    /// Error of the last foreground operation, if it failed.
    pub error: Option<AuthError>,
}

impl Session {
    /// Claims of the signed-in user.
    #[must_use]
    pub const fn current_user(&self) -> Option<&UserClaims> {
        self.current_user.as_ref()
    }

    /// Access token backing `current_user`.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Returns true if a user is signed in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.current_user.is_some()
    }

    /// Sets the identity. The token and its decoded claims always travel
    /// together.
    pub fn authenticate(&mut self, access_token: String, claims: UserClaims) {
        self.access_token = Some(access_token);
        self.current_user = Some(claims);
    }

    /// Drops the identity.
    pub fn clear_identity(&mut self) {
        self.access_token = None;
        self.current_user = None;
    }

    /// Marks the start of an operation.
    pub fn begin_loading(&mut self) {
        self.is_loading = true;
        self.error = None;
    }

    /// Marks the end of a failed operation; the identity is left as is.
    pub fn fail(&mut self, error: AuthError) {
        self.is_loading = false;
        self.error = Some(error);
    }

    /// Current phase, derived from the fields.
    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        if self.is_loading {
            SessionPhase::Loading
        } else if self.error.is_some() {
            SessionPhase::Error
        } else if self.current_user.is_some() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        }
    }
}

/// Coarse session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Nobody is signed in.
    Anonymous,
    /// An operation is in flight.
    Loading,
    /// A user is signed in.
    Authenticated,
    /// The last operation failed.
    Error,
}

impl SessionPhase {
    /// Short label for status output.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Loading => "loading",
            Self::Authenticated => "authenticated",
            Self::Error => "error",
        }
    }
}

/// Change of identity between two session snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthTransition {
    /// No user before, a user now.
    SignedIn,
    /// A user before, nobody now.
    SignedOut,
}

/// A published session update.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionChange {
    /// State before the mutation.
    pub previous: Session,
    /// State after the mutation.
    pub current: Session,
}

impl SessionChange {
    /// Identity transition carried by this change, if any.
    ///
    /// A token refresh for the same signed-in user is not a transition.
    #[must_use]
    pub const fn transition(&self) -> Option<AuthTransition> {
        match (
            self.previous.is_authenticated(),
            self.current.is_authenticated(),
        ) {
            (false, true) => Some(AuthTransition::SignedIn),
            (true, false) => Some(AuthTransition::SignedOut),
            _ => None,
        }
    }
}
