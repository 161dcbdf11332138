//! Login credentials and their validation rules.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Maximum accepted password length, in characters.
pub const MAX_PASSWORD_LEN: usize = 30;

/// Which authentication endpoint a credential pair is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthKind {
    /// Authenticate an existing account.
    SignIn,
    /// Create an account and authenticate it.
    SignUp,
}

impl AuthKind {
    /// Path segment of the account endpoint for this kind.
    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::SignIn => "signin",
            Self::SignUp => "signup",
        }
    }
}

impl fmt::Display for AuthKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignIn => write!(f, "sign-in"),
            Self::SignUp => write!(f, "sign-up"),
        }
    }
}

/// Credential validation failures.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CredentialsError {
    /// Login is blank.
    #[error("A valid login address is required")]
    MissingLogin,

    /// Password length is outside the accepted range.
    #[error("Password must be between 6 and 30 characters")]
    PasswordLength,

    /// Sign-up confirmation does not match the password.
    #[error("Passwords must match")]
    PasswordMismatch,
}

/// A login/password pair, serialized as the request body of the sign-in
/// and sign-up endpoints.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    login: String,
    password: String,
}

impl Credentials {
    /// Creates credentials without validating them.
    #[must_use]
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }

    /// Login as entered.
    #[must_use]
    pub fn login(&self) -> &str {
        &self.login
    }

    /// Password as entered.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Checks the login and password rules shared by sign-in and sign-up.
    ///
    /// # Errors
    ///
    /// Returns the first rule that fails.
    pub fn validate(&self) -> Result<(), CredentialsError> {
        if self.login.trim().is_empty() {
            return Err(CredentialsError::MissingLogin);
        }
        let len = self.password.chars().count();
        if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
            return Err(CredentialsError::PasswordLength);
        }
        Ok(())
    }

    /// Validates a sign-up form, including the password confirmation.
    ///
    /// # Errors
    ///
    /// Returns the first rule that fails.
    pub fn validate_sign_up(&self, confirm_password: &str) -> Result<(), CredentialsError> {
        self.validate()?;
        if self.password != confirm_password {
            return Err(CredentialsError::PasswordMismatch);
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}
