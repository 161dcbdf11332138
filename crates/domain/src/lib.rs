//! Memorizer Domain - Core authentication types
//!
//! This crate defines the domain model for the Memorizer auth client.
//! All types here are pure Rust with no I/O dependencies.

pub mod credentials;
pub mod error;
pub mod session;
pub mod token;

pub use credentials::{AuthKind, Credentials, CredentialsError};
pub use error::{AuthError, DecodeError, ErrorValue};
pub use session::{AuthTransition, Session, SessionChange, SessionPhase};
pub use token::{
    ACCESS_TOKEN_SLOT, REFRESH_TOKEN_SLOT, StoredTokens, TokenPair, UserClaims, decode_claims,
    decode_expiry, token_preview,
};
