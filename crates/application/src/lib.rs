//! Memorizer Application - Session use cases and ports
//!
//! This crate defines the application layer with:
//! - Port traits (transport, token storage, clock)
//! - Token decoding against a clock
//! - The session manager and its publisher

pub mod auth;
pub mod ports;
pub mod session;

#[cfg(test)]
mod test_support;

pub use auth::{InMemoryTokenStore, TokenCodec};
pub use ports::{AuthTransport, Clock, FixedClock, StorageError, TokenStore};
pub use session::{
    BootstrapOutcome, ListenerId, Navigator, RedirectRoutes, RefreshFailurePolicy,
    SessionManager, SessionOptions, SessionPublisher, SessionSubscription,
};
