//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod auth_transport;
mod clock;
mod token_store;

pub use auth_transport::AuthTransport;
pub use clock::{Clock, FixedClock};
pub use token_store::{StorageError, TokenStore};
