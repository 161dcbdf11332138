//! Memorizer Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus client configuration.

pub mod adapters;
pub mod config;
pub mod persistence;
pub mod serialization;

pub use adapters::{HttpAuthTransport, SystemClock};
pub use config::{ClientConfig, ConfigError, ConfigOverrides};
pub use persistence::FileTokenStore;
pub use serialization::SerializationError;
