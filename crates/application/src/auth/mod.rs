//! Token handling for the Memorizer auth client.
//!
//! This module provides:
//! - Access token decoding with expiry checking
//! - In-memory token storage

mod token_codec;
mod token_store;

pub use token_codec::TokenCodec;
pub use token_store::InMemoryTokenStore;
