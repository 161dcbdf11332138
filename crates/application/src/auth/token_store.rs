//! In-memory token storage.
//!
//! Mirrors the two-slot layout of durable storage without touching disk.
//! Used for ephemeral sessions and in tests.

use std::collections::HashMap;

use memorizer_domain::{ACCESS_TOKEN_SLOT, REFRESH_TOKEN_SLOT, StoredTokens, TokenPair};
use parking_lot::RwLock;

use crate::ports::{StorageError, TokenStore};

/// Thread-safe in-memory token store.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    slots: RwLock<HashMap<String, String>>,
}

impl InMemoryTokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with both slots already filled.
    #[must_use]
    pub fn with_tokens(tokens: &TokenPair) -> Self {
        let store = Self::new();
        store.write_pair(tokens);
        store
    }

    /// Create a store holding arbitrary slot values, including partial
    /// or garbage contents.
    #[must_use]
    pub fn with_slots(access_token: Option<&str>, refresh_token: Option<&str>) -> Self {
        let mut slots = HashMap::new();
        if let Some(token) = access_token {
            slots.insert(ACCESS_TOKEN_SLOT.to_string(), token.to_string());
        }
        if let Some(token) = refresh_token {
            slots.insert(REFRESH_TOKEN_SLOT.to_string(), token.to_string());
        }
        Self {
            slots: RwLock::new(slots),
        }
    }

    /// Get the raw value of a slot.
    #[must_use]
    pub fn get(&self, slot: &str) -> Option<String> {
        self.slots.read().get(slot).cloned()
    }

    fn write_pair(&self, tokens: &TokenPair) {
        let mut slots = self.slots.write();
        slots.insert(ACCESS_TOKEN_SLOT.to_string(), tokens.access_token.clone());
        slots.insert(REFRESH_TOKEN_SLOT.to_string(), tokens.refresh_token.clone());
    }
}

impl TokenStore for InMemoryTokenStore {
    fn save(&self, tokens: &TokenPair) -> Result<(), StorageError> {
        self.write_pair(tokens);
        Ok(())
    }

    fn load(&self) -> Result<StoredTokens, StorageError> {
        let slots = self.slots.read();
        Ok(StoredTokens {
            access_token: slots.get(ACCESS_TOKEN_SLOT).cloned(),
            refresh_token: slots.get(REFRESH_TOKEN_SLOT).cloned(),
        })
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut slots = self.slots.write();
        slots.remove(ACCESS_TOKEN_SLOT);
        slots.remove(REFRESH_TOKEN_SLOT);
        Ok(())
    }
}
