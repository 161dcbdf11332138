//! Session manager policies.

use serde::{Deserialize, Serialize};

/// What to do when the background refresh started by
/// [`SessionManager::bootstrap`](super::SessionManager::bootstrap) fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshFailurePolicy {
    /// Keep the restored session; the stale access token stays usable
    /// until its own expiry.
    #[default]
    KeepStaleSession,
    /// Drop the local session and clear durable storage.
    SignOut,
}

/// Tunables for a [`SessionManager`](super::SessionManager).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Reaction to a failed background refresh.
    pub refresh_failure_policy: RefreshFailurePolicy,
}

impl SessionOptions {
    /// Sets the background refresh failure policy.
    #[must_use]
    pub const fn with_refresh_failure_policy(mut self, policy: RefreshFailurePolicy) -> Self {
        self.refresh_failure_policy = policy;
        self
    }
}
