//! Shared fixtures for unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::VecDeque;
use std::pin::pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::task::{Context, Poll, Waker};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use memorizer_domain::{AuthError, AuthKind, Credentials, StoredTokens, TokenPair};
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::Notify;

use chrono::{DateTime, Utc};

use crate::auth::InMemoryTokenStore;
use crate::ports::{AuthTransport, Clock, StorageError, TokenStore};

pub const NOW: i64 = 1_700_000_000;

/// Builds an unsigned JWT with the given payload.
pub fn jwt(payload: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.c2lnbmF0dXJl")
}

/// Access token for user `id`, valid for an hour.
pub fn access_token(id: u64) -> String {
    jwt(&json!({"user": {"id": id, "login": format!("user{id}")}, "exp": NOW + 3600, "iat": NOW}))
}

/// Refresh token valid for a day.
pub fn refresh_token(tag: &str) -> String {
    jwt(&json!({"uid": tag, "exp": NOW + 86_400, "jti": tag}))
}

/// Token pair for user `id`.
pub fn pair(id: u64) -> TokenPair {
    TokenPair::new(access_token(id), refresh_token(&format!("r{id}")))
}

/// Clock a test can move forward.
#[derive(Debug)]
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn new(timestamp: i64) -> Self {
        Self(AtomicI64::new(timestamp))
    }

    pub fn set(&self, timestamp: i64) {
        self.0.store(timestamp, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.0.load(Ordering::SeqCst), 0).unwrap()
    }
}

/// Lets a test hold a transport call until it decides to release it.
#[derive(Clone, Default)]
pub struct Gate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl Gate {
    /// Waits until the transport call has started.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Lets the transport call return.
    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

struct Step<T> {
    result: Result<T, AuthError>,
    gate: Option<Gate>,
}

/// Transport answering from per-endpoint scripts.
#[derive(Default)]
pub struct ScriptedTransport {
    authenticate: Mutex<VecDeque<Step<TokenPair>>>,
    refresh: Mutex<VecDeque<Step<TokenPair>>>,
    sign_out: Mutex<VecDeque<Step<()>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_authenticate(&self, result: Result<TokenPair, AuthError>) -> &Self {
        self.authenticate.lock().push_back(Step { result, gate: None });
        self
    }

    pub fn on_authenticate_gated(&self, result: Result<TokenPair, AuthError>) -> Gate {
        let gate = Gate::default();
        self.authenticate.lock().push_back(Step {
            result,
            gate: Some(gate.clone()),
        });
        gate
    }

    pub fn on_refresh(&self, result: Result<TokenPair, AuthError>) -> &Self {
        self.refresh.lock().push_back(Step { result, gate: None });
        self
    }

    pub fn on_refresh_gated(&self, result: Result<TokenPair, AuthError>) -> Gate {
        let gate = Gate::default();
        self.refresh.lock().push_back(Step {
            result,
            gate: Some(gate.clone()),
        });
        gate
    }

    pub fn on_sign_out(&self, result: Result<(), AuthError>) -> &Self {
        self.sign_out.lock().push_back(Step { result, gate: None });
        self
    }

    /// Calls made so far, as `endpoint:argument` strings.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    async fn run<T>(queue: &Mutex<VecDeque<Step<T>>>) -> Result<T, AuthError> {
        let step = queue.lock().pop_front();
        let Some(step) = step else {
            return Err(AuthError::transport("no scripted response"));
        };
        if let Some(gate) = step.gate {
            gate.pass().await;
        }
        step.result
    }
}

#[async_trait]
impl AuthTransport for ScriptedTransport {
    async fn authenticate(
        &self,
        kind: AuthKind,
        credentials: &Credentials,
    ) -> Result<TokenPair, AuthError> {
        self.calls
            .lock()
            .push(format!("{}:{}", kind.endpoint(), credentials.login()));
        Self::run(&self.authenticate).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        self.calls.lock().push(format!("tokens:{refresh_token}"));
        Self::run(&self.refresh).await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.calls.lock().push(format!("signout:{access_token}"));
        Self::run(&self.sign_out).await
    }
}

/// In-memory store whose writes can be switched to fail.
#[derive(Default)]
pub struct FailingTokenStore {
    inner: InMemoryTokenStore,
    fail_saves: AtomicBool,
    fail_clears: AtomicBool,
}

impl FailingTokenStore {
    pub fn new(inner: InMemoryTokenStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn fail_saves(&self) -> &Self {
        self.fail_saves.store(true, Ordering::SeqCst);
        self
    }

    pub fn fail_clears(&self) -> &Self {
        self.fail_clears.store(true, Ordering::SeqCst);
        self
    }

    fn disk_full() -> StorageError {
        StorageError::Io(std::io::Error::other("disk full"))
    }
}

impl TokenStore for FailingTokenStore {
    fn save(&self, tokens: &TokenPair) -> Result<(), StorageError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Self::disk_full());
        }
        self.inner.save(tokens)
    }

    fn load(&self) -> Result<StoredTokens, StorageError> {
        self.inner.load()
    }

    fn clear(&self) -> Result<(), StorageError> {
        if self.fail_clears.load(Ordering::SeqCst) {
            return Err(Self::disk_full());
        }
        self.inner.clear()
    }
}

/// Drives a future that never waits to completion on the current thread.
pub fn now_or_never<F: Future>(future: F) -> F::Output {
    let mut future = pin!(future);
    match future.as_mut().poll(&mut Context::from_waker(Waker::noop())) {
        Poll::Ready(output) => output,
        Poll::Pending => panic!("future was not ready"),
    }
}
