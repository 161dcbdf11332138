//! Read-only session view shared with any number of consumers.
//!
//! Consumers either poll [`SessionPublisher::snapshot`], await changes on a
//! [`SessionSubscription`], or register a synchronous listener with
//! [`SessionPublisher::on_change`]. Only the session manager writes.

use std::collections::VecDeque;
use std::sync::Arc;

use memorizer_domain::{Session, SessionChange};
use parking_lot::{Mutex, ReentrantMutex};
use tokio::sync::watch;

/// Handle returned by [`SessionPublisher::on_change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&SessionChange) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, Listener)>,
}

struct Shared {
    sender: watch::Sender<Session>,
    listeners: Mutex<Listeners>,
    /// Changes not yet handed to listeners, in mutation order.
    pending: Mutex<VecDeque<SessionChange>>,
    /// Held while delivering; re-entrant so listeners may drive the manager.
    delivery: ReentrantMutex<()>,
}

/// Publishes session state to consumers.
///
/// Cloning is cheap; all clones observe the same session.
#[derive(Clone)]
pub struct SessionPublisher {
    shared: Arc<Shared>,
}

impl SessionPublisher {
    /// Creates a publisher holding an empty session.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Session::default());
        Self {
            shared: Arc::new(Shared {
                sender,
                listeners: Mutex::new(Listeners::default()),
                pending: Mutex::new(VecDeque::new()),
                delivery: ReentrantMutex::new(()),
            }),
        }
    }

    /// Returns a copy of the current session.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.shared.sender.borrow().clone()
    }

    /// Starts an async subscription. The current state counts as seen.
    #[must_use]
    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            receiver: self.shared.sender.subscribe(),
        }
    }

    /// Registers a listener called after every session change, in mutation
    /// order.
    ///
    /// Listeners run on the mutating task once the manager has released its
    /// internal locks, so a listener may start another session operation.
    /// They must not block on another thread that is itself publishing.
    pub fn on_change<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&SessionChange) + Send + Sync + 'static,
    {
        let mut listeners = self.shared.listeners.lock();
        listeners.next_id += 1;
        let id = ListenerId(listeners.next_id);
        listeners.entries.push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.shared.listeners.lock();
        let before = listeners.entries.len();
        listeners.entries.retain(|(entry, _)| *entry != id);
        listeners.entries.len() != before
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.shared.listeners.lock().entries.len()
    }

    /// Applies `mutate` and notifies consumers if anything changed. Returns
    /// whether the session changed.
    pub(crate) fn update<F>(&self, mutate: F) -> bool
    where
        F: FnOnce(&mut Session),
    {
        let changed = self.mutate(mutate);
        self.notify();
        changed
    }

    /// Applies `mutate` and wakes subscriptions, queueing the change for
    /// listeners until [`notify`](Self::notify).
    pub(crate) fn mutate<F>(&self, mutate: F) -> bool
    where
        F: FnOnce(&mut Session),
    {
        self.shared.sender.send_if_modified(|session| {
            let previous = session.clone();
            mutate(session);
            if *session == previous {
                return false;
            }
            // Queued under the watch lock so queue order is mutation order.
            self.shared.pending.lock().push_back(SessionChange {
                previous,
                current: session.clone(),
            });
            true
        })
    }

    /// Hands queued changes to listeners.
    pub(crate) fn notify(&self) {
        let _delivery = self.shared.delivery.lock();
        loop {
            let next = self.shared.pending.lock().pop_front();
            let Some(change) = next else {
                break;
            };

            // Listeners may register or remove listeners, so call them on a copy.
            let listeners: Vec<Listener> = self
                .shared
                .listeners
                .lock()
                .entries
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect();
            for listener in listeners {
                listener(&change);
            }
        }
    }
}

impl Default for SessionPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionPublisher")
            .field("session", &*self.shared.sender.borrow())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Async view of session changes.
#[derive(Debug, Clone)]
pub struct SessionSubscription {
    receiver: watch::Receiver<Session>,
}

impl SessionSubscription {
    /// Waits for the next change and returns the new state.
    ///
    /// Intermediate states may be skipped if several changes land before
    /// the subscriber wakes up. Returns `None` once the publisher is gone.
    pub async fn changed(&mut self) -> Option<Session> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Returns the latest state without waiting.
    #[must_use]
    pub fn current(&self) -> Session {
        self.receiver.borrow().clone()
    }
}
