//! Session state, its orchestration and its consumers.

mod manager;
mod options;
mod publisher;
mod redirect;

pub use manager::{BootstrapOutcome, SessionManager};
pub use options::{RefreshFailurePolicy, SessionOptions};
pub use publisher::{ListenerId, SessionPublisher, SessionSubscription};
pub use redirect::{Navigator, RedirectRoutes};
