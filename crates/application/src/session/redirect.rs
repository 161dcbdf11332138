//! Route redirects driven by sign-in and sign-out transitions.

use std::sync::Arc;

use memorizer_domain::AuthTransition;
use tracing::debug;

use super::publisher::{ListenerId, SessionPublisher};

/// Something that can move the user to a route.
pub trait Navigator: Send + Sync {
    /// Navigates to `route`.
    fn navigate(&self, route: &str);
}

/// Where to send the user after an identity transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectRoutes {
    /// Target after signing in, if any.
    pub authenticated: Option<String>,
    /// Target after signing out, if any.
    pub anonymous: Option<String>,
}

impl RedirectRoutes {
    /// Route for `transition`, if one is configured.
    #[must_use]
    pub fn target(&self, transition: AuthTransition) -> Option<&str> {
        match transition {
            AuthTransition::SignedIn => self.authenticated.as_deref(),
            AuthTransition::SignedOut => self.anonymous.as_deref(),
        }
    }

    /// Registers a listener on `publisher` that navigates on transitions.
    ///
    /// Token refreshes and loading or error changes do not navigate.
    pub fn attach(self, publisher: &SessionPublisher, navigator: Arc<dyn Navigator>) -> ListenerId {
        publisher.on_change(move |change| {
            let Some(transition) = change.transition() else {
                return;
            };
            if let Some(route) = self.target(transition) {
                debug!(?transition, route, "redirecting");
                navigator.navigate(route);
            }
        })
    }
}
