//! Adapters implementing application ports against real systems.

mod http_transport;
mod system_clock;

pub use http_transport::{API_PREFIX, HttpAuthTransport};
pub use system_clock::SystemClock;
