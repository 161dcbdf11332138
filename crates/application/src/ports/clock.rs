//! Clock port for time-related operations

use chrono::{DateTime, Utc};

/// Port for getting the current time.
///
/// Token expiry is checked against this clock, so tests can pin "now"
/// with [`FixedClock`].
pub trait Clock: Send + Sync {
    /// Returns the current UTC timestamp.
    fn now(&self) -> DateTime<Utc>;

    /// Returns the current time as seconds since the Unix epoch.
    fn timestamp(&self) -> i64 {
        self.now().timestamp()
    }
}

/// Clock frozen at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    /// Creates a clock frozen at `timestamp` seconds since the Unix epoch.
    ///
    /// Out-of-range timestamps fall back to the epoch.
    #[must_use]
    pub fn at_timestamp(timestamp: i64) -> Self {
        Self(DateTime::from_timestamp(timestamp, 0).unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
