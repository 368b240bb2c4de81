//! Nanosecond timestamps for point observations.

use std::fmt;
use std::time::Duration;

/// Nanoseconds since the Unix epoch.
///
/// A `u64` of nanoseconds covers dates up to the year 2554, which is why
/// the backend uses it as its native time unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Create from nanoseconds since the epoch.
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Get the value in nanoseconds.
    pub const fn as_nanos(&self) -> u64 {
        self.0
    }

    /// The next representable timestamp, or `None` at `u64::MAX`.
    pub const fn successor(&self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }

    /// Elapsed time since the epoch as a standard Duration.
    pub const fn to_duration(&self) -> Duration {
        Duration::from_nanos(self.0)
    }
}

impl From<u64> for Timestamp {
    fn from(nanos: u64) -> Self {
        Self(nanos)
    }
}

impl From<Timestamp> for u64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
