//! Strictly increasing nanosecond timestamps from a wall clock.
//!
//! The backend keys every observation by `(source, timestamp)`, and the four
//! observations derived from one flow share a timestamp so they can be
//! correlated later. Two flows must therefore never get the same timestamp,
//! even when the wall clock is too coarse to tell them apart or when NTP
//! steps it backwards.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use flowvault_types::Timestamp;
use parking_lot::Mutex;
use thiserror::Error;

/// Failure to produce a trustworthy timestamp. Always fatal to a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClockError {
    #[error("system clock reads {0:?} before the Unix epoch")]
    BeforeEpoch(Duration),

    #[error("system clock is beyond the range of a 64-bit nanosecond timestamp")]
    OutOfRange,

    #[error("timestamp space exhausted after {0}")]
    Exhausted(Timestamp),
}

/// A source of wall-clock readings.
pub trait Clock: Send {
    fn now(&mut self) -> Result<Timestamp, ClockError>;
}

/// `CLOCK_REALTIME` via [`SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&mut self) -> Result<Timestamp, ClockError> {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|err| ClockError::BeforeEpoch(err.duration()))?;
        u64::try_from(elapsed.as_nanos())
            .map(Timestamp::from_nanos)
            .map_err(|_| ClockError::OutOfRange)
    }
}

/// Issues timestamps that strictly increase for the lifetime of the value.
///
/// When the clock moves forward its reading is used as is. When it repeats
/// or goes backwards the previous timestamp plus one nanosecond is used
/// instead, until the clock catches up again.
///
/// Takes `&mut self`; see [`SharedSequencer`] for concurrent producers.
#[derive(Debug)]
pub struct Sequencer<C = SystemClock> {
    clock: C,
    last: Timestamp,
}

impl Sequencer<SystemClock> {
    /// A sequencer driven by the system wall clock.
    pub fn system() -> Result<Self, ClockError> {
        Self::new(SystemClock)
    }
}

impl<C: Clock> Sequencer<C> {
    /// Seed the sequencer with one reading of `clock`.
    pub fn new(mut clock: C) -> Result<Self, ClockError> {
        let last = clock.now()?;
        Ok(Self { clock, last })
    }

    /// The most recently issued timestamp (or the seed reading).
    pub fn last(&self) -> Timestamp {
        self.last
    }

    /// Read the clock and issue the next timestamp.
    pub fn next_timestamp(&mut self) -> Result<Timestamp, ClockError> {
        let now = self.clock.now()?;
        let issued = if now > self.last {
            now
        } else {
            self.last
                .successor()
                .ok_or(ClockError::Exhausted(self.last))?
        };
        self.last = issued;
        Ok(issued)
    }
}

/// A [`Sequencer`] behind a mutex, for several producers sharing one
/// timestamp space.
#[derive(Debug)]
pub struct SharedSequencer<C = SystemClock> {
    inner: Mutex<Sequencer<C>>,
}

impl<C: Clock> SharedSequencer<C> {
    pub fn new(sequencer: Sequencer<C>) -> Self {
        Self {
            inner: Mutex::new(sequencer),
        }
    }

    pub fn next_timestamp(&self) -> Result<Timestamp, ClockError> {
        self.inner.lock().next_timestamp()
    }

    pub fn last(&self) -> Timestamp {
        self.inner.lock().last()
    }
}
