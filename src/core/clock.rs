use std::time::{SystemTime, UNIX_EPOCH};

/// A source of slot timestamps.
///
/// The `time` field of a slot has no fixed meaning; heartbeats stamp it with
/// whatever clock the worker is given.
pub trait Clock {
    fn now(&self) -> u64;
}

/// Nanoseconds since the UNIX epoch, or 0 if the system clock is before it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX))
            .unwrap_or(0)
    }
}

/// A clock that always reports the same value. Useful for deterministic heartbeats.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}
