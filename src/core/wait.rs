use std::time::Duration;

const DEFAULT_POLL_US: u64 = 1;

/// Budget of a polling loop, counted in sleep iterations rather than wall time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Timeout {
    #[default]
    Unbounded,
    Polls(u64),
}

impl Timeout {
    pub fn is_bounded(self) -> bool {
        matches!(self, Timeout::Polls(_))
    }
}

/// Zero or negative budgets wait forever.
impl From<i64> for Timeout {
    fn from(value: i64) -> Self {
        if value > 0 {
            Timeout::Polls(value as u64)
        } else {
            Timeout::Unbounded
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_micros(DEFAULT_POLL_US),
        }
    }
}

impl PollPolicy {
    pub fn every(interval: Duration) -> Self {
        Self { interval }
    }

    pub(crate) fn poller(self, timeout: Timeout) -> Poller {
        Poller {
            policy: self,
            timeout,
            passed: 0,
        }
    }
}

/// Iteration counter shared by every busy-wait loop.
pub(crate) struct Poller {
    policy: PollPolicy,
    timeout: Timeout,
    passed: u64,
}

impl Poller {
    pub(crate) fn sleep(&mut self) {
        std::thread::sleep(self.policy.interval);
        self.passed = self.passed.saturating_add(1);
    }

    pub(crate) fn expired(&self) -> bool {
        match self.timeout {
            Timeout::Unbounded => false,
            Timeout::Polls(limit) => self.passed > limit,
        }
    }

    pub(crate) fn passed(&self) -> u64 {
        self.passed
    }
}
