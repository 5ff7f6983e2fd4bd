//! Injectable time source.

use chrono::{DateTime, FixedOffset, Local};

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock in the machine's local offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock frozen at a single instant, for deterministic tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<FixedOffset> {
        (**self).now()
    }
}
