use chrono::{DateTime, FixedOffset, Local};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Local wall clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Always returns the same instant.
#[cfg(test)]
pub struct FrozenClock(pub DateTime<FixedOffset>);

#[cfg(test)]
impl Clock for FrozenClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}
