use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// A `Duration` that can be shared between threads without a lock.
///
/// Stored as whole nanoseconds; values beyond `u64::MAX` nanoseconds (~584 years)
/// saturate. Loads and stores are independent, so concurrent writers race with
/// last-writer-wins semantics.
#[derive(Debug, Default)]
pub(crate) struct AtomicDuration(AtomicU64);

impl AtomicDuration {
    pub(crate) fn new(value: Duration) -> Self {
        Self(AtomicU64::new(to_nanos(value)))
    }

    pub(crate) fn load(&self) -> Duration {
        Duration::from_nanos(self.0.load(Ordering::Relaxed))
    }

    pub(crate) fn store(&self, value: Duration) {
        self.0.store(to_nanos(value), Ordering::Relaxed);
    }
}

fn to_nanos(value: Duration) -> u64 {
    u64::try_from(value.as_nanos()).unwrap_or(u64::MAX)
}
