//! In-flight execution accounting.

use parking_lot::RwLock;

/// Thread-safe count of jobs currently executing.
///
/// Writers take the lock exclusively; [`Counter::value`] takes a shared read
/// lock, so concurrent readers never block one another. Under correct use the
/// count never goes negative: every [`Counter::increase`] is paired with
/// exactly one [`Counter::decrease`] around a single job execution.
#[derive(Debug, Default)]
pub struct Counter {
    count: RwLock<i64>,
}

impl Counter {
    /// Create a counter starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one to the count.
    pub fn increase(&self) {
        *self.count.write() += 1;
    }

    /// Subtract one from the count.
    pub fn decrease(&self) {
        *self.count.write() -= 1;
    }

    /// Set the count back to zero.
    ///
    /// Intended for reusing a drained counter while nothing is executing;
    /// resetting with executions in flight desynchronizes their paired
    /// decreases.
    pub fn reset(&self) {
        *self.count.write() = 0;
    }

    /// Read the current count.
    #[must_use]
    pub fn value(&self) -> i64 {
        *self.count.read()
    }
}
