//! Completion tracking for in-flight executions.

use tokio::sync::watch;

/// Tracks registered executions so callers can await a full drain.
///
/// Couples a counter to a watch channel: [`WaitGroup::add`] and
/// [`WaitGroup::done`] adjust the count, and [`WaitGroup::wait`] resolves
/// once it reaches zero. A group with nothing registered satisfies `wait`
/// immediately, and any number of tasks may wait concurrently.
#[derive(Debug)]
pub struct WaitGroup {
    count: watch::Sender<usize>,
}

impl WaitGroup {
    /// Create an empty group.
    #[must_use]
    pub fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self { count }
    }

    /// Register one execution.
    pub fn add(&self) {
        self.count.send_modify(|n| *n += 1);
    }

    /// Mark one registered execution finished.
    ///
    /// Must be called exactly once per [`WaitGroup::add`].
    pub fn done(&self) {
        self.count.send_modify(|n| {
            debug_assert!(*n > 0, "done without matching add");
            *n = n.saturating_sub(1);
        });
    }

    /// Number of currently registered executions.
    #[must_use]
    pub fn len(&self) -> usize {
        *self.count.borrow()
    }

    /// Whether no executions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve once every registered execution has finished.
    pub async fn wait(&self) {
        let mut rx = self.count.subscribe();
        // wait_for inspects the current value before suspending, so a
        // drained group resolves without a wakeup.
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

impl Default for WaitGroup {
    fn default() -> Self {
        Self::new()
    }
}
