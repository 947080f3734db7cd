//! The contract queued work must satisfy.

use std::sync::Arc;

use async_trait::async_trait;

/// A unit of work the dispatcher can queue and execute.
///
/// Jobs are self-contained: cancellation wiring, results, errors, and any
/// lifecycle timestamps live inside the job itself, so the dispatcher never
/// needs to know what a job produces. The dispatch loop consults
/// [`Job::is_canceled`] exactly once, immediately before admission, and
/// invokes [`Job::call_target`] at most once on a task of its own.
///
/// Cancellation is cooperative on both layers. Before admission the
/// dispatcher discards jobs that report cancelled; after admission the
/// dispatcher never aborts a task, and a long-running target that wants to
/// stop early must observe its own cancellation signal from inside
/// [`Job::call_target`].
///
/// # Example
///
/// ```rust,ignore
/// struct FetchJob {
///     url: String,
///     canceled: AtomicBool,
///     result: RwLock<Option<String>>,
/// }
///
/// #[async_trait]
/// impl Job for FetchJob {
///     fn is_canceled(&self) -> bool {
///         self.canceled.load(Ordering::SeqCst)
///     }
///
///     async fn call_target(&self) {
///         let body = fetch(&self.url).await;
///         *self.result.write() = Some(body);
///     }
/// }
/// ```
#[async_trait]
pub trait Job: Send + Sync + 'static {
    /// Whether the job has been cancelled before starting.
    ///
    /// Checked by the dispatch loop right before admission; `true` drops the
    /// job without executing it. Once execution has started the dispatcher no
    /// longer consults it.
    fn is_canceled(&self) -> bool;

    /// Execute the unit of work.
    ///
    /// Called at most once per job. The implementation records its own
    /// outcome; the dispatcher ignores it.
    async fn call_target(&self);
}

#[async_trait]
impl<T> Job for Arc<T>
where
    T: Job + ?Sized,
{
    fn is_canceled(&self) -> bool {
        (**self).is_canceled()
    }

    async fn call_target(&self) {
        (**self).call_target().await;
    }
}
