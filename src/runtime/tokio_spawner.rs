//! Tokio runtime spawner implementation.

use std::future::Future;

use crate::core::Spawn;

/// Tokio-based [`Spawn`] implementation wrapping a runtime handle.
///
/// Handles are cheap to clone, so the same spawner can serve any number of
/// dispatchers.
#[derive(Debug, Clone)]
pub struct TokioSpawner {
    handle: tokio::runtime::Handle,
}

impl TokioSpawner {
    /// Wrap an existing tokio runtime handle.
    #[must_use]
    pub const fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime of the calling context.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, as
    /// [`tokio::runtime::Handle::current`] does.
    #[must_use]
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }

    /// Build a spawner backed by a fresh multi-threaded runtime.
    ///
    /// The runtime is returned alongside the spawner; the caller must keep
    /// it alive for as long as spawned work should keep running.
    ///
    /// # Errors
    ///
    /// Propagates runtime construction failures.
    pub fn with_worker_threads(
        worker_threads: usize,
    ) -> Result<(Self, tokio::runtime::Runtime), std::io::Error> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(worker_threads)
            .enable_all()
            .build()?;
        let spawner = Self::new(runtime.handle().clone());
        Ok((spawner, runtime))
    }
}

impl Spawn for TokioSpawner {
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn(fut);
    }
}

/// A bare runtime handle is itself a spawner.
impl Spawn for tokio::runtime::Handle {
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tokio::runtime::Handle::spawn(self, fut);
    }
}
