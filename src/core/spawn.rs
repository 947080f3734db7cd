//! Runtime seam for launching asynchronous work.

use std::future::Future;

/// Abstraction over spawning futures onto an async runtime.
///
/// The dispatcher launches job executions and its own background dispatch
/// loop through this seam, so the core stays decoupled from any concrete
/// runtime. [`crate::runtime::TokioSpawner`] is the provided implementation;
/// tests substitute their own to observe or redirect spawns.
///
/// Implementations are cheap to clone: one clone travels with the dispatch
/// loop for the duration of a run.
pub trait Spawn: Clone + Send + Sync + 'static {
    /// Spawn a future to run to completion in the background.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}
