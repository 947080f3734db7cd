//! Tick-driven dispatch of queued jobs with a concurrency ceiling.
//!
//! The dispatcher couples a bounded FIFO job buffer to a periodic dispatch
//! loop. Producers enqueue without blocking; the loop admits at most one job
//! per tick, and only while the number of in-flight executions is below the
//! configured ceiling.
//!
//! # Design
//!
//! - **Non-blocking producers**: `add` fails fast with `BufferFull` instead
//!   of applying backpressure.
//! - **Polled admission**: the tick interval bounds dispatch overhead and
//!   doubles as a simple rate limit on job starts.
//! - **Clean shutdown**: `stop` signals the loop over a channel; dropping the
//!   dispatcher closes that channel and ends a background loop the same way.

use std::sync::{Arc, Weak};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::DispatcherConfig;
use crate::core::counter::Counter;
use crate::core::error::DispatchError;
use crate::core::job::Job;
use crate::core::spawn::Spawn;
use crate::core::waitgroup::WaitGroup;

/// Control state guarded by one briefly-held lock.
#[derive(Debug)]
struct Control {
    /// Whether a dispatch loop is currently claimed. Flipped back to `false`
    /// only by the run guard, dropped loop futures included, so the flag
    /// always matches whether a claim is held.
    running: bool,
    /// Stop signal for the current run. Minted fresh on every run so a stale
    /// signal from a previous run cannot leak into a later one.
    stop_tx: Option<mpsc::Sender<()>>,
}

/// Releases one concurrency slot when an execution ends, panics included.
struct SlotGuard {
    active: Arc<Counter>,
    inflight: Arc<WaitGroup>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.active.decrease();
        self.inflight.done();
    }
}

/// Releases the running claim when the dispatch loop ends.
///
/// The loop future owns this guard from the moment the run is claimed, so
/// the claim is released on a normal exit, when the future is dropped
/// mid-run, and when it is never polled at all. It holds the control state
/// weakly: the dispatcher keeps the only strong handle, which is what lets
/// a dropped dispatcher close the stop channel underneath a background loop.
struct RunGuard {
    control: Weak<Mutex<Control>>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        // `None` means the dispatcher is already gone, control state and all.
        if let Some(control) = self.control.upgrade() {
            let mut control = control.lock();
            control.running = false;
            control.stop_tx = None;
        }
    }
}

/// Bounded-concurrency job dispatcher.
///
/// Jobs enter through [`Dispatcher::add`] into a fixed-capacity FIFO buffer.
/// A dispatch loop, started with [`Dispatcher::run`] (on the caller's task)
/// or [`Dispatcher::run_background`] (on a spawned task), admits queued jobs
/// one per tick while fewer than `max_concurrent` executions are in flight.
/// Each admitted job runs on a task of its own through the [`Spawn`] seam.
///
/// The dispatcher is `Sync`; share it behind an [`Arc`] to enqueue from many
/// tasks while the loop runs.
///
/// # Example
///
/// ```rust,ignore
/// let dispatcher = Dispatcher::new(16, TokioSpawner::current());
/// dispatcher.run_background(4, Duration::from_millis(50))?;
///
/// dispatcher.add(Arc::clone(&job))?;
///
/// dispatcher.stop();
/// dispatcher.wait().await;
/// ```
#[derive(Debug)]
pub struct Dispatcher<J, S> {
    /// Producer side of the job buffer.
    job_tx: Sender<J>,
    /// Consumer side of the job buffer, cloned into each dispatch loop.
    job_rx: Receiver<J>,
    /// Count of in-flight executions, bounded by the ceiling.
    active: Arc<Counter>,
    /// Drain tracking for in-flight executions.
    inflight: Arc<WaitGroup>,
    /// Run state and the stop channel of the current run.
    control: Arc<Mutex<Control>>,
    /// Runtime seam used for the background loop and every job task.
    spawner: S,
}

impl<J, S> Dispatcher<J, S>
where
    J: Job,
    S: Spawn,
{
    /// Create a stopped dispatcher with a job buffer of `buffer` slots.
    ///
    /// A capacity of zero makes every [`Dispatcher::add`] fail with
    /// [`DispatchError::BufferFull`]; use [`Dispatcher::from_config`] to have
    /// capacities validated instead.
    pub fn new(buffer: usize, spawner: S) -> Self {
        let (job_tx, job_rx) = bounded(buffer);
        Self {
            job_tx,
            job_rx,
            active: Arc::new(Counter::new()),
            inflight: Arc::new(WaitGroup::new()),
            control: Arc::new(Mutex::new(Control {
                running: false,
                stop_tx: None,
            })),
            spawner,
        }
    }

    /// Create a dispatcher from a validated configuration.
    ///
    /// The buffer capacity comes from `buffer_size`; the remaining fields
    /// feed [`Dispatcher::run`] via [`DispatcherConfig::max_concurrent`] and
    /// [`DispatcherConfig::tick_interval`].
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidConfig`] when validation fails.
    pub fn from_config(config: &DispatcherConfig, spawner: S) -> Result<Self, DispatchError> {
        config.validate().map_err(DispatchError::InvalidConfig)?;
        Ok(Self::new(config.buffer_size, spawner))
    }

    /// Enqueue a job without blocking.
    ///
    /// Valid in any state; jobs queued while stopped are dispatched once a
    /// loop starts. The buffer is strictly FIFO and never reorders.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::BufferFull`] when the buffer is at capacity.
    /// The job is not enqueued; the caller keeps its own handle and may retry
    /// or drop it.
    pub fn add(&self, job: J) -> Result<(), DispatchError> {
        match self.job_tx.try_send(job) {
            Ok(()) => {
                debug!(pending = self.job_tx.len(), "Job queued");
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                warn!(
                    capacity = self.job_tx.capacity().unwrap_or(0),
                    "Job buffer is full"
                );
                Err(DispatchError::BufferFull)
            }
            // The receiver half lives inside `self`, so the channel cannot
            // disconnect while the dispatcher exists.
            Err(TrySendError::Disconnected(_)) => Err(DispatchError::BufferFull),
        }
    }

    /// Number of queued jobs not yet admitted for execution.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.job_tx.len()
    }

    /// Number of jobs currently executing.
    #[must_use]
    pub fn active(&self) -> i64 {
        self.active.value()
    }

    /// Whether a dispatch loop is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.control.lock().running
    }

    /// Discard every queued job.
    ///
    /// In-flight executions are unaffected; only the buffer is drained.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::ResetWhileRunning`] while a dispatch loop is
    /// running, since draining would race the loop's own pops.
    pub fn reset(&self) -> Result<(), DispatchError> {
        // Holding the control lock keeps a concurrent `run` from claiming
        // the loop mid-drain.
        let control = self.control.lock();
        if control.running {
            return Err(DispatchError::ResetWhileRunning);
        }
        let mut drained = 0_usize;
        while self.job_rx.try_recv().is_ok() {
            drained += 1;
        }
        drop(control);
        if drained > 0 {
            debug!(drained = drained, "Job buffer reset");
        }
        Ok(())
    }

    /// Signal the dispatch loop to exit.
    ///
    /// A no-op while stopped. Jobs already admitted keep running to
    /// completion; combine with [`Dispatcher::wait`] to drain them.
    pub fn stop(&self) {
        let control = self.control.lock();
        if control.running {
            if let Some(stop_tx) = control.stop_tx.as_ref() {
                // Capacity-1 channel: a repeated stop while the first signal
                // is still in flight is dropped, which is equivalent.
                let _ = stop_tx.try_send(());
            }
        }
    }

    /// Resolve once every currently executing job has finished.
    ///
    /// Queued-but-not-admitted jobs do not hold this up, and with nothing in
    /// flight it resolves immediately.
    pub async fn wait(&self) {
        self.inflight.wait().await;
    }

    /// Run the dispatch loop on the caller's task until stopped.
    ///
    /// Ticks every `interval`. Each tick admits at most one queued job, and
    /// only while fewer than `max_concurrent` executions are in flight; a
    /// ceiling of `0` lifts the limit entirely. Returns `Ok(())` once
    /// [`Dispatcher::stop`] is observed.
    ///
    /// Cancelling the returned future, as a `timeout` or a losing `select!`
    /// arm does, also stops the loop and releases the running state, so a
    /// later [`Dispatcher::run`] or [`Dispatcher::run_background`] starts
    /// cleanly.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::AlreadyRunning`] when a loop is already
    /// active, leaving that loop undisturbed.
    pub async fn run(&self, max_concurrent: usize, interval: Duration) -> Result<(), DispatchError> {
        let (guard, stop_rx) = self.claim(max_concurrent, interval)?;
        dispatch_loop(
            self.job_rx.clone(),
            Arc::clone(&self.active),
            Arc::clone(&self.inflight),
            guard,
            self.spawner.clone(),
            max_concurrent,
            interval,
            stop_rx,
        )
        .await;
        Ok(())
    }

    /// Start the dispatch loop on a background task and return immediately.
    ///
    /// Same admission semantics as [`Dispatcher::run`]. The loop ends when
    /// [`Dispatcher::stop`] is called or the dispatcher is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::AlreadyRunning`] when a loop is already
    /// active.
    pub fn run_background(
        &self,
        max_concurrent: usize,
        interval: Duration,
    ) -> Result<(), DispatchError> {
        let (guard, stop_rx) = self.claim(max_concurrent, interval)?;
        self.spawner.spawn(dispatch_loop(
            self.job_rx.clone(),
            Arc::clone(&self.active),
            Arc::clone(&self.inflight),
            guard,
            self.spawner.clone(),
            max_concurrent,
            interval,
            stop_rx,
        ));
        Ok(())
    }

    /// Claim the running state and mint the stop channel for this run.
    ///
    /// The returned guard travels with the loop future; dropping it releases
    /// the claim.
    fn claim(
        &self,
        max_concurrent: usize,
        interval: Duration,
    ) -> Result<(RunGuard, mpsc::Receiver<()>), DispatchError> {
        let mut control = self.control.lock();
        if control.running {
            return Err(DispatchError::AlreadyRunning);
        }
        let (stop_tx, stop_rx) = mpsc::channel(1);
        control.stop_tx = Some(stop_tx);
        control.running = true;
        drop(control);
        info!(
            max_concurrent = max_concurrent,
            interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            "Dispatch loop starting"
        );
        Ok((
            RunGuard {
                control: Arc::downgrade(&self.control),
            },
            stop_rx,
        ))
    }
}

/// One dispatch loop: ticks, admission checks, and spawned executions.
///
/// Runs until a stop signal arrives or every stop sender is gone. The guard
/// it owns marks the dispatcher stopped on every exit path, a cancelled loop
/// future included. Only the dispatcher holds the control state strongly, so
/// dropping the dispatcher closes the stop channel underneath a background
/// loop and the loop winds down on its own.
#[allow(clippy::too_many_arguments)]
async fn dispatch_loop<J, S>(
    jobs: Receiver<J>,
    active: Arc<Counter>,
    inflight: Arc<WaitGroup>,
    guard: RunGuard,
    spawner: S,
    max_concurrent: usize,
    interval: Duration,
    mut stop_rx: mpsc::Receiver<()>,
) where
    J: Job,
    S: Spawn,
{
    // First tick lands one full interval after start; missed ticks are
    // skipped rather than bursted, so a slow admission cannot pile up starts.
    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ceiling = i64::try_from(max_concurrent).unwrap_or(i64::MAX);
    let mut admitted: u64 = 0;

    loop {
        // Biased select: a pending stop wins over a due tick.
        tokio::select! {
            biased;
            // `None` means every stop sender is gone, which only happens
            // once the dispatcher itself has been dropped.
            _ = stop_rx.recv() => {
                break;
            }
            _ = ticker.tick() => {
                if max_concurrent != 0 && active.value() >= ceiling {
                    continue;
                }
                let Ok(job) = jobs.try_recv() else {
                    continue;
                };
                if job.is_canceled() {
                    debug!("Discarding job cancelled before start");
                    continue;
                }
                admitted += 1;
                active.increase();
                inflight.add();
                debug!(active = active.value(), "Job admitted");
                let slot = SlotGuard {
                    active: Arc::clone(&active),
                    inflight: Arc::clone(&inflight),
                };
                spawner.spawn(async move {
                    // The guard rides along so the slot is released even if
                    // the target panics.
                    let _slot = slot;
                    job.call_target().await;
                });
            }
        }
    }

    // The guard's destructor marks the dispatcher stopped.
    drop(guard);
    info!(admitted = admitted, "Dispatch loop stopped");
}
