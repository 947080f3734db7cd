//! # jobtick
//!
//! A tick-driven, bounded-concurrency job dispatcher.
//!
//! This library provides a small dispatching layer for workloads where jobs
//! arrive faster than they should be started. Producers enqueue self-contained
//! jobs into a fixed-capacity FIFO buffer without ever blocking; a periodic
//! dispatch loop admits queued jobs onto tasks of their own, keeping the
//! number of simultaneously running jobs under a configurable ceiling and
//! discarding jobs that were cancelled before they started.
//!
//! ## Core Problem Solved
//!
//! Background job execution wants three guarantees that are awkward to get
//! from a plain task spawner:
//!
//! - **Bounded intake**: the buffer has a hard capacity, so a burst of
//!   submissions fails fast instead of growing without limit
//! - **Bounded concurrency**: at most `max_concurrent` jobs run at once, so
//!   a flood of cheap submissions cannot exhaust connections, handles, or
//!   memory downstream
//! - **Orderly shutdown**: stopping the loop never tears down running work;
//!   in-flight jobs finish on their own and can be awaited
//!
//! ## Key Features
//!
//! - **Non-Blocking Producers**: `add` either enqueues or fails with
//!   `BufferFull`, never applies backpressure
//! - **Polled Admission**: one job per tick bounds dispatch overhead and
//!   doubles as a simple rate limit on job starts
//! - **Two-Layer Cancellation**: cancelled-before-start jobs are discarded
//!   by the loop; cancellation of a running job stays cooperative, inside
//!   the job's own target
//! - **Runtime Seam**: the loop and every job task go through the `Spawn`
//!   trait, so tests can observe or redirect spawning
//!
//! A job whose target never returns occupies one concurrency slot forever;
//! that is the accepted cost of cooperative cancellation rather than
//! something the dispatcher papers over.
//!
//! ## Dispatcher - Queue, Run, Stop, Drain
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use jobtick::core::{Dispatcher, Job};
//! use jobtick::runtime::TokioSpawner;
//!
//! // Buffer up to 16 jobs, admit while fewer than 4 run at once.
//! let dispatcher = Dispatcher::new(16, TokioSpawner::current());
//! dispatcher.run_background(4, Duration::from_millis(50))?;
//!
//! dispatcher.add(Arc::clone(&job))?;   // any type implementing `Job`
//!
//! dispatcher.stop();                   // loop exits; running jobs continue
//! dispatcher.wait().await;             // drain in-flight executions
//! ```
//!
//! For complete examples, see:
//! - `tests/dispatch_loop_test.rs` - Admission, ceiling, and cancellation
//! - `tests/dispatcher_lifecycle_test.rs` - Queue and state-machine behavior

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core dispatching abstractions: jobs, accounting, and the dispatch loop.
pub mod core;
/// Configuration models for the dispatcher.
pub mod config;
/// Runtime adapters bridging to concrete async runtimes.
pub mod runtime;
/// Shared utilities.
pub mod util;
