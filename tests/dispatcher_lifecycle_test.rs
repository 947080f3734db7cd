//! Queue and state-machine behavior of the dispatcher.
//!
//! Covers buffer capacity, pending counts, reset rules, duplicate-run
//! rejection, stop as a no-op while stopped, restart after stop, and
//! teardown when the dispatcher is dropped or a run future is cancelled.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jobtick::config::DispatcherConfig;
use jobtick::core::{DispatchError, Dispatcher, Job};
use jobtick::runtime::TokioSpawner;

/// Minimal job that records whether its target ran.
#[derive(Debug, Default)]
struct TallyJob {
    canceled: AtomicBool,
    calls: AtomicUsize,
}

impl TallyJob {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Job for TallyJob {
    fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    async fn call_target(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_add_and_pending_up_to_capacity() {
    let dispatcher = Dispatcher::new(4, TokioSpawner::current());

    for expected in 1..=4 {
        dispatcher.add(Arc::new(TallyJob::default())).unwrap();
        assert_eq!(dispatcher.pending(), expected);
    }

    let err = dispatcher.add(Arc::new(TallyJob::default())).unwrap_err();
    assert_eq!(err, DispatchError::BufferFull);
    // The rejected job did not displace anything.
    assert_eq!(dispatcher.pending(), 4);
}

#[tokio::test]
async fn test_single_slot_buffer_fill_reset_cycle() {
    let dispatcher = Dispatcher::new(1, TokioSpawner::current());

    dispatcher.add(Arc::new(TallyJob::default())).unwrap();
    assert_eq!(dispatcher.pending(), 1);

    assert_eq!(
        dispatcher.add(Arc::new(TallyJob::default())).unwrap_err(),
        DispatchError::BufferFull
    );

    dispatcher.reset().unwrap();
    assert_eq!(dispatcher.pending(), 0);

    // The slot is usable again after the reset.
    dispatcher.add(Arc::new(TallyJob::default())).unwrap();
    assert_eq!(dispatcher.pending(), 1);
}

#[tokio::test]
async fn test_reset_on_empty_queue_is_ok() {
    let dispatcher: Dispatcher<Arc<TallyJob>, _> = Dispatcher::new(2, TokioSpawner::current());
    dispatcher.reset().unwrap();
    assert_eq!(dispatcher.pending(), 0);
}

#[tokio::test]
async fn test_reset_while_running_is_rejected() {
    let dispatcher = Dispatcher::new(4, TokioSpawner::current());
    dispatcher.add(Arc::new(TallyJob::default())).unwrap();

    // A long tick keeps the queued job unadmitted for the whole test.
    dispatcher
        .run_background(1, Duration::from_secs(60))
        .unwrap();

    assert_eq!(
        dispatcher.reset().unwrap_err(),
        DispatchError::ResetWhileRunning
    );
    assert_eq!(dispatcher.pending(), 1);

    dispatcher.stop();
}

#[tokio::test]
async fn test_second_run_is_rejected_while_first_is_active() {
    let dispatcher: Dispatcher<Arc<TallyJob>, _> = Dispatcher::new(4, TokioSpawner::current());
    dispatcher
        .run_background(1, Duration::from_millis(10))
        .unwrap();

    assert_eq!(
        dispatcher
            .run_background(1, Duration::from_millis(10))
            .unwrap_err(),
        DispatchError::AlreadyRunning
    );
    assert_eq!(
        dispatcher.run(1, Duration::from_millis(10)).await.unwrap_err(),
        DispatchError::AlreadyRunning
    );

    dispatcher.stop();
}

#[tokio::test]
async fn test_stop_while_stopped_is_a_noop() {
    let dispatcher: Dispatcher<Arc<TallyJob>, _> = Dispatcher::new(2, TokioSpawner::current());
    dispatcher.stop();
    dispatcher.stop();
    assert!(!dispatcher.is_running());
    // Still usable afterwards.
    dispatcher.add(Arc::new(TallyJob::default())).unwrap();
    assert_eq!(dispatcher.pending(), 1);
}

#[tokio::test]
async fn test_restart_after_stop() {
    let dispatcher: Dispatcher<Arc<TallyJob>, _> = Dispatcher::new(4, TokioSpawner::current());
    dispatcher
        .run_background(1, Duration::from_millis(10))
        .unwrap();
    assert!(dispatcher.is_running());

    dispatcher.stop();
    // The loop acknowledges the stop on its own task; give it a moment.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!dispatcher.is_running());

    dispatcher
        .run_background(1, Duration::from_millis(10))
        .unwrap();
    assert!(dispatcher.is_running());
    dispatcher.stop();
}

#[tokio::test]
async fn test_blocking_run_returns_after_stop() {
    let dispatcher: Arc<Dispatcher<Arc<TallyJob>, _>> =
        Arc::new(Dispatcher::new(2, TokioSpawner::current()));

    let runner = Arc::clone(&dispatcher);
    let handle = tokio::spawn(async move { runner.run(1, Duration::from_millis(10)).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(dispatcher.is_running());
    dispatcher.stop();

    let result = tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("run did not return after stop")
        .expect("run task panicked");
    assert!(result.is_ok());
    assert!(!dispatcher.is_running());
}

#[tokio::test]
async fn test_dropping_dispatcher_ends_background_loop() {
    let job = Arc::new(TallyJob::default());
    {
        let dispatcher = Dispatcher::new(4, TokioSpawner::current());
        dispatcher.add(Arc::clone(&job)).unwrap();
        dispatcher
            .run_background(1, Duration::from_millis(20))
            .unwrap();
        // Dropped before the first tick fires.
    }

    // An orphaned loop would admit the queued job on one of these ticks.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(job.calls(), 0);
}

#[tokio::test]
async fn test_cancelled_run_future_releases_running_state() {
    let dispatcher = Dispatcher::new(4, TokioSpawner::current());

    let timed_out = tokio::time::timeout(
        Duration::from_millis(50),
        dispatcher.run(1, Duration::from_millis(10)),
    )
    .await;
    assert!(timed_out.is_err(), "run returned without a stop");

    // Dropping the run future released the claim.
    assert!(!dispatcher.is_running());

    // A fresh run starts cleanly and dispatches.
    let job = Arc::new(TallyJob::default());
    dispatcher.add(Arc::clone(&job)).unwrap();
    dispatcher
        .run_background(1, Duration::from_millis(10))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    dispatcher.stop();
    dispatcher.wait().await;

    assert_eq!(job.calls(), 1);
}

#[tokio::test]
async fn test_jobs_queued_while_stopped_run_after_start() {
    let dispatcher = Dispatcher::new(4, TokioSpawner::current());

    let job = Arc::new(TallyJob::default());
    dispatcher.add(Arc::clone(&job)).unwrap();
    assert_eq!(job.calls(), 0);

    dispatcher
        .run_background(1, Duration::from_millis(10))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    dispatcher.stop();
    dispatcher.wait().await;

    assert_eq!(job.calls(), 1);
    assert_eq!(dispatcher.pending(), 0);
}

#[tokio::test]
async fn test_from_config_builds_a_working_dispatcher() {
    let config = DispatcherConfig::new()
        .with_buffer_size(2)
        .with_max_concurrent(1)
        .with_tick_interval(Duration::from_millis(10));

    let dispatcher = Dispatcher::from_config(&config, TokioSpawner::current()).unwrap();
    let job = Arc::new(TallyJob::default());
    dispatcher.add(Arc::clone(&job)).unwrap();

    dispatcher
        .run_background(config.max_concurrent, config.tick_interval())
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    dispatcher.stop();
    dispatcher.wait().await;

    assert_eq!(job.calls(), 1);
}

#[tokio::test]
async fn test_from_config_rejects_invalid_configuration() {
    let bad = DispatcherConfig::new().with_buffer_size(0);
    let err =
        Dispatcher::<Arc<TallyJob>, _>::from_config(&bad, TokioSpawner::current()).unwrap_err();
    assert_eq!(
        err,
        DispatchError::InvalidConfig("buffer_size must be greater than 0".into())
    );
}
