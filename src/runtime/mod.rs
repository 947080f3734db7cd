//! Runtime adapters bridging the dispatcher to concrete async runtimes.

pub mod tokio_spawner;

pub use tokio_spawner::TokioSpawner;
