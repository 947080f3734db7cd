//! Core dispatching abstractions: the job contract, execution accounting,
//! and the tick-driven dispatcher.

pub mod counter;
pub mod dispatcher;
pub mod error;
pub mod job;
pub mod spawn;
pub mod waitgroup;

pub use counter::Counter;
pub use dispatcher::Dispatcher;
pub use error::{AppResult, DispatchError};
pub use job::Job;
pub use spawn::Spawn;
pub use waitgroup::WaitGroup;
