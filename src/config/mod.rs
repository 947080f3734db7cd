//! Configuration models for the dispatcher.

pub mod dispatcher;

pub use dispatcher::DispatcherConfig;
