#![deny(missing_docs)]

//! A bounded, run-to-completion worker pool.
//!
//! Callers queue arbitrary closures on a [`WorkPool`], then call
//! [`WorkPool::run`], which fans the queued work out over a fixed number
//! of worker threads and blocks until all of it has finished. A panic in
//! one task never stops the others.

mod error;
mod pool;

pub use error::{Result, WorkPoolError};
pub use pool::{RunSummary, Task, WorkPool};
