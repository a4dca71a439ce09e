//! The worker pool that serves accepted client connections.

mod worker_pool;

pub use worker_pool::{SubmitError, WorkerPool};
