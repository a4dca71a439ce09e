use std::collections::VecDeque;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use thiserror::Error;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace};

/// A fixed set of workers consuming a shared FIFO queue.
///
/// Each worker takes one item at a time and runs the job on it to completion before
/// taking the next, so at most `size` jobs run at once. The queue itself is unbounded.
pub struct WorkerPool<T> {
    shared: Arc<Shared<T>>,
    workers: Vec<JoinHandle<()>>,
}

struct Shared<T> {
    queue: Mutex<VecDeque<T>>,
    stop: AtomicBool,
    notify: Notify,
}

/// Returned by [`WorkerPool::submit`] once shutdown has started; carries the rejected item.
#[derive(Error)]
#[error("worker pool is shutting down")]
pub struct SubmitError<T>(pub T);

impl<T> fmt::Debug for SubmitError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmitError").finish_non_exhaustive()
    }
}

impl<T> fmt::Debug for WorkerPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.workers.len())
            .field("queued", &self.shared.lock_queue().len())
            .field("stopping", &self.shared.stop.load(Ordering::Acquire))
            .finish()
    }
}

impl<T> Shared<T> {
    fn lock_queue(&self) -> MutexGuard<'_, VecDeque<T>> {
        // a panicking job never holds the lock, the queue stays consistent
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pop(&self) -> Option<T> {
        self.lock_queue().pop_front()
    }
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Spawns `size` workers on the current tokio runtime, each running `job` for the
    /// items it dequeues.
    pub fn new<F, Fut>(size: usize, job: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let shared = Arc::new(Shared { queue: Mutex::new(VecDeque::new()), stop: AtomicBool::new(false), notify: Notify::new() });
        let job = Arc::new(job);

        let workers = (0..size).map(|id| tokio::spawn(worker_loop(id, Arc::clone(&shared), Arc::clone(&job)))).collect();
        debug!(size, "started worker pool");

        Self { shared, workers }
    }

    /// Queues an item and wakes one idle worker.
    pub fn submit(&self, item: T) -> Result<(), SubmitError<T>> {
        {
            let mut queue = self.shared.lock_queue();
            if self.shared.stop.load(Ordering::Acquire) {
                return Err(SubmitError(item));
            }
            queue.push_back(item);
        }
        self.shared.notify.notify_one();
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Number of items waiting for a worker.
    pub fn queued(&self) -> usize {
        self.shared.lock_queue().len()
    }

    /// Stops accepting items, lets the workers drain the queue and waits for all of them.
    pub async fn shutdown(self) {
        {
            // taken under the lock so no submit can slip in after the workers exit
            let _queue = self.shared.lock_queue();
            self.shared.stop.store(true, Ordering::Release);
        }
        self.shared.notify.notify_waiters();

        for worker in self.workers {
            if let Err(e) = worker.await {
                error!(cause = %e, "worker task failed");
            }
        }
        debug!("worker pool shut down");
    }
}

async fn worker_loop<T, F, Fut>(id: usize, shared: Arc<Shared<T>>, job: Arc<F>)
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = ()>,
{
    loop {
        // registered before checking, so a wakeup between the checks and the await is kept
        let notified = shared.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if let Some(item) = shared.pop() {
            trace!(worker = id, "picked up job");
            if AssertUnwindSafe((*job)(item)).catch_unwind().await.is_err() {
                error!(worker = id, "job panicked");
            }
            continue;
        }

        if shared.stop.load(Ordering::Acquire) {
            break;
        }

        notified.await;
    }
    trace!(worker = id, "worker exiting");
}
