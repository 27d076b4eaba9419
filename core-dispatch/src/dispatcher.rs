//! Fixed-size worker pool with continuation-based delivery.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::thread;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error};

type Job = BoxFuture<'static, ()>;

/// A fixed-size worker pool executing submitted work units off the caller's
/// thread.
///
/// The pool is sized to the number of available processing units by default.
/// Workers share a single FIFO queue, so work units start in submission
/// order. Each worker may block on external I/O; the sizing assumes
/// I/O-bound work overlapping across workers.
///
/// # Example
///
/// ```ignore
/// use core_dispatch::Dispatcher;
///
/// let dispatcher = Dispatcher::new();
/// dispatcher.dispatch(async { 40 + 2 }, |answer| {
///     assert_eq!(answer, 42);
/// });
/// ```
pub struct Dispatcher {
    queue: mpsc::UnboundedSender<Job>,
    worker_count: usize,
}

impl Dispatcher {
    /// Create a dispatcher sized to the number of available processing units.
    ///
    /// Must be called within a tokio runtime context, since the workers are
    /// spawned as tokio tasks.
    pub fn new() -> Self {
        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self::with_workers(workers)
    }

    /// Create a dispatcher with an explicit worker count.
    ///
    /// A count of zero is clamped to one.
    pub fn with_workers(count: usize) -> Self {
        let count = count.max(1);
        let (tx, rx) = mpsc::unbounded_channel::<Job>();
        let rx = Arc::new(Mutex::new(rx));

        for worker in 0..count {
            let rx = Arc::clone(&rx);
            tokio::spawn(async move {
                loop {
                    // The lock is held only while dequeuing, so exactly one
                    // worker picks up each job and pickup order stays FIFO.
                    let job = {
                        let mut guard = rx.lock().await;
                        guard.recv().await
                    };
                    match job {
                        Some(job) => {
                            if AssertUnwindSafe(job).catch_unwind().await.is_err() {
                                error!(worker, "work unit panicked; worker continues");
                            }
                        }
                        None => break,
                    }
                }
                debug!(worker, "dispatch worker shut down");
            });
        }

        debug!(workers = count, "dispatcher started");
        Self {
            queue: tx,
            worker_count: count,
        }
    }

    /// Enqueue a work unit and return immediately.
    ///
    /// The work unit runs on a pool worker; once it completes, its output is
    /// handed to `on_done`. The continuation receives whatever the work unit
    /// produced — callers submitting fallible work pass a `Result` through,
    /// so the error path is part of every dispatch and can never be skipped.
    pub fn dispatch<T, F, C>(&self, work: F, on_done: C)
    where
        T: Send + 'static,
        F: Future<Output = T> + Send + 'static,
        C: FnOnce(T) + Send + 'static,
    {
        let job: Job = Box::pin(async move {
            on_done(work.await);
        });
        if self.queue.send(job).is_err() {
            // Only reachable after every worker has stopped.
            error!("dispatch queue closed; work unit dropped");
        }
    }

    /// Number of workers in the pool.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
