use std::sync::{Arc, Mutex, PoisonError};

use crossbeam::channel::{self, Receiver, Sender};
use crossbeam::sync::WaitGroup;
use log::{debug, error};
use serde::Serialize;

mod worker;

use self::worker::{Consumer, Tally};

/// A unit of work: run once, no inputs, no outputs.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// A bounded, run-to-completion worker pool.
///
/// Tasks are queued with [`enqueue`](WorkPool::enqueue) and nothing
/// executes until [`run`](WorkPool::run) is called. `run` spawns exactly
/// `workers` consumers over a shared FIFO queue and blocks until the queue
/// is drained and every claimed task has finished.
///
/// A panic inside a task is caught at that task's boundary; sibling tasks,
/// the consumers and the caller of `run` are unaffected.
///
/// `WorkPool` is cheaply cloneable. Clones share the same queue, which is
/// how other threads and tasks already running in the pool add work.
/// Tasks enqueued by a running task are executed by the same run.
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use workpool::WorkPool;
///
/// let count = Arc::new(AtomicUsize::new(0));
/// let pool = WorkPool::new(2);
/// for _ in 0..3 {
///     let count = Arc::clone(&count);
///     pool.enqueue(move || {
///         count.fetch_add(1, Ordering::SeqCst);
///     });
/// }
/// pool.run();
/// assert_eq!(count.load(Ordering::SeqCst), 3);
/// ```
#[derive(Clone)]
pub struct WorkPool {
    workers: usize,
    tx: Sender<Task>,
    rx: Receiver<Task>,
    run_lock: Arc<Mutex<()>>,
}

/// Outcome of a single [`WorkPool::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Tasks that returned normally.
    pub completed: usize,
    /// Tasks that panicked and were absorbed.
    pub faulted: usize,
}

impl RunSummary {
    /// Total number of tasks executed by the run, faulted or not.
    pub fn executed(&self) -> usize {
        self.completed + self.faulted
    }
}

impl WorkPool {
    /// Creates a pool with the given number of workers.
    ///
    /// A worker count of zero is normalized to one.
    pub fn new(workers: usize) -> Self {
        let (tx, rx) = channel::unbounded();
        WorkPool {
            workers: workers.max(1),
            tx,
            rx,
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Returns the effective number of workers.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Returns the number of tasks waiting to be claimed.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Appends a task to the tail of the queue.
    pub fn enqueue<F>(&self, task: F) -> &Self
    where
        F: FnOnce() + Send + 'static,
    {
        // The pool owns a receiver, so the channel can never be disconnected.
        let _ = self.tx.send(Box::new(task));
        self
    }

    /// Appends every task in `tasks`, in iteration order.
    pub fn enqueue_all<I, F>(&self, tasks: I) -> &Self
    where
        I: IntoIterator<Item = F>,
        F: FnOnce() + Send + 'static,
    {
        for task in tasks {
            self.enqueue(task);
        }
        self
    }

    /// Drains the queue across `workers` consumers and blocks until done.
    ///
    /// Returns once every task claimed during this run has finished and no
    /// consumer is still alive. Runs on the same pool never overlap: a
    /// concurrent call waits for the current one to return first.
    ///
    /// Calling `run` from inside one of this pool's own tasks deadlocks.
    pub fn run(&self) -> RunSummary {
        let _running = self
            .run_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if self.rx.is_empty() {
            debug!("Work pool run: queue empty, nothing to do");
            return RunSummary::default();
        }

        debug!(
            "Work pool run: {} pending tasks over {} workers",
            self.pending(),
            self.workers
        );

        let wg = WaitGroup::new();
        let tally = Arc::new(Tally::default());
        let mut started = 0;

        for id in 0..self.workers {
            match Consumer::new(id, &self.rx, &tally).spawn(wg.clone()) {
                Ok(()) => started += 1,
                Err(e) => error!("Failed to spawn worker {id}: {e}"),
            }
        }

        if started == 0 {
            error!("No workers could be spawned, draining on the calling thread");
            Consumer::new(0, &self.rx, &tally).drain();
        }

        // Each consumer holds a clone until it exits.
        wg.wait();

        let summary = tally.summary();
        debug!(
            "Work pool run finished: {} completed, {} faulted",
            summary.completed, summary.faulted
        );
        summary
    }
}
