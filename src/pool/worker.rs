use std::any::Any;
use std::io;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam::channel::Receiver;
use crossbeam::sync::WaitGroup;
use log::debug;

use super::{RunSummary, Task};

/// Per-run outcome counters shared by every consumer of that run.
#[derive(Debug, Default)]
pub(crate) struct Tally {
    completed: AtomicUsize,
    faulted: AtomicUsize,
}

impl Tally {
    pub(crate) fn summary(&self) -> RunSummary {
        RunSummary {
            completed: self.completed.load(Ordering::Acquire),
            faulted: self.faulted.load(Ordering::Acquire),
        }
    }
}

/// Everything one consumer needs to drain the queue for a single run.
pub(crate) struct Consumer {
    id: usize,
    rx: Receiver<Task>,
    tally: Arc<Tally>,
}

impl Consumer {
    pub(crate) fn new(id: usize, rx: &Receiver<Task>, tally: &Arc<Tally>) -> Self {
        Consumer {
            id,
            rx: rx.clone(),
            tally: Arc::clone(tally),
        }
    }

    /// Starts this consumer on its own named thread.
    ///
    /// The wait group handle is moved into the thread and released when the
    /// consumer exits, or right away if the thread cannot be spawned.
    pub(crate) fn spawn(self, wg: WaitGroup) -> io::Result<()> {
        let id = self.id;
        thread::Builder::new()
            .name(format!("workpool-worker-{id}"))
            .spawn(move || {
                self.drain();
                drop(wg);
            })
            .map(|_| ())
    }

    /// Claims and executes tasks until the queue is observed empty.
    ///
    /// A task enqueued by a task this consumer runs is seen by the next
    /// claim, so work spawned from inside a run is drained by that run.
    pub(crate) fn drain(&self) {
        let id = self.id;
        while let Ok(task) = self.rx.try_recv() {
            match panic::catch_unwind(AssertUnwindSafe(task)) {
                Ok(()) => {
                    self.tally.completed.fetch_add(1, Ordering::AcqRel);
                }
                Err(payload) => {
                    debug!("Worker {id}: task panicked, absorbed");
                    release_payload(payload);
                    self.tally.faulted.fetch_add(1, Ordering::AcqRel);
                }
            }
        }
        debug!("Worker {id}: queue drained, exiting");
    }
}

/// Drops a panic payload without letting a panicking `Drop` escape the task.
fn release_payload(payload: Box<dyn Any + Send>) {
    if let Err(nested) = panic::catch_unwind(AssertUnwindSafe(move || drop(payload))) {
        mem::forget(nested);
    }
}
