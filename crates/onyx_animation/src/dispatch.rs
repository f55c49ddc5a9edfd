//! Work dispatchers
//!
//! Actor work bodies run through a [`Dispatcher`]. [`WorkerPool`] runs them
//! on background threads; [`InlineDispatcher`] runs them immediately on the
//! calling thread. Either way the result reaches the render thread through
//! the scheduler's completion channel, never by direct call.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// A unit of off-thread work
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs actor work bodies
pub trait Dispatcher {
    fn dispatch(&self, job: Job);
}

/// Runs each job at dispatch time on the calling thread
///
/// Deterministic; used headless and in tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineDispatcher;

impl Dispatcher for InlineDispatcher {
    fn dispatch(&self, job: Job) {
        job();
    }
}

/// Fixed set of worker threads sharing one job queue
///
/// Dropping the pool closes the queue and joins every worker after the
/// jobs already queued have run.
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `workers` threads (at least one)
    pub fn new(workers: usize) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));

        let count = workers.max(1);
        let mut handles = Vec::with_capacity(count);
        for index in 0..count {
            let receiver = Arc::clone(&receiver);
            let handle = thread::Builder::new()
                .name(format!("onyx-worker-{}", index))
                .spawn(move || worker_loop(index, receiver))?;
            handles.push(handle);
        }

        tracing::debug!("WorkerPool: started {} workers", count);
        Ok(Self {
            sender: Some(sender),
            workers: handles,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

fn worker_loop(index: usize, receiver: Arc<Mutex<Receiver<Job>>>) {
    loop {
        let job = match receiver.lock() {
            Ok(queue) => queue.recv(),
            Err(_) => break,
        };
        match job {
            Ok(job) => job(),
            // Queue closed
            Err(_) => break,
        }
    }
    tracing::trace!("WorkerPool: worker {} exiting", index);
}

impl Dispatcher for WorkerPool {
    fn dispatch(&self, job: Job) {
        let Some(sender) = &self.sender else {
            return;
        };
        if sender.send(job).is_err() {
            tracing::warn!("WorkerPool: queue closed, job dropped");
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        drop(self.sender.take());
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                tracing::warn!("WorkerPool: worker panicked");
            }
        }
    }
}
