use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info};

use crate::job::JobStore;

/// Executes one claimed job end-to-end, leaving it in a terminal state.
#[async_trait]
pub trait JobRunner: Send + Sync + 'static {
    async fn run(&self, job_id: String);
}

/// Bounded worker pool over one FIFO job queue.
///
/// The queue is unbounded and jobs wait indefinitely when all workers are
/// busy; back-pressure is out of scope at this layer. Workers are spawned
/// lazily on the first submission and live for the process lifetime,
/// blocking on queue receive while idle.
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<String>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
    started: AtomicBool,
    max_workers: usize,
    store: Arc<JobStore>,
    runner: Arc<dyn JobRunner>,
}

impl Dispatcher {
    pub fn new(max_workers: usize, store: Arc<JobStore>, runner: Arc<dyn JobRunner>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
            started: AtomicBool::new(false),
            max_workers: max_workers.max(1),
            store,
            runner,
        }
    }

    /// Enqueues a job for execution, starting the worker pool if this is
    /// the first submission.
    pub fn submit(&self, job_id: String) {
        self.ensure_workers();
        if self.tx.send(job_id.clone()).is_err() {
            // Only possible if every worker task has exited.
            self.store.fail(&job_id, "dispatcher queue closed");
        }
    }

    fn ensure_workers(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(workers = self.max_workers, "starting worker pool");
        for worker in 0..self.max_workers {
            let rx = Arc::clone(&self.rx);
            let store = Arc::clone(&self.store);
            let runner = Arc::clone(&self.runner);
            tokio::spawn(async move {
                Self::worker_loop(worker, rx, store, runner).await;
            });
        }
    }

    /// One worker: claim from the shared queue, run the job, ensure a
    /// terminal state even if the runner panicked.
    async fn worker_loop(
        worker: usize,
        rx: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
        store: Arc<JobStore>,
        runner: Arc<dyn JobRunner>,
    ) {
        loop {
            let job_id = {
                let mut queue = rx.lock().await;
                match queue.recv().await {
                    Some(id) => id,
                    None => break,
                }
            };
            debug!(worker, %job_id, "worker claimed job");

            let outcome = std::panic::AssertUnwindSafe(runner.run(job_id.clone()))
                .catch_unwind()
                .await;

            if let Err(panic) = outcome {
                let cause = panic_message(&panic);
                error!(worker, %job_id, %cause, "job runner panicked");
                // The job must not be dropped silently: record the crash
                // before this worker slot picks up the next job.
                if store.snapshot(&job_id).is_some_and(|j| !j.state.is_terminal()) {
                    store.fail(&job_id, format!("worker crashed: {cause}"));
                }
            }
        }
        debug!(worker, "worker loop exited, queue closed");
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
