//! Bounded worker pool draining a FIFO intake queue.
//!
//! Enforces "at most N concurrent executions" with N dedicated workers
//! pulling from one ordered queue, so jobs enter execution in submission
//! order. Enqueueing is O(1) and never blocks the HTTP caller; a job simply
//! waits its turn.

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::metrics::QUEUE_DEPTH;
use crate::pipeline::JobPipeline;
use crate::registry::JobKey;

/// Fixed-size worker pool over a FIFO queue.
pub struct Scheduler {
    tx: mpsc::UnboundedSender<JobKey>,
    shutdown_tx: broadcast::Sender<()>,
    workers: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    /// Starts `concurrency` workers against the given pipeline.
    pub fn start(concurrency: usize, pipeline: Arc<JobPipeline>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<JobKey>();
        let (shutdown_tx, _) = broadcast::channel(1);

        // Workers share one receiver so the queue stays a single FIFO.
        let queue = Arc::new(Mutex::new(rx));
        let mut workers = Vec::with_capacity(concurrency);

        for worker_id in 0..concurrency {
            let queue = Arc::clone(&queue);
            let pipeline = Arc::clone(&pipeline);
            let mut shutdown_rx = shutdown_tx.subscribe();

            workers.push(tokio::spawn(async move {
                debug!(worker_id, "worker started");
                loop {
                    let key = tokio::select! {
                        _ = shutdown_rx.recv() => break,
                        key = async { queue.lock().await.recv().await } => match key {
                            Some(key) => key,
                            None => break,
                        },
                    };

                    QUEUE_DEPTH.dec();
                    pipeline.run(key).await;
                }
                debug!(worker_id, "worker stopped");
            }));
        }

        info!(concurrency, "scheduler started");
        Self {
            tx,
            shutdown_tx,
            workers: std::sync::Mutex::new(workers),
        }
    }

    /// Queues a job for execution. Returns immediately regardless of queue
    /// depth.
    pub fn enqueue(&self, key: JobKey) {
        QUEUE_DEPTH.inc();
        if self.tx.send(key).is_err() {
            // Only possible after shutdown; accepted jobs are lost with the
            // process anyway.
            QUEUE_DEPTH.dec();
            warn!("job enqueued after scheduler shutdown");
        }
    }

    /// Stops workers between jobs. In-flight jobs run to completion.
    pub async fn shutdown(&self) {
        info!("stopping scheduler");
        let _ = self.shutdown_tx.send(());
        let workers = {
            let mut guard = self.workers.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *guard)
        };
        for worker in workers {
            let _ = worker.await;
        }
        info!("scheduler stopped");
    }
}
