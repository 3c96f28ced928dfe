use super::QueueReceiver;
use crate::consumer::{HandleOutcome, QueueConsumer};
use crate::core::{DbError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

/// Background task feeding queued messages to a [`QueueConsumer`].
pub struct QueueWorker {
    processed: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
    stop_tx: Option<oneshot::Sender<()>>,
    join_handle: Option<JoinHandle<()>>,
}

impl QueueWorker {
    /// Messages handled so far, whatever their outcome.
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Acquire)
    }

    /// Messages whose insert failed for a reason other than a duplicate.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Acquire)
    }

    /// Signals the worker to stop and waits for it to finish.
    ///
    /// Messages already sitting in the queue are handled before the worker
    /// exits; delayed messages still waiting on their timer are not.
    pub async fn stop(mut self) -> Result<()> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        if let Some(join_handle) = self.join_handle.take() {
            join_handle
                .await
                .map_err(|err| DbError::ExecutionError(format!("queue worker join: {}", err)))?;
        }
        Ok(())
    }
}

impl Drop for QueueWorker {
    fn drop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(join_handle) = self.join_handle.take() {
            join_handle.abort();
        }
    }
}

/// Spawns a worker consuming `receiver` until stopped or the queue closes.
pub fn spawn_queue_worker(mut receiver: QueueReceiver, consumer: Arc<QueueConsumer>) -> QueueWorker {
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let processed = Arc::new(AtomicU64::new(0));
    let failed = Arc::new(AtomicU64::new(0));
    let processed_for_worker = processed.clone();
    let failed_for_worker = failed.clone();

    let join_handle = tokio::spawn(async move {
        let record = |outcome: HandleOutcome| {
            if outcome == HandleOutcome::Failed {
                failed_for_worker.fetch_add(1, Ordering::AcqRel);
            }
            processed_for_worker.fetch_add(1, Ordering::AcqRel);
        };

        loop {
            tokio::select! {
                biased;
                _ = &mut stop_rx => {
                    while let Some(message) = receiver.try_recv() {
                        record(consumer.handle(&message).await);
                    }
                    break;
                }
                message = receiver.recv() => {
                    match message {
                        Some(message) => record(consumer.handle(&message).await),
                        None => break,
                    }
                }
            }
        }
        debug!("queue worker stopped");
    });

    QueueWorker {
        processed,
        failed,
        stop_tx: Some(stop_tx),
        join_handle: Some(join_handle),
    }
}
