//! Fire-and-forget automatic response dispatch.
//!
//! Detection must never wait on a notification channel, so the ingestion
//! path only pushes the event id onto a bounded queue. A small worker pool
//! drains the queue and runs
//! [`TamperResponseService::execute_automatic_response`] for each event.
//! Nothing is retried here; a full queue drops the automatic response with
//! a warning rather than applying backpressure to ingestion.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use helioguard_core::types::DbId;

use crate::responses::TamperResponseService;

/// Default bound on queued automatic responses.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Default number of response workers.
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Producer handle for the response queue.
#[derive(Clone)]
pub struct ResponseQueue {
    sender: mpsc::Sender<DbId>,
}

impl ResponseQueue {
    /// Spawn the worker pool and return the producer handle plus the
    /// worker join handles for shutdown.
    pub fn start(
        responses: TamperResponseService,
        worker_count: usize,
        capacity: usize,
        cancel: CancellationToken,
    ) -> (Self, Vec<JoinHandle<()>>) {
        let (sender, receiver) = mpsc::channel::<DbId>(capacity);
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));

        let mut handles = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let receiver = Arc::clone(&receiver);
            let responses = responses.clone();
            let cancel = cancel.clone();
            handles.push(tokio::spawn(async move {
                run_worker(worker_id, responses, receiver, cancel).await;
            }));
        }

        tracing::info!(worker_count, capacity, "Response worker pool started");
        (Self { sender }, handles)
    }

    /// Enqueue an event for automatic response. Never blocks.
    pub fn enqueue(&self, event_id: DbId) {
        match self.sender.try_send(event_id) {
            Ok(()) => {
                tracing::debug!(event_id, "Automatic response enqueued");
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(
                    event_id,
                    "Response queue full, dropping automatic response"
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!(
                    event_id,
                    "Response queue closed, dropping automatic response"
                );
            }
        }
    }
}

/// Drain loop for one response worker.
async fn run_worker(
    worker_id: usize,
    responses: TamperResponseService,
    receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<DbId>>>,
    cancel: CancellationToken,
) {
    loop {
        let event_id = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(worker_id, "Response worker shutting down");
                break;
            }
            // The receiver lock is only held while waiting for the next id;
            // execution happens after it is released so workers overlap.
            next = async { receiver.lock().await.recv().await } => match next {
                Some(id) => id,
                None => {
                    tracing::info!(worker_id, "Response queue closed, worker exiting");
                    break;
                }
            },
        };

        match responses.execute_automatic_response(event_id).await {
            Ok(Some(response)) => {
                tracing::debug!(
                    worker_id,
                    event_id,
                    response_id = response.id,
                    "Automatic response executed"
                );
            }
            Ok(None) => {
                tracing::debug!(worker_id, event_id, "Automatic response skipped");
            }
            Err(e) => {
                tracing::error!(
                    worker_id,
                    event_id,
                    error = %e,
                    "Automatic response failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enqueue_on_full_queue_does_not_block() {
        // A sender with no running workers: fill the queue past capacity
        // and confirm enqueue stays non-blocking.
        let (sender, _receiver) = mpsc::channel::<DbId>(1);
        let queue = ResponseQueue { sender };

        queue.enqueue(1);
        // Queue is now full; this drops with a warning instead of waiting.
        queue.enqueue(2);
    }

    #[tokio::test]
    async fn enqueue_after_close_does_not_panic() {
        let (sender, receiver) = mpsc::channel::<DbId>(1);
        drop(receiver);
        let queue = ResponseQueue { sender };
        queue.enqueue(1);
    }
}
