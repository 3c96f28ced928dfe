pub mod memory;
pub mod message;
pub mod worker;

pub use memory::{InMemoryQueue, QueueReceiver};
pub use message::QueuedMessage;
pub use worker::{QueueWorker, spawn_queue_worker};

use crate::core::{Result, WriteRequest};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// At-least-once task queue the deferred writes travel through.
///
/// Delivery timing and redelivery are the transport's business; once `send`
/// returns `Ok` the message is out of the caller's hands.
#[async_trait]
pub trait QueueTransport: Send + Sync {
    async fn send(&self, message: QueuedMessage) -> Result<()>;
}

/// Wraps write requests into queue messages and hands them to a transport.
#[derive(Clone)]
pub struct QueueDispatcher {
    transport: Arc<dyn QueueTransport>,
}

impl QueueDispatcher {
    pub fn new(transport: Arc<dyn QueueTransport>) -> Self {
        Self { transport }
    }

    /// Sends `request`, delayed by `delay` when it is non-zero. Returns the message id.
    pub async fn send(&self, request: &WriteRequest, delay: Duration) -> Result<Uuid> {
        let message = QueuedMessage::new(request.clone(), delay);
        let id = message.id;
        self.transport.send(message).await?;
        Ok(id)
    }
}
