use super::{QueueTransport, QueuedMessage};
use crate::core::{DbError, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::sleep;

/// In-process queue transport over an unbounded tokio channel.
///
/// Delayed messages are parked in a timer task and enqueued once the delay
/// elapses, so they are lost if the runtime shuts down first.
#[derive(Clone)]
pub struct InMemoryQueue {
    sender: mpsc::UnboundedSender<QueuedMessage>,
}

/// Receiving half of an [`InMemoryQueue`].
pub struct QueueReceiver {
    receiver: mpsc::UnboundedReceiver<QueuedMessage>,
}

impl InMemoryQueue {
    pub fn new() -> (Self, QueueReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, QueueReceiver { receiver })
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

#[async_trait]
impl QueueTransport for InMemoryQueue {
    async fn send(&self, message: QueuedMessage) -> Result<()> {
        if self.sender.is_closed() {
            return Err(DbError::Queue("in-memory queue is closed".to_string()));
        }

        match message.delay() {
            Some(delay) => {
                let sender = self.sender.clone();
                tokio::spawn(async move {
                    sleep(delay).await;
                    let _ = sender.send(message);
                });
                Ok(())
            }
            None => self
                .sender
                .send(message)
                .map_err(|_| DbError::Queue("in-memory queue is closed".to_string())),
        }
    }
}

impl QueueReceiver {
    pub async fn recv(&mut self) -> Option<QueuedMessage> {
        self.receiver.recv().await
    }

    /// Next message if one is ready right now.
    pub fn try_recv(&mut self) -> Option<QueuedMessage> {
        self.receiver.try_recv().ok()
    }

    pub fn close(&mut self) {
        self.receiver.close();
    }
}
