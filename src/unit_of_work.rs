use crate::retry_buffer::{DeferredRetryBuffer, FlushReport};
use crate::writer::RowWriter;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

/// Scope of one request: owns the retry buffer for writes deferred during it.
///
/// The host creates one per request and calls [`UnitOfWork::finish`] when the
/// response is out.
#[derive(Debug)]
pub struct UnitOfWork {
    id: Uuid,
    started_at: DateTime<Utc>,
    buffer: DeferredRetryBuffer,
}

impl UnitOfWork {
    pub fn new(max_retries: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            buffer: DeferredRetryBuffer::with_max_retries(max_retries),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn buffer(&self) -> &DeferredRetryBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut DeferredRetryBuffer {
        &mut self.buffer
    }

    /// Flushes the buffer once, then resets it regardless of the outcome.
    pub async fn finish(mut self, writer: &RowWriter) -> FlushReport {
        let report = self.buffer.flush(writer).await;
        if report.retained() > 0 {
            warn!(
                unit_of_work = %self.id,
                dropped = report.retained(),
                "unit of work ended with deferred inserts still failing"
            );
        }
        self.buffer.reset();
        debug!(unit_of_work = %self.id, touched = report.outcomes.len(), "unit of work finished");
        report
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        if !self.buffer.is_empty() {
            warn!(
                unit_of_work = %self.id,
                pending = self.buffer.len(),
                "unit of work dropped without finish; deferred inserts discarded"
            );
        }
    }
}
