// ============================================================================
// Deferred Row Inserts
// ============================================================================
//
// A write requested during a request is queued, written directly when the
// queue is unavailable, and parked in a per-request retry buffer when even
// that fails. Callers never see an error past translation.

pub mod core;
pub mod config;
pub mod duplicate;
pub mod storage;
pub mod queue;
pub mod translator;
pub mod writer;
pub mod consumer;
pub mod retry_buffer;
pub mod unit_of_work;
pub mod coordinator;
mod stats;

// Re-export main types for convenience
pub use crate::core::{DataType, DbError, Result, Row, Value, WriteRequest, normalize_row};
pub use config::{AsyncInsertConfig, ForceSync};
pub use duplicate::is_duplicate_entry;
pub use storage::{InMemoryConnection, InMemoryStorage, StorageBackend, TableSchema};
pub use queue::{
    InMemoryQueue, QueueDispatcher, QueueReceiver, QueueTransport, QueueWorker, QueuedMessage,
    spawn_queue_worker,
};
pub use translator::{Entity, EntityTranslator, Translator};
pub use writer::RowWriter;
pub use consumer::{HandleOutcome, QueueConsumer};
pub use retry_buffer::{DeferredRetryBuffer, FlushOutcome, FlushOutcomeKind, FlushReport, RetryEntry};
pub use unit_of_work::UnitOfWork;
pub use coordinator::{AsyncInsertCoordinator, EnqueueOptions, EnqueueOutcome};
pub use stats::InsertStats;
