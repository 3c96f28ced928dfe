use crate::config::AsyncInsertConfig;
use crate::consumer::QueueConsumer;
use crate::core::{Result, Value, WriteRequest, render_row};
use crate::queue::{QueueDispatcher, QueueTransport};
use crate::retry_buffer::{DeferredRetryBuffer, FlushReport};
use crate::stats::{InsertCounters, InsertStats};
use crate::storage::StorageBackend;
use crate::translator::Translator;
use crate::unit_of_work::UnitOfWork;
use crate::writer::RowWriter;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Per-call enqueue options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnqueueOptions {
    pub delay: Duration,
    pub allow_duplicate: bool,
}

impl EnqueueOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn allow_duplicate(mut self, allow: bool) -> Self {
        self.allow_duplicate = allow;
        self
    }
}

/// Where an enqueued write ended up. Informational only; none of these is a
/// failure the caller has to handle.
#[derive(Debug, Clone, PartialEq)]
pub enum EnqueueOutcome {
    Queued,
    WrittenDirectly { id: Value },
    /// Direct write hit an existing row and duplicates were allowed.
    DuplicateIgnored,
    /// Direct write hit an existing row; logged, not retried.
    DuplicateRejected,
    /// Both the queue and the direct write failed; parked in the retry buffer.
    Deferred,
}

/// Defers row inserts past the current request.
///
/// Tries the queue first, then a direct insert, then the caller's retry
/// buffer. Nothing past translation is ever reported as an error.
pub struct AsyncInsertCoordinator {
    dispatcher: QueueDispatcher,
    writer: RowWriter,
    config: AsyncInsertConfig,
    counters: Arc<InsertCounters>,
}

impl AsyncInsertCoordinator {
    pub fn new(
        transport: Arc<dyn QueueTransport>,
        backend: Arc<dyn StorageBackend>,
        config: AsyncInsertConfig,
    ) -> Self {
        let writer = RowWriter::new(backend).with_primary_key_column(config.primary_key_column.clone());
        Self {
            dispatcher: QueueDispatcher::new(transport),
            writer,
            config,
            counters: Arc::new(InsertCounters::default()),
        }
    }

    pub fn config(&self) -> &AsyncInsertConfig {
        &self.config
    }

    pub fn writer(&self) -> &RowWriter {
        &self.writer
    }

    pub fn stats(&self) -> InsertStats {
        self.counters.snapshot()
    }

    /// Queue-side consumer with this coordinator's settings, writing through
    /// its own storage connection.
    pub fn consumer(&self, backend: Arc<dyn StorageBackend>) -> QueueConsumer {
        let writer = RowWriter::new(backend).with_primary_key_column(self.config.primary_key_column.clone());
        QueueConsumer::new(writer).quiet(self.config.quiet_logging)
    }

    pub fn begin_unit_of_work(&self) -> UnitOfWork {
        UnitOfWork::new(self.config.max_retries)
    }

    pub async fn finish_unit_of_work(&self, unit: UnitOfWork) -> FlushReport {
        unit.finish(&self.writer).await
    }

    /// Translates `object` and defers its insert.
    ///
    /// The only error this returns is the translator's own: once a table and
    /// row exist, every failure is logged and absorbed by the fallback chain.
    pub async fn enqueue<O, T>(
        &self,
        translator: &T,
        object: &O,
        options: EnqueueOptions,
        buffer: &mut DeferredRetryBuffer,
    ) -> Result<EnqueueOutcome>
    where
        O: ?Sized,
        T: Translator<O> + ?Sized,
    {
        let (table, row) = translator.translate(object)?;
        let request = WriteRequest::new(table, row).allow_duplicate(options.allow_duplicate);
        Ok(self.enqueue_request(request, options.delay, buffer).await)
    }

    /// Defers an already translated request. Never fails.
    pub async fn enqueue_request(
        &self,
        request: WriteRequest,
        delay: Duration,
        buffer: &mut DeferredRetryBuffer,
    ) -> EnqueueOutcome {
        if self.config.force_sync.is_enabled() {
            debug!(table = %request.table, "force-sync enabled, bypassing queue");
            return self.write_directly(request, buffer).await;
        }

        match self.dispatcher.send(&request, delay).await {
            Ok(message_id) => {
                self.counters.record_queued();
                debug!(table = %request.table, %message_id, "insert queued");
                EnqueueOutcome::Queued
            }
            Err(err) => {
                error!(
                    table = %request.table,
                    row = %render_row(&request.row),
                    error = %err,
                    "async insert dispatch failed, trying direct insert"
                );
                self.write_directly(request, buffer).await
            }
        }
    }

    async fn write_directly(&self, request: WriteRequest, buffer: &mut DeferredRetryBuffer) -> EnqueueOutcome {
        match self.writer.insert(&request.table, &request.row).await {
            Ok(id) => {
                self.counters.record_direct_write();
                EnqueueOutcome::WrittenDirectly { id }
            }
            Err(err) if err.is_duplicate() => {
                if request.allow_duplicate {
                    debug!(table = %request.table, "direct insert hit existing row, allowed");
                    return EnqueueOutcome::DuplicateIgnored;
                }
                self.counters.record_duplicate();
                error!(
                    table = %request.table,
                    row = %render_row(&request.row),
                    error = %err,
                    "direct insert found duplicate row"
                );
                EnqueueOutcome::DuplicateRejected
            }
            Err(err) => {
                error!(
                    table = %request.table,
                    row = %render_row(&request.row),
                    error = %err,
                    "direct insert failed, retrying after request end"
                );
                self.counters.record_deferred();
                buffer.add(request.table, request.row);
                EnqueueOutcome::Deferred
            }
        }
    }
}
