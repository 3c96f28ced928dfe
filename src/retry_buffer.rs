use crate::config::DEFAULT_MAX_RETRIES;
use crate::core::{Row, render_row};
use crate::writer::RowWriter;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info_span, Instrument};

/// A row that failed every immediate write path.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryEntry {
    pub table: String,
    pub row: Row,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcomeKind {
    Inserted,
    /// Row already exists; dropped without a retry.
    Duplicate,
    /// Failed again; kept for the next flush.
    Retained,
    /// Failed past the retry ceiling; dropped. The row is lost.
    Exhausted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlushOutcome {
    pub table: String,
    pub attempts: u32,
    pub kind: FlushOutcomeKind,
}

/// What one flush pass did, one outcome per entry it touched, in buffer order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlushReport {
    pub outcomes: Vec<FlushOutcome>,
}

impl FlushReport {
    pub fn count(&self, kind: FlushOutcomeKind) -> usize {
        self.outcomes.iter().filter(|o| o.kind == kind).count()
    }

    pub fn inserted(&self) -> usize {
        self.count(FlushOutcomeKind::Inserted)
    }

    pub fn duplicates(&self) -> usize {
        self.count(FlushOutcomeKind::Duplicate)
    }

    pub fn retained(&self) -> usize {
        self.count(FlushOutcomeKind::Retained)
    }

    pub fn exhausted(&self) -> usize {
        self.count(FlushOutcomeKind::Exhausted)
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Per-unit-of-work buffer of rows to retry once the request is done.
///
/// Owned by a single unit of work; it is not shared between concurrent ones.
/// Entries are kept in insertion order and never deduplicated.
#[derive(Debug, Clone)]
pub struct DeferredRetryBuffer {
    entries: Vec<RetryEntry>,
    max_retries: u32,
}

impl DeferredRetryBuffer {
    pub fn new() -> Self {
        Self::with_max_retries(DEFAULT_MAX_RETRIES)
    }

    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            entries: Vec::new(),
            max_retries,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn add(&mut self, table: impl Into<String>, row: Row) {
        self.entries.push(RetryEntry {
            table: table.into(),
            row,
            attempts: 0,
            created_at: Utc::now(),
        });
    }

    pub fn entries(&self) -> &[RetryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Attempts every buffered row once.
    ///
    /// Inserted and duplicate rows are evicted. Any other failure bumps the
    /// entry's attempt count; once it exceeds the retry ceiling the entry is
    /// dropped as exhausted, otherwise it stays for the next pass.
    pub async fn flush(&mut self, writer: &RowWriter) -> FlushReport {
        let mut report = FlushReport::default();
        if self.entries.is_empty() {
            return report;
        }

        let pending = std::mem::take(&mut self.entries);
        let span = info_span!("deferred_insert.flush", entries = pending.len());

        let retained = async {
            let mut retained = Vec::new();
            for mut entry in pending {
                let kind = match writer.insert(&entry.table, &entry.row).await {
                    Ok(_) => FlushOutcomeKind::Inserted,
                    Err(err) if err.is_duplicate() => {
                        debug!(table = %entry.table, "deferred insert already present, dropping");
                        FlushOutcomeKind::Duplicate
                    }
                    Err(err) => {
                        entry.attempts += 1;
                        if entry.attempts > self.max_retries {
                            error!(
                                outcome = "exhausted",
                                table = %entry.table,
                                row = %render_row(&entry.row),
                                attempts = entry.attempts,
                                error = %err,
                                "deferred insert retries exhausted, dropping row"
                            );
                            FlushOutcomeKind::Exhausted
                        } else {
                            error!(
                                outcome = "retry",
                                table = %entry.table,
                                row = %render_row(&entry.row),
                                attempts = entry.attempts,
                                error = %err,
                                "deferred insert failed after request end"
                            );
                            FlushOutcomeKind::Retained
                        }
                    }
                };

                report.outcomes.push(FlushOutcome {
                    table: entry.table.clone(),
                    attempts: entry.attempts,
                    kind,
                });
                if kind == FlushOutcomeKind::Retained {
                    retained.push(entry);
                }
            }
            retained
        }
        .instrument(span)
        .await;

        self.entries = retained;
        report
    }

    /// Drops every entry, whatever the last flush did.
    pub fn reset(&mut self) {
        self.entries.clear();
    }
}

impl Default for DeferredRetryBuffer {
    fn default() -> Self {
        Self::new()
    }
}
