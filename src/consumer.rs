use crate::core::{Value, normalize_row, render_row};
use crate::queue::QueuedMessage;
use crate::writer::RowWriter;
use tracing::{error, info};

/// Result of handling one queued message. Never an error: the consumer is
/// terminal for business-level retries.
#[derive(Debug, Clone, PartialEq)]
pub enum HandleOutcome {
    Inserted { id: Value },
    /// Row already present and the message allowed it.
    DuplicateIgnored,
    /// Row already present although the message did not allow it.
    DuplicateRejected,
    Failed,
}

/// Queue-side handler performing the insert a message describes.
pub struct QueueConsumer {
    writer: RowWriter,
    quiet: bool,
}

impl QueueConsumer {
    pub fn new(writer: RowWriter) -> Self {
        Self { writer, quiet: false }
    }

    /// Silences success and duplicate logging. Insert behaviour is unchanged.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub async fn handle(&self, message: &QueuedMessage) -> HandleOutcome {
        let table = message.table.as_str();
        let row = match normalize_row(&message.row) {
            Ok(row) => row,
            Err(err) => {
                error!(message_id = %message.id, table, error = %err, "async insert could not normalize row");
                return HandleOutcome::Failed;
            }
        };

        match self.writer.insert(table, &row).await {
            Ok(id) => {
                if !self.quiet {
                    info!(message_id = %message.id, table, row = %render_row(&row), id = %id, "async insert succeeded");
                }
                HandleOutcome::Inserted { id }
            }
            Err(err) if err.is_duplicate() => {
                if message.allow_duplicate {
                    return HandleOutcome::DuplicateIgnored;
                }
                if !self.quiet {
                    error!(
                        message_id = %message.id,
                        table,
                        row = %render_row(&row),
                        error = %err,
                        "async insert found duplicate row"
                    );
                }
                HandleOutcome::DuplicateRejected
            }
            Err(err) => {
                error!(
                    message_id = %message.id,
                    table,
                    row = %render_row(&row),
                    error = %err,
                    "async insert failed"
                );
                HandleOutcome::Failed
            }
        }
    }
}
