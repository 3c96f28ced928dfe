use crate::core::{Result, Row, Value, normalize_row};
use crate::storage::StorageBackend;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Synchronous single-row insert shared by every write path.
///
/// Clones share one session: an insert and its id lookup never interleave
/// with another insert through the same writer.
#[derive(Clone)]
pub struct RowWriter {
    backend: Arc<dyn StorageBackend>,
    primary_key_column: String,
    session: Arc<Mutex<()>>,
}

impl RowWriter {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            primary_key_column: "id".to_string(),
            session: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_primary_key_column(mut self, column: impl Into<String>) -> Self {
        self.primary_key_column = column.into();
        self
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// Inserts `row` into `table` and returns the row's id.
    ///
    /// An explicit, non-blank primary key in the row is returned as is;
    /// otherwise the backend is asked once for its last generated id, after
    /// the insert succeeded. Backend errors are returned unchanged.
    pub async fn insert(&self, table: &str, row: &Row) -> Result<Value> {
        let row = normalize_row(row)?;
        let _session = self.session.lock().await;
        self.backend.insert(table, &row).await?;

        match row.get(&self.primary_key_column) {
            Some(id) if !id.is_blank() => Ok(id.clone()),
            _ => self.backend.last_generated_id().await,
        }
    }
}
