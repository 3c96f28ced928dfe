use crate::core::{Result, Row, Value};
use async_trait::async_trait;

/// Storage backend trait - the single-row insert primitive every write path uses.
///
/// Rows handed to a backend are already normalized: they hold scalar values only.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Insert one row into a table
    async fn insert(&self, table: &str, row: &Row) -> Result<()>;

    /// Id generated by the most recent successful insert on this backend
    async fn last_generated_id(&self) -> Result<Value>;
}
