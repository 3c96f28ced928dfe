use super::{StorageBackend, Table, TableSchema};
use crate::core::{DbError, Result, Row, Value};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

type Catalog = HashMap<String, Arc<RwLock<Table>>>;

/// In-memory reference database.
///
/// Each table sits behind its own lock; the table map itself is only locked
/// for DDL and lookups. Clones share the same tables. Writes go through a
/// [`InMemoryConnection`], which tracks its own last generated id.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    tables: Arc<RwLock<Catalog>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new connection with its own last-generated-id slot.
    pub fn connection(&self) -> Arc<InMemoryConnection> {
        Arc::new(InMemoryConnection {
            storage: self.clone(),
            last_id: Mutex::new(Value::Null),
        })
    }

    /// Creates a table; fails if the name is taken.
    pub async fn create_table(&self, schema: TableSchema) -> Result<()> {
        let name = schema.name().to_string();
        let mut tables = self.tables.write().await;

        if tables.contains_key(&name) {
            return Err(DbError::ExecutionError(format!("Table '{}' already exists", name)));
        }

        tables.insert(name, Arc::new(RwLock::new(Table::new(schema))));
        Ok(())
    }

    /// Table handle for concurrent access
    pub async fn get_table(&self, name: &str) -> Result<Arc<RwLock<Table>>> {
        self.tables
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    pub async fn scan(&self, table_name: &str) -> Result<Vec<Row>> {
        let table_handle = self.get_table(table_name).await?;
        let table = table_handle.read().await;
        Ok(table.scan())
    }

    pub async fn row_count(&self, table_name: &str) -> Result<usize> {
        let table_handle = self.get_table(table_name).await?;
        let table = table_handle.read().await;
        Ok(table.row_count())
    }

    pub async fn table_exists(&self, name: &str) -> bool {
        self.tables.read().await.contains_key(name)
    }
}

/// One session against an [`InMemoryStorage`].
pub struct InMemoryConnection {
    storage: InMemoryStorage,
    last_id: Mutex<Value>,
}

impl InMemoryConnection {
    pub fn storage(&self) -> &InMemoryStorage {
        &self.storage
    }
}

#[async_trait]
impl StorageBackend for InMemoryConnection {
    async fn insert(&self, table: &str, row: &Row) -> Result<()> {
        let table_handle = self.storage.get_table(table).await?;
        let id = {
            let mut table = table_handle.write().await;
            table.insert(row.clone())?
        };
        *self.last_id.lock().await = id;
        Ok(())
    }

    async fn last_generated_id(&self) -> Result<Value> {
        Ok(self.last_id.lock().await.clone())
    }
}
