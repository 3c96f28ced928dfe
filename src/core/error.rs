use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Column '{0}' not found in table '{1}'")]
    ColumnNotFound(String, String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Native duplicate-key error raised by a storage backend.
    #[error("Unique constraint violation: column '{column}' of table '{table}' already contains value {value}")]
    UniqueViolation {
        table: String,
        column: String,
        value: String,
    },

    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl DbError {
    /// Whether this error means the row already exists.
    pub fn is_duplicate(&self) -> bool {
        crate::duplicate::is_duplicate_entry(self)
    }
}

impl<T> From<std::sync::PoisonError<T>> for DbError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
