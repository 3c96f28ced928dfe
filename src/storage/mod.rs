pub mod engine;
pub mod memory;
pub mod table;

pub use engine::StorageBackend;
pub use memory::{InMemoryConnection, InMemoryStorage};
pub use table::{Table, TableSchema};
