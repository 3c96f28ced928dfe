pub mod error;
pub mod types;
pub mod value;

pub use error::{DbError, Result};
pub use types::{Column, Row, Schema, WriteRequest};
pub(crate) use types::render_row;
pub use value::{DataType, Value, normalize_row};
