//! Object to table/row translation.

use crate::core::{DbError, Result, Row, Value};
use serde::Serialize;

/// Maps a domain object onto the table it belongs in and its column values.
///
/// Translation failures propagate to the caller of
/// [`AsyncInsertCoordinator::enqueue`](crate::AsyncInsertCoordinator::enqueue):
/// without a table and row there is nothing to fall back with.
pub trait Translator<O: ?Sized>: Send + Sync {
    fn translate(&self, object: &O) -> Result<(String, Row)>;
}

/// A serializable object stored as one row of a fixed table.
pub trait Entity: Serialize {
    fn table_name() -> &'static str;
}

/// Translates any [`Entity`] through its serde representation: every field
/// becomes a column, nested fields stay structured until normalization.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityTranslator;

impl<E: Entity> Translator<E> for EntityTranslator {
    fn translate(&self, object: &E) -> Result<(String, Row)> {
        let fields = match serde_json::to_value(object) {
            Ok(serde_json::Value::Object(fields)) => fields,
            Ok(other) => {
                return Err(DbError::Translation(format!(
                    "'{}' entity must serialize to an object, got {}",
                    E::table_name(),
                    other
                )));
            }
            Err(err) => return Err(DbError::Translation(err.to_string())),
        };

        let row = fields
            .into_iter()
            .map(|(column, value)| (column, Value::from_json(value)))
            .collect();
        Ok((E::table_name().to_string(), row))
    }
}
