use super::{DataType, DbError, Result, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column name to value mapping for a single row.
pub type Row = BTreeMap<String, Value>;

/// One-line JSON rendering of a row for log fields.
pub(crate) fn render_row(row: &Row) -> String {
    serde_json::to_string(row).unwrap_or_else(|_| format!("{:?}", row))
}

/// One row to insert into one table.
///
/// Built once by a translator and never mutated afterwards; it is either
/// handed to a `RowWriter` or wrapped into a queued message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteRequest {
    pub table: String,
    pub row: Row,
    #[serde(default)]
    pub allow_duplicate: bool,
}

impl WriteRequest {
    pub fn new(table: impl Into<String>, row: Row) -> Self {
        Self {
            table: table.into(),
            row,
            allow_duplicate: false,
        }
    }

    pub fn allow_duplicate(mut self, allow: bool) -> Self {
        self.allow_duplicate = allow;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub auto_increment: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            primary_key: false,
            unique: false,
            auto_increment: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn validate(&self, value: &Value) -> Result<()> {
        if matches!(value, Value::Null) {
            if !self.nullable {
                return Err(DbError::ConstraintViolation(format!(
                    "Column '{}' cannot be NULL",
                    self.name
                )));
            }
            return Ok(());
        }

        if !self.data_type.is_compatible(value) {
            return Err(DbError::TypeMismatch(format!(
                "Column '{}' expects type {}, got {}",
                self.name,
                self.data_type,
                value.type_name()
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|col| col.name == name)
    }

    pub fn auto_increment_column(&self) -> Option<&Column> {
        self.columns.iter().find(|col| col.auto_increment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_row_is_compact_json() {
        let mut row = Row::new();
        row.insert("name".into(), Value::from("a"));
        row.insert("id".into(), Value::Integer(3));
        row.insert("note".into(), Value::Null);

        assert_eq!(render_row(&row), r#"{"id":3,"name":"a","note":null}"#);
    }
}
