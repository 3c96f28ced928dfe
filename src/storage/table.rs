use crate::core::{Column, DbError, Result, Row, Schema, Value};

#[derive(Debug, Clone)]
pub struct Table {
    schema: TableSchema,
    rows: Vec<Row>,
    // None once the id space is used up
    next_auto_id: Option<i64>,
}

impl Table {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
            next_auto_id: Some(1),
        }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Validates and stores a row. Returns the value of the auto-increment
    /// column if the table has one, the inserted row's primary key otherwise.
    pub fn insert(&mut self, mut row: Row) -> Result<Value> {
        self.check_columns(&row)?;

        let mut generated = None;
        let mut next_auto_id = self.next_auto_id;
        if let Some(column) = self.schema.schema().auto_increment_column() {
            let explicit = row.get(&column.name).filter(|v| !v.is_null()).cloned();
            let id = match explicit {
                Some(value) => {
                    if let (Some(i), Some(next)) = (value.as_i64(), next_auto_id) {
                        next_auto_id = i.checked_add(1).map(|after| next.max(after));
                    }
                    value
                }
                None => {
                    let id = next_auto_id.ok_or_else(|| {
                        DbError::ExecutionError(format!(
                            "Auto-increment column '{}' of table '{}' is exhausted",
                            column.name, self.schema.name
                        ))
                    })?;
                    next_auto_id = id.checked_add(1);
                    Value::Integer(id)
                }
            };
            row.insert(column.name.clone(), id.clone());
            generated = Some(id);
        }

        self.validate_row(&row)?;
        self.check_uniqueness(&row)?;
        self.next_auto_id = next_auto_id;

        let id = generated
            .or_else(|| self.primary_key_value(&row))
            .unwrap_or(Value::Integer(self.rows.len() as i64 + 1));
        self.rows.push(row);
        Ok(id)
    }

    pub fn scan(&self) -> Vec<Row> {
        self.rows.clone()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn primary_key_value(&self, row: &Row) -> Option<Value> {
        self.schema
            .schema()
            .columns()
            .iter()
            .find(|col| col.primary_key)
            .and_then(|col| row.get(&col.name).cloned())
    }

    fn check_columns(&self, row: &Row) -> Result<()> {
        for name in row.keys() {
            if self.schema.schema().get_column(name).is_none() {
                return Err(DbError::ColumnNotFound(name.clone(), self.schema.name.clone()));
            }
        }
        Ok(())
    }

    fn validate_row(&self, row: &Row) -> Result<()> {
        for column in self.schema.schema().columns() {
            let value = row.get(&column.name).unwrap_or(&Value::Null);
            if value.is_nested() {
                return Err(DbError::TypeMismatch(format!(
                    "Column '{}' cannot store a nested value",
                    column.name
                )));
            }
            column.validate(value)?;
        }
        Ok(())
    }

    fn check_uniqueness(&self, row: &Row) -> Result<()> {
        for column in self.schema.schema().columns() {
            if !(column.primary_key || column.unique) {
                continue;
            }
            let value = match row.get(&column.name) {
                Some(value) if !value.is_null() => value,
                _ => continue,
            };
            if self.rows.iter().any(|existing| existing.get(&column.name) == Some(value)) {
                return Err(DbError::UniqueViolation {
                    table: self.schema.name.clone(),
                    column: column.name.clone(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct TableSchema {
    name: String,
    schema: Schema,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            schema: Schema::new(columns),
        }
    }
    pub fn name(&self) -> &str { &self.name }
    pub fn schema(&self) -> &Schema { &self.schema }
}
