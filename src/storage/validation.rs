//! Type and range checks applied to caller data before it reaches a table.

use std::collections::BTreeSet;

use crate::{
    executor::predicate::SqlTerm,
    storage::schema::{ColumnSchema, TableSchema},
    types::{
        error::{DatabaseError, Result},
        tuple::Record,
        value::Value,
    },
};

/// A full record for insertion: exactly the schema's columns, each typed and in range.
pub fn validate_record(record: &Record, schema: &TableSchema) -> Result<()> {
    let given: BTreeSet<&str> = record.keys().map(String::as_str).collect();
    let expected: BTreeSet<&str> = schema.columns.iter().map(|c| c.name.as_str()).collect();
    if given != expected {
        return Err(DatabaseError::schema(format!(
            "Column names do not match table schema of '{}'",
            schema.table_name
        )));
    }
    validate_partial(record, schema)
}

/// Any subset of the schema's columns, each typed and in range.
pub fn validate_partial(record: &Record, schema: &TableSchema) -> Result<()> {
    for (name, value) in record {
        let column = schema.require_column(name)?;
        check_type(column, value)?;
        if !column.contains(value) {
            return Err(DatabaseError::OutOfRange {
                column: name.clone(),
                value: value.to_string(),
                min: column.min.to_string(),
                max: column.max.to_string(),
            });
        }
    }
    Ok(())
}

/// Select terms only need known columns and matching types; comparing
/// against a value outside the declared bounds is legal.
pub fn validate_terms(terms: &[SqlTerm], schema: &TableSchema) -> Result<()> {
    for term in terms {
        let column = schema.require_column(&term.column_name)?;
        check_type(column, &term.value).map_err(|_| {
            DatabaseError::query(format!(
                "Value {} is not comparable with column '{}' of type {}",
                term.value, column.name, column.data_type
            ))
        })?;
    }
    Ok(())
}

fn check_type(column: &ColumnSchema, value: &Value) -> Result<()> {
    if value.is_compatible_with_type(&column.data_type) {
        Ok(())
    } else {
        Err(DatabaseError::TypeMismatch {
            column: column.name.clone(),
            expected: column.data_type.to_string(),
            actual: value.data_type().to_string(),
        })
    }
}
