use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::{
    error::{DatabaseError, Result},
    value::{DataType, Value},
};

pub const METADATA_HEADER: &str =
    "TableName,ColumnName,ColumnType,ClusteringKey,IndexName,IndexType,Min,Max";

/// Characters that would split a metadata row or field.
const METADATA_RESERVED: [char; 3] = [',', '\n', '\r'];

fn check_metadata_text(what: &str, text: &str) -> Result<()> {
    if text.contains(METADATA_RESERVED) {
        return Err(DatabaseError::schema(format!(
            "{what} '{}' contains a comma or line break",
            text.escape_debug()
        )));
    }
    Ok(())
}

/// A table name becomes a directory and file name in the data directory.
fn check_table_name(name: &str) -> Result<()> {
    check_metadata_text("Table name", name)?;
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(DatabaseError::schema(format!(
            "Table name '{}' is not a valid file name",
            name.escape_debug()
        )));
    }
    Ok(())
}

/// Represents a column definition in a table schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: DataType,
    pub clustering_key: bool,
    pub index_name: Option<String>,
    pub index_type: Option<String>,
    pub min: Value,
    pub max: Value,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, data_type: DataType, min: Value, max: Value) -> Self {
        Self {
            name: name.into(),
            data_type,
            clustering_key: false,
            index_name: None,
            index_type: None,
            min,
            max,
        }
    }

    /// Build a column from the textual type and bounds a caller supplies.
    pub fn parse(name: impl Into<String>, data_type: &str, min: &str, max: &str) -> Result<Self> {
        let name = name.into();
        let data_type = DataType::from_string(data_type)?;
        let bound = |raw: &str| {
            Value::parse(raw, data_type).map_err(|_| {
                DatabaseError::schema(format!(
                    "Bound '{raw}' of column '{name}' is not a valid {data_type}"
                ))
            })
        };
        let (min, max) = (bound(min)?, bound(max)?);
        Ok(Self::new(name, data_type, min, max))
    }

    pub fn clustering_key(mut self) -> Self {
        self.clustering_key = true;
        self
    }

    pub fn contains(&self, value: &Value) -> bool {
        matches!(
            (value.compare(&self.min), value.compare(&self.max)),
            (Some(lo), Some(hi)) if lo.is_ge() && hi.is_le()
        )
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(DatabaseError::schema("Column name is empty"));
        }
        check_metadata_text("Column name", &self.name)?;
        for text in [&self.index_name, &self.index_type].into_iter().flatten() {
            check_metadata_text("Index field", text)?;
        }
        for bound in [&self.min, &self.max] {
            if let Value::Text(text) = bound {
                check_metadata_text("Bound", text)?;
            }
            if !bound.is_compatible_with_type(&self.data_type) {
                return Err(DatabaseError::schema(format!(
                    "Bound {bound} of column '{}' does not match type {}",
                    self.name, self.data_type
                )));
            }
        }
        if self.min.compare(&self.max).is_some_and(|o| o.is_gt()) {
            return Err(DatabaseError::schema(format!(
                "min > max for column '{}'",
                self.name
            )));
        }
        Ok(())
    }

    fn to_csv_row(&self, table_name: &str) -> String {
        [
            table_name.to_string(),
            self.name.clone(),
            self.data_type.to_string(),
            if self.clustering_key { "True" } else { "False" }.to_string(),
            self.index_name.clone().unwrap_or_else(|| "null".to_string()),
            self.index_type.clone().unwrap_or_else(|| "null".to_string()),
            self.min.to_string(),
            self.max.to_string(),
        ]
        .join(",")
    }

    fn from_csv_row(fields: &[&str]) -> Result<Self> {
        let optional = |field: &str| (field != "null").then(|| field.to_string());
        let mut column = Self::parse(fields[1], fields[2], fields[6], fields[7])?;
        column.clustering_key = fields[3].eq_ignore_ascii_case("true");
        column.index_name = optional(fields[4]);
        column.index_type = optional(fields[5]);
        Ok(column)
    }
}

/// Represents a complete table schema with all column definitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    pub fn new(table_name: impl Into<String>, columns: Vec<ColumnSchema>) -> Result<Self> {
        let schema = Self {
            table_name: table_name.into(),
            columns,
        };
        schema.validate()?;
        Ok(schema)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        check_table_name(&self.table_name)?;
        if self.columns.is_empty() {
            return Err(DatabaseError::schema(format!(
                "Table '{}' has no columns",
                self.table_name
            )));
        }
        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(DatabaseError::schema(format!(
                    "Duplicate column '{}'",
                    column.name
                )));
            }
            column.validate()?;
        }
        match self.columns.iter().filter(|c| c.clustering_key).count() {
            1 => Ok(()),
            0 => Err(DatabaseError::schema("Clustering key does not exist")),
            _ => Err(DatabaseError::schema("More than one clustering key")),
        }
    }

    /// Get column by name
    pub fn get_column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|col| col.name == name)
    }

    pub fn require_column(&self, name: &str) -> Result<&ColumnSchema> {
        self.get_column(name)
            .ok_or_else(|| DatabaseError::ColumnNotFound {
                name: name.to_string(),
                table: self.table_name.clone(),
            })
    }

    pub fn clustering_column(&self) -> &ColumnSchema {
        // `validate` guarantees exactly one clustering column.
        self.columns
            .iter()
            .find(|col| col.clustering_key)
            .unwrap_or(&self.columns[0])
    }

    /// Get all column names in order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|col| col.name.clone()).collect()
    }

    /// Declared [min, max] bounds of the given columns.
    pub fn bounds_of(&self, columns: &[String]) -> Result<(BTreeMap<String, Value>, BTreeMap<String, Value>)> {
        let mut min = BTreeMap::new();
        let mut max = BTreeMap::new();
        for name in columns {
            let column = self.require_column(name)?;
            min.insert(name.clone(), column.min.clone());
            max.insert(name.clone(), column.max.clone());
        }
        Ok((min, max))
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::from(METADATA_HEADER);
        for column in &self.columns {
            out.push('\n');
            out.push_str(&column.to_csv_row(&self.table_name));
        }
        out
    }

    pub fn from_csv(contents: &str) -> Result<Self> {
        let mut lines = contents.lines().filter(|line| !line.trim().is_empty());
        match lines.next() {
            Some(header) if header.trim() == METADATA_HEADER => {}
            _ => return Err(DatabaseError::schema("Missing metadata header")),
        }
        let mut table_name = None;
        let mut columns = Vec::new();
        for line in lines {
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() != 8 {
                return Err(DatabaseError::schema(format!(
                    "Malformed metadata row: {line}"
                )));
            }
            table_name.get_or_insert_with(|| fields[0].to_string());
            columns.push(ColumnSchema::from_csv_row(&fields)?);
        }
        let table_name =
            table_name.ok_or_else(|| DatabaseError::schema("Metadata lists no columns"))?;
        Self::new(table_name, columns)
    }
}

/// Schema manager for handling table and column schemas
#[derive(Debug, Clone, Default)]
pub struct SchemaManager {
    pub table_schemas: HashMap<String, TableSchema>,
}

impl SchemaManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table schema
    pub fn add_table_schema(&mut self, schema: TableSchema) {
        self.table_schemas.insert(schema.table_name.clone(), schema);
    }

    /// Get a table schema by name
    pub fn get_table_schema(&self, table_name: &str) -> Option<&TableSchema> {
        self.table_schemas.get(table_name)
    }

    pub fn get_table_schema_mut(&mut self, table_name: &str) -> Option<&mut TableSchema> {
        self.table_schemas.get_mut(table_name)
    }

    /// Get all table names
    pub fn table_names(&self) -> Vec<&str> {
        self.table_schemas.keys().map(|s| s.as_str()).collect()
    }

    /// Check if a table exists
    pub fn table_exists(&self, table_name: &str) -> bool {
        self.table_schemas.contains_key(table_name)
    }
}
