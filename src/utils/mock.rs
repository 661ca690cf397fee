use std::path::Path;

use tempfile::TempDir;

use crate::{
    config::Config,
    storage::{database::Database, schema::ColumnSchema, store::FileStore},
    types::{
        error::Result,
        tuple::Record,
        value::{DataType, Value},
    },
};

/// A file-backed database living in a temporary directory that is removed
/// on drop.
pub struct TempDatabase {
    dir: TempDir,
    max_rows_per_page: usize,
    database: Option<Database<FileStore>>,
}

impl TempDatabase {
    pub fn with_prefix(prefix: &str) -> Result<Self> {
        Self::with_page_capacity(prefix, crate::types::DEFAULT_MAX_ROWS_PER_PAGE)
    }

    pub fn with_page_capacity(prefix: &str, max_rows_per_page: usize) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("tertib_{prefix}_"))
            .tempdir()?;
        Ok(Self {
            dir,
            max_rows_per_page,
            database: None,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> Result<Config> {
        Config::builder()
            .data_dir(self.dir.path())
            .max_rows_per_page(self.max_rows_per_page)
            .build()
    }

    /// The open database, opening it on first use.
    pub fn database(&mut self) -> Result<&mut Database<FileStore>> {
        let database = match self.database.take() {
            Some(database) => database,
            None => Database::open(self.config()?)?,
        };
        Ok(self.database.insert(database))
    }

    /// Drop the open handle so the next `database()` call re-reads disk.
    pub fn close(&mut self) {
        self.database = None;
    }
}

/// Columns of the `students` fixture table, clustered on `id` once created.
pub fn student_columns() -> Vec<ColumnSchema> {
    vec![
        ColumnSchema::new("id", DataType::Integer, Value::Integer(0), Value::Integer(1_000_000)),
        ColumnSchema::new("name", DataType::Text, Value::Text("A".into()), Value::Text("zzzzzzzzzz".into())),
        ColumnSchema::new("gpa", DataType::Real, Value::Real(0.0), Value::Real(5.0)),
    ]
}

pub fn student_record(id: i64, name: &str, gpa: f64) -> Record {
    Record::from([
        ("id".to_string(), Value::Integer(id)),
        ("name".to_string(), Value::Text(name.to_string())),
        ("gpa".to_string(), Value::Real(gpa)),
    ])
}
