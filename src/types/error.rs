use thiserror::Error;

use crate::types::PageId;

/// Coarse classification of every error the engine can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Schema,
    NotFound,
    AlreadyExists,
    Query,
    Storage,
    Config,
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization/deserialization error: {details}")]
    SerializationError { details: String },

    #[error("Corrupted page: page_id={page_id}, reason={reason}")]
    CorruptedPage { page_id: PageId, reason: String },

    #[error("Schema error: {details}")]
    SchemaError { details: String },

    #[error("Type mismatch for column '{column}': expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },

    #[error("Value {value} for column '{column}' is outside [{min}, {max}]")]
    OutOfRange {
        column: String,
        value: String,
        min: String,
        max: String,
    },

    #[error("Table '{name}' not found")]
    TableNotFound { name: String },

    #[error("Column '{name}' not found in table '{table}'")]
    ColumnNotFound { name: String, table: String },

    #[error("Page {page_id} of table '{table}' not found")]
    PageNotFound { table: String, page_id: PageId },

    #[error("No tuple with clustering key {key} in table '{table}'")]
    TupleNotFound { table: String, key: String },

    #[error("Table '{name}' already exists")]
    TableAlreadyExists { name: String },

    #[error("Index '{name}' not found on table '{table}'")]
    IndexNotFound { name: String, table: String },

    #[error("Index '{name}' already exists on table '{table}'")]
    IndexAlreadyExists { name: String, table: String },

    #[error("Duplicate clustering key {key} in table '{table}'")]
    DuplicateKey { table: String, key: String },

    #[error("Query error: {details}")]
    QueryError { details: String },

    #[error("Configuration error: {details}")]
    ConfigError { details: String },
}

impl DatabaseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DatabaseError::Io(_)
            | DatabaseError::SerializationError { .. }
            | DatabaseError::CorruptedPage { .. } => ErrorKind::Storage,
            DatabaseError::SchemaError { .. }
            | DatabaseError::TypeMismatch { .. }
            | DatabaseError::OutOfRange { .. } => ErrorKind::Schema,
            DatabaseError::TableNotFound { .. }
            | DatabaseError::ColumnNotFound { .. }
            | DatabaseError::PageNotFound { .. }
            | DatabaseError::TupleNotFound { .. }
            | DatabaseError::IndexNotFound { .. } => ErrorKind::NotFound,
            DatabaseError::TableAlreadyExists { .. }
            | DatabaseError::IndexAlreadyExists { .. }
            | DatabaseError::DuplicateKey { .. } => ErrorKind::AlreadyExists,
            DatabaseError::QueryError { .. } => ErrorKind::Query,
            DatabaseError::ConfigError { .. } => ErrorKind::Config,
        }
    }

    pub(crate) fn schema(details: impl Into<String>) -> Self {
        DatabaseError::SchemaError {
            details: details.into(),
        }
    }

    pub(crate) fn query(details: impl Into<String>) -> Self {
        DatabaseError::QueryError {
            details: details.into(),
        }
    }
}

impl From<bincode::error::EncodeError> for DatabaseError {
    fn from(err: bincode::error::EncodeError) -> Self {
        DatabaseError::SerializationError {
            details: err.to_string(),
        }
    }
}

impl From<bincode::error::DecodeError> for DatabaseError {
    fn from(err: bincode::error::DecodeError) -> Self {
        DatabaseError::SerializationError {
            details: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
