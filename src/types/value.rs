use std::{cmp::Ordering, fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{
    DATE_FORMAT,
    error::{DatabaseError, Result},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Text,
    Integer,
    Real,
    Date,
}

impl DataType {
    /// Accepts plain names (`integer`, `text`) as well as qualified ones
    /// such as `java.lang.Integer`, case-insensitively.
    pub fn from_string(name: &str) -> Result<Self> {
        let lowered = name.trim().to_lowercase();
        let short = lowered.rsplit('.').next().unwrap_or(&lowered);
        match short {
            "string" | "text" | "varchar" => Ok(DataType::Text),
            "int" | "integer" | "bigint" => Ok(DataType::Integer),
            "double" | "real" | "float" => Ok(DataType::Real),
            "date" => Ok(DataType::Date),
            _ => Err(DatabaseError::schema(format!("Unsupported data type: {name}"))),
        }
    }
}

impl FromStr for DataType {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_string(s)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Text => "TEXT",
            DataType::Integer => "INTEGER",
            DataType::Real => "REAL",
            DataType::Date => "DATE",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Text(String),
    Integer(i64),
    Real(f64),
    Date(NaiveDate),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Text(_) => DataType::Text,
            Value::Integer(_) => DataType::Integer,
            Value::Real(_) => DataType::Real,
            Value::Date(_) => DataType::Date,
        }
    }

    /// Parse the textual form of a value, e.g. a min/max bound from metadata.
    pub fn parse(raw: &str, data_type: DataType) -> Result<Self> {
        let raw = raw.trim();
        let invalid = || DatabaseError::TypeMismatch {
            column: String::new(),
            expected: data_type.to_string(),
            actual: raw.to_string(),
        };
        match data_type {
            DataType::Text => Ok(Value::Text(raw.to_string())),
            DataType::Integer => raw.parse().map(Value::Integer).map_err(|_| invalid()),
            DataType::Real => raw.parse().map(Value::Real).map_err(|_| invalid()),
            DataType::Date => NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .map(Value::Date)
                .map_err(|_| invalid()),
        }
    }

    pub fn is_compatible_with_type(&self, data_type: &DataType) -> bool {
        self.data_type() == *data_type
    }

    /// Total order within one tag; values of different tags are incomparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Real(a), Value::Real(b)) => Some(a.total_cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// Equality agrees with [`Value::compare`], so `-0.0` and `0.0` differ.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}
