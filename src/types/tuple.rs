use std::{cmp::Ordering, collections::BTreeMap};

use serde::{Deserialize, Serialize};

use crate::types::{
    error::{DatabaseError, Result},
    value::Value,
};

/// Column name to value mapping as supplied by callers.
pub type Record = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuple {
    cluster_key: String,
    values: Record,
}

impl Tuple {
    pub fn new(cluster_key: impl Into<String>, values: Record) -> Result<Self> {
        let cluster_key = cluster_key.into();
        if !values.contains_key(&cluster_key) {
            return Err(DatabaseError::schema(format!(
                "Tuple is missing clustering key column '{cluster_key}'"
            )));
        }
        Ok(Self {
            cluster_key,
            values,
        })
    }

    pub fn cluster_key_name(&self) -> &str {
        &self.cluster_key
    }

    pub fn cluster_key_value(&self) -> &Value {
        // Presence is checked in `new` and the key column can never be replaced.
        &self.values[&self.cluster_key]
    }

    pub fn get_value(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    pub fn values(&self) -> &Record {
        &self.values
    }

    pub fn set_value(&mut self, column: &str, value: Value) -> Result<()> {
        if column == self.cluster_key {
            return Err(DatabaseError::query(format!(
                "Cannot update clustering key column '{column}'"
            )));
        }
        match self.values.get_mut(column) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(DatabaseError::ColumnNotFound {
                name: column.to_string(),
                table: String::new(),
            }),
        }
    }

    /// True when every given column holds exactly the given value.
    pub fn matches_all(&self, criteria: &Record) -> bool {
        criteria
            .iter()
            .all(|(column, value)| self.values.get(column) == Some(value))
    }

    pub fn cmp_key(&self, key: &Value) -> Ordering {
        self.cluster_key_value()
            .compare(key)
            .unwrap_or(Ordering::Equal)
    }
}
