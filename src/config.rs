//! Engine configuration.
//!
//! Page capacity is shared by every page of every table. Values can be set
//! through the builder or read from a `key = value` properties file.

use std::{fs, path::Path, path::PathBuf};

use crate::types::{
    DEFAULT_MAX_ROWS_PER_PAGE,
    error::{DatabaseError, Result},
};

const KEY_MAX_ROWS: &str = "MaximumRowsCountinPage";
const KEY_DATA_DIR: &str = "DataDirectory";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Root directory for table, page and metadata files.
    ///   {data_dir}/
    ///     ├── metadata/{table}.csv
    ///     └── {table}/
    ///           ├── {table}.table
    ///           └── pages/{page_id}.page
    pub data_dir: PathBuf,

    /// Page capacity C.
    pub max_rows_per_page: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./tertib_data"),
            max_rows_per_page: DEFAULT_MAX_ROWS_PER_PAGE,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load settings from a properties file; unknown keys are ignored and
    /// missing keys keep their defaults.
    pub fn from_properties<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse_properties(&contents)
    }

    pub fn parse_properties(contents: &str) -> Result<Self> {
        let mut config = Config::default();
        for (line_no, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(DatabaseError::ConfigError {
                    details: format!("line {}: expected key = value", line_no + 1),
                });
            };
            match key.trim() {
                KEY_MAX_ROWS => {
                    config.max_rows_per_page =
                        value.trim().parse().map_err(|_| DatabaseError::ConfigError {
                            details: format!("{KEY_MAX_ROWS} must be a positive integer"),
                        })?;
                }
                KEY_DATA_DIR => config.data_dir = PathBuf::from(value.trim()),
                _ => {}
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_rows_per_page == 0 {
            return Err(DatabaseError::ConfigError {
                details: "page capacity must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    pub fn max_rows_per_page(mut self, rows: usize) -> Self {
        self.config.max_rows_per_page = rows;
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
