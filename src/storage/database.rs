use crate::{
    config::Config,
    executor::predicate::{Predicate, SqlTerm},
    storage::{
        index::{Index, RANGE_INDEX_TYPE},
        schema::{ColumnSchema, SchemaManager, TableSchema},
        store::{FileStore, MemoryStore, MetadataStore, PageStore},
        table::Table,
        validation::{validate_partial, validate_record, validate_terms},
    },
    types::{
        error::{DatabaseError, Result},
        tuple::{Record, Tuple},
        value::Value,
    },
};

/// Entry point for applications: validates requests against table metadata,
/// then loads the table object, delegates to it and persists it again.
pub struct Database<S: PageStore + MetadataStore> {
    config: Config,
    store: S,
    schema_manager: SchemaManager,
}

impl Database<FileStore> {
    /// Open (or initialise) the database rooted at `config.data_dir`.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let store = FileStore::new(&config.data_dir)?;
        Self::with_store(config, store)
    }
}

impl Database<MemoryStore> {
    pub fn in_memory(config: Config) -> Result<Self> {
        Self::with_store(config, MemoryStore::new())
    }
}

impl<S: PageStore + MetadataStore> Database<S> {
    pub fn with_store(config: Config, store: S) -> Result<Self> {
        config.validate()?;
        let mut schema_manager = SchemaManager::new();
        for table_name in store.list_tables()? {
            schema_manager.add_table_schema(store.read_metadata(&table_name)?);
        }
        tracing::info!(
            tables = schema_manager.table_schemas.len(),
            max_rows_per_page = config.max_rows_per_page,
            "database opened"
        );
        Ok(Self {
            config,
            store,
            schema_manager,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn schema(&self, table_name: &str) -> Result<&TableSchema> {
        self.schema_manager
            .get_table_schema(table_name)
            .ok_or_else(|| DatabaseError::TableNotFound {
                name: table_name.to_string(),
            })
    }

    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .schema_manager
            .table_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        names.sort();
        names
    }

    /// Current table object, as last persisted.
    pub fn table(&self, table_name: &str) -> Result<Table> {
        self.schema(table_name)?;
        self.store.deserialize_table(table_name)
    }

    /// Create a table clustered on `cluster_key`, which must name one of `columns`.
    pub fn create_table(
        &mut self,
        table_name: &str,
        cluster_key: &str,
        columns: Vec<ColumnSchema>,
    ) -> Result<()> {
        if self.schema_manager.table_exists(table_name) || self.store.table_exists(table_name) {
            return Err(DatabaseError::TableAlreadyExists {
                name: table_name.to_string(),
            });
        }
        if !columns.iter().any(|column| column.name == cluster_key) {
            return Err(DatabaseError::schema("Clustering key does not exist"));
        }
        let columns = columns
            .into_iter()
            .map(|column| {
                if column.name == cluster_key {
                    column.clustering_key()
                } else {
                    column
                }
            })
            .collect();
        let schema = TableSchema::new(table_name, columns)?;
        let table = Table::new(table_name, cluster_key, self.config.max_rows_per_page);

        self.store.write_metadata(&schema)?;
        self.store.serialize_table(&table)?;
        self.schema_manager.add_table_schema(schema);
        tracing::info!(table = table_name, cluster_key, "created table");
        Ok(())
    }

    pub fn insert_into_table(&mut self, table_name: &str, record: Record) -> Result<()> {
        let schema = self.schema(table_name)?;
        validate_record(&record, schema)?;
        let tuple = Tuple::new(schema.clustering_column().name.clone(), record)?;

        let mut table = self.store.deserialize_table(table_name)?;
        table.insert_tuple(&mut self.store, tuple)?;
        self.store.serialize_table(&table)
    }

    /// Change non-key columns of the tuple whose clustering key equals `key`.
    pub fn update_table(&mut self, table_name: &str, key: &Value, changes: &Record) -> Result<()> {
        let schema = self.schema(table_name)?;
        let key_column = schema.clustering_column();
        if !key.is_compatible_with_type(&key_column.data_type) {
            return Err(DatabaseError::TypeMismatch {
                column: key_column.name.clone(),
                expected: key_column.data_type.to_string(),
                actual: key.data_type().to_string(),
            });
        }
        validate_partial(changes, schema)?;

        let mut table = self.store.deserialize_table(table_name)?;
        table.update_tuple(&mut self.store, key, changes)?;
        self.store.serialize_table(&table)
    }

    /// Delete the tuples matching every pair in `criteria`; empty criteria
    /// empties the table. Returns the number of tuples deleted.
    pub fn delete_from_table(&mut self, table_name: &str, criteria: &Record) -> Result<usize> {
        validate_partial(criteria, self.schema(table_name)?)?;

        let mut table = self.store.deserialize_table(table_name)?;
        let deleted = table.delete_tuples(&mut self.store, criteria)?;
        self.store.serialize_table(&table)?;
        Ok(deleted)
    }

    /// Evaluate `terms` joined by `connectors` (`AND`, `OR`, `XOR`), using
    /// the table's indices when they cover the referenced columns.
    pub fn select_from_table(
        &self,
        table_name: &str,
        terms: Vec<SqlTerm>,
        connectors: &[&str],
    ) -> Result<Vec<Tuple>> {
        let schema = self.schema(table_name)?;
        if let Some(term) = terms.iter().find(|term| term.table_name != table_name) {
            return Err(DatabaseError::query(format!(
                "Term on table '{}' in a select from '{table_name}'",
                term.table_name
            )));
        }
        validate_terms(&terms, schema)?;
        let predicate = Predicate::parse(terms, connectors)?;

        let table = self.store.deserialize_table(table_name)?;
        table.select_tuples_with_index(&self.store, &predicate)
    }

    /// Create a range index whose declared range is each column's schema bounds.
    pub fn create_index(&mut self, table_name: &str, index_name: &str, columns: &[&str]) -> Result<()> {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let (min, max) = self.schema(table_name)?.bounds_of(&columns)?;
        self.create_index_with_range(table_name, Index::new(index_name, columns, min, max)?)
    }

    pub fn create_index_with_range(&mut self, table_name: &str, index: Index) -> Result<()> {
        let schema = self.schema(table_name)?;
        for column in index.columns() {
            let declared = schema.require_column(column)?;
            let Some((lo, hi)) = index.range_of(column) else {
                return Err(DatabaseError::schema(format!(
                    "Index '{}' has no range for column '{column}'",
                    index.name()
                )));
            };
            for bound in [lo, hi] {
                if !bound.is_compatible_with_type(&declared.data_type) {
                    return Err(DatabaseError::TypeMismatch {
                        column: column.clone(),
                        expected: declared.data_type.to_string(),
                        actual: bound.data_type().to_string(),
                    });
                }
            }
        }

        let mut schema = schema.clone();
        for column in schema.columns.iter_mut() {
            if index.columns().contains(&column.name) {
                column.index_name = Some(index.name().to_string());
                column.index_type = Some(RANGE_INDEX_TYPE.to_string());
            }
        }
        schema.validate()?;

        let mut table = self.store.deserialize_table(table_name)?;
        table.create_index(&self.store, index)?;
        self.store.serialize_table(&table)?;
        self.store.write_metadata(&schema)?;
        self.schema_manager.add_table_schema(schema);
        Ok(())
    }

    /// Remove an index. Columns it named in the metadata fall back to the
    /// most recent remaining index over them, or to none.
    pub fn drop_index(&mut self, table_name: &str, index_name: &str) -> Result<()> {
        let mut schema = self.schema(table_name)?.clone();
        let mut table = self.store.deserialize_table(table_name)?;
        table.drop_index(index_name)?;

        for column in schema.columns.iter_mut() {
            if column.index_name.as_deref() != Some(index_name) {
                continue;
            }
            let replacement = table
                .indices()
                .iter()
                .rev()
                .find(|index| index.columns().contains(&column.name));
            column.index_name = replacement.map(|index| index.name().to_string());
            column.index_type = replacement.map(|_| RANGE_INDEX_TYPE.to_string());
        }

        self.store.serialize_table(&table)?;
        self.store.write_metadata(&schema)?;
        self.schema_manager.add_table_schema(schema);
        Ok(())
    }

    /// Check the table's stored pages against its structural invariants.
    pub fn verify_table(&self, table_name: &str) -> Result<()> {
        self.table(table_name)?.verify_layout(&self.store)
    }
}
