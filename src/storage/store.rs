use std::{
    cell::Cell,
    collections::HashMap,
    fs,
    io::ErrorKind as IoErrorKind,
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    storage::{page_reference::PageReference, schema::TableSchema, table::Table},
    types::{
        PageId,
        error::{DatabaseError, Result},
        page::Page,
    },
    utils::hash::{seal, unseal},
};

/// Page id used when sealing table objects, which have no page of their own.
const TABLE_OBJECT_ID: PageId = 0;

/// Persists pages and table objects.
///
/// Every page is a separately stored unit; nothing is cached between calls.
pub trait PageStore {
    fn serialize_page(&mut self, page: &Page) -> Result<()>;

    /// Load the page behind `reference`, stamped with the reference's
    /// current page index.
    fn deserialize_page(&self, table_name: &str, reference: &PageReference) -> Result<Page>;

    fn remove_page(&mut self, table_name: &str, reference: &PageReference) -> Result<()>;

    fn serialize_table(&mut self, table: &Table) -> Result<()>;

    fn deserialize_table(&self, table_name: &str) -> Result<Table>;

    fn table_exists(&self, table_name: &str) -> bool;
}

/// Persists per-table column metadata.
pub trait MetadataStore {
    fn write_metadata(&mut self, schema: &TableSchema) -> Result<()>;

    fn read_metadata(&self, table_name: &str) -> Result<TableSchema>;

    fn list_tables(&self) -> Result<Vec<String>>;
}

/// Page and table I/O counters, handy for checking how much a query touched.
#[derive(Debug, Default)]
pub struct StoreStats {
    page_reads: Cell<usize>,
    page_writes: Cell<usize>,
}

impl StoreStats {
    pub fn page_reads(&self) -> usize {
        self.page_reads.get()
    }

    pub fn page_writes(&self) -> usize {
        self.page_writes.get()
    }

    pub fn reset(&self) {
        self.page_reads.set(0);
        self.page_writes.set(0);
    }

    fn record_read(&self) {
        self.page_reads.set(self.page_reads.get() + 1);
    }

    fn record_write(&self) {
        self.page_writes.set(self.page_writes.get() + 1);
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(bincode::serde::encode_to_vec(value, bincode::config::standard())?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let (value, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
    Ok(value)
}

fn decode_page(bytes: &[u8], reference: &PageReference) -> Result<Page> {
    let mut page: Page = decode(unseal(bytes, reference.page_id)?)?;
    if page.page_id != reference.page_id {
        return Err(DatabaseError::CorruptedPage {
            page_id: reference.page_id,
            reason: format!("file holds page {}", page.page_id),
        });
    }
    page.page_index = reference.page_index;
    page.is_dirty = false;
    Ok(page)
}

/// File-per-page store rooted at a data directory.
#[derive(Debug)]
pub struct FileStore {
    data_dir: PathBuf,
    pub stats: StoreStats,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(data_dir.join("metadata"))?;
        Ok(Self {
            data_dir,
            stats: StoreStats::default(),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn table_path(&self, table_name: &str) -> PathBuf {
        self.data_dir
            .join(table_name)
            .join(format!("{table_name}.table"))
    }

    fn metadata_path(&self, table_name: &str) -> PathBuf {
        self.data_dir
            .join("metadata")
            .join(format!("{table_name}.csv"))
    }

    fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;
        Ok(())
    }
}

impl PageStore for FileStore {
    fn serialize_page(&mut self, page: &Page) -> Result<()> {
        let path = self.data_dir.join(PageReference::new(page).locator());
        Self::write_file(&path, &seal(&encode(page)?))?;
        self.stats.record_write();
        Ok(())
    }

    fn deserialize_page(&self, table_name: &str, reference: &PageReference) -> Result<Page> {
        let path = self.data_dir.join(reference.locator());
        let bytes = fs::read(&path).map_err(|err| match err.kind() {
            IoErrorKind::NotFound => DatabaseError::PageNotFound {
                table: table_name.to_string(),
                page_id: reference.page_id,
            },
            _ => DatabaseError::Io(err),
        })?;
        self.stats.record_read();
        decode_page(&bytes, reference)
    }

    fn remove_page(&mut self, table_name: &str, reference: &PageReference) -> Result<()> {
        match fs::remove_file(self.data_dir.join(reference.locator())) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == IoErrorKind::NotFound => Err(DatabaseError::PageNotFound {
                table: table_name.to_string(),
                page_id: reference.page_id,
            }),
            Err(err) => Err(err.into()),
        }
    }

    fn serialize_table(&mut self, table: &Table) -> Result<()> {
        let path = self.table_path(table.name());
        Self::write_file(&path, &seal(&encode(table)?))
    }

    fn deserialize_table(&self, table_name: &str) -> Result<Table> {
        let bytes = fs::read(self.table_path(table_name)).map_err(|err| match err.kind() {
            IoErrorKind::NotFound => DatabaseError::TableNotFound {
                name: table_name.to_string(),
            },
            _ => DatabaseError::Io(err),
        })?;
        decode(unseal(&bytes, TABLE_OBJECT_ID)?)
    }

    fn table_exists(&self, table_name: &str) -> bool {
        self.table_path(table_name).exists()
    }
}

impl MetadataStore for FileStore {
    fn write_metadata(&mut self, schema: &TableSchema) -> Result<()> {
        Self::write_file(&self.metadata_path(&schema.table_name), schema.to_csv().as_bytes())
    }

    fn read_metadata(&self, table_name: &str) -> Result<TableSchema> {
        let contents =
            fs::read_to_string(self.metadata_path(table_name)).map_err(|err| match err.kind() {
                IoErrorKind::NotFound => DatabaseError::TableNotFound {
                    name: table_name.to_string(),
                },
                _ => DatabaseError::Io(err),
            })?;
        TableSchema::from_csv(&contents)
    }

    fn list_tables(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.data_dir.join("metadata"))? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

/// In-process store. Pages are still encoded so loads hand out fresh copies.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pages: HashMap<(String, PageId), Vec<u8>>,
    tables: HashMap<String, Vec<u8>>,
    metadata: HashMap<String, String>,
    pub stats: StoreStats,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored_page_count(&self, table_name: &str) -> usize {
        self.pages.keys().filter(|(table, _)| table == table_name).count()
    }
}

impl PageStore for MemoryStore {
    fn serialize_page(&mut self, page: &Page) -> Result<()> {
        let bytes = seal(&encode(page)?);
        self.pages
            .insert((page.table_name.clone(), page.page_id), bytes);
        self.stats.record_write();
        Ok(())
    }

    fn deserialize_page(&self, table_name: &str, reference: &PageReference) -> Result<Page> {
        let bytes = self
            .pages
            .get(&(table_name.to_string(), reference.page_id))
            .ok_or_else(|| DatabaseError::PageNotFound {
                table: table_name.to_string(),
                page_id: reference.page_id,
            })?;
        self.stats.record_read();
        decode_page(bytes, reference)
    }

    fn remove_page(&mut self, table_name: &str, reference: &PageReference) -> Result<()> {
        self.pages
            .remove(&(table_name.to_string(), reference.page_id))
            .map(|_| ())
            .ok_or_else(|| DatabaseError::PageNotFound {
                table: table_name.to_string(),
                page_id: reference.page_id,
            })
    }

    fn serialize_table(&mut self, table: &Table) -> Result<()> {
        let bytes = seal(&encode(table)?);
        self.tables.insert(table.name().to_string(), bytes);
        Ok(())
    }

    fn deserialize_table(&self, table_name: &str) -> Result<Table> {
        let bytes = self
            .tables
            .get(table_name)
            .ok_or_else(|| DatabaseError::TableNotFound {
                name: table_name.to_string(),
            })?;
        decode(unseal(bytes, TABLE_OBJECT_ID)?)
    }

    fn table_exists(&self, table_name: &str) -> bool {
        self.tables.contains_key(table_name)
    }
}

impl MetadataStore for MemoryStore {
    fn write_metadata(&mut self, schema: &TableSchema) -> Result<()> {
        self.metadata
            .insert(schema.table_name.clone(), schema.to_csv());
        Ok(())
    }

    fn read_metadata(&self, table_name: &str) -> Result<TableSchema> {
        let contents = self
            .metadata
            .get(table_name)
            .ok_or_else(|| DatabaseError::TableNotFound {
                name: table_name.to_string(),
            })?;
        TableSchema::from_csv(contents)
    }

    fn list_tables(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.metadata.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}
