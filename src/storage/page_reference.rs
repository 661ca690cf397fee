use std::{cmp::Ordering, collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::{PageId, PageIndex, page::Page, value::Value};

/// Cached summary of a page: bounds, fill level and where it lives.
///
/// The table refreshes a reference from the page contents every time it
/// stores that page, so range lookups never need to load the page itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageReference {
    pub table_name: String,
    pub page_id: PageId,
    pub page_index: PageIndex,
    pub min_key: Option<Value>,
    pub max_key: Option<Value>,
    pub size: usize,
    pub capacity: usize,
    /// Per-column bounds for indexed columns.
    pub column_bounds: BTreeMap<String, (Value, Value)>,
}

impl PageReference {
    pub fn new(page: &Page) -> Self {
        Self {
            table_name: page.table_name.clone(),
            page_id: page.page_id,
            page_index: page.page_index,
            min_key: page.min_key().cloned(),
            max_key: page.max_key().cloned(),
            size: page.size(),
            capacity: page.capacity,
            column_bounds: BTreeMap::new(),
        }
    }

    /// Storage locator, relative to the data directory.
    pub fn locator(&self) -> PathBuf {
        page_locator(&self.table_name, self.page_id)
    }

    pub fn refresh<'a, I>(&mut self, page: &Page, indexed_columns: I)
    where
        I: IntoIterator<Item = &'a String>,
    {
        self.min_key = page.min_key().cloned();
        self.max_key = page.max_key().cloned();
        self.size = page.size();
        self.capacity = page.capacity;
        self.column_bounds = indexed_columns
            .into_iter()
            .filter_map(|column| {
                page.column_bounds(column)
                    .map(|bounds| (column.clone(), bounds))
            })
            .collect();
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn is_full(&self) -> bool {
        self.size >= self.capacity
    }

    pub fn is_overflow(&self) -> bool {
        self.size > self.capacity
    }

    pub fn empty_space(&self) -> usize {
        self.capacity.saturating_sub(self.size)
    }

    /// Position of `key` relative to this page's [min, max] range:
    /// `Less` when the page lies wholly below the key, `Greater` when above.
    pub fn cmp_range(&self, key: &Value) -> Ordering {
        let (Some(min), Some(max)) = (&self.min_key, &self.max_key) else {
            return Ordering::Greater;
        };
        if key.compare(min) == Some(Ordering::Less) {
            Ordering::Greater
        } else if key.compare(max) == Some(Ordering::Greater) {
            Ordering::Less
        } else {
            Ordering::Equal
        }
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.cmp_range(key) == Ordering::Equal
    }
}

pub fn page_locator(table_name: &str, page_id: PageId) -> PathBuf {
    PathBuf::from(table_name)
        .join("pages")
        .join(format!("{page_id}.page"))
}
