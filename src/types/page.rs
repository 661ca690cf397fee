use serde::{Deserialize, Serialize};

use crate::types::{
    PageId, PageIndex,
    error::{DatabaseError, Result},
    tuple::{Record, Tuple},
    value::Value,
};

/*
 * A page is a bounded run of tuples kept sorted by clustering key.
 *
 *   page_index 0          page_index 1          page_index 2
 * ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────┐
 * │ k1 ≤ k2 ≤ ... kC │  │ kC+1 ≤ ...       │  │ ...              │
 * └──────────────────┘  └──────────────────┘  └──────────────────┘
 *
 * `page_id` names the storage unit and never changes; `page_index` is the
 * page's current rank inside its table and is reassigned after compaction.
 * A page may temporarily hold capacity + 1 tuples between an insert and the
 * rebalancing that follows it.
 */

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub page_id: PageId,
    pub page_index: PageIndex,
    pub table_name: String,
    pub capacity: usize,
    tuples: Vec<Tuple>,
    #[serde(skip)]
    pub is_dirty: bool,
}

impl Page {
    pub fn new(
        table_name: impl Into<String>,
        page_id: PageId,
        page_index: PageIndex,
        capacity: usize,
    ) -> Self {
        Self {
            page_id,
            page_index,
            table_name: table_name.into(),
            capacity,
            tuples: Vec::with_capacity(capacity + 1),
            is_dirty: false,
        }
    }

    pub fn size(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.tuples.len() >= self.capacity
    }

    pub fn is_overflow(&self) -> bool {
        self.tuples.len() > self.capacity
    }

    pub fn empty_space(&self) -> usize {
        self.capacity.saturating_sub(self.tuples.len())
    }

    pub fn tuples(&self) -> &[Tuple] {
        &self.tuples
    }

    pub fn into_tuples(self) -> Vec<Tuple> {
        self.tuples
    }

    pub fn get_tuple(&self, slot: usize) -> Option<&Tuple> {
        self.tuples.get(slot)
    }

    pub fn min_key(&self) -> Option<&Value> {
        self.tuples.first().map(Tuple::cluster_key_value)
    }

    pub fn max_key(&self) -> Option<&Value> {
        self.tuples.last().map(Tuple::cluster_key_value)
    }

    /// Slot holding `key`, or the slot it would be inserted at.
    pub fn search(&self, key: &Value) -> std::result::Result<usize, usize> {
        self.tuples.binary_search_by(|tuple| tuple.cmp_key(key))
    }

    pub fn find_tuple(&self, key: &Value) -> Option<&Tuple> {
        self.search(key).ok().map(|slot| &self.tuples[slot])
    }

    /// Insert in sorted position. Capacity is not enforced here; overflow is
    /// resolved by the table's rebalancing.
    pub fn insert_tuple(&mut self, tuple: Tuple) -> Result<usize> {
        match self.search(tuple.cluster_key_value()) {
            Ok(_) => Err(DatabaseError::DuplicateKey {
                table: self.table_name.clone(),
                key: tuple.cluster_key_value().to_string(),
            }),
            Err(slot) => {
                self.tuples.insert(slot, tuple);
                self.is_dirty = true;
                Ok(slot)
            }
        }
    }

    pub fn delete_tuple(&mut self, key: &Value) -> Option<Tuple> {
        let slot = self.search(key).ok()?;
        self.is_dirty = true;
        Some(self.tuples.remove(slot))
    }

    /// Remove every tuple matching all criteria and return them.
    pub fn delete_matching(&mut self, criteria: &Record) -> Vec<Tuple> {
        let (removed, kept): (Vec<Tuple>, Vec<Tuple>) = std::mem::take(&mut self.tuples)
            .into_iter()
            .partition(|tuple| tuple.matches_all(criteria));
        self.tuples = kept;
        if !removed.is_empty() {
            self.is_dirty = true;
        }
        removed
    }

    pub fn update_tuple(&mut self, key: &Value, changes: &Record) -> Result<()> {
        let slot = self
            .search(key)
            .map_err(|_| DatabaseError::TupleNotFound {
                table: self.table_name.clone(),
                key: key.to_string(),
            })?;
        let tuple = &mut self.tuples[slot];
        for (column, value) in changes {
            tuple.set_value(column, value.clone()).map_err(|err| match err {
                DatabaseError::ColumnNotFound { name, .. } => DatabaseError::ColumnNotFound {
                    name,
                    table: self.table_name.clone(),
                },
                other => other,
            })?;
        }
        self.is_dirty = true;
        Ok(())
    }

    pub fn pop_max_tuple(&mut self) -> Option<Tuple> {
        let tuple = self.tuples.pop()?;
        self.is_dirty = true;
        Some(tuple)
    }

    pub fn pop_min_tuple(&mut self) -> Option<Tuple> {
        if self.tuples.is_empty() {
            return None;
        }
        self.is_dirty = true;
        Some(self.tuples.remove(0))
    }

    /// Move up to `count` tuples into `target`, taking from the end that keeps
    /// both pages in clustering order: the largest keys when `target` lies to
    /// the right, the smallest when it lies to the left.
    pub fn shift_tuples_to(&mut self, target: &mut Page, count: usize) -> Result<usize> {
        let mut moved = 0;
        while moved < count {
            let tuple = if target.page_index > self.page_index {
                self.pop_max_tuple()
            } else {
                self.pop_min_tuple()
            };
            let Some(tuple) = tuple else { break };
            target.insert_tuple(tuple)?;
            moved += 1;
        }
        Ok(moved)
    }

    /// Smallest and largest value of `column` among the page's tuples.
    pub fn column_bounds(&self, column: &str) -> Option<(Value, Value)> {
        let mut values = self.tuples.iter().filter_map(|t| t.get_value(column));
        let first = values.next()?;
        let (mut lo, mut hi) = (first, first);
        for value in values {
            if value.compare(lo) == Some(std::cmp::Ordering::Less) {
                lo = value;
            }
            if value.compare(hi) == Some(std::cmp::Ordering::Greater) {
                hi = value;
            }
        }
        Some((lo.clone(), hi.clone()))
    }
}
