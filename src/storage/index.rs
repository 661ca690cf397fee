use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
    executor::predicate::Predicate,
    storage::page_reference::PageReference,
    types::{
        PageIndex,
        error::{DatabaseError, Result},
        value::Value,
    },
};

pub const RANGE_INDEX_TYPE: &str = "Range";

/// Secondary range index over one or more columns.
///
/// For every page whose indexed values all fall inside the declared
/// [min, max] ranges the index records that page's per-column bounds.
/// Pages with values outside the declared ranges are uncovered and are
/// always kept as candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    name: String,
    columns: Vec<String>,
    min: BTreeMap<String, Value>,
    max: BTreeMap<String, Value>,
    page_count: usize,
    entries: BTreeMap<PageIndex, BTreeMap<String, (Value, Value)>>,
}

impl Index {
    pub fn new(
        name: impl Into<String>,
        columns: Vec<String>,
        min: BTreeMap<String, Value>,
        max: BTreeMap<String, Value>,
    ) -> Result<Self> {
        let name = name.into();
        if columns.is_empty() {
            return Err(DatabaseError::schema(format!(
                "Index '{name}' must cover at least one column"
            )));
        }
        for column in &columns {
            let (Some(lo), Some(hi)) = (min.get(column), max.get(column)) else {
                return Err(DatabaseError::schema(format!(
                    "Index '{name}' has no range for column '{column}'"
                )));
            };
            match lo.compare(hi) {
                Some(order) if order.is_le() => {}
                Some(_) => {
                    return Err(DatabaseError::schema(format!(
                        "Index '{name}' has min > max for column '{column}'"
                    )));
                }
                None => {
                    return Err(DatabaseError::schema(format!(
                        "Index '{name}' has bounds of different types for column '{column}'"
                    )));
                }
            }
        }
        Ok(Self {
            name,
            columns,
            min,
            max,
            page_count: 0,
            entries: BTreeMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Declared lower bound per indexed column.
    pub fn min(&self) -> &BTreeMap<String, Value> {
        &self.min
    }

    /// Declared upper bound per indexed column.
    pub fn max(&self) -> &BTreeMap<String, Value> {
        &self.max
    }

    /// Declared [min, max] of one indexed column.
    pub fn range_of(&self, column: &str) -> Option<(&Value, &Value)> {
        Some((self.min.get(column)?, self.max.get(column)?))
    }

    pub fn column_set(&self) -> BTreeSet<&str> {
        self.columns.iter().map(String::as_str).collect()
    }

    pub fn covers_columns<S: AsRef<str>>(&self, columns: &[S]) -> bool {
        columns
            .iter()
            .all(|c| self.columns.iter().any(|own| own == c.as_ref()))
    }

    fn in_range(&self, column: &str, bounds: &(Value, Value)) -> bool {
        let (Some(lo), Some(hi)) = (self.min.get(column), self.max.get(column)) else {
            return false;
        };
        bounds.0.compare(lo).is_some_and(|o| o.is_ge())
            && bounds.1.compare(hi).is_some_and(|o| o.is_le())
    }

    /// Rebuild the page entries from the table's page references.
    pub fn refresh(&mut self, references: &[PageReference]) {
        self.page_count = references.len();
        self.entries.clear();
        for reference in references {
            let bounds: Option<BTreeMap<String, (Value, Value)>> = self
                .columns
                .iter()
                .map(|column| {
                    let bounds = reference.column_bounds.get(column)?;
                    self.in_range(column, bounds)
                        .then(|| (column.clone(), bounds.clone()))
                })
                .collect();
            if let Some(bounds) = bounds {
                self.entries.insert(reference.page_index, bounds);
            }
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn page_bounds(&self, page_index: PageIndex) -> Option<&BTreeMap<String, (Value, Value)>> {
        self.entries.get(&page_index)
    }

    /// Every page of the table that may hold a tuple satisfying `predicate`.
    pub fn candidate_pages(&self, predicate: &Predicate) -> BTreeSet<PageIndex> {
        (0..self.page_count)
            .filter(|page_index| match self.entries.get(page_index) {
                Some(bounds) => predicate.might_match(|column| bounds.get(column)),
                None => true,
            })
            .collect()
    }
}

/// Merge two or more indices into one synthetic index.
///
/// Columns are unioned. Declared ranges and per-page bounds are intersected
/// so the result is never looser than any source. Returns `None` for fewer
/// than two sources or when the sources describe different page layouts.
pub fn combine_indices(indices: &[&Index]) -> Option<Index> {
    if indices.len() < 2 {
        return None;
    }
    let page_count = indices[0].page_count;
    if indices.iter().any(|index| index.page_count != page_count) {
        return None;
    }

    let mut columns: Vec<String> = Vec::new();
    let mut min: BTreeMap<String, Value> = BTreeMap::new();
    let mut max: BTreeMap<String, Value> = BTreeMap::new();
    for index in indices {
        for column in &index.columns {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
            let Some((lo, hi)) = index.range_of(column) else {
                continue;
            };
            tighten(&mut min, column, lo, |o| o.is_gt());
            tighten(&mut max, column, hi, |o| o.is_lt());
        }
    }

    let mut entries: BTreeMap<PageIndex, BTreeMap<String, (Value, Value)>> = BTreeMap::new();
    for index in indices {
        for (page_index, bounds) in &index.entries {
            let merged = entries.entry(*page_index).or_default();
            for (column, (lo, hi)) in bounds {
                merged
                    .entry(column.clone())
                    .and_modify(|(cur_lo, cur_hi)| {
                        if lo.compare(cur_lo).is_some_and(|o| o.is_gt()) {
                            *cur_lo = lo.clone();
                        }
                        if hi.compare(cur_hi).is_some_and(|o| o.is_lt()) {
                            *cur_hi = hi.clone();
                        }
                    })
                    .or_insert_with(|| (lo.clone(), hi.clone()));
            }
        }
    }

    let name = indices
        .iter()
        .map(|index| index.name.as_str())
        .collect::<Vec<_>>()
        .join("+");
    Some(Index {
        name,
        columns,
        min,
        max,
        page_count,
        entries,
    })
}

fn tighten(
    bounds: &mut BTreeMap<String, Value>,
    column: &str,
    candidate: &Value,
    replaces: impl Fn(std::cmp::Ordering) -> bool,
) {
    match bounds.get_mut(column) {
        Some(current) => {
            if candidate.compare(current).is_some_and(&replaces) {
                *current = candidate.clone();
            }
        }
        None => {
            bounds.insert(column.to_string(), candidate.clone());
        }
    }
}
