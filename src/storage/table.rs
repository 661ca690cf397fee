use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    executor::{
        predicate::Predicate,
        scan::{Scanner, TableScanner},
    },
    storage::{
        index::{Index, combine_indices},
        page_reference::PageReference,
        store::PageStore,
    },
    types::{
        PageId, PageIndex,
        error::{DatabaseError, Result},
        page::Page,
        tuple::{Record, Tuple},
        value::Value,
    },
};

/// A clustered table: an ordered run of pages plus secondary indices.
///
/// Invariants kept by every public mutation:
/// - for pages i < j every key in page i is below every key in page j;
/// - page indices are exactly `0..page_count`, none of them empty;
/// - `size` equals the sum of page sizes;
/// - no page but the last has spare room while its right neighbour holds tuples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    name: String,
    cluster_key: String,
    capacity: usize,
    size: usize,
    next_page_id: PageId,
    page_references: Vec<PageReference>,
    indices: Vec<Index>,
}

impl Table {
    pub fn new(name: impl Into<String>, cluster_key: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            cluster_key: cluster_key.into(),
            capacity,
            size: 0,
            next_page_id: 1,
            page_references: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cluster_key_name(&self) -> &str {
        &self.cluster_key
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of tuples in the table.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn page_count(&self) -> usize {
        self.page_references.len()
    }

    pub fn page_references(&self) -> &[PageReference] {
        &self.page_references
    }

    pub fn page_reference(&self, page_index: PageIndex) -> Result<&PageReference> {
        self.page_references
            .get(page_index)
            .ok_or_else(|| DatabaseError::PageNotFound {
                table: self.name.clone(),
                page_id: page_index as PageId,
            })
    }

    pub fn indices(&self) -> &[Index] {
        &self.indices
    }

    pub fn get_index(&self, name: &str) -> Option<&Index> {
        self.indices.iter().find(|index| index.name() == name)
    }

    /// Density check across the whole table, not a single page.
    pub fn is_full(&self) -> bool {
        self.size >= self.capacity * self.page_count()
    }

    pub(crate) fn load_page<S: PageStore + ?Sized>(
        &self,
        store: &S,
        page_index: PageIndex,
    ) -> Result<Page> {
        let reference = self.page_reference(page_index)?;
        store.deserialize_page(&self.name, reference)
    }

    fn indexed_columns(&self) -> BTreeSet<String> {
        self.indices
            .iter()
            .flat_map(|index| index.columns().iter().cloned())
            .collect()
    }

    fn refresh_reference(&mut self, page: &Page) {
        let columns = self.indexed_columns();
        if let Some(reference) = self.page_references.get_mut(page.page_index) {
            reference.refresh(page, &columns);
        }
    }

    fn refresh_indices(&mut self) {
        for index in &mut self.indices {
            index.refresh(&self.page_references);
        }
    }

    /// Persist a page and bring its reference up to date.
    fn store_page<S: PageStore + ?Sized>(&mut self, store: &mut S, page: &Page) -> Result<()> {
        store.serialize_page(page)?;
        self.refresh_reference(page);
        Ok(())
    }

    fn add_page<S: PageStore + ?Sized>(&mut self, store: &mut S) -> Result<()> {
        let page = Page::new(
            self.name.clone(),
            self.next_page_id,
            self.page_count(),
            self.capacity,
        );
        store.serialize_page(&page)?;
        self.next_page_id += 1;
        self.page_references.push(PageReference::new(&page));
        tracing::debug!(table = %self.name, page_id = page.page_id, "added page");
        Ok(())
    }

    fn drop_last_page<S: PageStore + ?Sized>(&mut self, store: &mut S) -> Result<()> {
        if let Some(reference) = self.page_references.pop() {
            store.remove_page(&self.name, &reference)?;
            self.next_page_id -= 1;
        }
        Ok(())
    }

    /// Binary search over the non-empty pages: `Ok(i)` when `key` falls
    /// inside page i's [min, max], otherwise `Err(i)` with i the first page
    /// whose min exceeds `key`.
    pub fn locate_page(&self, key: &Value) -> std::result::Result<PageIndex, PageIndex> {
        let filled = self
            .page_references
            .iter()
            .take_while(|reference| !reference.is_empty())
            .count();
        self.page_references[..filled].binary_search_by(|reference| reference.cmp_range(key))
    }

    fn insertion_page_index(&self, key: &Value) -> PageIndex {
        match self.locate_page(key) {
            Ok(page_index) => page_index,
            Err(page_index) => page_index.min(self.page_count().saturating_sub(1)),
        }
    }

    pub fn insert_tuple<S: PageStore + ?Sized>(&mut self, store: &mut S, tuple: Tuple) -> Result<()> {
        if tuple.cluster_key_name() != self.cluster_key {
            return Err(DatabaseError::schema(format!(
                "Tuple is clustered on '{}' but table '{}' uses '{}'",
                tuple.cluster_key_name(),
                self.name,
                self.cluster_key
            )));
        }

        let added = self.page_count() == 0 || self.is_full();
        if added {
            self.add_page(store)?;
        }

        let page_index = self.insertion_page_index(tuple.cluster_key_value());
        let mut page = self.load_page(store, page_index)?;
        if let Err(err) = page.insert_tuple(tuple) {
            if added {
                self.drop_last_page(store)?;
            }
            return Err(err);
        }
        self.store_page(store, &page)?;
        self.size += 1;

        self.rebalance(store)?;
        self.refresh_indices();
        Ok(())
    }

    /// Delete every tuple whose columns equal all of `criteria`. An empty
    /// criteria map matches every tuple. Returns the number deleted.
    pub fn delete_tuples<S: PageStore + ?Sized>(
        &mut self,
        store: &mut S,
        criteria: &Record,
    ) -> Result<usize> {
        let key = criteria.get(&self.cluster_key).cloned();
        let mut deleted = 0;
        for page_index in 0..self.page_count() {
            if let Some(key) = &key {
                if !self.page_references[page_index].contains_key(key) {
                    continue;
                }
            }
            let mut page = self.load_page(store, page_index)?;
            let removed = page.delete_matching(criteria);
            if removed.is_empty() {
                continue;
            }
            deleted += removed.len();
            self.size -= removed.len();
            self.store_page(store, &page)?;
        }

        if deleted > 0 {
            self.rebalance(store)?;
            self.refresh_indices();
        }
        tracing::debug!(table = %self.name, deleted, "delete finished");
        Ok(deleted)
    }

    /// Change non-key columns of the tuple with clustering key `key`.
    pub fn update_tuple<S: PageStore + ?Sized>(
        &mut self,
        store: &mut S,
        key: &Value,
        changes: &Record,
    ) -> Result<()> {
        if changes.contains_key(&self.cluster_key) {
            return Err(DatabaseError::query(format!(
                "Cannot update clustering key column '{}'",
                self.cluster_key
            )));
        }
        let not_found = || DatabaseError::TupleNotFound {
            table: self.name.clone(),
            key: key.to_string(),
        };
        let page_index = self.locate_page(key).map_err(|_| not_found())?;
        let mut page = self.load_page(store, page_index)?;
        if page.find_tuple(key).is_none() {
            return Err(not_found());
        }
        page.update_tuple(key, changes)?;
        self.store_page(store, &page)?;
        self.refresh_indices();
        Ok(())
    }

    /// Restore clustering order and density after a mutation.
    ///
    /// Each round is a distribution pass over adjacent pairs followed by
    /// compaction of empty pages. A single round always suffices after an
    /// insert; a delete that empties pages in the middle of the table can
    /// need more, so rounds repeat until the layout is dense.
    fn rebalance<S: PageStore + ?Sized>(&mut self, store: &mut S) -> Result<()> {
        let mut round = 0;
        loop {
            round += 1;
            let moved = self.distribute_pages(store)?;
            self.remove_empty_pages(store)?;
            if self.is_dense() {
                break;
            }
            if !moved {
                tracing::warn!(table = %self.name, round, "rebalancing made no progress");
                break;
            }
        }
        tracing::debug!(table = %self.name, rounds = round, pages = self.page_count(), "rebalanced");
        Ok(())
    }

    fn distribute_pages<S: PageStore + ?Sized>(&mut self, store: &mut S) -> Result<bool> {
        let mut moved = false;
        for page_index in 0..self.page_count().saturating_sub(1) {
            let next_index = page_index + 1;
            if self.page_references[page_index].is_overflow() {
                self.shift_tuples(store, page_index, next_index, 1)?;
                moved = true;
            }
            let current = &self.page_references[page_index];
            if !current.is_full() && !self.page_references[next_index].is_empty() {
                let wanted = current.empty_space();
                self.shift_tuples(store, next_index, page_index, wanted)?;
                moved = true;
            }
        }
        Ok(moved)
    }

    fn shift_tuples<S: PageStore + ?Sized>(
        &mut self,
        store: &mut S,
        from: PageIndex,
        to: PageIndex,
        count: usize,
    ) -> Result<()> {
        let mut source = self.load_page(store, from)?;
        let mut target = self.load_page(store, to)?;
        let moved = source.shift_tuples_to(&mut target, count)?;
        self.store_page(store, &source)?;
        self.store_page(store, &target)?;
        tracing::debug!(table = %self.name, from, to, moved, "shifted tuples");
        Ok(())
    }

    fn remove_empty_pages<S: PageStore + ?Sized>(&mut self, store: &mut S) -> Result<()> {
        let (empty, kept): (Vec<PageReference>, Vec<PageReference>) =
            std::mem::take(&mut self.page_references)
                .into_iter()
                .partition(PageReference::is_empty);
        self.page_references = kept;
        for (position, reference) in self.page_references.iter_mut().enumerate() {
            reference.page_index = position;
        }
        for reference in &empty {
            store.remove_page(&self.name, reference)?;
            tracing::debug!(table = %self.name, page_id = reference.page_id, "removed empty page");
        }
        Ok(())
    }

    fn is_dense(&self) -> bool {
        self.page_references
            .iter()
            .all(|reference| !reference.is_overflow())
            && self
                .page_references
                .windows(2)
                .all(|pair| pair[0].is_full() || pair[1].is_empty())
    }

    /// Register a range index and compute its page bounds from the pages
    /// already stored.
    pub fn create_index<S: PageStore + ?Sized>(&mut self, store: &S, index: Index) -> Result<()> {
        if self.get_index(index.name()).is_some() {
            return Err(DatabaseError::IndexAlreadyExists {
                name: index.name().to_string(),
                table: self.name.clone(),
            });
        }
        tracing::info!(table = %self.name, index = index.name(), columns = ?index.columns(), "creating index");
        self.indices.push(index);

        let columns = self.indexed_columns();
        for page_index in 0..self.page_count() {
            let page = self.load_page(store, page_index)?;
            self.page_references[page_index].refresh(&page, &columns);
        }
        self.refresh_indices();
        Ok(())
    }

    /// Unregister an index. Per-page bounds of columns no other index
    /// covers are discarded.
    pub fn drop_index(&mut self, name: &str) -> Result<Index> {
        let position = self
            .indices
            .iter()
            .position(|index| index.name() == name)
            .ok_or_else(|| DatabaseError::IndexNotFound {
                name: name.to_string(),
                table: self.name.clone(),
            })?;
        let index = self.indices.remove(position);

        let columns = self.indexed_columns();
        for reference in &mut self.page_references {
            reference.column_bounds.retain(|column, _| columns.contains(column));
        }
        tracing::info!(table = %self.name, index = name, "dropped index");
        Ok(index)
    }

    /// Indices whose column set contains every one of `columns`.
    pub fn get_relevant_indices<S: AsRef<str>>(&self, columns: &[S]) -> Vec<&Index> {
        self.indices
            .iter()
            .filter(|index| index.covers_columns(columns))
            .collect()
    }

    /// Combine the indices relevant to `columns`, if at least two exist.
    pub fn get_combined_index<S: AsRef<str>>(&self, columns: &[S]) -> Option<Index> {
        combine_indices(&self.get_relevant_indices(columns))
    }

    pub fn scanner<'a, S: PageStore + ?Sized>(&'a self, store: &'a S) -> TableScanner<'a, S> {
        TableScanner::new(self, store)
    }

    /// Full scan: every tuple of every page tested against `predicate`.
    pub fn select_tuples<S: PageStore + ?Sized>(
        &self,
        store: &S,
        predicate: &Predicate,
    ) -> Result<Vec<Tuple>> {
        filter_scan(self.scanner(store), predicate)
    }

    /// Prune pages through a combined index when one can be built for the
    /// predicate's columns, otherwise fall back to the full scan.
    pub fn select_tuples_with_index<S: PageStore + ?Sized>(
        &self,
        store: &S,
        predicate: &Predicate,
    ) -> Result<Vec<Tuple>> {
        let columns = predicate.columns();
        match self.get_combined_index(columns.as_slice()) {
            Some(index) => self.select_tuples_using_index(store, &index, predicate),
            None => self.select_tuples(store, predicate),
        }
    }

    /// Scan only the candidate pages of `index`, re-checking the full predicate.
    pub fn select_tuples_using_index<S: PageStore + ?Sized>(
        &self,
        store: &S,
        index: &Index,
        predicate: &Predicate,
    ) -> Result<Vec<Tuple>> {
        if index.page_count() != self.page_count() {
            tracing::debug!(table = %self.name, index = index.name(), "stale index, scanning all pages");
            return self.select_tuples(store, predicate);
        }
        let candidates = index.candidate_pages(predicate);
        tracing::debug!(
            table = %self.name,
            index = index.name(),
            candidates = candidates.len(),
            pages = self.page_count(),
            "index scan"
        );
        filter_scan(TableScanner::with_pages(self, store, candidates), predicate)
    }

    /// Check every structural invariant against the stored pages.
    pub fn verify_layout<S: PageStore + ?Sized>(&self, store: &S) -> Result<()> {
        let corrupted = |page_id: PageId, reason: String| DatabaseError::CorruptedPage {
            page_id,
            reason,
        };
        let mut total = 0;
        let mut previous_max: Option<Value> = None;
        for (position, reference) in self.page_references.iter().enumerate() {
            if reference.page_index != position {
                return Err(corrupted(
                    reference.page_id,
                    format!("index {} at position {position}", reference.page_index),
                ));
            }
            let page = self.load_page(store, position)?;
            if page.is_empty() || page.is_overflow() {
                return Err(corrupted(page.page_id, format!("holds {} tuples", page.size())));
            }
            if page.min_key() != reference.min_key.as_ref()
                || page.max_key() != reference.max_key.as_ref()
            {
                return Err(corrupted(page.page_id, "stale page reference".to_string()));
            }
            if let (Some(prev), Some(min)) = (&previous_max, page.min_key()) {
                if prev.compare(min).is_some_and(|o| o.is_gt()) {
                    return Err(corrupted(page.page_id, "out of clustering order".to_string()));
                }
            }
            previous_max = page.max_key().cloned();
            total += page.size();
        }
        if total != self.size {
            return Err(corrupted(0, format!("counter {} but pages hold {total}", self.size)));
        }
        if !self.is_dense() {
            return Err(corrupted(0, "pages are not densely packed".to_string()));
        }
        Ok(())
    }
}

fn filter_scan<S: Scanner>(mut scanner: S, predicate: &Predicate) -> Result<Vec<Tuple>> {
    let mut tuples = Vec::new();
    while let Some(tuple) = scanner.scan()? {
        if predicate.evaluate(&tuple)? {
            tuples.push(tuple);
        }
    }
    Ok(tuples)
}
