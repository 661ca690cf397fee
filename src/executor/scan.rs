use std::collections::VecDeque;

use crate::{
    storage::{store::PageStore, table::Table},
    types::{PageIndex, error::Result, tuple::Tuple},
};

pub trait Scanner {
    fn scan(&mut self) -> Result<Option<Tuple>>;
    fn scan_batch(&mut self, batch_size: usize) -> Result<Vec<Tuple>>;
    fn reset(&mut self) -> Result<()>;
}

/// Walks a table's pages in index order, holding one page in memory at a time.
pub struct TableScanner<'a, S: PageStore + ?Sized> {
    table: &'a Table,
    store: &'a S,
    pages: Vec<PageIndex>,
    next_page: usize,
    buffer: VecDeque<Tuple>,
}

impl<'a, S: PageStore + ?Sized> TableScanner<'a, S> {
    pub fn new(table: &'a Table, store: &'a S) -> Self {
        Self::with_pages(table, store, 0..table.page_count())
    }

    /// Scan only `pages`, visited in the order given.
    pub fn with_pages<I>(table: &'a Table, store: &'a S, pages: I) -> Self
    where
        I: IntoIterator<Item = PageIndex>,
    {
        Self {
            table,
            store,
            pages: pages.into_iter().collect(),
            next_page: 0,
            buffer: VecDeque::new(),
        }
    }

    pub fn pages_visited(&self) -> usize {
        self.next_page
    }

    fn load_next_page(&mut self) -> Result<bool> {
        let Some(&page_index) = self.pages.get(self.next_page) else {
            return Ok(false);
        };
        self.next_page += 1;
        let page = self.table.load_page(self.store, page_index)?;
        self.buffer.extend(page.into_tuples());
        Ok(true)
    }
}

impl<S: PageStore + ?Sized> Scanner for TableScanner<'_, S> {
    fn scan(&mut self) -> Result<Option<Tuple>> {
        while self.buffer.is_empty() {
            if !self.load_next_page()? {
                return Ok(None);
            }
        }
        Ok(self.buffer.pop_front())
    }

    fn scan_batch(&mut self, batch_size: usize) -> Result<Vec<Tuple>> {
        let mut batch = Vec::with_capacity(batch_size);
        while batch.len() < batch_size {
            match self.scan()? {
                Some(tuple) => batch.push(tuple),
                None => break,
            }
        }
        Ok(batch)
    }

    fn reset(&mut self) -> Result<()> {
        self.next_page = 0;
        self.buffer.clear();
        Ok(())
    }
}

pub struct ScanIterator<S: Scanner> {
    scanner: S,
}

impl<S: Scanner> ScanIterator<S> {
    pub fn new(scanner: S) -> Self {
        Self { scanner }
    }
}

impl<S: Scanner> Iterator for ScanIterator<S> {
    type Item = Result<Tuple>;

    fn next(&mut self) -> Option<Self::Item> {
        self.scanner.scan().transpose()
    }
}
