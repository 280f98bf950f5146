//! A named column of cells.

use crate::model::{Cell, DataTable};
use crate::types::CellId;

/// Default name given to new blank series
pub const DEFAULT_SERIES_NAME: &str = "Untitled Series";

/// Head, tail and length of one cell chain.
///
/// The chain itself lives in the owning [`DataTable`] arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    pub(crate) name: String,
    pub(crate) head: Option<CellId>,
    pub(crate) tail: Option<CellId>,
    pub(crate) len: usize,
}

impl Series {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// First cell (the header cell, row 0)
    pub fn first(&self) -> Option<CellId> {
        self.head
    }

    pub fn last(&self) -> Option<CellId> {
        self.tail
    }

    /// Number of cells, header included
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Front-to-back traversal of a series
pub struct SeriesIter<'a> {
    table: &'a DataTable,
    next: Option<CellId>,
}

impl<'a> SeriesIter<'a> {
    pub(crate) fn new(table: &'a DataTable, head: Option<CellId>) -> Self {
        Self { table, next: head }
    }
}

impl<'a> Iterator for SeriesIter<'a> {
    type Item = (CellId, &'a Cell);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let cell = self.table.cell(id).ok()?;
        self.next = cell.next;
        Some((id, cell))
    }
}
