//! A single text cell, one node of a series chain.

use crate::error::Result;
use crate::types::{CellId, NumberLocale, SeriesId};

/// One text value in a series, linked to its neighbours by handle.
///
/// A cell created with [`DataTable::new_cell`](crate::model::DataTable::new_cell)
/// starts detached: no series, no neighbours, and no index.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub(crate) value: String,
    pub(crate) index: Option<usize>,
    pub(crate) series: Option<SeriesId>,
    pub(crate) previous: Option<CellId>,
    pub(crate) next: Option<CellId>,
}

impl Cell {
    pub(crate) fn new(value: String) -> Self {
        Self {
            value,
            index: None,
            series: None,
            previous: None,
            next: None,
        }
    }

    /// The text value
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Position in the owning series, or `None` while detached
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// The owning series
    pub fn series(&self) -> Option<SeriesId> {
        self.series
    }

    pub fn previous(&self) -> Option<CellId> {
        self.previous
    }

    pub fn next(&self) -> Option<CellId> {
        self.next
    }

    /// Whether the cell is linked into a series
    pub fn is_attached(&self) -> bool {
        self.series.is_some()
    }

    /// Read the value as a number.
    ///
    /// Text with no leading number is an error; sorting treats it as 0.
    pub fn numeric(&self, locale: &NumberLocale) -> Result<f64> {
        locale.parse(&self.value)
    }

    /// Reset to the detached state, keeping only the value
    pub(crate) fn detach(&mut self) {
        self.index = None;
        self.series = None;
        self.previous = None;
        self.next = None;
    }
}
