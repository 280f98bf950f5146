//! The data table: every series and every cell of a project.
//!
//! Cells live in an arena of slots addressed by [`CellId`]. Each series is a
//! doubly-linked chain through that arena, with `previous`/`next` stored as
//! handles. Every cell also carries its 0-based position in the chain, so
//! structural edits renumber the cells behind the edit point (O(n)) while
//! lookups of a cell's row are O(1).

use std::collections::HashMap;

use crate::error::{Result, StoreError};
use crate::model::{Cell, Series, SeriesIter};
use crate::types::{CellId, NumberLocale, SeriesId};

/// One arena slot. The generation is bumped whenever the slot is freed.
#[derive(Debug)]
struct CellSlot {
    generation: u32,
    cell: Option<Cell>,
}

/// Columns of linked cells, in display order
#[derive(Debug, Default)]
pub struct DataTable {
    cells: Vec<CellSlot>,
    free_slots: Vec<usize>,
    series: HashMap<SeriesId, Series>,
    order: Vec<SeriesId>,
    next_series_id: u32,
}

impl DataTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    // ----- cells -----

    /// Allocate a detached cell
    pub fn new_cell(&mut self, value: impl Into<String>) -> CellId {
        let cell = Cell::new(value.into());

        if let Some(slot) = self.free_slots.pop() {
            let entry = &mut self.cells[slot];
            entry.cell = Some(cell);
            CellId::new(slot as u32, entry.generation)
        } else {
            let slot = self.cells.len();
            self.cells.push(CellSlot {
                generation: 0,
                cell: Some(cell),
            });
            CellId::new(slot as u32, 0)
        }
    }

    /// Look up a cell
    pub fn cell(&self, id: CellId) -> Result<&Cell> {
        self.cells
            .get(id.slot())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.cell.as_ref())
            .ok_or(StoreError::CellNotFound(id))
    }

    fn cell_mut(&mut self, id: CellId) -> Result<&mut Cell> {
        self.cells
            .get_mut(id.slot())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.cell.as_mut())
            .ok_or(StoreError::CellNotFound(id))
    }

    /// Replace a cell's text
    pub fn set_value(&mut self, id: CellId, value: impl Into<String>) -> Result<()> {
        self.cell_mut(id)?.value = value.into();
        Ok(())
    }

    /// Free a detached cell, returning its contents. The handle stops resolving.
    pub fn discard(&mut self, id: CellId) -> Result<Cell> {
        self.ensure_detached(id)?;

        let slot = &mut self.cells[id.slot()];
        let cell = slot.cell.take().ok_or(StoreError::CellNotFound(id))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_slots.push(id.slot());
        Ok(cell)
    }

    /// Number of live cells in the arena, attached or not
    pub fn cell_count(&self) -> usize {
        self.cells.len() - self.free_slots.len()
    }

    fn ensure_detached(&self, id: CellId) -> Result<()> {
        if self.cell(id)?.is_attached() {
            return Err(StoreError::invalid_operation(format!(
                "cell {} already belongs to a series",
                id
            )));
        }
        Ok(())
    }

    /// Series and index of an attached cell
    fn position(&self, id: CellId) -> Result<(SeriesId, usize)> {
        let cell = self.cell(id)?;
        match (cell.series, cell.index) {
            (Some(series), Some(index)) => Ok((series, index)),
            _ => Err(StoreError::CellNotAttached(id)),
        }
    }

    // ----- series -----

    /// Resolve a series handle. A removed series resolves to `None`.
    pub fn series(&self, id: SeriesId) -> Option<&Series> {
        self.series.get(&id)
    }

    fn series_ref(&self, id: SeriesId) -> Result<&Series> {
        self.series.get(&id).ok_or(StoreError::SeriesNotFound(id))
    }

    fn series_mut(&mut self, id: SeriesId) -> Result<&mut Series> {
        self.series.get_mut(&id).ok_or(StoreError::SeriesNotFound(id))
    }

    /// Series handles in column order
    pub fn series_ids(&self) -> &[SeriesId] {
        &self.order
    }

    pub fn series_count(&self) -> usize {
        self.order.len()
    }

    /// Column position of a series
    pub fn index_of(&self, id: SeriesId) -> Option<usize> {
        self.order.iter().position(|&s| s == id)
    }

    /// Series at a column position
    pub fn series_at(&self, position: usize) -> Option<SeriesId> {
        self.order.get(position).copied()
    }

    /// First series (in column order) with the given name
    pub fn series_by_name(&self, name: &str) -> Option<SeriesId> {
        self.order
            .iter()
            .copied()
            .find(|id| self.series.get(id).is_some_and(|s| s.name == name))
    }

    pub fn rename_series(&mut self, id: SeriesId, name: impl Into<String>) -> Result<()> {
        self.series_mut(id)?.name = name.into();
        Ok(())
    }

    /// Append a new series seeded with a single detached cell
    pub fn add_series(&mut self, name: impl Into<String>, seed: CellId) -> Result<SeriesId> {
        self.insert_series(self.order.len(), name, seed)
    }

    /// Insert a new series at a column position, seeded with a single detached cell
    pub fn insert_series(
        &mut self,
        position: usize,
        name: impl Into<String>,
        seed: CellId,
    ) -> Result<SeriesId> {
        if position > self.order.len() {
            return Err(StoreError::invalid_operation(format!(
                "series position {} out of bounds (count: {})",
                position,
                self.order.len()
            )));
        }
        self.ensure_detached(seed)?;

        let id = SeriesId::new(self.next_series_id);
        self.next_series_id += 1;

        {
            let cell = self.cell_mut(seed)?;
            cell.series = Some(id);
            cell.index = Some(0);
        }

        let mut series = Series::new(name.into());
        series.head = Some(seed);
        series.tail = Some(seed);
        series.len = 1;

        self.series.insert(id, series);
        self.order.insert(position, id);
        Ok(id)
    }

    /// Append a series holding `values` in order; the first value is the header cell
    pub fn add_series_from_values<I, S>(
        &mut self,
        name: impl Into<String>,
        values: I,
    ) -> Result<SeriesId>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut values = values.into_iter();
        let first = values
            .next()
            .ok_or_else(|| StoreError::invalid_operation("a series needs at least one cell"))?;

        let seed = self.new_cell(first);
        let id = self.add_series(name, seed)?;

        let mut last = seed;
        for value in values {
            let cell = self.new_cell(value);
            self.insert_after(last, cell)?;
            last = cell;
        }
        Ok(id)
    }

    /// Insert a series of `rows` empty cells at a column position
    pub fn insert_blank_series(
        &mut self,
        position: usize,
        name: impl Into<String>,
        rows: usize,
    ) -> Result<SeriesId> {
        let seed = self.new_cell("");
        let id = match self.insert_series(position, name, seed) {
            Ok(id) => id,
            Err(e) => {
                self.discard(seed)?;
                return Err(e);
            }
        };

        let mut last = seed;
        for _ in 1..rows.max(1) {
            let cell = self.new_cell("");
            self.insert_after(last, cell)?;
            last = cell;
        }
        Ok(id)
    }

    /// Remove a series and free all of its cells
    pub fn remove_series(&mut self, id: SeriesId) -> Result<Series> {
        let position = self.index_of(id).ok_or(StoreError::SeriesNotFound(id))?;
        let series = self.series.remove(&id).ok_or(StoreError::SeriesNotFound(id))?;
        self.order.remove(position);

        let mut cursor = series.head;
        while let Some(cell_id) = cursor {
            let cell = self.cell_mut(cell_id)?;
            cursor = cell.next;
            cell.detach();
            self.discard(cell_id)?;
        }

        Ok(series)
    }

    /// Traverse a series front to back
    pub fn iter(&self, id: SeriesId) -> Result<SeriesIter<'_>> {
        let series = self.series_ref(id)?;
        Ok(SeriesIter::new(self, series.head))
    }

    /// All values of a series, header first
    pub fn values(&self, id: SeriesId) -> Result<Vec<String>> {
        Ok(self.iter(id)?.map(|(_, cell)| cell.value.clone()).collect())
    }

    /// Cell at `index` in a series, by walking the chain
    pub fn cell_at(&self, id: SeriesId, index: usize) -> Result<Option<CellId>> {
        Ok(self.iter(id)?.nth(index).map(|(cell_id, _)| cell_id))
    }

    /// Cells of a series whose value equals `key`
    pub fn search(&self, id: SeriesId, key: &str) -> Result<Vec<CellId>> {
        Ok(self
            .iter(id)?
            .filter(|(_, cell)| cell.value == key)
            .map(|(cell_id, _)| cell_id)
            .collect())
    }

    /// Matching cells across every series, column by column
    pub fn search_all(&self, key: &str) -> Vec<CellId> {
        self.order
            .iter()
            .filter_map(|&id| self.search(id, key).ok())
            .flatten()
            .collect()
    }

    // ----- structural edits -----

    /// Link `new` into `anchor`'s series directly before `anchor`
    pub fn insert_before(&mut self, anchor: CellId, new: CellId) -> Result<()> {
        if anchor == new {
            return Err(StoreError::invalid_operation("cannot insert a cell next to itself"));
        }
        let (series_id, anchor_index) = self.position(anchor)?;
        self.ensure_detached(new)?;
        self.series_ref(series_id)?;

        let old_previous = self.cell(anchor)?.previous;
        {
            let cell = self.cell_mut(new)?;
            cell.series = Some(series_id);
            cell.previous = old_previous;
            cell.next = Some(anchor);
            cell.index = Some(anchor_index);
        }

        match old_previous {
            Some(previous) => self.cell_mut(previous)?.next = Some(new),
            None => self.series_mut(series_id)?.head = Some(new),
        }
        self.cell_mut(anchor)?.previous = Some(new);
        self.series_mut(series_id)?.len += 1;

        self.renumber_from(Some(anchor), anchor_index + 1)
    }

    /// Link `new` into `anchor`'s series directly after `anchor`
    pub fn insert_after(&mut self, anchor: CellId, new: CellId) -> Result<()> {
        if anchor == new {
            return Err(StoreError::invalid_operation("cannot insert a cell next to itself"));
        }
        let (series_id, anchor_index) = self.position(anchor)?;
        self.ensure_detached(new)?;
        self.series_ref(series_id)?;

        let old_next = self.cell(anchor)?.next;
        {
            let cell = self.cell_mut(new)?;
            cell.series = Some(series_id);
            cell.previous = Some(anchor);
            cell.next = old_next;
            cell.index = Some(anchor_index + 1);
        }

        self.cell_mut(anchor)?.next = Some(new);
        match old_next {
            Some(next) => self.cell_mut(next)?.previous = Some(new),
            None => self.series_mut(series_id)?.tail = Some(new),
        }
        self.series_mut(series_id)?.len += 1;

        self.renumber_from(old_next, anchor_index + 2)
    }

    /// Unlink a cell from its series. The cell stays in the arena, detached.
    pub fn remove(&mut self, id: CellId) -> Result<()> {
        let (series_id, index) = self.position(id)?;
        self.series_ref(series_id)?;

        let (previous, next) = {
            let cell = self.cell(id)?;
            (cell.previous, cell.next)
        };

        match previous {
            Some(p) => self.cell_mut(p)?.next = next,
            None => self.series_mut(series_id)?.head = next,
        }
        match next {
            Some(n) => self.cell_mut(n)?.previous = previous,
            None => self.series_mut(series_id)?.tail = previous,
        }
        self.series_mut(series_id)?.len -= 1;

        self.renumber_from(next, index)?;
        self.cell_mut(id)?.detach();
        Ok(())
    }

    /// Exchange a cell with its successor. Fails without changes on the tail.
    pub fn swap_with_next(&mut self, id: CellId) -> Result<()> {
        let (series_id, index) = self.position(id)?;
        self.series_ref(series_id)?;

        let (previous, next) = {
            let cell = self.cell(id)?;
            (cell.previous, cell.next.ok_or(StoreError::NoSuccessor(id))?)
        };
        let after = self.cell(next)?.next;

        // previous <-> next <-> id <-> after
        match previous {
            Some(p) => self.cell_mut(p)?.next = Some(next),
            None => self.series_mut(series_id)?.head = Some(next),
        }
        {
            let moved_back = self.cell_mut(next)?;
            moved_back.previous = previous;
            moved_back.next = Some(id);
            moved_back.index = Some(index);
        }
        {
            let moved_on = self.cell_mut(id)?;
            moved_on.previous = Some(next);
            moved_on.next = after;
            moved_on.index = Some(index + 1);
        }
        match after {
            Some(a) => self.cell_mut(a)?.previous = Some(id),
            None => self.series_mut(series_id)?.tail = Some(id),
        }

        Ok(())
    }

    /// Assign consecutive indices from `start` to the tail
    fn renumber_from(&mut self, start: Option<CellId>, first_index: usize) -> Result<()> {
        let mut cursor = start;
        let mut index = first_index;
        while let Some(id) = cursor {
            let cell = self.cell_mut(id)?;
            cell.index = Some(index);
            cursor = cell.next;
            index += 1;
        }
        Ok(())
    }

    // ----- rows -----

    /// Rows in the table, header row included
    pub fn row_count(&self) -> usize {
        self.order
            .first()
            .and_then(|id| self.series.get(id))
            .map_or(0, |s| s.len)
    }

    /// The cell of every series at `row`, in column order
    pub fn row(&self, row: usize) -> Result<Vec<CellId>> {
        let mut cells = Vec::with_capacity(self.order.len());
        for &id in &self.order {
            let rows = self.series_ref(id)?.len;
            let cell = self
                .cell_at(id, row)?
                .ok_or(StoreError::RowOutOfBounds { row, rows })?;
            cells.push(cell);
        }
        Ok(cells)
    }

    /// Insert an empty row above `row`, returning the new cells in column order
    pub fn insert_row_before(&mut self, row: usize) -> Result<Vec<CellId>> {
        let anchors = self.row(row)?;
        let mut inserted = Vec::with_capacity(anchors.len());
        for anchor in anchors {
            let cell = self.new_cell("");
            self.insert_before(anchor, cell)?;
            inserted.push(cell);
        }
        Ok(inserted)
    }

    /// Insert an empty row below `row`, returning the new cells in column order
    pub fn insert_row_after(&mut self, row: usize) -> Result<Vec<CellId>> {
        let anchors = self.row(row)?;
        let mut inserted = Vec::with_capacity(anchors.len());
        for anchor in anchors {
            let cell = self.new_cell("");
            self.insert_after(anchor, cell)?;
            inserted.push(cell);
        }
        Ok(inserted)
    }

    /// Remove `row` from every series, returning the removed cells
    pub fn remove_row(&mut self, row: usize) -> Result<Vec<Cell>> {
        let cells = self.row(row)?;
        let mut removed = Vec::with_capacity(cells.len());
        for id in cells {
            self.remove(id)?;
            removed.push(self.discard(id)?);
        }
        Ok(removed)
    }

    /// Bubble-sort the data rows (row 0 stays put) by the numeric value of
    /// `key`, moving whole rows. Non-numeric keys compare as 0.
    ///
    /// Returns the number of row swaps performed.
    pub fn sort_by_series(&mut self, key: SeriesId, locale: &NumberLocale) -> Result<usize> {
        let key_position = self.index_of(key).ok_or(StoreError::SeriesNotFound(key))?;
        let rows = self.series_ref(key)?.len;

        for &id in &self.order {
            if self.series_ref(id)?.len != rows {
                return Err(StoreError::invalid_operation(
                    "cannot sort a table whose series differ in length",
                ));
            }
        }

        if rows < 3 {
            return Ok(0);
        }

        let numeric = |table: &Self, id: CellId| -> Result<f64> {
            Ok(table.cell(id)?.numeric(locale).unwrap_or(0.0))
        };

        let mut swaps = 0;
        let mut pass_length = rows - 2;
        while pass_length > 0 {
            let mut active = self.row(1)?;
            for _ in 0..pass_length {
                let current = active[key_position];
                let Some(next) = self.cell(current)?.next else {
                    break;
                };

                if numeric(self, current)? > numeric(self, next)? {
                    // Active cells move down with the swap
                    for &cell in &active {
                        self.swap_with_next(cell)?;
                    }
                    swaps += 1;
                } else {
                    for cell in active.iter_mut() {
                        *cell = self.cell(*cell)?.next.ok_or(StoreError::NoSuccessor(*cell))?;
                    }
                }
            }
            pass_length -= 1;
        }

        Ok(swaps)
    }

    /// Verify linkage, ownership and index density of a series chain
    pub fn check_series(&self, id: SeriesId) -> Result<()> {
        let series = self.series_ref(id)?;

        let mut expected = 0;
        let mut previous = None;
        let mut cursor = series.head;
        while let Some(cell_id) = cursor {
            if expected >= series.len {
                return Err(StoreError::corruption(format!(
                    "series {} chain is longer than its length {}",
                    id, series.len
                )));
            }
            let cell = self.cell(cell_id).map_err(|_| {
                StoreError::corruption(format!("series {} links to dead cell {}", id, cell_id))
            })?;
            if cell.series != Some(id) {
                return Err(StoreError::corruption(format!(
                    "cell {} not owned by series {}",
                    cell_id, id
                )));
            }
            if cell.index != Some(expected) {
                return Err(StoreError::corruption(format!(
                    "cell {} has index {:?}, expected {}",
                    cell_id, cell.index, expected
                )));
            }
            if cell.previous != previous {
                return Err(StoreError::corruption(format!(
                    "cell {} has a stale previous link",
                    cell_id
                )));
            }
            previous = Some(cell_id);
            cursor = cell.next;
            expected += 1;
        }

        if expected != series.len {
            return Err(StoreError::corruption(format!(
                "series {} has {} cells but length {}",
                id, expected, series.len
            )));
        }
        if series.tail != previous {
            return Err(StoreError::corruption(format!(
                "series {} tail does not end the chain",
                id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn indices(table: &DataTable, id: SeriesId) -> Vec<usize> {
        table.iter(id).unwrap().map(|(_, c)| c.index().unwrap()).collect()
    }

    fn links(table: &DataTable, id: SeriesId) -> Vec<(Option<CellId>, CellId, Option<CellId>)> {
        table
            .iter(id)
            .unwrap()
            .map(|(cell_id, c)| (c.previous(), cell_id, c.next()))
            .collect()
    }

    #[test]
    fn test_build_series() -> Result<()> {
        let mut table = DataTable::new();
        let id = table.add_series_from_values("Time", ["", "Text", "17.4"])?;

        assert_eq!(table.values(id)?, vec!["", "Text", "17.4"]);
        assert_eq!(indices(&table, id), vec![0, 1, 2]);
        assert_eq!(table.series(id).unwrap().len(), 3);
        table.check_series(id)?;

        let first = table.series(id).unwrap().first().unwrap();
        let last = table.series(id).unwrap().last().unwrap();
        assert_eq!(table.cell(first)?.previous(), None);
        assert_eq!(table.cell(last)?.next(), None);
        assert_eq!(table.cell(last)?.value(), "17.4");
        Ok(())
    }

    #[test]
    fn test_insert_before_head() -> Result<()> {
        let mut table = DataTable::new();
        let id = table.add_series_from_values("s", ["a", "b"])?;
        let head = table.series(id).unwrap().first().unwrap();

        let new = table.new_cell("z");
        table.insert_before(head, new)?;

        assert_eq!(table.series(id).unwrap().first(), Some(new));
        assert_eq!(table.values(id)?, vec!["z", "a", "b"]);
        assert_eq!(indices(&table, id), vec![0, 1, 2]);
        table.check_series(id)?;
        Ok(())
    }

    #[test]
    fn test_insert_after_tail_and_middle() -> Result<()> {
        let mut table = DataTable::new();
        let id = table.add_series_from_values("s", ["a", "c"])?;
        let head = table.series(id).unwrap().first().unwrap();
        let tail = table.series(id).unwrap().last().unwrap();

        let d = table.new_cell("d");
        table.insert_after(tail, d)?;
        assert_eq!(table.series(id).unwrap().last(), Some(d));

        let b = table.new_cell("b");
        table.insert_after(head, b)?;
        assert_eq!(table.cell(b)?.index(), Some(1));

        assert_eq!(table.values(id)?, vec!["a", "b", "c", "d"]);
        assert_eq!(indices(&table, id), vec![0, 1, 2, 3]);
        table.check_series(id)?;
        Ok(())
    }

    #[test]
    fn test_insert_rejects_attached_cell() -> Result<()> {
        let mut table = DataTable::new();
        let id = table.add_series_from_values("s", ["a", "b"])?;
        let head = table.series(id).unwrap().first().unwrap();
        let tail = table.series(id).unwrap().last().unwrap();

        assert!(matches!(
            table.insert_after(head, tail),
            Err(StoreError::InvalidOperation(_))
        ));

        let loose = table.new_cell("x");
        let other = table.new_cell("y");
        assert!(matches!(
            table.insert_after(loose, other),
            Err(StoreError::CellNotAttached(_))
        ));

        table.check_series(id)?;
        Ok(())
    }

    #[test]
    fn test_remove_endpoints_and_middle() -> Result<()> {
        let mut table = DataTable::new();
        let id = table.add_series_from_values("s", ["a", "b", "c", "d"])?;
        let cells: Vec<CellId> = table.iter(id)?.map(|(c, _)| c).collect();

        table.remove(cells[1])?;
        assert_eq!(table.values(id)?, vec!["a", "c", "d"]);
        assert_eq!(indices(&table, id), vec![0, 1, 2]);

        table.remove(cells[0])?;
        assert_eq!(table.series(id).unwrap().first(), Some(cells[2]));

        table.remove(cells[3])?;
        assert_eq!(table.series(id).unwrap().last(), Some(cells[2]));
        assert_eq!(table.values(id)?, vec!["c"]);
        table.check_series(id)?;

        let removed = table.cell(cells[1])?;
        assert_eq!(removed.index(), None);
        assert_eq!(removed.series(), None);
        assert_eq!(removed.previous(), None);
        assert_eq!(removed.next(), None);
        assert_eq!(removed.value(), "b");
        Ok(())
    }

    #[test]
    fn test_removed_cell_can_be_reused() -> Result<()> {
        let mut table = DataTable::new();
        let id = table.add_series_from_values("s", ["a", "b", "c"])?;
        let cells: Vec<CellId> = table.iter(id)?.map(|(c, _)| c).collect();

        table.remove(cells[0])?;
        table.insert_after(cells[2], cells[0])?;
        assert_eq!(table.values(id)?, vec!["b", "c", "a"]);
        table.check_series(id)?;
        Ok(())
    }

    #[test]
    fn test_insert_then_remove_restores_chain() -> Result<()> {
        let mut table = DataTable::new();
        let id = table.add_series_from_values("s", ["a", "b", "c"])?;
        let before = links(&table, id);
        let middle = table.cell_at(id, 1)?.unwrap();

        let new = table.new_cell("x");
        table.insert_before(middle, new)?;
        table.remove(new)?;
        assert_eq!(links(&table, id), before);
        assert_eq!(indices(&table, id), vec![0, 1, 2]);

        table.insert_after(middle, new)?;
        table.remove(new)?;
        assert_eq!(links(&table, id), before);
        Ok(())
    }

    #[test]
    fn test_swap_with_next() -> Result<()> {
        let mut table = DataTable::new();
        let id = table.add_series_from_values("s", ["a", "b", "c"])?;
        let a = table.cell_at(id, 0)?.unwrap();
        let b = table.cell_at(id, 1)?.unwrap();

        table.swap_with_next(a)?;
        assert_eq!(table.values(id)?, vec!["b", "a", "c"]);
        assert_eq!(table.series(id).unwrap().first(), Some(b));
        assert_eq!(table.cell(a)?.index(), Some(1));
        assert_eq!(table.cell(b)?.index(), Some(0));
        table.check_series(id)?;

        // a is now in the middle; swapping it reaches the tail
        table.swap_with_next(a)?;
        assert_eq!(table.values(id)?, vec!["b", "c", "a"]);
        assert_eq!(table.series(id).unwrap().last(), Some(a));
        table.check_series(id)?;
        Ok(())
    }

    #[test]
    fn test_swap_twice_is_identity() -> Result<()> {
        let mut table = DataTable::new();
        let id = table.add_series_from_values("s", ["a", "b", "c", "d"])?;
        let before = links(&table, id);
        let b = table.cell_at(id, 1)?.unwrap();
        let c = table.cell_at(id, 2)?.unwrap();

        table.swap_with_next(b)?;
        table.swap_with_next(c)?;
        assert_eq!(links(&table, id), before);
        assert_eq!(indices(&table, id), vec![0, 1, 2, 3]);
        Ok(())
    }

    #[test]
    fn test_swap_tail_is_reported() -> Result<()> {
        let mut table = DataTable::new();
        let id = table.add_series_from_values("s", ["a", "b"])?;
        let before = links(&table, id);
        let tail = table.series(id).unwrap().last().unwrap();

        assert!(matches!(table.swap_with_next(tail), Err(StoreError::NoSuccessor(_))));
        assert_eq!(links(&table, id), before);
        Ok(())
    }

    #[test]
    fn test_discard_invalidates_handle() -> Result<()> {
        let mut table = DataTable::new();
        let id = table.add_series_from_values("s", ["a", "b"])?;
        let b = table.cell_at(id, 1)?.unwrap();

        assert!(table.discard(b).is_err());
        table.remove(b)?;
        let cell = table.discard(b)?;
        assert_eq!(cell.value(), "b");
        assert!(matches!(table.cell(b), Err(StoreError::CellNotFound(_))));

        // Slot reuse does not revive the old handle
        let fresh = table.new_cell("c");
        assert_eq!(fresh.slot(), b.slot());
        assert!(table.cell(b).is_err());
        assert_eq!(table.cell(fresh)?.value(), "c");
        Ok(())
    }

    #[test]
    fn test_remove_series_drops_weak_references() -> Result<()> {
        let mut table = DataTable::new();
        let x = table.add_series_from_values("x", ["", "1"])?;
        let y = table.add_series_from_values("y", ["", "2"])?;
        assert_eq!(table.cell_count(), 4);

        table.remove_series(x)?;
        assert!(table.series(x).is_none());
        assert_eq!(table.series_ids(), &[y]);
        assert_eq!(table.index_of(y), Some(0));
        assert_eq!(table.cell_count(), 2);
        assert_eq!(table.series_by_name("x"), None);
        Ok(())
    }

    #[test]
    fn test_series_lookup_and_search() -> Result<()> {
        let mut table = DataTable::new();
        let a = table.add_series_from_values("A", ["", "5", "7", "5"])?;
        let b = table.add_series_from_values("B", ["", "5", "x", "y"])?;

        assert_eq!(table.series_by_name("B"), Some(b));
        assert_eq!(table.series_at(0), Some(a));

        let hits = table.search(a, "5")?;
        assert_eq!(hits.len(), 2);
        assert_eq!(table.cell(hits[1])?.index(), Some(3));

        assert_eq!(table.search_all("5").len(), 3);
        Ok(())
    }

    #[test]
    fn test_insert_series_positions() -> Result<()> {
        let mut table = DataTable::new();
        let a = table.add_series_from_values("A", ["", "1"])?;
        let c = table.add_series_from_values("C", ["", "3"])?;
        let b = table.insert_blank_series(1, "B", table.row_count())?;

        assert_eq!(table.series_ids(), &[a, b, c]);
        assert_eq!(table.values(b)?, vec!["", ""]);

        let seed = table.new_cell("");
        assert!(table.insert_series(9, "Z", seed).is_err());
        Ok(())
    }

    #[test]
    fn test_row_operations() -> Result<()> {
        let mut table = DataTable::new();
        let a = table.add_series_from_values("A", ["", "1", "2"])?;
        let b = table.add_series_from_values("B", ["", "x", "y"])?;

        let inserted = table.insert_row_after(1)?;
        assert_eq!(inserted.len(), 2);
        table.set_value(inserted[0], "1.5")?;
        assert_eq!(table.values(a)?, vec!["", "1", "1.5", "2"]);
        assert_eq!(table.values(b)?, vec!["", "x", "", "y"]);

        table.insert_row_before(1)?;
        assert_eq!(table.row_count(), 5);

        let removed = table.remove_row(2)?;
        assert_eq!(removed[0].value(), "1");
        assert_eq!(table.values(a)?, vec!["", "", "1.5", "2"]);

        assert!(matches!(
            table.remove_row(4),
            Err(StoreError::RowOutOfBounds { row: 4, .. })
        ));
        table.check_series(a)?;
        table.check_series(b)?;
        Ok(())
    }

    #[test]
    fn test_sort_moves_whole_rows() -> Result<()> {
        let mut table = DataTable::new();
        let key = table.add_series_from_values("key", ["Key", "3", "1", "oops", "2"])?;
        let label = table.add_series_from_values("label", ["Label", "c", "a", "z", "b"])?;

        table.sort_by_series(key, &NumberLocale::default())?;

        assert_eq!(table.values(key)?, vec!["Key", "oops", "1", "2", "3"]);
        assert_eq!(table.values(label)?, vec!["Label", "z", "a", "b", "c"]);
        table.check_series(key)?;
        table.check_series(label)?;
        Ok(())
    }

    #[test]
    fn test_sort_reads_numeric_prefixes() -> Result<()> {
        let mut table = DataTable::new();
        let key = table.add_series_from_values("key", ["Key", "12abc", "3", "1e5"])?;
        let label = table.add_series_from_values("label", ["Label", "twelve", "three", "one"])?;

        table.sort_by_series(key, &NumberLocale::default())?;

        assert_eq!(table.values(key)?, vec!["Key", "1e5", "3", "12abc"]);
        assert_eq!(table.values(label)?, vec!["Label", "one", "three", "twelve"]);
        Ok(())
    }

    #[test]
    fn test_sort_rejects_ragged_table() -> Result<()> {
        let mut table = DataTable::new();
        let key = table.add_series_from_values("key", ["", "2", "1"])?;
        table.add_series_from_values("other", ["", "x"])?;

        assert!(table.sort_by_series(key, &NumberLocale::default()).is_err());
        assert_eq!(table.values(key)?, vec!["", "2", "1"]);
        Ok(())
    }

    #[test]
    fn test_random_edits_keep_indices_dense() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut table = DataTable::new();
        let id = table.add_series_from_values("s", ["h"])?;
        let mut model: Vec<String> = vec!["h".to_string()];

        for step in 0..500 {
            let len = model.len();
            match rng.gen_range(0..4) {
                0 => {
                    let at = rng.gen_range(0..len);
                    let anchor = table.cell_at(id, at)?.unwrap();
                    let value = format!("b{}", step);
                    let cell = table.new_cell(value.clone());
                    table.insert_before(anchor, cell)?;
                    model.insert(at, value);
                }
                1 => {
                    let at = rng.gen_range(0..len);
                    let anchor = table.cell_at(id, at)?.unwrap();
                    let value = format!("a{}", step);
                    let cell = table.new_cell(value.clone());
                    table.insert_after(anchor, cell)?;
                    model.insert(at + 1, value);
                }
                2 if len > 1 => {
                    let at = rng.gen_range(0..len);
                    let cell = table.cell_at(id, at)?.unwrap();
                    table.remove(cell)?;
                    table.discard(cell)?;
                    model.remove(at);
                }
                _ if len > 1 => {
                    let at = rng.gen_range(0..len - 1);
                    let cell = table.cell_at(id, at)?.unwrap();
                    table.swap_with_next(cell)?;
                    model.swap(at, at + 1);
                }
                _ => {}
            }

            table.check_series(id)?;
            assert_eq!(table.values(id)?, model);
            assert_eq!(indices(&table, id), (0..model.len()).collect::<Vec<_>>());
        }
        Ok(())
    }
}
