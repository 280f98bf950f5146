//! The project handle: one data table, its plots, and the file they live in.
//!
//! Every edit goes to the in-memory model first and is then persisted. Edits
//! that only change a record's contents overwrite it in place; edits that add
//! or remove records stage byte ranges and flush them with one shifting pass,
//! then rewrite the header. If persisting fails the error is returned and the
//! model keeps the edit.

use std::path::Path;

use tracing::debug;

use crate::error::{Result, StoreError};
use crate::model::{DataTable, Graph, PlottableData};
use crate::store::{RecordEncoder, RecordStore};
use crate::types::{encode_text, CellId, RecordKind, SeriesId, CELL_RECORD_SIZE};
use crate::{Config, ProjectSnapshot};

/// A model object that has a record in the project file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordRef {
    /// Plottable at this position in the plottable list
    Plottable(usize),
    Series(SeriesId),
    Cell(CellId),
}

/// An open project
pub struct Project {
    store: RecordStore,
    table: DataTable,
    graph: Graph,
    plottables: Vec<PlottableData>,
    config: Config,
}

impl Project {
    /// Open a project file and load it. An empty file becomes a new project
    /// and is written out immediately.
    pub fn open(config: Config) -> Result<Self> {
        let mut store = RecordStore::new(config.sync_on_write);
        store.open(&config.path, config.create_if_missing)?;

        let fresh = store.is_empty()?;
        let loaded = store.load()?;

        let mut project = Self {
            store,
            table: loaded.table,
            graph: loaded.graph,
            plottables: loaded.plottables,
            config,
        };

        if fresh {
            debug!(path = %project.config.path.display(), "initializing new project file");
            project.save_all()?;
        }
        Ok(project)
    }

    /// Release the file. The model stays usable; later edits fail to persist
    /// until [`save_as`](Self::save_as) opens a file again.
    pub fn close(&mut self) -> Result<()> {
        self.store.close()
    }

    /// Write the whole project to `path` and keep it open there
    pub fn save_as(&mut self, path: &Path) -> Result<()> {
        self.store.open(path, true)?;
        self.config.path = path.to_path_buf();
        self.save_all()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn table(&self) -> &DataTable {
        &self.table
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn plottables(&self) -> &[PlottableData] {
        &self.plottables
    }

    /// The underlying record store
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Bring the store's record counts in line with the model
    fn sync_counts(&mut self) {
        self.store
            .set_counts(self.plottables.len() as u32, self.table.series_count() as u32);
    }

    /// Absolute position and encoded bytes of a record, for the current counts
    fn locate(&self, record: RecordRef) -> Result<(u64, Vec<u8>)> {
        let encoder = RecordEncoder::new(&self.table);
        let (kind, index, bytes) = match record {
            RecordRef::Plottable(i) => {
                let plottable = self.plottables.get(i).ok_or_else(|| {
                    StoreError::invalid_operation(format!("no plottable at position {}", i))
                })?;
                (RecordKind::Plottable, i, encoder.plottable(plottable))
            }
            RecordRef::Series(id) => {
                (RecordKind::Series, encoder.series_index(id)?, encoder.series(id)?)
            }
            RecordRef::Cell(id) => (RecordKind::Cell, encoder.cell_index(id)?, encoder.cell(id)?),
        };
        Ok((self.store.offset(kind, index), bytes))
    }

    /// Overwrite a record that already has a slot in the file
    pub fn save(&self, record: RecordRef) -> Result<()> {
        let (pos, bytes) = self.locate(record)?;
        self.store.write_bytes(pos, &bytes)
    }

    /// Stage a record for insertion at the position it has in the model now
    pub fn stage_insert(&mut self, record: RecordRef) -> Result<()> {
        let (pos, bytes) = self.locate(record)?;
        self.store.stage_insert_bytes(pos, &bytes);
        Ok(())
    }

    /// Stage a record's current byte range for deletion
    pub fn stage_delete(&mut self, record: RecordRef) -> Result<()> {
        let (pos, bytes) = self.locate(record)?;
        self.store.stage_delete_range(pos, bytes.len() as u64);
        Ok(())
    }

    /// Apply staged inserts
    pub fn flush_inserts(&mut self) -> Result<usize> {
        self.store.flush_inserts()
    }

    /// Apply staged deletes
    pub fn flush_deletes(&mut self) -> Result<usize> {
        self.store.flush_deletes()
    }

    /// Rewrite the header
    pub fn save_metadata(&self) -> Result<()> {
        let metadata = RecordEncoder::new(&self.table).metadata(&self.graph, self.plottables.len());
        self.store.write_metadata(&metadata)
    }

    /// Rewrite the whole file from the model, resizing it to fit
    pub fn save_all(&mut self) -> Result<()> {
        self.sync_counts();
        let encoder = RecordEncoder::new(&self.table);

        let mut bytes = encoder.metadata(&self.graph, self.plottables.len()).to_bytes();
        for plottable in &self.plottables {
            bytes.extend(encoder.plottable(plottable));
        }
        for &id in self.table.series_ids() {
            bytes.extend(encoder.series(id)?);
        }
        for row in 0..self.table.row_count() {
            bytes.extend(self.encode_row(row)?);
        }

        self.store.write_bytes(0, &bytes)?;
        self.store.set_len(bytes.len() as u64)?;
        debug!(len = bytes.len(), "saved whole project");
        Ok(())
    }

    /// Cell records of one row, in column order
    fn encode_row(&self, row: usize) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(self.table.series_count() * CELL_RECORD_SIZE);
        for &id in self.table.series_ids() {
            let cell = self.table.cell_at(id, row)?.ok_or_else(|| {
                StoreError::corruption(format!("series {} has no row {}", id, row))
            })?;
            bytes.extend(encode_text(self.table.cell(cell)?.value(), CELL_RECORD_SIZE));
        }
        Ok(bytes)
    }

    /// Overwrite every cell record in place
    fn save_cells(&self) -> Result<()> {
        let columns = self.table.series_count();
        for row in 0..self.table.row_count() {
            let pos = self.store.offset(RecordKind::Cell, row * columns);
            self.store.write_bytes(pos, &self.encode_row(row)?)?;
        }
        Ok(())
    }

    fn rows(&self, series: SeriesId) -> Result<usize> {
        self.table
            .series(series)
            .map(|s| s.len())
            .ok_or(StoreError::SeriesNotFound(series))
    }

    // ----- graph -----

    /// Replace the graph settings and rewrite the header
    pub fn set_graph(&mut self, graph: Graph) -> Result<()> {
        self.graph = graph;
        self.save_metadata()
    }

    // ----- cells -----

    /// Set the text of the cell at `row` of a series
    pub fn set_cell_value(
        &mut self,
        series: SeriesId,
        row: usize,
        value: impl Into<String>,
    ) -> Result<CellId> {
        let rows = self.rows(series)?;
        let cell = self
            .table
            .cell_at(series, row)?
            .ok_or(StoreError::RowOutOfBounds { row, rows })?;
        self.table.set_value(cell, value)?;
        self.save(RecordRef::Cell(cell))?;
        Ok(cell)
    }

    // ----- series -----

    /// Append an empty series
    pub fn add_series(&mut self, name: impl Into<String>) -> Result<SeriesId> {
        self.insert_series(self.table.series_count(), name)
    }

    /// Insert an empty series at a column position
    pub fn insert_series(&mut self, position: usize, name: impl Into<String>) -> Result<SeriesId> {
        let rows = self.table.row_count();
        let id = self.table.insert_blank_series(position, name, rows)?;
        self.sync_counts();

        self.stage_insert(RecordRef::Series(id))?;
        let cells: Vec<CellId> = self.table.iter(id)?.map(|(cell, _)| cell).collect();
        for cell in cells {
            self.stage_insert(RecordRef::Cell(cell))?;
        }

        self.flush_inserts()?;
        self.save_metadata()?;
        Ok(id)
    }

    /// Remove a series. Plots and gridlines referring to it lose the reference.
    pub fn remove_series(&mut self, id: SeriesId) -> Result<()> {
        self.stage_delete(RecordRef::Series(id))?;
        let cells: Vec<CellId> = self.table.iter(id)?.map(|(cell, _)| cell).collect();
        for cell in cells {
            self.stage_delete(RecordRef::Cell(cell))?;
        }

        self.table.remove_series(id)?;
        self.sync_counts();

        self.flush_deletes()?;
        self.save_metadata()?;
        for i in 0..self.plottables.len() {
            if self.plottables[i].refers_to(id) {
                self.save(RecordRef::Plottable(i))?;
            }
        }
        Ok(())
    }

    /// Rename a series, rewriting every record that stores its name
    pub fn rename_series(&mut self, id: SeriesId, name: impl Into<String>) -> Result<()> {
        self.table.rename_series(id, name)?;
        self.save(RecordRef::Series(id))?;

        for i in 0..self.plottables.len() {
            if self.plottables[i].refers_to(id) {
                self.save(RecordRef::Plottable(i))?;
            }
        }
        if self.graph.gridline_x == Some(id) || self.graph.gridline_y == Some(id) {
            self.save_metadata()?;
        }
        Ok(())
    }

    // ----- rows -----

    /// Insert an empty row above `row` in every series. Nothing goes above
    /// the header row.
    pub fn insert_row_before(&mut self, row: usize) -> Result<Vec<CellId>> {
        if row == 0 {
            return Err(StoreError::invalid_operation("cannot insert a row above the header row"));
        }
        let cells = self.table.insert_row_before(row)?;
        self.persist_new_row(&cells)?;
        Ok(cells)
    }

    /// Insert an empty row below `row` in every series
    pub fn insert_row_after(&mut self, row: usize) -> Result<Vec<CellId>> {
        let cells = self.table.insert_row_after(row)?;
        self.persist_new_row(&cells)?;
        Ok(cells)
    }

    fn persist_new_row(&mut self, cells: &[CellId]) -> Result<()> {
        for &cell in cells {
            self.stage_insert(RecordRef::Cell(cell))?;
        }
        self.flush_inserts()?;
        self.save_metadata()
    }

    /// Remove a data row from every series. The header row cannot be removed.
    pub fn remove_row(&mut self, row: usize) -> Result<()> {
        if row == 0 {
            return Err(StoreError::invalid_operation("the header row cannot be removed"));
        }

        for cell in self.table.row(row)? {
            self.stage_delete(RecordRef::Cell(cell))?;
        }
        self.table.remove_row(row)?;

        self.flush_deletes()?;
        self.save_metadata()
    }

    /// Sort data rows by the numeric value of a series and rewrite the cells
    pub fn sort_by_series(&mut self, key: SeriesId) -> Result<usize> {
        let swaps = self.table.sort_by_series(key, &self.config.number_locale)?;
        if swaps > 0 {
            self.save_cells()?;
        }
        Ok(swaps)
    }

    // ----- plottables -----

    /// Append a data set
    pub fn add_plottable(&mut self, plottable: PlottableData) -> Result<usize> {
        self.plottables.push(plottable);
        let index = self.plottables.len() - 1;
        self.sync_counts();

        self.stage_insert(RecordRef::Plottable(index))?;
        self.flush_inserts()?;
        self.save_metadata()?;
        Ok(index)
    }

    /// Edit a data set in place and rewrite its record
    pub fn update_plottable<F>(&mut self, index: usize, edit: F) -> Result<()>
    where
        F: FnOnce(&mut PlottableData),
    {
        let plottable = self.plottables.get_mut(index).ok_or_else(|| {
            StoreError::invalid_operation(format!("no plottable at position {}", index))
        })?;
        edit(plottable);
        self.save(RecordRef::Plottable(index))
    }

    /// Remove a data set
    pub fn remove_plottable(&mut self, index: usize) -> Result<PlottableData> {
        self.stage_delete(RecordRef::Plottable(index))?;
        let removed = self.plottables.remove(index);
        self.sync_counts();

        self.flush_deletes()?;
        self.save_metadata()?;
        Ok(removed)
    }

    /// Serializable view of the whole project
    pub fn snapshot(&self) -> Result<ProjectSnapshot> {
        ProjectSnapshot::capture(&self.graph, &self.table, &self.plottables)
    }
}
