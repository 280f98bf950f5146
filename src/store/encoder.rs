//! Model objects to fixed-width records and back.
//!
//! Record identity is positional. Cells are stored row-major: the cell at
//! row `r` of the series in column `c` is cell record `r * series_count + c`,
//! with the header row at `r = 0`. The same numbering is used for overwrites
//! and for staging inserts and deletes.

use crate::error::{Result, StoreError};
use crate::model::{DataTable, Graph, PlottableData, SeriesRole};
use crate::store::GraphMetadata;
use crate::types::{
    decode_text, encode_text, CellId, SeriesId, CELL_RECORD_SIZE, PLOTTABLE_RECORD_SIZE,
    SERIES_NAME_WIDTH, SERIES_RECORD_SIZE,
};

/// Cell record number of the cell at `row` in column `column`
pub const fn cell_record_index(row: usize, column: usize, series_count: usize) -> usize {
    row * series_count + column
}

/// Encodes records for the current state of a table
pub struct RecordEncoder<'a> {
    table: &'a DataTable,
}

impl<'a> RecordEncoder<'a> {
    pub fn new(table: &'a DataTable) -> Self {
        Self { table }
    }

    /// Name of a weakly referenced series; empty if it no longer resolves
    fn series_name(&self, id: Option<SeriesId>) -> &'a str {
        id.and_then(|id| self.table.series(id))
            .map_or("", |series| series.name())
    }

    /// Plottable record: five names then the flag byte
    pub fn plottable(&self, plottable: &PlottableData) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(PLOTTABLE_RECORD_SIZE);
        bytes.extend(encode_text(&plottable.name, SERIES_NAME_WIDTH));
        for role in SeriesRole::ALL {
            bytes.extend(encode_text(self.series_name(plottable.series(role)), SERIES_NAME_WIDTH));
        }
        bytes.push(plottable.flags());
        bytes
    }

    /// Series record: the name
    pub fn series(&self, id: SeriesId) -> Result<Vec<u8>> {
        let series = self.table.series(id).ok_or(StoreError::SeriesNotFound(id))?;
        Ok(encode_text(series.name(), SERIES_RECORD_SIZE))
    }

    /// Cell record: the value
    pub fn cell(&self, id: CellId) -> Result<Vec<u8>> {
        Ok(encode_text(self.table.cell(id)?.value(), CELL_RECORD_SIZE))
    }

    /// Series record number (its column)
    pub fn series_index(&self, id: SeriesId) -> Result<usize> {
        self.table.index_of(id).ok_or(StoreError::SeriesNotFound(id))
    }

    /// Cell record number of an attached cell
    pub fn cell_index(&self, id: CellId) -> Result<usize> {
        let cell = self.table.cell(id)?;
        let (series, row) = match (cell.series(), cell.index()) {
            (Some(series), Some(row)) => (series, row),
            _ => return Err(StoreError::CellNotAttached(id)),
        };
        let column = self.series_index(series)?;
        Ok(cell_record_index(row, column, self.table.series_count()))
    }

    /// Header for the graph and the current record counts
    pub fn metadata(&self, graph: &Graph, plottable_count: usize) -> GraphMetadata {
        GraphMetadata {
            title: graph.title.clone(),
            x_axis_title: graph.x_axis_title.clone(),
            y_axis_title: graph.y_axis_title.clone(),
            gridline_x: self.series_name(graph.gridline_x).to_string(),
            gridline_y: self.series_name(graph.gridline_y).to_string(),
            graph_type: graph.graph_type,
            plottable_count: plottable_count as u32,
            series_count: self.table.series_count() as u32,
        }
    }
}

/// Decode a plottable record, resolving series names against `table`.
/// Names with no matching series decode to no reference.
pub fn decode_plottable(bytes: &[u8], table: &DataTable) -> PlottableData {
    let slot = |i: usize| &bytes[i * SERIES_NAME_WIDTH..(i + 1) * SERIES_NAME_WIDTH];
    let lookup = |i: usize| {
        let name = decode_text(slot(i));
        if name.is_empty() {
            None
        } else {
            table.series_by_name(&name)
        }
    };

    let mut plottable = PlottableData::new(decode_text(slot(0)));
    for (i, role) in SeriesRole::ALL.into_iter().enumerate() {
        plottable.set_series(role, lookup(i + 1));
    }
    plottable.set_flags(bytes[5 * SERIES_NAME_WIDTH]);
    plottable
}

/// Graph settings from a header, resolving gridline names against `table`
pub fn decode_graph(metadata: &GraphMetadata, table: &DataTable) -> Graph {
    let lookup = |name: &str| {
        if name.is_empty() {
            None
        } else {
            table.series_by_name(name)
        }
    };

    Graph {
        title: metadata.title.clone(),
        x_axis_title: metadata.x_axis_title.clone(),
        y_axis_title: metadata.y_axis_title.clone(),
        gridline_x: lookup(&metadata.gridline_x),
        gridline_y: lookup(&metadata.gridline_y),
        graph_type: metadata.graph_type,
    }
}
