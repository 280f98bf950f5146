//! Rebuilding the model from a project file.

use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::model::{DataTable, Graph, PlottableData};
use crate::store::encoder::{decode_graph, decode_plottable};
use crate::store::RecordStore;
use crate::types::{decode_text, RecordKind, CELL_RECORD_SIZE};

/// Everything read back from a project file
#[derive(Debug, Default)]
pub struct LoadedProject {
    pub graph: Graph,
    pub table: DataTable,
    pub plottables: Vec<PlottableData>,
}

impl RecordStore {
    /// Read the whole project. An empty file loads as an empty project.
    ///
    /// Also sets the store's record counts from the header.
    pub fn load(&mut self) -> Result<LoadedProject> {
        let metadata = match self.read_metadata()? {
            Some(metadata) => metadata,
            None => {
                debug!("empty project file");
                self.set_counts(0, 0);
                return Ok(LoadedProject::default());
            }
        };
        self.set_counts(metadata.plottable_count, metadata.series_count);

        let series_count = metadata.series_count as usize;
        let names = (0..series_count)
            .map(|i| self.read_record(RecordKind::Series, i).map(|bytes| decode_text(&bytes)))
            .collect::<Result<Vec<_>>>()?;

        let columns = self.read_cell_columns(series_count)?;

        let mut table = DataTable::new();
        let mut blank_columns = 0;
        for (name, column) in names.into_iter().zip(columns) {
            if column.is_empty() {
                table.insert_blank_series(table.series_count(), name, 1)?;
                blank_columns += 1;
            } else {
                table.add_series_from_values(name, column)?;
            }
        }
        if blank_columns > 0 {
            // Give the blank header row a slot in the file as well
            debug!(blank_columns, "writing empty header row");
            self.write_bytes(
                self.offset(RecordKind::Cell, 0),
                &vec![0; blank_columns * CELL_RECORD_SIZE],
            )?;
        }

        let plottables = (0..metadata.plottable_count as usize)
            .map(|i| {
                self.read_record(RecordKind::Plottable, i)
                    .map(|bytes| decode_plottable(&bytes, &table))
            })
            .collect::<Result<Vec<_>>>()?;

        let graph = decode_graph(&metadata, &table);
        debug!(
            series = table.series_count(),
            rows = table.row_count(),
            plottables = plottables.len(),
            "loaded project"
        );

        Ok(LoadedProject {
            graph,
            table,
            plottables,
        })
    }

    /// Read the cell region row by row into one value list per series.
    ///
    /// Bytes past the last complete row are cut from the file so that later
    /// structural edits cannot shift them into the table.
    fn read_cell_columns(&self, series_count: usize) -> Result<Vec<Vec<String>>> {
        let start = self.offset(RecordKind::Cell, 0);
        let len = self.len()?;
        if len < start {
            return Err(StoreError::invalid_file(format!(
                "file ends at {} bytes, before the cell region at {}",
                len, start
            )));
        }

        let records = ((len - start) / CELL_RECORD_SIZE as u64) as usize;
        let rows = records.checked_div(series_count).unwrap_or(0);
        let end = self.offset(RecordKind::Cell, rows * series_count);
        if end < len {
            warn!(
                records,
                series_count,
                trailing = len - end,
                "cutting cell data past the last complete row"
            );
            self.set_len(end)?;
        }

        let mut columns = vec![Vec::new(); series_count];
        for row in 0..rows {
            let pos = self.offset(RecordKind::Cell, row * series_count);
            let bytes = self.read_bytes(pos, series_count * CELL_RECORD_SIZE)?;
            for (column, record) in columns.iter_mut().zip(bytes.chunks_exact(CELL_RECORD_SIZE)) {
                column.push(decode_text(record));
            }
        }

        Ok(columns)
    }
}
