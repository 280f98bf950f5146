//! In-memory project model.
//!
//! - [`DataTable`]: series of text cells, each series a doubly-linked chain
//! - [`PlottableData`]: data sets referring weakly to series
//! - [`Graph`]: titles, gridlines and graph type

mod cell;
mod graph;
mod plottable;
mod series;
mod table;

pub use cell::Cell;
pub use graph::{Graph, DEFAULT_GRAPH_TITLE};
pub use plottable::{
    Colour, PlottableData, SeriesRole, DEFAULT_PLOTTABLE_NAME, FLAG_ACTIVE,
    FLAG_REGRESS_X_AGAINST_Y, FLAG_TRENDLINE,
};
pub use series::{Series, SeriesIter, DEFAULT_SERIES_NAME};
pub use table::DataTable;
