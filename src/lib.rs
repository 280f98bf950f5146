//! # Grapher Storage
//!
//! The data model and project file behind a small graphing tool.
//!
//! ## Architecture
//!
//! - **Model** (`model`): series as doubly-linked chains of cells with dense
//!   indices, plus data sets that refer to series weakly
//! - **Store** (`store`): one file of fixed-width records, edited in place by
//!   batched byte insertion and deletion
//! - **Project** (`Project`): keeps the model and the file in step
//!
//! ## Usage
//!
//! ```rust,ignore
//! use grapher_storage::{Config, Project};
//!
//! let mut project = Project::open(Config::new("cooling.graph"))?;
//!
//! let time = project.add_series("Time")?;
//! project.insert_row_after(0)?;
//! project.set_cell_value(time, 1, "0.5")?;
//!
//! let snapshot = project.snapshot()?;
//! println!("{}", serde_json::to_string_pretty(&snapshot)?);
//! ```

pub mod error;
pub mod model;
mod project;
pub mod store;
pub mod types;

pub use error::{Result, StoreError};
pub use project::{Project, RecordRef};
pub use types::{CellId, GraphType, NumberLocale, SeriesId};

// Re-export main public API
pub use model::{Colour, DataTable, Graph, PlottableData, SeriesRole};
pub use store::RecordStore;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Project configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the project file
    pub path: PathBuf,
    /// Whether to sync writes immediately (default: false for performance)
    pub sync_on_write: bool,
    /// Create the file when it does not exist (default: true)
    pub create_if_missing: bool,
    /// How cell text is read as a number when sorting
    pub number_locale: NumberLocale,
}

impl Config {
    /// Create a new configuration with default settings
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            sync_on_write: false,
            create_if_missing: true,
            number_locale: NumberLocale::default(),
        }
    }

    /// Enable sync on write for durability
    pub fn sync_on_write(mut self, enabled: bool) -> Self {
        self.sync_on_write = enabled;
        self
    }

    pub fn create_if_missing(mut self, enabled: bool) -> Self {
        self.create_if_missing = enabled;
        self
    }

    /// Set the number format used for sorting
    pub fn number_locale(mut self, locale: NumberLocale) -> Self {
        self.number_locale = locale;
        self
    }
}

/// Serializable view of a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    pub title: String,
    pub x_axis_title: String,
    pub y_axis_title: String,
    pub graph_type: GraphType,
    /// Series names; `None` where no gridline is set
    pub gridline_x: Option<String>,
    pub gridline_y: Option<String>,
    /// Series in column order
    pub series: Vec<SeriesSnapshot>,
    pub plottables: Vec<PlottableSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSnapshot {
    pub name: String,
    /// Cell values, header first
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlottableSnapshot {
    pub name: String,
    pub colour: Colour,
    pub x: Option<String>,
    pub y: Option<String>,
    pub x_error: Option<String>,
    pub y_error: Option<String>,
    pub active: bool,
    pub trendline: bool,
    pub regress_x_against_y: bool,
}

impl ProjectSnapshot {
    /// Capture the current model
    pub fn capture(graph: &Graph, table: &DataTable, plottables: &[PlottableData]) -> Result<Self> {
        let name_of = |id: Option<SeriesId>| {
            id.and_then(|id| table.series(id))
                .map(|series| series.name().to_string())
        };

        let series = table
            .series_ids()
            .iter()
            .map(|&id| {
                Ok(SeriesSnapshot {
                    name: name_of(Some(id)).unwrap_or_default(),
                    values: table.values(id)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let plottables = plottables
            .iter()
            .map(|p| PlottableSnapshot {
                name: p.name.clone(),
                colour: p.colour,
                x: name_of(p.x),
                y: name_of(p.y),
                x_error: name_of(p.x_error),
                y_error: name_of(p.y_error),
                active: p.active,
                trendline: p.trendline,
                regress_x_against_y: p.regress_x_against_y,
            })
            .collect();

        Ok(Self {
            title: graph.title.clone(),
            x_axis_title: graph.x_axis_title.clone(),
            y_axis_title: graph.y_axis_title.clone(),
            graph_type: graph.graph_type,
            gridline_x: name_of(graph.gridline_x),
            gridline_y: name_of(graph.gridline_y),
            series,
            plottables,
        })
    }
}
