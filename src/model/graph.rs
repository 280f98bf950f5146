//! Graph-wide settings kept in the project header.

use crate::types::{GraphType, SeriesId};

/// Title given to new graphs
pub const DEFAULT_GRAPH_TITLE: &str = "New Graph";

/// Titles, gridline series and graph type
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    pub title: String,
    pub x_axis_title: String,
    pub y_axis_title: String,
    /// Series supplying vertical gridline positions (weak)
    pub gridline_x: Option<SeriesId>,
    /// Series supplying horizontal gridline positions (weak)
    pub gridline_y: Option<SeriesId>,
    pub graph_type: GraphType,
}

impl Default for Graph {
    fn default() -> Self {
        Self {
            title: DEFAULT_GRAPH_TITLE.to_string(),
            x_axis_title: String::new(),
            y_axis_title: String::new(),
            gridline_x: None,
            gridline_y: None,
            graph_type: GraphType::Scatter,
        }
    }
}
