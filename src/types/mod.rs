//! Common types used throughout the table model and the record store.

mod handle;
mod number;
mod text;

pub use handle::{CellId, SeriesId};
pub use number::NumberLocale;
pub use text::{decode_text, encode_text};

use serde::{Deserialize, Serialize};

/// Size of the metadata header at the start of every project file
pub const METADATA_SIZE: usize = 937;

/// Size of one plottable record
pub const PLOTTABLE_RECORD_SIZE: usize = 321;

/// Size of one series-name record
pub const SERIES_RECORD_SIZE: usize = 64;

/// Size of one cell record
pub const CELL_RECORD_SIZE: usize = 128;

/// Width of the graph title slot in the header
pub const GRAPH_TITLE_WIDTH: usize = 400;

/// Width of each axis title slot in the header
pub const AXIS_TITLE_WIDTH: usize = 200;

/// Width of every series-name slot (header gridlines, plottable references, series records)
pub const SERIES_NAME_WIDTH: usize = 64;

/// Record kinds stored after the metadata header, in file order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Plottable data set configuration
    Plottable,
    /// Series name
    Series,
    /// Cell value
    Cell,
}

impl RecordKind {
    /// Fixed width in bytes of one record of this kind
    pub const fn size(self) -> usize {
        match self {
            Self::Plottable => PLOTTABLE_RECORD_SIZE,
            Self::Series => SERIES_RECORD_SIZE,
            Self::Cell => CELL_RECORD_SIZE,
        }
    }
}

/// How the graph is drawn
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphType {
    #[default]
    Scatter = 1,
    Line = 2,
    Bar = 3,
}

impl GraphType {
    /// Convert from the header tag byte
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Scatter),
            2 => Some(Self::Line),
            3 => Some(Self::Bar),
            _ => None,
        }
    }

    /// Header tag byte
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_kind_sizes() {
        assert_eq!(RecordKind::Plottable.size(), 321);
        assert_eq!(RecordKind::Series.size(), 64);
        assert_eq!(RecordKind::Cell.size(), 128);
    }

    #[test]
    fn test_header_widths_add_up() {
        let plottable = 5 * SERIES_NAME_WIDTH + 1;
        assert_eq!(plottable, PLOTTABLE_RECORD_SIZE);

        let header = GRAPH_TITLE_WIDTH + 2 * AXIS_TITLE_WIDTH + 2 * SERIES_NAME_WIDTH + 1 + 4 + 4;
        assert_eq!(header, METADATA_SIZE);
    }

    #[test]
    fn test_graph_type_tags() {
        assert_eq!(GraphType::from_byte(1), Some(GraphType::Scatter));
        assert_eq!(GraphType::from_byte(3), Some(GraphType::Bar));
        assert_eq!(GraphType::from_byte(0), None);
        assert_eq!(GraphType::Line.as_byte(), 2);
        assert_eq!(GraphType::default(), GraphType::Scatter);
    }
}
