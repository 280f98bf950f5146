//! Project file header.
//!
//! The first 937 bytes of every project file hold the graph settings and the
//! two record counts that every later offset depends on.

use crate::error::{Result, StoreError};
use crate::types::{
    decode_text, encode_text, GraphType, AXIS_TITLE_WIDTH, GRAPH_TITLE_WIDTH, METADATA_SIZE,
    SERIES_NAME_WIDTH,
};

const TITLE_OFFSET: usize = 0;
const X_AXIS_OFFSET: usize = TITLE_OFFSET + GRAPH_TITLE_WIDTH;
const Y_AXIS_OFFSET: usize = X_AXIS_OFFSET + AXIS_TITLE_WIDTH;
const GRIDLINE_X_OFFSET: usize = Y_AXIS_OFFSET + AXIS_TITLE_WIDTH;
const GRIDLINE_Y_OFFSET: usize = GRIDLINE_X_OFFSET + SERIES_NAME_WIDTH;
const GRAPH_TYPE_OFFSET: usize = GRIDLINE_Y_OFFSET + SERIES_NAME_WIDTH;
const PLOTTABLE_COUNT_OFFSET: usize = GRAPH_TYPE_OFFSET + 1;
const SERIES_COUNT_OFFSET: usize = PLOTTABLE_COUNT_OFFSET + 4;

/// Decoded project header
///
/// Layout:
/// ```text
/// Offset  Size  Description
/// 0       400   Graph title
/// 400     200   X axis title
/// 600     200   Y axis title
/// 800     64    X gridline series name
/// 864     64    Y gridline series name
/// 928     1     Graph type (1 scatter, 2 line, 3 bar)
/// 929     4     Plottable record count (big-endian)
/// 933     4     Series record count (big-endian)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GraphMetadata {
    pub title: String,
    pub x_axis_title: String,
    pub y_axis_title: String,
    /// Name of the X gridline series, empty for none
    pub gridline_x: String,
    /// Name of the Y gridline series, empty for none
    pub gridline_y: String,
    pub graph_type: GraphType,
    pub plottable_count: u32,
    pub series_count: u32,
}

impl GraphMetadata {
    /// Read a header from bytes
    pub fn read(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < METADATA_SIZE {
            return Err(StoreError::invalid_file(format!(
                "header too short: {} bytes (expected {})",
                bytes.len(),
                METADATA_SIZE
            )));
        }

        let tag = bytes[GRAPH_TYPE_OFFSET];
        let graph_type = GraphType::from_byte(tag)
            .ok_or_else(|| StoreError::invalid_file(format!("unknown graph type tag {}", tag)))?;

        let count_at = |offset: usize| {
            u32::from_be_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ])
        };

        Ok(Self {
            title: decode_text(&bytes[TITLE_OFFSET..X_AXIS_OFFSET]),
            x_axis_title: decode_text(&bytes[X_AXIS_OFFSET..Y_AXIS_OFFSET]),
            y_axis_title: decode_text(&bytes[Y_AXIS_OFFSET..GRIDLINE_X_OFFSET]),
            gridline_x: decode_text(&bytes[GRIDLINE_X_OFFSET..GRIDLINE_Y_OFFSET]),
            gridline_y: decode_text(&bytes[GRIDLINE_Y_OFFSET..GRAPH_TYPE_OFFSET]),
            graph_type,
            plottable_count: count_at(PLOTTABLE_COUNT_OFFSET),
            series_count: count_at(SERIES_COUNT_OFFSET),
        })
    }

    /// Encode this header
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(METADATA_SIZE);
        bytes.extend(encode_text(&self.title, GRAPH_TITLE_WIDTH));
        bytes.extend(encode_text(&self.x_axis_title, AXIS_TITLE_WIDTH));
        bytes.extend(encode_text(&self.y_axis_title, AXIS_TITLE_WIDTH));
        bytes.extend(encode_text(&self.gridline_x, SERIES_NAME_WIDTH));
        bytes.extend(encode_text(&self.gridline_y, SERIES_NAME_WIDTH));
        bytes.push(self.graph_type.as_byte());
        bytes.extend(self.plottable_count.to_be_bytes());
        bytes.extend(self.series_count.to_be_bytes());
        bytes
    }
}
