//! Storage layer: the project file and its record layout.
//!
//! This module provides the single-file record store, the header codec,
//! the staged-edit backlog, and the record encoder that maps model objects
//! to fixed-width records.

mod backlog;
mod encoder;
mod load;
mod metadata;
mod record_store;

pub use backlog::Backlog;
pub use encoder::{cell_record_index, decode_graph, decode_plottable, RecordEncoder};
pub use load::LoadedProject;
pub use metadata::GraphMetadata;
pub use record_store::RecordStore;
