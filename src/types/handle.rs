//! Handle types for cells and series.

use std::fmt;

/// Stable handle to a cell in a [`DataTable`](crate::model::DataTable) arena.
///
/// Arena slots are reused after a cell is discarded, so the handle carries the
/// slot's generation. A handle kept past `discard` no longer resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId {
    slot: u32,
    generation: u32,
}

impl CellId {
    pub(crate) const fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }

    /// Arena slot this handle points at
    pub const fn slot(self) -> usize {
        self.slot as usize
    }

    /// Generation of the slot when the handle was issued
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.slot, self.generation)
    }
}

/// Handle to a series. Series ids are never reused, so a weak reference to a
/// removed series simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeriesId(pub u32);

impl SeriesId {
    /// Create a new series ID
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw value
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for SeriesId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_id_basics() {
        let id = CellId::new(4, 2);
        assert_eq!(id.slot(), 4);
        assert_eq!(id.generation(), 2);
        assert_ne!(id, CellId::new(4, 3));
        assert_eq!(format!("{}", id), "4v2");
    }

    #[test]
    fn test_series_id_display() {
        assert_eq!(format!("{}", SeriesId::new(42)), "#42");
        assert_eq!(SeriesId::from(7).value(), 7);
    }
}
