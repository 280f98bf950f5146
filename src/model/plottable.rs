//! Plottable data sets: which series feed a plot, and how it is drawn.

use serde::{Deserialize, Serialize};

use crate::model::{DataTable, Series};
use crate::types::SeriesId;

/// Name given to new data sets
pub const DEFAULT_PLOTTABLE_NAME: &str = "Unnamed Data Set";

/// Flag bit: the data set is drawn
pub const FLAG_ACTIVE: u8 = 0b001;
/// Flag bit: a trendline is drawn
pub const FLAG_TRENDLINE: u8 = 0b010;
/// Flag bit: regression minimizes horizontal rather than vertical distance
pub const FLAG_REGRESS_X_AGAINST_Y: u8 = 0b100;

/// RGB display colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Colour {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Which series slot of a data set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesRole {
    X,
    Y,
    XError,
    YError,
}

impl SeriesRole {
    /// Slots in record order
    pub const ALL: [SeriesRole; 4] = [Self::X, Self::Y, Self::XError, Self::YError];
}

/// A named plot configuration referring to up to four series.
///
/// The series references are weak: they are handles into the
/// [`DataTable`], and a reference to a removed series resolves to `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlottableData {
    pub name: String,
    /// Not persisted in the project file
    pub colour: Colour,
    pub x: Option<SeriesId>,
    pub y: Option<SeriesId>,
    pub x_error: Option<SeriesId>,
    pub y_error: Option<SeriesId>,
    pub active: bool,
    pub trendline: bool,
    pub regress_x_against_y: bool,
}

impl Default for PlottableData {
    fn default() -> Self {
        Self {
            name: DEFAULT_PLOTTABLE_NAME.to_string(),
            colour: Colour::default(),
            x: None,
            y: None,
            x_error: None,
            y_error: None,
            active: true,
            trendline: false,
            regress_x_against_y: false,
        }
    }
}

impl PlottableData {
    /// Create an active data set with no series selected
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Series handle held in a slot
    pub fn series(&self, role: SeriesRole) -> Option<SeriesId> {
        match role {
            SeriesRole::X => self.x,
            SeriesRole::Y => self.y,
            SeriesRole::XError => self.x_error,
            SeriesRole::YError => self.y_error,
        }
    }

    pub fn set_series(&mut self, role: SeriesRole, series: Option<SeriesId>) {
        let slot = match role {
            SeriesRole::X => &mut self.x,
            SeriesRole::Y => &mut self.y,
            SeriesRole::XError => &mut self.x_error,
            SeriesRole::YError => &mut self.y_error,
        };
        *slot = series;
    }

    /// Follow a slot's weak reference into the table
    pub fn resolve<'a>(&self, table: &'a DataTable, role: SeriesRole) -> Option<&'a Series> {
        self.series(role).and_then(|id| table.series(id))
    }

    /// Whether any slot points at `id`
    pub fn refers_to(&self, id: SeriesId) -> bool {
        SeriesRole::ALL.iter().any(|&role| self.series(role) == Some(id))
    }

    /// Packed option flags as stored on disk
    pub fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.active {
            flags |= FLAG_ACTIVE;
        }
        if self.trendline {
            flags |= FLAG_TRENDLINE;
        }
        if self.regress_x_against_y {
            flags |= FLAG_REGRESS_X_AGAINST_Y;
        }
        flags
    }

    pub fn set_flags(&mut self, flags: u8) {
        self.active = flags & FLAG_ACTIVE != 0;
        self.trendline = flags & FLAG_TRENDLINE != 0;
        self.regress_x_against_y = flags & FLAG_REGRESS_X_AGAINST_Y != 0;
    }
}
