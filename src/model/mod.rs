//! Value types shared by the layout engine, the session and the saver

pub mod geometry;
pub mod panel;
pub mod region;

use std::fmt;

pub use geometry::{Location, Orientation, Point, Rect, Side, SideBarLocation, Size};
pub use panel::{LastPosition, Panel, PanelOptions, PlaceholderRef};
pub use region::{Region, RegionId, RegionOptions};

/// Unique identifier for a floating window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FloatingWindowId(pub u64);

/// Names the window whose layout owns an item or region
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayoutRef {
    MainWindow(String),
    Floating(FloatingWindowId),
}

impl LayoutRef {
    pub fn is_main_window(&self) -> bool {
        matches!(self, LayoutRef::MainWindow(_))
    }

    pub fn main_window_name(&self) -> Option<&str> {
        match self {
            LayoutRef::MainWindow(name) => Some(name),
            LayoutRef::Floating(_) => None,
        }
    }
}

impl fmt::Display for LayoutRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutRef::MainWindow(name) => write!(f, "main window '{}'", name),
            LayoutRef::Floating(id) => write!(f, "floating window #{}", id.0),
        }
    }
}
