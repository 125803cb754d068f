//! Message types for the Elm-style architecture
//!
//! Every change a host makes to a [`Session`](crate::session::Session) can be
//! expressed as one of these messages and applied with
//! [`update`](crate::update::update).

use crate::layout::{AddingOption, AnchorId};
use crate::model::{FloatingWindowId, LayoutRef, Location, Rect, RegionId, SideBarLocation, Size};

/// Docking intents (panels moving between regions, windows and side bars)
#[derive(Debug, Clone, PartialEq)]
pub enum DockMsg {
    /// Dock a panel in a new region of `target`
    AddPanel {
        name: String,
        target: LayoutRef,
        location: Location,
        relative_to: Option<RegionId>,
        option: AddingOption,
    },
    /// Add a panel as a tab of an existing region
    AddPanelAsTab {
        name: String,
        region: RegionId,
        index: Option<usize>,
    },
    ClosePanel(String),
    /// Reopen a closed panel at its last position
    OpenPanel(String),
    FloatPanel {
        name: String,
        geometry: Option<Rect>,
    },
    DockFloatingWindow {
        window: FloatingWindowId,
        main_window: String,
        location: Location,
        relative_to: Option<RegionId>,
    },
    SetCurrentTab {
        region: RegionId,
        index: usize,
    },

    // === Side bars ===
    MoveToSideBar {
        name: String,
        location: SideBarLocation,
    },
    RestoreFromSideBar(String),
}

/// Window geometry intents
#[derive(Debug, Clone, PartialEq)]
pub enum WindowMsg {
    /// The window hosting `layout` was resized
    Resize { layout: LayoutRef, size: Size },
    /// A separator was dragged
    MoveSeparator {
        layout: LayoutRef,
        anchor: AnchorId,
        position: i32,
    },
}

/// Top-level message type
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    Dock(DockMsg),
    Window(WindowMsg),
}

impl From<DockMsg> for Msg {
    fn from(msg: DockMsg) -> Self {
        Msg::Dock(msg)
    }
}

impl From<WindowMsg> for Msg {
    fn from(msg: WindowMsg) -> Self {
        Msg::Window(msg)
    }
}
