//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use dockyard::layout::{AddingOption, AnchorId, SplitterLayout};
use dockyard::model::{LayoutRef, Location, Panel, Rect, Size};
use dockyard::session::{MainWindow, Session};

pub const MAIN: &str = "main";

/// Size hint every test panel asks for
pub const PANEL_HINT: Size = Size::new(200, 200);

pub fn main_ref() -> LayoutRef {
    LayoutRef::MainWindow(MAIN.to_string())
}

pub fn test_panel(name: &str) -> Panel {
    Panel::new(name).with_size_hint(PANEL_HINT)
}

/// A session with one main window of the given size and the named panels, all closed
pub fn test_session(width: i32, height: i32, panels: &[&str]) -> Session {
    let mut session = Session::default();
    assert!(session.add_main_window(MainWindow::new(MAIN).with_geometry(Rect::new(0, 0, width, height))));
    for name in panels {
        assert!(session.create_panel(test_panel(name)));
    }
    session
}

/// Dock a panel into the main window at the window edge
pub fn dock(session: &mut Session, name: &str, location: Location) {
    assert!(
        session.add_panel(name, &main_ref(), location, None, AddingOption::None),
        "failed to dock '{}'",
        name
    );
}

/// Session with `left` docked on the left and `right` docked on the right
pub fn two_panel_session(width: i32, height: i32) -> Session {
    let mut session = test_session(width, height, &["left", "right"]);
    dock(&mut session, "left", Location::OnLeft);
    dock(&mut session, "right", Location::OnRight);
    session
}

/// Make the session build unknown windows and panels on demand
pub fn install_factories(session: &mut Session, main_window_geometry: Rect) {
    session.set_main_window_factory(move |name| MainWindow::new(name).with_geometry(main_window_geometry));
    session.set_panel_factory(|name| Some(test_panel(name)));
}

/// Every movable, non-following anchor sits within its bounds
pub fn assert_anchors_bounded(layout: &SplitterLayout) {
    for id in layout.anchor_ids() {
        let anchor = layout.anchor(id).unwrap();
        if anchor.is_static() || anchor.is_following() {
            continue;
        }
        let (low, high) = layout.bound_positions_for_anchor(id);
        let position = anchor.position();
        assert!(
            low <= position && position <= high,
            "anchor #{} at {} outside [{}, {}]",
            id.0,
            position,
            low,
            high
        );
    }
}

/// The canvas is at least as large as the layout's minimum size
pub fn layout_fits(layout: &SplitterLayout) -> bool {
    let (size, min) = (layout.size(), layout.min_size());
    size.width >= min.width && size.height >= min.height
}

/// Every open panel docked in the main window has a positive size inside the canvas
pub fn assert_main_panels_on_canvas(session: &Session) {
    let Some(window) = session.main_window_by_name(MAIN) else {
        return;
    };
    let size = window.layout().size();
    for panel in session.panels().filter(|p| p.is_open()) {
        let in_main = session
            .region_of_panel(panel.name())
            .and_then(|r| r.owner())
            .is_some_and(|owner| *owner == main_ref());
        if !in_main {
            continue;
        }
        let Some(rect) = session.panel_geometry(panel.name()) else {
            continue;
        };
        assert!(
            rect.width > 0 && rect.height > 0 && rect.x >= 0 && rect.y >= 0,
            "'{}' has geometry {:?}",
            panel.name(),
            rect
        );
        assert!(
            rect.right() <= size.width && rect.bottom() <= size.height,
            "'{}' at {:?} leaves the {:?} canvas",
            panel.name(),
            rect,
            size
        );
    }
}

/// Movable vertical separators, left to right
pub fn vertical_separators(layout: &SplitterLayout) -> Vec<AnchorId> {
    let mut anchors = layout.anchors(dockyard::model::Orientation::Vertical, false, false);
    anchors.sort_by_key(|a| layout.anchor(*a).map(|a| a.position()));
    anchors
}
