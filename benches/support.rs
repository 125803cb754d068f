//! Shared helpers for benchmarks

use dockyard::config::LayoutConfig;
use dockyard::layout::{AddingOption, Dockable, SplitterLayout};
use dockyard::model::{LayoutRef, Location, Panel, Rect, RegionId, Size};
use dockyard::session::{MainWindow, Session};

pub const MAIN: &str = "main";

pub fn region(id: u64) -> Dockable {
    Dockable::Region {
        id: RegionId(id),
        min_size: Size::new(80, 90),
        size_hint: Size::new(200, 200),
    }
}

/// A layout with `regions` regions, alternating columns and rows
#[allow(dead_code)]
pub fn make_layout(regions: usize) -> SplitterLayout {
    let mut layout = SplitterLayout::new(Size::new(1920, 1080), LayoutConfig::default());
    for i in 0..regions {
        let location = if i % 2 == 0 {
            Location::OnRight
        } else {
            Location::OnBottom
        };
        layout.add_widget(region(i as u64 + 1), location, None, AddingOption::None);
    }
    layout
}

/// A session whose main window holds `panels` docked panels
#[allow(dead_code)]
pub fn make_session(panels: usize) -> Session {
    let mut session = Session::default();
    install_factories(&mut session);
    session.add_main_window(MainWindow::new(MAIN).with_geometry(Rect::new(0, 0, 1920, 1080)));

    let target = LayoutRef::MainWindow(MAIN.to_string());
    for i in 0..panels {
        let name = format!("panel-{}", i);
        session.create_panel(Panel::new(&name).with_size_hint(Size::new(200, 200)));
        let location = if i % 2 == 0 {
            Location::OnRight
        } else {
            Location::OnBottom
        };
        session.add_panel(&name, &target, location, None, AddingOption::None);
    }
    session
}

/// Let a restore build missing windows and panels
#[allow(dead_code)]
pub fn install_factories(session: &mut Session) {
    session.set_main_window_factory(|name| {
        MainWindow::new(name).with_geometry(Rect::new(0, 0, 1920, 1080))
    });
    session.set_panel_factory(|name| Some(Panel::new(name).with_size_hint(Size::new(200, 200))));
}
