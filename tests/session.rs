//! Tests for session-level docking operations

mod common;

use common::{
    assert_anchors_bounded, assert_main_panels_on_canvas, dock, layout_fits, main_ref, test_panel, test_session,
    two_panel_session, vertical_separators, MAIN,
};
use dockyard::layout::AddingOption;
use dockyard::model::{LayoutRef, Location, PanelOptions, Rect, RegionId, SideBarLocation, Size};
use dockyard::session::{MainWindow, MainWindowOptions, Session};
use proptest::prelude::*;
use proptest::test_runner::{RngAlgorithm, TestRng, TestRunner};

fn main_layout(session: &Session) -> &dockyard::layout::SplitterLayout {
    session.main_window_by_name(MAIN).unwrap().layout()
}

// ============================================================================
// Close / reopen
// ============================================================================

#[test]
fn test_close_collapses_into_placeholder() {
    let mut session = two_panel_session(800, 600);
    assert!(session.close_panel("right"));

    assert!(!session.panel("right").unwrap().is_open());
    assert_eq!(session.closed_panels(), vec!["right"]);
    assert_eq!(session.panel_geometry("left"), Some(Rect::new(1, 1, 798, 598)));
    assert_eq!(main_layout(&session).placeholder_count(), 1);
    assert_eq!(main_layout(&session).num_anchors_following(), 1);
    assert!(session.is_sane());
}

#[test]
fn test_reopen_restores_width() {
    let mut session = two_panel_session(800, 600);
    session.close_panel("right");
    assert!(session.open_panel("right"));

    let rect = session.panel_geometry("right").unwrap();
    assert_eq!(rect.width, 200);
    assert_eq!(rect.right(), 799);
    assert_eq!(main_layout(&session).placeholder_count(), 0);
    assert!(session.is_sane());
}

#[test]
fn test_start_hidden_opens_into_reserved_slot() {
    let mut session = test_session(800, 600, &["left", "bottom"]);
    dock(&mut session, "left", Location::OnLeft);
    assert!(session.add_panel("bottom", &main_ref(), Location::OnBottom, None, AddingOption::StartHidden));

    assert!(!session.panel("bottom").unwrap().is_open());
    assert_eq!(main_layout(&session).placeholder_count(), 1);

    assert!(session.open_panel("bottom"));
    let rect = session.panel_geometry("bottom").unwrap();
    assert_eq!(rect.x, 1);
    assert_eq!(rect.width, 798);
    assert_eq!(main_layout(&session).placeholder_count(), 0);
    assert!(session.is_sane());
}

#[test]
fn test_closing_twice_is_harmless() {
    let mut session = two_panel_session(800, 600);
    assert!(session.close_panel("right"));
    assert!(session.close_panel("right"));
    assert!(!session.close_panel("missing"));
    assert!(session.is_sane());
}

// ============================================================================
// Tabs
// ============================================================================

#[test]
fn test_tab_close_and_reopen_returns_to_region() {
    let mut session = two_panel_session(800, 600);
    session.create_panel(test_panel("extra"));
    let region = session.panel("left").unwrap().region().unwrap();

    assert!(session.add_panel_as_tab("extra", region, None));
    assert_eq!(session.region(region).unwrap().panels(), ["left", "extra"]);
    assert_eq!(session.region(region).unwrap().current_tab(), 1);

    assert!(session.close_panel("extra"));
    assert_eq!(session.region(region).unwrap().len(), 1);

    assert!(session.open_panel("extra"));
    assert_eq!(session.panel("extra").unwrap().region(), Some(region));
    assert_eq!(session.region(region).unwrap().index_of("extra"), Some(1));
    assert!(session.is_sane());
}

#[test]
fn test_set_current_tab_checks_range() {
    let mut session = two_panel_session(800, 600);
    let region = session.panel("left").unwrap().region().unwrap();
    assert!(session.set_current_tab(region, 0));
    assert!(!session.set_current_tab(region, 5));
}

// ============================================================================
// Floating
// ============================================================================

#[test]
fn test_float_then_dock_back() {
    let mut session = two_panel_session(800, 600);
    let id = session.float_panel("right", None).unwrap();

    let owner = session.region_of_panel("right").and_then(|r| r.owner().cloned());
    assert_eq!(owner, Some(LayoutRef::Floating(id)));
    assert!(session.panel("right").unwrap().last_position().was_floating);
    assert_eq!(session.floating_windows().count(), 1);
    assert!(session.is_sane());

    assert!(session.dock_floating_window(id, MAIN, Location::OnBottom, None));
    assert_eq!(session.floating_windows().count(), 0);
    let owner = session.region_of_panel("right").and_then(|r| r.owner().cloned());
    assert_eq!(owner, Some(main_ref()));
    assert!(!session.panel("right").unwrap().last_position().was_floating);
    assert!(session.is_sane());
}

#[test]
fn test_float_uses_size_hint() {
    let mut session = two_panel_session(800, 600);
    let id = session.float_panel("left", None).unwrap();
    let window = session.floating_window(id).unwrap();
    assert_eq!(window.geometry.size(), Size::new(200, 200));
}

#[test]
fn test_closing_floating_panel_removes_window() {
    let mut session = two_panel_session(800, 600);
    session.float_panel("right", Some(Rect::new(50, 60, 300, 250)));
    assert!(session.close_panel("right"));

    assert_eq!(session.floating_windows().count(), 0);
    assert_eq!(
        session.panel("right").unwrap().last_position().last_floating_geometry,
        Rect::new(50, 60, 300, 250)
    );

    // Back into the main window slot it came from
    assert!(session.open_panel("right"));
    let owner = session.region_of_panel("right").and_then(|r| r.owner().cloned());
    assert_eq!(owner, Some(main_ref()));
    assert_eq!(session.panel_geometry("right").map(|r| r.width), Some(200));
    assert!(session.is_sane());
}

#[test]
fn test_not_dockable_panel_only_floats() {
    let mut session = test_session(800, 600, &[]);
    let options = PanelOptions {
        not_dockable: true,
        ..PanelOptions::default()
    };
    session.create_panel(test_panel("tool").with_options(options));

    assert!(!session.add_panel("tool", &main_ref(), Location::OnLeft, None, AddingOption::None));
    assert!(session.float_panel("tool", None).is_some());
    assert!(session.panel("tool").unwrap().is_open());
}

// ============================================================================
// Side bars
// ============================================================================

#[test]
fn test_side_bar_round_trip() {
    let mut session = two_panel_session(800, 600);
    assert!(session.move_to_sidebar("right", SideBarLocation::East));

    let window = session.main_window_by_name(MAIN).unwrap();
    assert_eq!(window.side_bar(SideBarLocation::East), ["right"]);
    assert_eq!(window.side_bar_of("right"), Some(SideBarLocation::East));
    assert!(!session.panel("right").unwrap().is_open());
    assert!(session.closed_panels().is_empty());

    assert!(session.restore_from_sidebar("right"));
    let window = session.main_window_by_name(MAIN).unwrap();
    assert!(window.side_bar(SideBarLocation::East).is_empty());
    assert!(session.panel("right").unwrap().is_open());
    assert!(session.is_sane());
}

#[test]
fn test_floating_panel_cant_go_to_side_bar() {
    let mut session = two_panel_session(800, 600);
    session.float_panel("right", None);
    assert!(!session.move_to_sidebar("right", SideBarLocation::South));
}

// ============================================================================
// Windows and affinities
// ============================================================================

#[test]
fn test_resize_is_clamped_to_minimum() {
    let mut session = two_panel_session(800, 600);
    assert!(!session.resize_main_window(MAIN, Size::new(50, 50)));
    let layout = main_layout(&session);
    assert_eq!(layout.size(), layout.min_size());

    assert!(session.resize_main_window(MAIN, Size::new(1024, 768)));
    let window = session.main_window_by_name(MAIN).unwrap();
    assert_eq!(window.geometry.size(), Size::new(1024, 768));
    assert!(session.is_sane());
}

#[test]
fn test_affinity_mismatch_refuses_dock() {
    let mut session = Session::default();
    session.add_main_window(
        MainWindow::new("editor")
            .with_geometry(Rect::new(0, 0, 800, 600))
            .with_affinities(&["editing"]),
    );
    session.create_panel(test_panel("tools").with_affinities(&["debugging"]));
    session.create_panel(test_panel("outline").with_affinities(&["editing"]));

    let target = LayoutRef::MainWindow("editor".to_string());
    assert!(!session.add_panel("tools", &target, Location::OnLeft, None, AddingOption::None));
    assert!(session.add_panel("outline", &target, Location::OnLeft, None, AddingOption::None));
}

#[test]
fn test_central_region_survives_emptying() {
    let mut session = Session::default();
    session.add_main_window(
        MainWindow::new(MAIN)
            .with_geometry(Rect::new(0, 0, 800, 600))
            .with_options(MainWindowOptions { has_central: true }),
    );
    session.create_panel(test_panel("doc"));
    let central = session.main_window_by_name(MAIN).unwrap().central_region().unwrap();

    assert!(session.add_panel_as_tab("doc", central, None));
    assert!(session.close_panel("doc"));
    assert!(session.region(central).is_some());
    assert!(session.is_sane());
}

// ============================================================================
// Close / float / re-dock sequences
// ============================================================================

fn region_of(session: &Session, name: &str) -> RegionId {
    session.panel(name).and_then(|p| p.region()).unwrap()
}

fn assert_layout_holds(session: &Session) {
    let layout = main_layout(session);
    assert!(layout_fits(layout));
    assert_anchors_bounded(layout);
    assert_main_panels_on_canvas(session);
    assert!(session.is_sane());
}

#[test]
fn test_close_after_float_keeps_minimum_heights() {
    let mut session = test_session(800, 600, &["a", "b", "c", "d", "e"]);
    dock(&mut session, "c", Location::OnRight);
    let first = region_of(&session, "c");
    assert!(session.add_panel("b", &main_ref(), Location::OnBottom, Some(first), AddingOption::None));
    dock(&mut session, "e", Location::OnRight);
    assert!(session.add_panel("d", &main_ref(), Location::OnLeft, Some(first), AddingOption::None));
    dock(&mut session, "a", Location::OnTop);
    dock(&mut session, "c", Location::OnBottom);
    assert!(session.float_panel("d", None).is_some());
    assert_layout_holds(&session);

    assert!(session.close_panel("e"));
    assert_layout_holds(&session);
    let b = session.panel_geometry("b").unwrap();
    assert!(b.height >= 90, "b shrank to {:?}", b);
}

#[test]
fn test_redock_at_edge_keeps_neighbour_on_canvas() {
    let mut session = test_session(800, 600, &["a", "b", "c", "e"]);
    dock(&mut session, "e", Location::OnRight);
    dock(&mut session, "a", Location::OnLeft);
    let first = region_of(&session, "e");
    assert!(session.add_panel("b", &main_ref(), Location::OnLeft, Some(first), AddingOption::None));
    dock(&mut session, "c", Location::OnBottom);
    assert!(session.close_panel("b"));
    assert!(session.float_panel("c", None).is_some());
    assert_layout_holds(&session);

    dock(&mut session, "a", Location::OnLeft);
    assert_layout_holds(&session);
    let a = session.panel_geometry("a").unwrap();
    let e = session.panel_geometry("e").unwrap();
    assert!(e.width >= 80, "e squeezed to {:?}", e);
    assert!(a.right() <= e.x);
    assert_eq!(e.right(), 799);
}

// ============================================================================
// Seeded operation sequences
// ============================================================================

const PANELS: [&str; 5] = ["p0", "p1", "p2", "p3", "p4"];

#[derive(Debug, Clone)]
enum Step {
    Dock {
        panel: usize,
        location: Location,
        relative_to: Option<usize>,
    },
    Close(usize),
    Open(usize),
    Float(usize),
    Resize(i32, i32),
    MoveSeparator { index: usize, position: i32 },
}

fn location() -> impl Strategy<Value = Location> {
    prop_oneof![
        Just(Location::OnLeft),
        Just(Location::OnTop),
        Just(Location::OnRight),
        Just(Location::OnBottom),
    ]
}

fn step() -> impl Strategy<Value = Step> {
    let panel = 0..PANELS.len();
    prop_oneof![
        3 => (panel.clone(), location(), proptest::option::of(panel.clone()))
            .prop_map(|(panel, location, relative_to)| Step::Dock { panel, location, relative_to }),
        2 => panel.clone().prop_map(Step::Close),
        1 => panel.clone().prop_map(Step::Open),
        1 => panel.prop_map(Step::Float),
        1 => (300..1400i32, 300..1000i32).prop_map(|(w, h)| Step::Resize(w, h)),
        1 => (0..8usize, 0..1400i32).prop_map(|(index, position)| Step::MoveSeparator { index, position }),
    ]
}

fn apply(session: &mut Session, step: &Step) {
    match step {
        Step::Dock {
            panel,
            location,
            relative_to,
        } => {
            let relative_to = (*relative_to).and_then(|r| {
                session
                    .region_of_panel(PANELS[r])
                    .filter(|region| region.owner() == Some(&main_ref()))
                    .map(|region| region.id())
            });
            session.add_panel(PANELS[*panel], &main_ref(), *location, relative_to, AddingOption::None);
        }
        Step::Close(panel) => {
            session.close_panel(PANELS[*panel]);
        }
        Step::Open(panel) => {
            session.open_panel(PANELS[*panel]);
        }
        Step::Float(panel) => {
            session.float_panel(PANELS[*panel], None);
        }
        Step::Resize(width, height) => {
            session.resize_main_window(MAIN, Size::new(*width, *height));
        }
        Step::MoveSeparator { index, position } => {
            let separators = vertical_separators(main_layout(session));
            if !separators.is_empty() {
                let anchor = separators[index % separators.len()];
                session.move_separator(&main_ref(), anchor, *position);
            }
        }
    }
}

#[test]
fn test_seeded_sequences_keep_session_sane() {
    let config = ProptestConfig {
        cases: 64,
        failure_persistence: None,
        ..ProptestConfig::default()
    };
    let mut runner = TestRunner::new_with_rng(config, TestRng::deterministic_rng(RngAlgorithm::ChaCha));

    let result = runner.run(&prop::collection::vec(step(), 1..60), |steps| {
        let mut session = test_session(800, 600, &PANELS);
        for (n, step) in steps.iter().enumerate() {
            apply(&mut session, step);
            let layout = main_layout(&session);
            prop_assert!(layout_fits(layout), "step {} {:?}: canvas below minimum", n, step);
            assert_anchors_bounded(layout);
            assert_main_panels_on_canvas(&session);
            prop_assert!(session.is_sane(), "step {} {:?} left the session insane", n, step);
        }
        Ok(())
    });

    if let Err(e) = result {
        panic!("{}", e);
    }
}
