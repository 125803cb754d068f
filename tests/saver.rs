//! Tests for saving and restoring whole-session layouts

mod common;

use common::{dock, install_factories, test_panel, test_session, two_panel_session, MAIN};
use dockyard::model::{LayoutRef, Location, Rect, SideBarLocation};
use dockyard::saver::{LayoutDocument, LayoutSaver, RestoreOptions, SERIALIZATION_VERSION};
use dockyard::session::{MainWindow, Session};

fn document(session: &Session) -> LayoutDocument {
    LayoutSaver::default().document(session).unwrap()
}

/// Empty session that builds whatever a document asks for
fn fresh_session(geometry: Rect) -> Session {
    let mut session = Session::default();
    install_factories(&mut session, geometry);
    session
}

// ============================================================================
// Round trips
// ============================================================================

#[test]
fn test_round_trip_into_fresh_session() {
    let original = two_panel_session(1000, 800);
    let saver = LayoutSaver::default();
    let data = saver.serialize_layout(&original).unwrap();

    let mut restored = fresh_session(Rect::new(0, 0, 1000, 800));
    assert!(saver.restore_layout(&mut restored, &data));

    assert_eq!(document(&restored), document(&original));
    assert!(restored.is_sane());
}

#[test]
fn test_round_trip_keeps_closed_panel_placeholder() {
    let mut original = two_panel_session(1000, 800);
    original.close_panel("right");
    let saver = LayoutSaver::default();
    let data = saver.serialize_layout(&original).unwrap();

    let mut restored = fresh_session(Rect::new(0, 0, 1000, 800));
    assert!(saver.restore_layout(&mut restored, &data));
    assert_eq!(document(&restored), document(&original));
    assert_eq!(restored.closed_panels(), vec!["right"]);

    // The closed panel still knows where it lived
    assert!(restored.open_panel("right"));
    assert_eq!(restored.panel_geometry("right").map(|r| r.width), Some(200));
    assert!(restored.is_sane());
}

#[test]
fn test_round_trip_with_side_bar() {
    let mut original = two_panel_session(1000, 800);
    original.move_to_sidebar("right", SideBarLocation::West);
    let saver = LayoutSaver::default();
    let data = saver.serialize_layout(&original).unwrap();

    let mut restored = fresh_session(Rect::new(0, 0, 1000, 800));
    assert!(saver.restore_layout(&mut restored, &data));
    let window = restored.main_window_by_name(MAIN).unwrap();
    assert_eq!(window.side_bar(SideBarLocation::West), ["right"]);
    assert!(restored.panel("right").unwrap().was_restored());
}

#[test]
fn test_restore_into_same_session() {
    let mut session = two_panel_session(1000, 800);
    let saver = LayoutSaver::default();
    let before = document(&session);
    let data = saver.serialize_layout(&session).unwrap();

    session.close_panel("left");
    session.float_panel("right", None);
    assert!(saver.restore_layout(&mut session, &data));

    assert_eq!(session.floating_windows().count(), 0);
    assert!(session.panel("left").unwrap().is_open());
    assert_eq!(document(&session).main_windows, before.main_windows);
    assert!(session.is_sane());
}

#[test]
fn test_floating_window_round_trip() {
    let mut original = two_panel_session(1000, 800);
    original.float_panel("right", Some(Rect::new(40, 40, 300, 200)));
    let saver = LayoutSaver::default();
    let data = saver.serialize_layout(&original).unwrap();

    let mut restored = fresh_session(Rect::new(0, 0, 1000, 800));
    assert!(saver.restore_layout(&mut restored, &data));

    let windows: Vec<_> = restored.floating_windows().collect();
    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].geometry, Rect::new(40, 40, 300, 200));
    assert!(matches!(
        restored.region_of_panel("right").and_then(|r| r.owner()),
        Some(LayoutRef::Floating(_))
    ));
    assert!(restored.is_sane());
}

// ============================================================================
// Files
// ============================================================================

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("layouts").join("default.json");
    let original = two_panel_session(1000, 800);
    let saver = LayoutSaver::default();

    assert!(saver.save_to_file(&original, &path));
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"serializationVersion\": 3"));
    assert!(text.contains("\"allDockWidgets\""));

    let mut restored = fresh_session(Rect::new(0, 0, 1000, 800));
    assert!(saver.restore_from_file(&mut restored, &path));
    assert_eq!(document(&restored), document(&original));
}

#[test]
fn test_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::default();
    assert!(!LayoutSaver::default().restore_from_file(&mut session, &dir.path().join("none.json")));
}

// ============================================================================
// Rejected input
// ============================================================================

#[test]
fn test_version_mismatch_changes_nothing() {
    let mut session = two_panel_session(1000, 800);
    let mut saved = document(&session);
    saved.serialization_version = SERIALIZATION_VERSION - 1;
    let data = saved.to_json();

    session.close_panel("right");
    let before = document(&session);
    assert!(!LayoutSaver::default().restore_layout(&mut session, &data));
    assert_eq!(document(&session), before);
    assert!(!session.panel("right").unwrap().is_open());
}

#[test]
fn test_garbage_is_rejected() {
    let mut session = two_panel_session(1000, 800);
    let before = document(&session);
    assert!(!LayoutSaver::default().restore_layout(&mut session, b"{ not json"));
    assert_eq!(document(&session), before);
}

#[test]
fn test_corrupt_layout_index_changes_nothing() {
    let mut session = two_panel_session(1000, 800);
    let mut saved = document(&session);
    saved.main_windows[0].multi_splitter_layout.layout.items[0].left_index = 42;
    assert!(!saved.is_valid());
    let data = saved.to_json();

    let before = document(&session);
    assert!(!LayoutSaver::default().restore_layout(&mut session, &data));
    assert_eq!(document(&session), before);
    assert!(session.panel("left").unwrap().is_open());
    assert!(session.panel("right").unwrap().is_open());
    assert_eq!(session.main_window_by_name(MAIN).unwrap().layout().visible_count(), 2);
    assert!(session.is_sane());
}

#[test]
fn test_rejected_document_keeps_restored_flags() {
    let mut session = two_panel_session(1000, 800);
    let saver = LayoutSaver::default();
    let data = saver.serialize_layout(&session).unwrap();
    assert!(saver.restore_layout(&mut session, &data));
    assert!(session.panel("left").unwrap().was_restored());

    assert!(!saver.restore_layout(&mut session, b"{ not json"));
    let mut saved = document(&session);
    saved.serialization_version = SERIALIZATION_VERSION + 1;
    assert!(!saver.restore_layout(&mut session, &saved.to_json()));

    let mut restored = saver.restored_panels(&session);
    restored.sort();
    assert_eq!(restored, vec!["left", "right"]);
}

#[test]
fn test_missing_main_window_factory_fails() {
    let original = two_panel_session(1000, 800);
    let data = LayoutSaver::default().serialize_layout(&original).unwrap();

    let mut session = Session::default();
    session.set_panel_factory(|name| Some(test_panel(name)));
    assert!(!LayoutSaver::default().restore_layout(&mut session, &data));
    assert!(!session.is_restoring());
}

// ============================================================================
// Options and filters
// ============================================================================

#[test]
fn test_relative_restore_scales_to_current_window() {
    let original = two_panel_session(1000, 800);
    let saved_left = original.panel_geometry("left").unwrap();
    let saved_right = original.panel_geometry("right").unwrap();
    let data = LayoutSaver::default().serialize_layout(&original).unwrap();

    let mut session = test_session(1200, 800, &["left", "right"]);
    let saver = LayoutSaver::new(RestoreOptions::RELATIVE_TO_MAIN_WINDOW);
    assert!(saver.restore_layout(&mut session, &data));

    let window = session.main_window_by_name(MAIN).unwrap();
    assert_eq!(window.geometry, Rect::new(0, 0, 1200, 800));

    let left = session.panel_geometry("left").unwrap();
    let right = session.panel_geometry("right").unwrap();
    let left_factor = left.width as f64 / saved_left.width as f64;
    let right_factor = right.width as f64 / saved_right.width as f64;
    assert!((left_factor - 1.2).abs() < 0.05, "left scaled by {}", left_factor);
    assert!((right_factor - 1.2).abs() < 0.05, "right scaled by {}", right_factor);
    assert_eq!(left.height, saved_left.height);
    assert_eq!(right.height, saved_right.height);
    assert!(session.is_sane());
}

#[test]
fn test_absolute_restore_applies_saved_geometry() {
    let original = two_panel_session(1000, 800);
    let data = LayoutSaver::default().serialize_layout(&original).unwrap();

    let mut session = test_session(1200, 800, &["left", "right"]);
    assert!(LayoutSaver::default().restore_layout(&mut session, &data));
    let window = session.main_window_by_name(MAIN).unwrap();
    assert_eq!(window.geometry, Rect::new(0, 0, 1000, 800));
}

#[test]
fn test_unknown_panel_is_floated_out() {
    let original = two_panel_session(1000, 800);
    let data = LayoutSaver::default().serialize_layout(&original).unwrap();

    let mut session = test_session(1000, 800, &["left", "right", "extra"]);
    dock(&mut session, "left", Location::OnLeft);
    dock(&mut session, "extra", Location::OnBottom);
    assert!(LayoutSaver::default().restore_layout(&mut session, &data));

    let extra = session.region_of_panel("extra").and_then(|r| r.owner().cloned());
    assert!(matches!(extra, Some(LayoutRef::Floating(_))));
    assert!(session.panel("extra").unwrap().is_open());
    assert!(!session.panel("extra").unwrap().was_restored());

    let mut restored = LayoutSaver::default().restored_panels(&session);
    restored.sort();
    assert_eq!(restored, vec!["left", "right"]);
    assert!(session.is_sane());
}

#[test]
fn test_affinity_filter_skips_other_windows() {
    let mut session = Session::default();
    session.add_main_window(
        MainWindow::new("editor")
            .with_geometry(Rect::new(0, 0, 800, 600))
            .with_affinities(&["editing"]),
    );
    session.add_main_window(
        MainWindow::new("debugger")
            .with_geometry(Rect::new(0, 0, 800, 600))
            .with_affinities(&["debugging"]),
    );

    let mut saver = LayoutSaver::default();
    saver.set_affinity_names(&["editing"]);
    let saved = saver.document(&session).unwrap();
    assert_eq!(saved.main_window_names(), vec!["editor".to_string()]);
}
