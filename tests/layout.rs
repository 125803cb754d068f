//! Tests for the splitter layout engine

mod common;

use common::{assert_anchors_bounded, vertical_separators};
use dockyard::config::LayoutConfig;
use dockyard::layout::{AddingOption, Dockable, ItemId, SplitterLayout};
use dockyard::model::{Location, Orientation, Rect, RegionId, Size};

fn layout(width: i32, height: i32) -> SplitterLayout {
    SplitterLayout::new(Size::new(width, height), LayoutConfig::default())
}

fn region(id: u64) -> Dockable {
    Dockable::Region {
        id: RegionId(id),
        min_size: Size::new(80, 90),
        size_hint: Size::new(200, 200),
    }
}

fn add(layout: &mut SplitterLayout, id: u64, location: Location, relative_to: Option<ItemId>) -> ItemId {
    layout.add_widget(region(id), location, relative_to, AddingOption::None)[0]
}

// ============================================================================
// Static anchors
// ============================================================================

#[test]
fn test_static_anchors_hug_the_canvas() {
    let mut layout = layout(800, 600);
    add(&mut layout, 1, Location::OnLeft, None);
    add(&mut layout, 2, Location::OnBottom, None);

    let group = layout.static_group();
    let position = |id| layout.anchor(id).unwrap().position();
    assert_eq!(position(group.left), 0);
    assert_eq!(position(group.top), 0);
    assert_eq!(position(group.right), 799);
    assert_eq!(position(group.bottom), 599);

    assert!(layout.set_size(Size::new(1024, 768)));
    let position = |id| layout.anchor(id).unwrap().position();
    assert_eq!(position(group.right), 1023);
    assert_eq!(position(group.bottom), 767);
}

// ============================================================================
// Insertion
// ============================================================================

#[test]
fn test_basic_insert_fills_canvas() {
    let mut layout = layout(800, 600);
    let a = add(&mut layout, 1, Location::OnLeft, None);
    assert_eq!(layout.item_geometry(a), Some(Rect::new(1, 1, 798, 598)));
    assert_eq!(layout.visible_count(), 1);
    assert!(layout.check_sanity());
}

#[test]
fn test_grid_of_four() {
    let mut layout = layout(1000, 800);
    let a = add(&mut layout, 1, Location::OnLeft, None);
    let b = add(&mut layout, 2, Location::OnRight, None);
    let c = add(&mut layout, 3, Location::OnBottom, Some(a));
    let d = add(&mut layout, 4, Location::OnBottom, Some(b));

    assert_eq!(layout.count(), 4);
    let rects: Vec<Rect> = [a, b, c, d].iter().map(|i| layout.item_geometry(*i).unwrap()).collect();
    for (i, first) in rects.iter().enumerate() {
        for second in &rects[i + 1..] {
            assert!(!first.intersects(second), "{:?} overlaps {:?}", first, second);
        }
    }
    assert!(layout.check_sanity());
    assert_anchors_bounded(&layout);
}

#[test]
fn test_insert_grows_small_canvas() {
    let mut layout = layout(200, 200);
    for id in 1..=4 {
        add(&mut layout, id, Location::OnRight, None);
    }
    assert!(layout.size().width >= layout.min_size().width);
    assert!(layout.check_sanity());
}

// ============================================================================
// Bounds invariant
// ============================================================================

#[test]
fn test_anchors_stay_bounded_through_operations() {
    let mut layout = layout(900, 700);
    let a = add(&mut layout, 1, Location::OnLeft, None);
    let b = add(&mut layout, 2, Location::OnRight, None);
    add(&mut layout, 3, Location::OnRight, None);
    add(&mut layout, 4, Location::OnBottom, Some(a));
    assert_anchors_bounded(&layout);

    let separators = vertical_separators(&layout);
    layout.move_anchor(separators[0], 5000);
    assert_anchors_bounded(&layout);

    layout.move_anchor(separators[0], -100);
    assert_anchors_bounded(&layout);

    assert!(layout.set_size(Size::new(500, 400)));
    assert_anchors_bounded(&layout);

    assert!(layout.remove_item(b));
    assert_anchors_bounded(&layout);
    assert!(layout.check_sanity());
}

// ============================================================================
// Removal
// ============================================================================

#[test]
fn test_removing_everything_leaves_static_anchors() {
    let mut layout = layout(800, 600);
    let ids = [
        add(&mut layout, 1, Location::OnLeft, None),
        add(&mut layout, 2, Location::OnRight, None),
        add(&mut layout, 3, Location::OnTop, None),
    ];
    for id in ids {
        assert!(layout.remove_item(id));
        assert!(layout.check_sanity());
    }
    assert!(layout.is_empty());
    assert_eq!(layout.anchor_ids().len(), 4);
}

#[test]
fn test_placeholder_count_tracks_state() {
    let mut layout = layout(800, 600);
    add(&mut layout, 1, Location::OnLeft, None);
    let b = add(&mut layout, 2, Location::OnRight, None);
    assert!(layout.ref_item(b));
    assert!(layout.turn_into_placeholder(b));
    assert_eq!(layout.placeholder_count(), 1);
    assert_eq!(layout.visible_count(), 1);

    assert!(layout.restore_placeholder(b, RegionId(2), Size::new(80, 90), Size::new(200, 200)));
    assert_eq!(layout.placeholder_count(), 0);
    assert_eq!(layout.item_for_region(RegionId(2)), Some(b));
}

// ============================================================================
// Propagation
// ============================================================================

#[test]
fn test_propagation_sums_to_delta() {
    let mut layout = layout(800, 600);
    add(&mut layout, 1, Location::OnLeft, None);
    add(&mut layout, 2, Location::OnRight, None);
    add(&mut layout, 3, Location::OnRight, None);
    let separators = vertical_separators(&layout);

    let report = layout.propagate_resize(30, separators[1], dockyard::model::Side::Side1);
    assert_eq!(report.total(), -30);
    assert_anchors_bounded(&layout);
}

// ============================================================================
// Nested layouts
// ============================================================================

#[test]
fn test_add_layout_keeps_relative_arrangement() {
    let mut nested = layout(400, 300);
    let x = add(&mut nested, 10, Location::OnLeft, None);
    let y = add(&mut nested, 11, Location::OnRight, None);

    let mut layout = layout(1000, 800);
    add(&mut layout, 1, Location::OnLeft, None);
    let mapping = layout.add_layout(nested, Location::OnRight, None);

    assert_eq!(mapping.len(), 2);
    let new_x = layout.item_geometry(mapping[&x]).unwrap();
    let new_y = layout.item_geometry(mapping[&y]).unwrap();
    assert!(new_x.right() < new_y.x);
    assert_eq!(new_x.height, new_y.height);
    assert_eq!(layout.count(), 3);
    assert!(layout.check_sanity());
}

// ============================================================================
// Serialization
// ============================================================================

#[test]
fn test_record_rebuilds_same_geometry() {
    let mut layout = layout(800, 600);
    let a = add(&mut layout, 1, Location::OnLeft, None);
    let b = add(&mut layout, 2, Location::OnRight, None);
    let c = add(&mut layout, 3, Location::OnBottom, Some(b));
    layout.move_anchor(vertical_separators(&layout)[0], 400);

    let record = layout.serialize();
    let restored = SplitterLayout::deserialize(&record, LayoutConfig::default(), |key| {
        key.parse::<RegionId>().ok().map(|id| (id, Size::new(80, 90)))
    })
    .unwrap();

    for (id, region) in [(a, 1), (b, 2), (c, 3)] {
        let item = restored.item_for_region(RegionId(region)).unwrap();
        assert_eq!(restored.item_geometry(item), layout.item_geometry(id));
    }
    assert_eq!(restored.serialize(), record);
    assert!(restored.check_sanity());
}

#[test]
fn test_wasted_spacing_with_three_columns() {
    let mut layout = layout(800, 600);
    for id in 1..=3 {
        add(&mut layout, id, Location::OnRight, None);
    }
    assert_eq!(layout.wasted_spacing(Orientation::Vertical), 1 + 5 + 5 + 1);
}
