//! Structural and geometric self-checks

use std::collections::BTreeSet;
use std::fmt;

use crate::model::{Orientation, Rect, Side};

use super::{AnchorId, AnchorType, ItemId, SplitterLayout};

/// A broken layout invariant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SanityIssue {
    StaticAnchorMisplaced { anchor: AnchorId, expected: i32, actual: i32 },
    AnchorOutOfBounds { anchor: AnchorId, position: i32, bounds: (i32, i32) },
    AnchorWithoutItems { anchor: AnchorId, side: Side },
    AnchorListsUnknownItem { anchor: AnchorId, item: ItemId },
    AnchorMissingExtent { anchor: AnchorId },
    FollowCycle { anchor: AnchorId },
    FolloweeOrientationMismatch { anchor: AnchorId, followee: AnchorId },
    ItemAnchorMismatch { item: ItemId, anchor: AnchorId },
    ItemTooSmall { item: ItemId, length: i32, min: i32, orientation: Orientation },
    ItemsOverlap { first: ItemId, second: ItemId },
    DuplicateRegion { item: ItemId },
    ItemOutsideCanvas { item: ItemId, geometry: Rect },
    StackingMismatch { stacked: usize, items: usize },
}

impl fmt::Display for SanityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SanityIssue::StaticAnchorMisplaced {
                anchor,
                expected,
                actual,
            } => write!(
                f,
                "static anchor {:?} at {} instead of {}",
                anchor, actual, expected
            ),
            SanityIssue::AnchorOutOfBounds {
                anchor,
                position,
                bounds,
            } => write!(
                f,
                "anchor {:?} at {} outside bounds {:?}",
                anchor, position, bounds
            ),
            SanityIssue::AnchorWithoutItems { anchor, side } => {
                write!(f, "anchor {:?} has no items on {:?}", anchor, side)
            }
            SanityIssue::AnchorListsUnknownItem { anchor, item } => {
                write!(f, "anchor {:?} lists unknown item {:?}", anchor, item)
            }
            SanityIssue::AnchorMissingExtent { anchor } => {
                write!(f, "anchor {:?} has a broken from/to extent", anchor)
            }
            SanityIssue::FollowCycle { anchor } => {
                write!(f, "anchor {:?} is part of a follow cycle", anchor)
            }
            SanityIssue::FolloweeOrientationMismatch { anchor, followee } => write!(
                f,
                "anchor {:?} follows {:?} of the other orientation",
                anchor, followee
            ),
            SanityIssue::ItemAnchorMismatch { item, anchor } => write!(
                f,
                "item {:?} and anchor {:?} disagree about their adjacency",
                item, anchor
            ),
            SanityIssue::ItemTooSmall {
                item,
                length,
                min,
                orientation,
            } => write!(
                f,
                "item {:?} is {}px along {:?}, minimum is {}",
                item, length, orientation, min
            ),
            SanityIssue::ItemsOverlap { first, second } => {
                write!(f, "items {:?} and {:?} overlap", first, second)
            }
            SanityIssue::DuplicateRegion { item } => {
                write!(f, "item {:?} shows a region shown elsewhere", item)
            }
            SanityIssue::ItemOutsideCanvas { item, geometry } => {
                write!(f, "item {:?} at {:?} sticks out of the canvas", item, geometry)
            }
            SanityIssue::StackingMismatch { stacked, items } => {
                write!(f, "{} items stacked but {} in the layout", stacked, items)
            }
        }
    }
}

impl SplitterLayout {
    /// Every invariant violation in the current state
    pub fn sanity_issues(&self) -> Vec<SanityIssue> {
        let mut issues = Vec::new();
        self.check_static_anchors(&mut issues);
        self.check_anchors(&mut issues);
        self.check_items(&mut issues);
        issues
    }

    /// Log every violation; true when the layout is sane
    pub fn check_sanity(&self) -> bool {
        let issues = self.sanity_issues();
        for issue in &issues {
            tracing::warn!("Layout sanity: {}", issue);
        }
        issues.is_empty()
    }

    /// Panic on the first violation
    #[cfg(debug_assertions)]
    pub fn assert_invariants(&self) {
        if let Some(issue) = self.sanity_issues().first() {
            panic!("Layout invariant violated: {}", issue);
        }
    }

    fn check_static_anchors(&self, issues: &mut Vec<SanityIssue>) {
        let st = self.config.static_separator_thickness;
        for anchor in self.anchors.values().filter(|a| a.is_static()) {
            let expected = match anchor.anchor_type {
                AnchorType::LeftStatic | AnchorType::TopStatic => 0,
                AnchorType::RightStatic => self.size.width - st,
                AnchorType::BottomStatic => self.size.height - st,
                AnchorType::Normal => continue,
            };
            if anchor.position != expected {
                issues.push(SanityIssue::StaticAnchorMisplaced {
                    anchor: anchor.id,
                    expected,
                    actual: anchor.position,
                });
            }
        }
    }

    fn check_anchors(&self, issues: &mut Vec<SanityIssue>) {
        let layout_fits = self.size.width >= self.min_size.width && self.size.height >= self.min_size.height;

        for anchor in self.anchors.values() {
            for side in [Side::Side1, Side::Side2] {
                for item in anchor.items(side) {
                    match self.items.get(item) {
                        None => issues.push(SanityIssue::AnchorListsUnknownItem {
                            anchor: anchor.id,
                            item: *item,
                        }),
                        Some(i) if i.anchor_at_side(side.opposite(), anchor.orientation) != anchor.id => {
                            issues.push(SanityIssue::ItemAnchorMismatch {
                                item: *item,
                                anchor: anchor.id,
                            })
                        }
                        Some(_) => {}
                    }
                }
            }

            if anchor.is_static() {
                continue;
            }

            for side in [Side::Side1, Side::Side2] {
                if !anchor.has_items(side) {
                    issues.push(SanityIssue::AnchorWithoutItems {
                        anchor: anchor.id,
                        side,
                    });
                }
            }

            let extent_ok = [anchor.from, anchor.to].iter().all(|end| {
                end.and_then(|id| self.anchors.get(&id))
                    .is_some_and(|a| a.orientation != anchor.orientation)
            });
            if !extent_ok {
                issues.push(SanityIssue::AnchorMissingExtent { anchor: anchor.id });
            }

            if let Some(followee) = anchor.followee {
                if self.orientation_of(followee) != anchor.orientation {
                    issues.push(SanityIssue::FolloweeOrientationMismatch {
                        anchor: anchor.id,
                        followee,
                    });
                }
                if self.follows_in_cycle(anchor.id) {
                    issues.push(SanityIssue::FollowCycle { anchor: anchor.id });
                }
            } else if layout_fits {
                let bounds = self.bound_positions_for_anchor(anchor.id);
                if anchor.position < bounds.0 || anchor.position > bounds.1 {
                    issues.push(SanityIssue::AnchorOutOfBounds {
                        anchor: anchor.id,
                        position: anchor.position,
                        bounds,
                    });
                }
            }
        }
    }

    pub(crate) fn follows_in_cycle(&self, start: AnchorId) -> bool {
        let mut seen = BTreeSet::new();
        let mut current = start;
        while let Some(next) = self.anchors.get(&current).and_then(|a| a.followee) {
            if !seen.insert(current) {
                return true;
            }
            current = next;
        }
        false
    }

    fn check_items(&self, issues: &mut Vec<SanityIssue>) {
        let layout_fits = self.size.width >= self.min_size.width && self.size.height >= self.min_size.height;
        let mut regions = BTreeSet::new();
        let mut visible = Vec::new();

        for item in self.items.values() {
            for orientation in Orientation::ALL {
                for side in [Side::Side1, Side::Side2] {
                    let anchor = item.anchor_at_side(side, orientation);
                    let listed = self
                        .anchors
                        .get(&anchor)
                        .is_some_and(|a| a.orientation == orientation && a.items(side.opposite()).contains(&item.id));
                    if !listed {
                        issues.push(SanityIssue::ItemAnchorMismatch {
                            item: item.id,
                            anchor,
                        });
                    }
                }
            }

            let Some(region) = item.region() else {
                continue;
            };
            if !regions.insert(region) {
                issues.push(SanityIssue::DuplicateRegion { item: item.id });
            }

            if let Some(rect) = self.item_geometry(item.id) {
                if layout_fits {
                    for orientation in Orientation::ALL {
                        let length = rect.length(orientation);
                        let min = item.min_length(orientation);
                        if length < min {
                            issues.push(SanityIssue::ItemTooSmall {
                                item: item.id,
                                length,
                                min,
                                orientation,
                            });
                        }
                    }
                }
                visible.push((item.id, rect));
            }
        }

        for (i, (first, rect)) in visible.iter().enumerate() {
            for (second, other) in visible.iter().skip(i + 1) {
                if rect.intersects(other) {
                    issues.push(SanityIssue::ItemsOverlap {
                        first: *first,
                        second: *second,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::layout::{AddingOption, Dockable};
    use crate::model::{Location, RegionId, Size};

    fn region(id: u64) -> Dockable {
        Dockable::Region {
            id: RegionId(id),
            min_size: Size::new(80, 90),
            size_hint: Size::new(200, 200),
        }
    }

    #[test]
    fn test_fresh_layout_is_sane() {
        let layout = SplitterLayout::new(Size::new(800, 600), LayoutConfig::default());
        assert!(layout.sanity_issues().is_empty());
        layout.assert_invariants();
    }

    #[test]
    fn test_grid_is_sane() {
        let mut layout = SplitterLayout::new(Size::new(800, 600), LayoutConfig::default());
        let a = layout.add_widget(region(1), Location::OnLeft, None, AddingOption::None)[0];
        layout.add_widget(region(2), Location::OnBottom, Some(a), AddingOption::None);
        layout.add_widget(region(3), Location::OnRight, None, AddingOption::None);
        layout.add_widget(region(4), Location::OnTop, None, AddingOption::None);
        assert_eq!(layout.sanity_issues(), Vec::new());
    }

    #[test]
    fn test_misplaced_static_anchor_detected() {
        let mut layout = SplitterLayout::new(Size::new(800, 600), LayoutConfig::default());
        let right = layout.static_group().right;
        layout.set_anchor_position(right, 500, false);
        assert!(matches!(
            layout.sanity_issues().first(),
            Some(SanityIssue::StaticAnchorMisplaced { expected: 799, actual: 500, .. })
        ));
        assert!(!layout.check_sanity());
    }

    #[test]
    fn test_out_of_bounds_anchor_detected() {
        let mut layout = SplitterLayout::new(Size::new(800, 600), LayoutConfig::default());
        layout.add_widget(region(1), Location::OnLeft, None, AddingOption::None);
        layout.add_widget(region(2), Location::OnRight, None, AddingOption::None);
        let separator = layout.anchors(Orientation::Vertical, false, true)[0];
        layout.set_anchor_position(separator, 20, false);
        assert!(layout
            .sanity_issues()
            .iter()
            .any(|i| matches!(i, SanityIssue::AnchorOutOfBounds { .. })));
    }
}
