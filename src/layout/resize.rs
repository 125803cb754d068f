//! Sizing: minimum lengths, anchor bounds, resize propagation and canvas resizes

use std::collections::{BTreeMap, HashMap};

use crate::model::{Orientation, Side, Size};

use super::{AnchorId, AnchorType, ItemId, LayoutEvent, SplitterLayout};

/// Passes of the forward/backward relaxation before giving up
const MAX_RELAX_PASSES: usize = 3;

/// Anchors moved by a resize propagation and how far each moved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationReport {
    moves: Vec<(AnchorId, i32)>,
}

impl PropagationReport {
    pub fn moves(&self) -> &[(AnchorId, i32)] {
        &self.moves
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Sum of all moves
    pub fn total(&self) -> i32 {
        self.moves.iter().map(|(_, delta)| delta).sum()
    }

    pub fn delta_for(&self, anchor: AnchorId) -> Option<i32> {
        self.moves
            .iter()
            .find(|(id, _)| *id == anchor)
            .map(|(_, delta)| *delta)
    }
}

impl SplitterLayout {
    // ========================================================================
    // Minimum lengths and bounds
    // ========================================================================

    /// Space needed from the canvas edge on `side` up to and including this anchor
    ///
    /// Works on effective anchors: items sitting on anchors that follow the
    /// one measured count as its own, and collapsed placeholders count as zero.
    pub fn cumulative_min_length(&self, anchor: AnchorId, side: Side) -> i32 {
        let mut groups: BTreeMap<AnchorId, Vec<AnchorId>> = BTreeMap::new();
        for id in self.anchors.keys() {
            groups.entry(self.end_followee(*id)).or_default().push(*id);
        }
        let mut memo = HashMap::new();
        self.cumulative_min_length_inner(self.end_followee(anchor), side, &groups, &mut memo, 0)
    }

    fn cumulative_min_length_inner(
        &self,
        id: AnchorId,
        side: Side,
        groups: &BTreeMap<AnchorId, Vec<AnchorId>>,
        memo: &mut HashMap<AnchorId, i32>,
        depth: usize,
    ) -> i32 {
        if let Some(value) = memo.get(&id) {
            return *value;
        }
        let Some(anchor) = self.anchors.get(&id) else {
            return 0;
        };
        let thickness = self.thickness(id);
        if depth > self.anchors.len() {
            tracing::warn!("cumulative_min_length: cycle through anchor {:?}", id);
            return thickness;
        }

        let orientation = anchor.orientation;
        let members = groups.get(&id).map(Vec::as_slice).unwrap_or(std::slice::from_ref(&anchor.id));
        let mut result = 0;
        for member in members {
            for item_id in self.items_on(*member, side) {
                let Some(item) = self.items.get(&item_id) else {
                    continue;
                };
                let next = self.end_followee(item.anchor_at_side(side, orientation));
                if next == id {
                    continue;
                }
                let min = item.min_length(orientation);
                result = result.max(self.cumulative_min_length_inner(next, side, groups, memo, depth + 1) + min);
            }
        }

        let own = if anchor.is_following() { 0 } else { thickness };
        let value = result + own;
        memo.insert(id, value);
        value
    }

    /// Range an anchor may move within without squeezing any item below its minimum
    pub fn bound_positions_for_anchor(&self, id: AnchorId) -> (i32, i32) {
        let Some(anchor) = self.anchors.get(&id) else {
            return (0, 0);
        };
        let st = self.config.static_separator_thickness;
        match anchor.anchor_type {
            AnchorType::LeftStatic | AnchorType::TopStatic => return (0, 0),
            AnchorType::RightStatic => {
                let p = self.size.width - st;
                return (p, p);
            }
            AnchorType::BottomStatic => {
                let p = self.size.height - st;
                return (p, p);
            }
            AnchorType::Normal => {}
        }

        let effective = self.end_followee(id);
        if effective != id && self.is_static(effective) {
            return self.bound_positions_for_anchor(effective);
        }

        let thickness = self.thickness(effective);
        let length = self.length(anchor.orientation);
        let min1 = self.cumulative_min_length(effective, Side::Side1);
        let min2 = self.cumulative_min_length(effective, Side::Side2);
        let bounds = ((min1 - thickness).max(0), (length - min2).max(0));
        if bounds.1 < bounds.0 {
            tracing::debug!("Anchor {:?} has inverted bounds {:?}", id, bounds);
        }
        bounds
    }

    /// Bound in the direction of `side`: lower bound for side 1, upper for side 2
    pub(crate) fn bound_towards(&self, id: AnchorId, side: Side) -> i32 {
        let (low, high) = self.bound_positions_for_anchor(id);
        match side {
            Side::Side1 => low,
            Side::Side2 => high,
        }
    }

    /// Lowest position an anchor may take given its real side 1 items
    pub(crate) fn min_position(&self, id: AnchorId) -> i32 {
        let orientation = self.orientation_of(id);
        self.items_on(id, Side::Side1)
            .iter()
            .filter_map(|i| self.items.get(i))
            .filter(|i| !i.is_placeholder())
            .map(|item| {
                let left = self.end_followee(item.anchor_at_side(Side::Side1, orientation));
                self.position_of(left) + self.thickness(left) + item.min_length(orientation)
            })
            .max()
            .unwrap_or(0)
    }

    pub fn update_size_constraints(&mut self) {
        let group = self.static_group;
        let min_size = Size::new(
            self.cumulative_min_length(group.left, Side::Side2),
            self.cumulative_min_length(group.top, Side::Side2),
        );
        if min_size != self.min_size {
            tracing::debug!("Minimum size changed {:?} -> {:?}", self.min_size, min_size);
            self.min_size = min_size;
            self.events.push(LayoutEvent::MinimumSizeChanged(min_size));
        }
    }

    // ========================================================================
    // Propagation
    // ========================================================================

    /// Push the anchors beyond `from` by a share of `delta` towards `direction`
    ///
    /// Each chain of anchors reachable from `from` shares the delta equally
    /// between its anchors. Anchors that already moved for a shorter chain are
    /// left alone.
    pub fn propagate_resize(&mut self, delta: i32, from: AnchorId, direction: Side) -> PropagationReport {
        let mut report = PropagationReport::default();
        if delta < 0 {
            tracing::warn!("propagate_resize: negative delta {}", delta);
        }
        if delta <= 0 || self.is_static(from) {
            return report;
        }

        let mut paths = Vec::new();
        self.collect_paths(&mut paths, Vec::new(), from, direction, 0);

        let mut contributed = vec![from];
        while !paths.is_empty() {
            let smallest = take_smallest_path(&mut paths);
            if smallest.len() <= 1 {
                continue;
            }

            let step = (delta / (smallest.len() as i32 - 1)) * direction.sign();
            if step.abs() < self.config.min_propagation_step {
                continue;
            }

            for anchor in smallest.iter().skip(1) {
                if contributed.contains(anchor) || self.is_following(*anchor) {
                    continue;
                }
                let bound = self.bound_towards(*anchor, direction);
                let old = self.position_of(*anchor);
                let new = match direction {
                    Side::Side1 => (old + step).max(bound),
                    Side::Side2 => (old + step).min(bound),
                };
                if new != old {
                    self.set_anchor_position(*anchor, new, true);
                    contributed.push(*anchor);
                    report.moves.push((*anchor, new - old));
                }
            }
        }

        tracing::trace!("propagate_resize from {:?}: {:?}", from, report);
        report
    }

    /// Every anchor chain from `from` to the canvas edge in `direction`
    pub(crate) fn collect_paths(
        &self,
        paths: &mut Vec<Vec<AnchorId>>,
        mut prefix: Vec<AnchorId>,
        from: AnchorId,
        direction: Side,
        depth: usize,
    ) {
        if self.is_static(from) || depth > self.anchors.len() {
            if !prefix.is_empty() {
                paths.push(prefix);
            }
            return;
        }
        prefix.push(from);

        let orientation = self.orientation_of(from);
        let next: Vec<AnchorId> = self
            .items_on(from, direction)
            .iter()
            .filter_map(|i| self.items.get(i))
            .map(|item| item.anchor_at_side(direction, orientation))
            .collect();

        if next.is_empty() {
            paths.push(prefix);
            return;
        }
        for anchor in next {
            self.collect_paths(paths, prefix.clone(), anchor, direction, depth + 1);
        }
    }

    // ========================================================================
    // Bounds enforcement
    // ========================================================================

    /// Move anchors until every real item is at least its minimum size
    ///
    /// `pinned` stays where it is; the anchors around it give way.
    pub fn ensure_anchors_bounded(&mut self, pinned: Option<AnchorId>) {
        self.position_static_anchors();
        for orientation in Orientation::ALL {
            self.relax_orientation(orientation, pinned);
        }
        self.sync_following_positions();
    }

    fn relax_orientation(&mut self, orientation: Orientation, pinned: Option<AnchorId>) {
        // (side 1 anchor, side 2 anchor, min length) for every item; placeholders
        // that did not collapse still keep their separators apart
        let constraints: Vec<(AnchorId, AnchorId, i32)> = self
            .items
            .values()
            .map(|item| {
                (
                    self.end_followee(item.anchor_at_side(Side::Side1, orientation)),
                    self.end_followee(item.anchor_at_side(Side::Side2, orientation)),
                    item.min_length(orientation),
                )
            })
            .filter(|(l, r, _)| l != r)
            .collect();
        if constraints.is_empty() {
            return;
        }

        let order = self.anchor_order(orientation, &constraints);

        for _ in 0..MAX_RELAX_PASSES {
            let mut changed = false;

            for anchor in &order {
                if self.is_static(*anchor) || Some(*anchor) == pinned {
                    continue;
                }
                let lowest = constraints
                    .iter()
                    .filter(|(_, r, _)| r == anchor)
                    .map(|(l, _, min)| self.position_of(*l) + self.thickness(*l) + min)
                    .max();
                if let Some(lowest) = lowest {
                    if self.position_of(*anchor) < lowest {
                        self.set_anchor_position(*anchor, lowest, true);
                        changed = true;
                    }
                }
            }

            for anchor in order.iter().rev() {
                if self.is_static(*anchor) || Some(*anchor) == pinned {
                    continue;
                }
                let thickness = self.thickness(*anchor);
                let highest = constraints
                    .iter()
                    .filter(|(l, _, _)| l == anchor)
                    .map(|(_, r, min)| self.position_of(*r) - min - thickness)
                    .min();
                if let Some(highest) = highest {
                    if self.position_of(*anchor) > highest {
                        self.set_anchor_position(*anchor, highest.max(0), true);
                        changed = true;
                    }
                }
            }

            if !changed {
                self.clamp_unconstrained(&order, &constraints, pinned);
                return;
            }
        }
        tracing::debug!("Anchors along {:?} could not be fully bounded", orientation);
    }

    /// Anchors no item ties down still have to stay inside their bounds
    fn clamp_unconstrained(
        &mut self,
        order: &[AnchorId],
        constraints: &[(AnchorId, AnchorId, i32)],
        pinned: Option<AnchorId>,
    ) {
        for anchor in order {
            if self.is_static(*anchor)
                || Some(*anchor) == pinned
                || constraints.iter().any(|(l, r, _)| l == anchor || r == anchor)
            {
                continue;
            }
            let (low, high) = self.bound_positions_for_anchor(*anchor);
            let position = self.position_of(*anchor);
            if low <= high && (position < low || position > high) {
                self.set_anchor_position(*anchor, position.clamp(low, high), true);
            }
        }
    }

    /// Non-following anchors of one orientation, side 1 to side 2
    fn anchor_order(&self, orientation: Orientation, constraints: &[(AnchorId, AnchorId, i32)]) -> Vec<AnchorId> {
        let mut order = self.anchors(orientation, true, false);
        let mut rank: BTreeMap<AnchorId, usize> = order.iter().map(|a| (*a, 0)).collect();

        for _ in 0..order.len() {
            let mut changed = false;
            for (l, r, _) in constraints {
                let next = rank.get(l).copied().unwrap_or(0) + 1;
                if let Some(current) = rank.get_mut(r) {
                    if *current < next {
                        *current = next;
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }

        order.sort_by_key(|a| (rank.get(a).copied().unwrap_or(0), self.position_of(*a), *a));
        order
    }

    // ========================================================================
    // Canvas resizes
    // ========================================================================

    /// Resize the canvas, keeping anchors at their relative positions
    ///
    /// Refuses sizes below the minimum and returns false.
    pub fn set_size(&mut self, size: Size) -> bool {
        if size == self.size {
            return true;
        }
        if size.width < self.min_size.width || size.height < self.min_size.height {
            tracing::warn!(
                "Refusing to resize layout to {:?}, below its minimum {:?}",
                size,
                self.min_size
            );
            return false;
        }

        let old_size = self.size;
        self.size = size;
        self.redistribute_space(old_size, size);
        self.ensure_anchors_bounded(None);
        self.events.push(LayoutEvent::SizeChanged(size));
        self.maybe_check_sanity();
        true
    }

    /// Resize along one orientation only
    pub fn set_content_length(&mut self, length: i32, orientation: Orientation) -> bool {
        let mut size = self.size;
        size.set_length(orientation, length);
        self.set_size(size)
    }

    fn redistribute_space(&mut self, old_size: Size, new_size: Size) {
        self.position_static_anchors();
        if old_size == new_size || !old_size.is_valid() || !new_size.is_valid() {
            return;
        }

        let group = self.static_group;
        if old_size.width != new_size.width {
            self.redistribute_from(group.left, 0, 0);
        }
        if old_size.height != new_size.height {
            self.redistribute_from(group.top, 0, 0);
        }
    }

    fn redistribute_from(&mut self, from: AnchorId, min_anchor_position: i32, depth: usize) {
        if depth > self.anchors.len() {
            return;
        }
        let orientation = self.orientation_of(from);
        let length = self.length(orientation);

        let next_anchors: Vec<AnchorId> = self
            .items_on(from, Side::Side2)
            .iter()
            .filter_map(|i| self.items.get(i))
            .map(|item| item.anchor_at_side(Side::Side2, orientation))
            .collect();

        for next in next_anchors {
            if self.is_static(next) {
                continue;
            }

            let mut min_position = min_anchor_position;
            if self.has_non_placeholder_items(next, Side::Side1) {
                min_position = self.min_position(next);
            }

            if self.has_non_placeholder_items(next, Side::Side2) && !self.is_following(next) {
                let percentage = self
                    .anchors
                    .get(&next)
                    .map_or(0.0, |a| a.position_percentage);
                let proposed = (percentage * length as f64).round() as i32;
                let (low, high) = self.bound_positions_for_anchor(next);
                let bounded = low.max(min_position.max(proposed.min(high)));
                self.set_anchor_position(next, bounded, false);
            }

            self.redistribute_from(next, min_position, depth + 1);
        }
    }

    // ========================================================================
    // Interactive moves
    // ========================================================================

    /// Drag a separator, clamped to its bounds; returns the applied position
    pub fn move_anchor(&mut self, id: AnchorId, position: i32) -> Option<i32> {
        let Some(anchor) = self.anchors.get(&id) else {
            tracing::warn!("move_anchor: unknown anchor {:?}", id);
            return None;
        };
        if anchor.is_static() || anchor.is_following() {
            tracing::warn!("move_anchor: anchor {:?} can't be moved", id);
            return None;
        }

        let (low, high) = self.bound_positions_for_anchor(id);
        let clamped = low.max(position.min(high));
        self.set_anchor_position(id, clamped, true);
        self.ensure_anchors_bounded(Some(id));
        self.maybe_check_sanity();
        Some(self.position_of(id))
    }

    /// Resize an item along `orientation` by moving one of its separators
    pub fn resize_item(&mut self, id: ItemId, length: i32, orientation: Orientation) -> bool {
        let Some(item) = self.items.get(&id) else {
            tracing::warn!("resize_item: unknown item {:?}", id);
            return false;
        };
        let side1 = item.anchor_at_side(Side::Side1, orientation);
        let side2 = item.anchor_at_side(Side::Side2, orientation);
        let Some(current) = self.item_geometry(id).map(|r| r.length(orientation)) else {
            return false;
        };
        let delta = length - current;
        if delta == 0 {
            return true;
        }

        let movable = |a: AnchorId| !self.is_static(a) && !self.is_following(a);
        if movable(side2) {
            let target = self.position_of(side2) + delta;
            self.move_anchor(side2, target).is_some()
        } else if movable(side1) {
            let target = self.position_of(side1) - delta;
            self.move_anchor(side1, target).is_some()
        } else {
            tracing::debug!("resize_item: item {:?} has no movable separator", id);
            false
        }
    }
}

/// Remove and return the shortest path; the last one wins ties
fn take_smallest_path(paths: &mut Vec<Vec<AnchorId>>) -> Vec<AnchorId> {
    let mut index = 0;
    for (i, path) in paths.iter().enumerate() {
        if path.len() <= paths[index].len() {
            index = i;
        }
    }
    paths.remove(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::layout::{AddingOption, Dockable};
    use crate::model::{Location, RegionId};

    fn region(id: u64) -> Dockable {
        Dockable::Region {
            id: RegionId(id),
            min_size: Size::new(80, 90),
            size_hint: Size::new(200, 200),
        }
    }

    /// A | B | C side by side on an 800x600 canvas
    fn three_columns() -> (SplitterLayout, Vec<ItemId>) {
        let mut layout = SplitterLayout::new(Size::new(800, 600), LayoutConfig::default());
        let mut ids = Vec::new();
        ids.extend(layout.add_widget(region(1), Location::OnLeft, None, AddingOption::None));
        ids.extend(layout.add_widget(region(2), Location::OnRight, None, AddingOption::None));
        ids.extend(layout.add_widget(region(3), Location::OnRight, None, AddingOption::None));
        (layout, ids)
    }

    fn separators(layout: &SplitterLayout) -> Vec<AnchorId> {
        let mut anchors = layout.anchors(Orientation::Vertical, false, true);
        anchors.sort_by_key(|a| layout.position_of(*a));
        anchors
    }

    // ========================================================================
    // Minimum lengths
    // ========================================================================

    #[test]
    fn test_min_size_sums_items_and_separators() {
        let (layout, _) = three_columns();
        assert_eq!(layout.min_size(), Size::new(1 + 80 + 5 + 80 + 5 + 80 + 1, 92));
    }

    #[test]
    fn test_bounds_between_two_items() {
        let mut layout = SplitterLayout::new(Size::new(800, 600), LayoutConfig::default());
        layout.add_widget(region(1), Location::OnLeft, None, AddingOption::None);
        layout.add_widget(region(2), Location::OnRight, None, AddingOption::None);
        let anchor = separators(&layout)[0];
        assert_eq!(layout.bound_positions_for_anchor(anchor), (81, 714));
    }

    #[test]
    fn test_static_bounds_are_fixed() {
        let layout = SplitterLayout::new(Size::new(800, 600), LayoutConfig::default());
        let group = layout.static_group();
        assert_eq!(layout.bound_positions_for_anchor(group.left), (0, 0));
        assert_eq!(layout.bound_positions_for_anchor(group.bottom), (599, 599));
    }

    // ========================================================================
    // Propagation
    // ========================================================================

    #[test]
    fn test_three_columns_geometry() {
        let (layout, ids) = three_columns();
        let anchors = separators(&layout);
        assert_eq!(layout.position_of(anchors[0]), 389);
        assert_eq!(layout.position_of(anchors[1]), 594);
        assert_eq!(layout.item_geometry(ids[1]).map(|r| r.width), Some(200));
        assert_eq!(layout.item_geometry(ids[2]).map(|r| r.width), Some(200));
    }

    #[test]
    fn test_propagate_resize_moves_chain() {
        let (mut layout, _) = three_columns();
        let anchors = separators(&layout);
        let report = layout.propagate_resize(20, anchors[1], Side::Side1);
        assert_eq!(report.delta_for(anchors[0]), Some(-20));
        assert_eq!(report.total(), -20);
        assert_eq!(layout.position_of(anchors[0]), 369);
        assert_eq!(layout.position_of(anchors[1]), 594);
    }

    #[test]
    fn test_propagate_resize_respects_bounds() {
        let (mut layout, _) = three_columns();
        let anchors = separators(&layout);
        layout.propagate_resize(1000, anchors[1], Side::Side1);
        assert_eq!(layout.position_of(anchors[0]), 81);
    }

    #[test]
    fn test_propagate_resize_ignores_small_steps() {
        let (mut layout, _) = three_columns();
        let anchors = separators(&layout);
        assert!(layout.propagate_resize(3, anchors[1], Side::Side1).is_empty());
        assert!(layout.propagate_resize(0, anchors[1], Side::Side1).is_empty());
    }

    #[test]
    fn test_take_smallest_path_prefers_last() {
        let mut paths = vec![
            vec![AnchorId(1), AnchorId(2)],
            vec![AnchorId(3)],
            vec![AnchorId(4)],
        ];
        assert_eq!(take_smallest_path(&mut paths), vec![AnchorId(4)]);
        assert_eq!(paths.len(), 2);
    }

    // ========================================================================
    // Moves and resizes
    // ========================================================================

    #[test]
    fn test_move_anchor_clamps_to_bounds() {
        let (mut layout, _) = three_columns();
        let anchors = separators(&layout);
        assert_eq!(layout.move_anchor(anchors[0], 10), Some(81));
        assert_eq!(layout.move_anchor(anchors[0], 300), Some(300));
        // Dragging past the neighbour pushes it along
        assert_eq!(layout.move_anchor(anchors[0], 700), Some(629));
        assert_eq!(layout.position_of(anchors[1]), 714);
    }

    #[test]
    fn test_move_static_anchor_refused() {
        let (mut layout, _) = three_columns();
        let left = layout.static_group().left;
        assert_eq!(layout.move_anchor(left, 10), None);
    }

    #[test]
    fn test_set_size_refuses_below_minimum() {
        let (mut layout, _) = three_columns();
        assert!(!layout.set_size(Size::new(100, 600)));
        assert_eq!(layout.size(), Size::new(800, 600));
    }

    #[test]
    fn test_set_size_keeps_items_valid() {
        let (mut layout, ids) = three_columns();
        assert!(layout.set_size(Size::new(1000, 700)));
        assert!(layout.check_sanity());
        let total: i32 = ids
            .iter()
            .filter_map(|id| layout.item_geometry(*id))
            .map(|r| r.width)
            .sum();
        assert_eq!(total, 1000 - 2 - 10);

        assert!(layout.set_size(Size::new(300, 200)));
        assert!(layout.check_sanity());
        for id in &ids {
            let rect = layout.item_geometry(*id).unwrap();
            assert!(rect.width >= 80);
            assert_eq!(rect.height, 198);
        }
    }

    #[test]
    fn test_resize_item_moves_separator() {
        let (mut layout, ids) = three_columns();
        assert!(layout.resize_item(ids[1], 250, Orientation::Vertical));
        assert_eq!(layout.item_geometry(ids[1]).map(|r| r.width), Some(250));
    }
}
