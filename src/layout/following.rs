//! Anchor following
//!
//! An anchor with only placeholders on one side follows the nearest anchor
//! with real content on that side, so hidden slots collapse to zero length.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{Orientation, Side};

use super::{AnchorGroup, AnchorId, SplitterLayout};

impl SplitterLayout {
    pub(crate) fn clear_anchors_following(&mut self) {
        for anchor in self.anchors.values_mut() {
            anchor.followee = None;
        }
    }

    /// The anchor every placeholder path from `from` towards `side` ends at
    ///
    /// Paths cross placeholder-only anchors and stop at the first anchor with
    /// real items on `side` (or a static one). When the paths end at different
    /// anchors there is no single place to collapse to and `None` is returned.
    pub fn find_nearest_anchor_with_items(&self, from: AnchorId, side: Side) -> Option<AnchorId> {
        let orientation = self.orientation_of(from);
        let mut pending = vec![from];
        let mut seen = BTreeSet::new();
        let mut end = None;

        while let Some(current) = pending.pop() {
            if !seen.insert(current) {
                continue;
            }
            if seen.len() > self.anchors.len() {
                tracing::warn!("find_nearest_anchor_with_items: no end from {:?}", from);
                return None;
            }
            let items = self.anchors.get(&current)?.items(side);
            if items.is_empty() {
                return None;
            }
            for item in items {
                let next = self.items.get(item)?.anchor_at_side(side, orientation);
                if self.is_static(next) || self.has_non_placeholder_items(next, side) {
                    match end {
                        None => end = Some(next),
                        Some(found) if found != next => return None,
                        Some(_) => {}
                    }
                } else {
                    pending.push(next);
                }
            }
        }
        end
    }

    /// Recompute which anchors follow which
    ///
    /// `removed_group` is the anchor group of an item that just went away or
    /// became a placeholder; the anchor on the far side of it can take over part
    /// of the freed space.
    pub fn update_anchor_following(&mut self, removed_group: Option<AnchorGroup>) {
        self.clear_anchors_following();

        let mut shifts: BTreeMap<AnchorId, i32> = BTreeMap::new();
        let ids: Vec<AnchorId> = self
            .anchors
            .values()
            .filter(|a| !a.is_static())
            .map(|a| a.id)
            .collect();

        for id in ids {
            let side = if self.only_has_placeholder_items(id, Side::Side2) {
                Side::Side2
            } else if self.only_has_placeholder_items(id, Side::Side1) {
                Side::Side1
            } else {
                continue;
            };

            let Some(to_follow) = self.find_nearest_anchor_with_items(id, side) else {
                continue;
            };
            if to_follow == id
                || self.anchors.get(&to_follow).and_then(|a| a.followee) == Some(id)
            {
                continue;
            }

            if let Some(group) = removed_group {
                if let Some(position) = self.removed_group_shift(id, to_follow, side, group) {
                    shifts.insert(to_follow, position);
                }
            }

            if let Some(anchor) = self.anchors.get_mut(&id) {
                anchor.followee = Some(to_follow);
            }
        }

        self.drop_inconsistent_following();

        for (anchor, position) in shifts {
            self.apply_shift(anchor, position, removed_group);
        }

        self.update_size_constraints();
        if self.size.width < self.min_size.width || self.size.height < self.min_size.height {
            let grown = self.size.expanded_to(self.min_size);
            tracing::debug!("Growing layout to {:?} to fit its minimum", grown);
            self.set_size(grown);
        }
        self.ensure_anchors_bounded(None);
    }

    /// Unfollow anchors until no real item collapses and no follow loop remains
    fn drop_inconsistent_following(&mut self) {
        for _ in 0..=self.anchors.len() {
            let broken = self.inconsistent_followers();
            if broken.is_empty() {
                return;
            }
            tracing::debug!("Dropping following of {:?}", broken);
            for id in broken {
                if let Some(anchor) = self.anchors.get_mut(&id) {
                    anchor.followee = None;
                }
            }
        }
        tracing::warn!("Following did not settle; clearing it");
        self.clear_anchors_following();
    }

    fn inconsistent_followers(&self) -> Vec<AnchorId> {
        let mut broken = BTreeSet::new();

        for anchor in self.anchors.values() {
            if anchor.is_following() && self.follows_in_cycle(anchor.id) {
                broken.insert(anchor.id);
            }
        }
        if !broken.is_empty() {
            return broken.into_iter().collect();
        }

        for item in self.items.values().filter(|i| !i.is_placeholder()) {
            for orientation in Orientation::ALL {
                let side1 = item.anchor_at_side(Side::Side1, orientation);
                let side2 = item.anchor_at_side(Side::Side2, orientation);
                if self.end_followee(side1) == self.end_followee(side2) {
                    broken.extend([side1, side2].into_iter().filter(|a| self.is_following(*a)));
                }
            }
        }
        if !broken.is_empty() {
            return broken.into_iter().collect();
        }

        // Collapsing must keep the separators of each orientation in a strict order
        for orientation in Orientation::ALL {
            if !self.effective_order_is_acyclic(orientation) {
                broken.extend(
                    self.anchors
                        .values()
                        .filter(|a| a.orientation == orientation && a.is_following())
                        .map(|a| a.id),
                );
            }
        }
        broken.into_iter().collect()
    }

    /// Whether "side 1 anchor comes before side 2 anchor" over all items is a partial order
    pub(crate) fn effective_order_is_acyclic(&self, orientation: Orientation) -> bool {
        let edges: BTreeSet<(AnchorId, AnchorId)> = self
            .items
            .values()
            .map(|item| {
                (
                    self.end_followee(item.anchor_at_side(Side::Side1, orientation)),
                    self.end_followee(item.anchor_at_side(Side::Side2, orientation)),
                )
            })
            .filter(|(l, r)| l != r)
            .collect();

        let mut incoming: BTreeMap<AnchorId, usize> = BTreeMap::new();
        for (l, r) in &edges {
            incoming.entry(*l).or_insert(0);
            *incoming.entry(*r).or_insert(0) += 1;
        }
        let mut ready: Vec<AnchorId> = incoming.iter().filter(|(_, n)| **n == 0).map(|(a, _)| *a).collect();
        let mut visited = 0;
        while let Some(anchor) = ready.pop() {
            visited += 1;
            for (_, r) in edges.iter().filter(|(l, _)| *l == anchor) {
                if let Some(n) = incoming.get_mut(r) {
                    *n -= 1;
                    if *n == 0 {
                        ready.push(*r);
                    }
                }
            }
        }
        visited == incoming.len()
    }

    /// Position `to_follow` would take to hand part of the removed space to its far side
    fn removed_group_shift(
        &self,
        follower: AnchorId,
        to_follow: AnchorId,
        side: Side,
        group: AnchorGroup,
    ) -> Option<i32> {
        if self.is_static(to_follow)
            || !group.contains_anchor(follower, side.opposite())
            || !self.only_has_placeholder_items(to_follow, side.opposite())
        {
            return None;
        }

        let share = self.config.removed_group_share;
        let follower_position = self.position_of(follower);
        let target_position = self.position_of(to_follow);
        let delta = match side {
            Side::Side2 => target_position - follower_position - self.thickness(follower),
            Side::Side1 => follower_position - target_position - self.thickness(to_follow),
        };
        let shift = (delta as f64 * share) as i32;
        if shift <= 0 {
            return None;
        }
        Some(target_position - side.sign() * shift)
    }

    fn apply_shift(&mut self, anchor: AnchorId, position: i32, removed_group: Option<AnchorGroup>) {
        if self.is_following(anchor) {
            return;
        }
        let current = self.position_of(anchor);
        let towards = if position < current {
            Side::Side1
        } else {
            Side::Side2
        };

        // A follower with real content on the side we move into would be squeezed
        let blocked = self.anchors_following(anchor).into_iter().any(|follower| {
            self.has_non_placeholder_items(follower, towards)
                && !removed_group.is_some_and(|g| g.contains_anchor(follower, towards))
        });
        if blocked {
            tracing::debug!("Not shifting anchor {:?}: a follower would be squeezed", anchor);
            return;
        }

        let (low, high) = self.bound_positions_for_anchor(anchor);
        let bounded = low.max(position.min(high));
        self.set_anchor_position(anchor, bounded, true);
    }
}
