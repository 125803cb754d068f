//! Anchor-based splitter layout engine
//!
//! The canvas is partitioned by anchors (separator lines). Four static anchors
//! sit on the canvas edges; every other anchor separates the items on its
//! side 1 (left/top) from the items on its side 2 (right/bottom). Items are
//! grid cells holding a region or a placeholder, each bounded by an
//! [`AnchorGroup`].
//!
//! An anchor whose items on one side are all placeholders *follows* the
//! nearest anchor with real content on that side. Its effective position and
//! thickness are those of its end followee, which is how a closed panel's slot
//! collapses without disappearing.

mod anchor;
mod drop;
mod following;
mod item;
mod mdi;
mod resize;
mod sanity;
mod serialize;

use std::collections::BTreeMap;

pub use anchor::{Anchor, AnchorId, AnchorType};
pub use drop::Length;
pub use item::{AnchorGroup, Item, ItemContent, ItemId};
pub use mdi::{MdiItem, MdiLayout};
pub use resize::PropagationReport;
pub use sanity::SanityIssue;
pub use serialize::{AnchorRecord, ItemRecord, SplitterLayoutRecord};

use crate::config::LayoutConfig;
use crate::model::{Location, Orientation, Point, Rect, RegionId, Side, Size};

/// Region id reserved for the temporary cell a nested layout is merged into
const MERGE_CELL: RegionId = RegionId(u64::MAX);

// ============================================================================
// Events / inputs
// ============================================================================

/// Notifications produced by layout mutations, drained with [`SplitterLayout::take_events`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutEvent {
    WidgetAdded(ItemId),
    WidgetRemoved(ItemId),
    WidgetCountChanged(usize),
    VisibleWidgetCountChanged(usize),
    MinimumSizeChanged(Size),
    SizeChanged(Size),
}

/// Something that can be inserted into a layout
#[derive(Debug, Clone)]
pub enum Dockable {
    Region {
        id: RegionId,
        min_size: Size,
        size_hint: Size,
    },
    /// A whole layout merged into one cell, e.g. a floating window being docked
    Layout(SplitterLayout),
    /// A hidden slot remembered for a panel that starts closed
    Placeholder,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AddingOption {
    #[default]
    None,
    StartHidden,
}

// ============================================================================
// Layout
// ============================================================================

#[derive(Debug, Clone)]
pub struct SplitterLayout {
    config: LayoutConfig,
    size: Size,
    min_size: Size,
    anchors: BTreeMap<AnchorId, Anchor>,
    items: BTreeMap<ItemId, Item>,
    static_group: AnchorGroup,
    next_anchor_id: u64,
    next_item_id: u64,
    events: Vec<LayoutEvent>,
}

impl SplitterLayout {
    /// Empty layout with the four static anchors
    pub fn new(size: Size, config: LayoutConfig) -> Self {
        let mut layout = Self {
            config,
            size,
            min_size: Size::default(),
            anchors: BTreeMap::new(),
            items: BTreeMap::new(),
            static_group: AnchorGroup {
                left: AnchorId(0),
                top: AnchorId(1),
                right: AnchorId(2),
                bottom: AnchorId(3),
            },
            next_anchor_id: 0,
            next_item_id: 0,
            events: Vec::new(),
        };
        layout.create_static_anchors();
        layout.position_static_anchors();
        layout.update_size_constraints();
        layout.events.clear();
        layout
    }

    fn create_static_anchors(&mut self) {
        let left = self.create_anchor(Orientation::Vertical, AnchorType::LeftStatic);
        let top = self.create_anchor(Orientation::Horizontal, AnchorType::TopStatic);
        let right = self.create_anchor(Orientation::Vertical, AnchorType::RightStatic);
        let bottom = self.create_anchor(Orientation::Horizontal, AnchorType::BottomStatic);

        for (id, from, to) in [
            (left, top, bottom),
            (right, top, bottom),
            (top, left, right),
            (bottom, left, right),
        ] {
            if let Some(anchor) = self.anchors.get_mut(&id) {
                anchor.from = Some(from);
                anchor.to = Some(to);
            }
        }

        self.static_group = AnchorGroup {
            left,
            top,
            right,
            bottom,
        };
    }

    fn create_anchor(&mut self, orientation: Orientation, anchor_type: AnchorType) -> AnchorId {
        let id = AnchorId(self.next_anchor_id);
        self.next_anchor_id += 1;
        self.anchors
            .insert(id, Anchor::new(id, orientation, anchor_type));
        id
    }

    fn next_item(&mut self) -> ItemId {
        let id = ItemId(self.next_item_id);
        self.next_item_id += 1;
        id
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn min_size(&self) -> Size {
        self.min_size
    }

    pub fn width(&self) -> i32 {
        self.size.width
    }

    pub fn height(&self) -> i32 {
        self.size.height
    }

    /// Canvas length along an anchor orientation
    pub fn length(&self, orientation: Orientation) -> i32 {
        self.size.length(orientation)
    }

    pub fn static_group(&self) -> AnchorGroup {
        self.static_group
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn item_ids(&self) -> Vec<ItemId> {
        self.items.keys().copied().collect()
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    /// Position of an item in serialization order
    pub fn item_index(&self, id: ItemId) -> Option<usize> {
        self.items.keys().position(|k| *k == id)
    }

    pub fn item_at_index(&self, index: usize) -> Option<ItemId> {
        self.items.keys().nth(index).copied()
    }

    pub fn anchor(&self, id: AnchorId) -> Option<&Anchor> {
        self.anchors.get(&id)
    }

    pub fn anchor_ids(&self) -> Vec<AnchorId> {
        self.anchors.keys().copied().collect()
    }

    /// Anchors of one orientation, optionally including static and following ones
    pub fn anchors(
        &self,
        orientation: Orientation,
        include_static: bool,
        include_following: bool,
    ) -> Vec<AnchorId> {
        self.anchors
            .values()
            .filter(|a| a.orientation == orientation)
            .filter(|a| include_static || !a.is_static())
            .filter(|a| include_following || !a.is_following())
            .map(|a| a.id)
            .collect()
    }

    /// Anchors directly following `followee`
    pub fn anchors_following(&self, followee: AnchorId) -> Vec<AnchorId> {
        self.anchors
            .values()
            .filter(|a| a.followee == Some(followee))
            .map(|a| a.id)
            .collect()
    }

    pub fn num_anchors_following(&self) -> usize {
        self.anchors.values().filter(|a| a.is_following()).count()
    }

    /// Number of items, placeholders included
    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn visible_count(&self) -> usize {
        self.items.values().filter(|i| !i.is_placeholder()).count()
    }

    pub fn placeholder_count(&self) -> usize {
        self.items.values().filter(|i| i.is_placeholder()).count()
    }

    pub fn has_visible_items(&self) -> bool {
        self.items.values().any(|i| !i.is_placeholder())
    }

    /// Pixels spent on separators along an orientation
    pub fn wasted_spacing(&self, orientation: Orientation) -> i32 {
        let num_anchors = self
            .anchors
            .values()
            .filter(|a| a.orientation == orientation)
            .count() as i32;
        2 * self.config.static_separator_thickness
            + (num_anchors - 2) * self.config.separator_thickness
    }

    pub fn item_for_region(&self, region: RegionId) -> Option<ItemId> {
        self.items
            .values()
            .find(|i| i.region() == Some(region))
            .map(|i| i.id)
    }

    pub fn regions(&self) -> Vec<RegionId> {
        self.items.values().filter_map(|i| i.region()).collect()
    }

    /// Geometry of an item, computed from its anchors' effective positions
    pub fn item_geometry(&self, id: ItemId) -> Option<Rect> {
        let item = self.items.get(&id)?;
        let group = item.group;
        let left = self.end_followee(group.left);
        let top = self.end_followee(group.top);
        let right = self.end_followee(group.right);
        let bottom = self.end_followee(group.bottom);

        let x = self.position_of(left) + self.thickness(left);
        let y = self.position_of(top) + self.thickness(top);
        Some(Rect::new(
            x,
            y,
            self.position_of(right) - x,
            self.position_of(bottom) - y,
        ))
    }

    /// Visible region item containing `point`
    pub fn item_at(&self, point: Point) -> Option<ItemId> {
        self.items
            .values()
            .filter(|i| !i.is_placeholder())
            .find(|i| {
                self.item_geometry(i.id)
                    .is_some_and(|r| r.contains(point))
            })
            .map(|i| i.id)
    }

    /// Rectangle covered by a separator
    pub fn anchor_geometry(&self, id: AnchorId) -> Option<Rect> {
        let anchor = self.anchors.get(&id)?;
        let effective = self.end_followee(id);
        let position = self.position_of(effective);
        let thickness = self.thickness(effective);
        let perpendicular = anchor.orientation.opposite();

        let start = anchor
            .from
            .map(|from| {
                let from = self.end_followee(from);
                self.position_of(from) + self.thickness(from)
            })
            .unwrap_or(0);
        let end = anchor
            .to
            .map(|to| self.position_of(self.end_followee(to)))
            .unwrap_or_else(|| self.length(perpendicular));

        Some(match anchor.orientation {
            Orientation::Vertical => Rect::new(position, start, thickness, end - start),
            Orientation::Horizontal => Rect::new(start, position, end - start, thickness),
        })
    }

    /// Drain pending notifications
    pub fn take_events(&mut self) -> Vec<LayoutEvent> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // Anchor helpers
    // ========================================================================

    pub(crate) fn thickness(&self, id: AnchorId) -> i32 {
        match self.anchors.get(&id) {
            Some(anchor) if anchor.is_static() => self.config.static_separator_thickness,
            Some(_) => self.config.separator_thickness,
            None => 0,
        }
    }

    pub(crate) fn position_of(&self, id: AnchorId) -> i32 {
        self.anchors.get(&id).map_or(0, |a| a.position)
    }

    pub(crate) fn is_static(&self, id: AnchorId) -> bool {
        self.anchors.get(&id).is_some_and(|a| a.is_static())
    }

    pub(crate) fn is_following(&self, id: AnchorId) -> bool {
        self.anchors.get(&id).is_some_and(|a| a.is_following())
    }

    pub(crate) fn orientation_of(&self, id: AnchorId) -> Orientation {
        self.anchors
            .get(&id)
            .map_or(Orientation::Vertical, |a| a.orientation)
    }

    pub(crate) fn items_on(&self, id: AnchorId, side: Side) -> Vec<ItemId> {
        self.anchors
            .get(&id)
            .map(|a| a.items(side).to_vec())
            .unwrap_or_default()
    }

    pub(crate) fn has_items(&self, id: AnchorId, side: Side) -> bool {
        self.anchors.get(&id).is_some_and(|a| a.has_items(side))
    }

    pub(crate) fn has_non_placeholder_items(&self, id: AnchorId, side: Side) -> bool {
        self.anchors.get(&id).is_some_and(|a| {
            a.items(side)
                .iter()
                .any(|i| self.items.get(i).is_some_and(|item| !item.is_placeholder()))
        })
    }

    /// No real content on `side` (an empty side counts too)
    pub(crate) fn only_has_placeholder_items(&self, id: AnchorId, side: Side) -> bool {
        !self.has_non_placeholder_items(id, side)
    }

    /// Last anchor of the follow chain starting at `id`
    pub fn end_followee(&self, id: AnchorId) -> AnchorId {
        let mut current = id;
        for _ in 0..=self.anchors.len() {
            match self.anchors.get(&current).and_then(|a| a.followee) {
                Some(next) if next != id => current = next,
                _ => return current,
            }
        }
        tracing::warn!("Follow chain starting at {:?} does not terminate", id);
        current
    }

    pub(crate) fn set_anchor_position(&mut self, id: AnchorId, position: i32, recalculate_percentage: bool) {
        let length = self.length(self.orientation_of(id));
        if let Some(anchor) = self.anchors.get_mut(&id) {
            anchor.position = position;
            if recalculate_percentage && length > 0 {
                anchor.position_percentage = position as f64 / length as f64;
            }
        }
    }

    pub(crate) fn position_static_anchors(&mut self) {
        let st = self.config.static_separator_thickness;
        let group = self.static_group;
        self.set_anchor_position(group.left, 0, true);
        self.set_anchor_position(group.top, 0, true);
        self.set_anchor_position(group.right, self.size.width - st, true);
        self.set_anchor_position(group.bottom, self.size.height - st, true);
    }

    /// Copy each following anchor's effective position into its own
    pub(crate) fn sync_following_positions(&mut self) {
        let following: Vec<(AnchorId, i32)> = self
            .anchors
            .values()
            .filter(|a| a.is_following())
            .map(|a| (a.id, self.position_of(self.end_followee(a.id))))
            .collect();
        for (id, position) in following {
            self.set_anchor_position(id, position, false);
        }
    }

    fn register_item(&mut self, id: ItemId) {
        let Some(group) = self.items.get(&id).map(|i| i.group) else {
            return;
        };
        for (anchor, side) in [
            (group.left, Side::Side2),
            (group.right, Side::Side1),
            (group.top, Side::Side2),
            (group.bottom, Side::Side1),
        ] {
            if let Some(anchor) = self.anchors.get_mut(&anchor) {
                anchor.add_item(id, side);
            }
        }
    }

    fn emit_count_changes(&mut self, old_count: usize, old_visible: usize) {
        if self.items.len() != old_count {
            self.events
                .push(LayoutEvent::WidgetCountChanged(self.items.len()));
        }
        let visible = self.visible_count();
        if visible != old_visible {
            self.events
                .push(LayoutEvent::VisibleWidgetCountChanged(visible));
        }
    }

    pub(crate) fn maybe_check_sanity(&self) {
        if self.config.check_sanity_after_ops {
            self.check_sanity();
        }
    }

    // ========================================================================
    // Insertion
    // ========================================================================

    fn validate_inputs(
        &self,
        region: Option<RegionId>,
        is_placeholder: bool,
        location: Location,
        relative_to: Option<ItemId>,
        option: AddingOption,
    ) -> bool {
        let start_hidden = option == AddingOption::StartHidden;
        if is_placeholder != start_hidden {
            tracing::warn!(
                "Wrong parameters: placeholder={} start_hidden={}",
                is_placeholder,
                start_hidden
            );
            return false;
        }

        if let Some(id) = region {
            if self.item_for_region(id).is_some() {
                tracing::warn!("Layout already contains region {}", id);
                return false;
            }
        }

        if location == Location::None {
            tracing::warn!("Not adding to location None");
            return false;
        }

        if let Some(relative) = relative_to {
            if !self.items.contains_key(&relative) {
                tracing::warn!("Layout doesn't contain relative item {:?}", relative);
                return false;
            }
        }

        true
    }

    /// Insert a widget at `location`, relative to an item or the whole layout
    ///
    /// Returns the ids of the items created; empty when the input was rejected.
    pub fn add_widget(
        &mut self,
        widget: Dockable,
        location: Location,
        relative_to: Option<ItemId>,
        option: AddingOption,
    ) -> Vec<ItemId> {
        tracing::debug!(
            "add_widget location={} relative_to={:?} size={:?}",
            location.as_str(),
            relative_to,
            self.size
        );

        let region = match &widget {
            Dockable::Region { id, .. } => Some(*id),
            _ => None,
        };
        let is_placeholder = matches!(widget, Dockable::Placeholder);
        if !self.validate_inputs(region, is_placeholder, location, relative_to, option) {
            return Vec::new();
        }

        match widget {
            Dockable::Region {
                id,
                min_size,
                size_hint,
            } => self
                .add_region(id, min_size, size_hint, location, relative_to)
                .into_iter()
                .collect(),
            Dockable::Layout(layout) => self
                .add_layout(layout, location, relative_to)
                .into_values()
                .collect(),
            Dockable::Placeholder => self
                .add_placeholder(location, relative_to)
                .into_iter()
                .collect(),
        }
    }

    fn add_region(
        &mut self,
        region: RegionId,
        min_size: Size,
        size_hint: Size,
        location: Location,
        relative_to: Option<ItemId>,
    ) -> Option<ItemId> {
        let lfd = self.resolve_drop_length(min_size, size_hint, location, relative_to)?;

        let old_count = self.items.len();
        let old_visible = self.visible_count();
        let id = self.insert_item(
            ItemContent::Region(region),
            min_size,
            size_hint,
            location,
            relative_to,
            Some(lfd),
        )?;

        self.update_anchor_following(None);
        self.events.push(LayoutEvent::WidgetAdded(id));
        self.emit_count_changes(old_count, old_visible);
        self.maybe_check_sanity();
        Some(id)
    }

    /// Drop length for a widget, growing the canvas when there is no room
    fn resolve_drop_length(
        &mut self,
        min_size: Size,
        size_hint: Size,
        location: Location,
        relative_to: Option<ItemId>,
    ) -> Option<Length> {
        let mut lfd = self.length_for_drop(min_size, size_hint, location, relative_to);
        if lfd.is_null() {
            self.ensure_enough_size(min_size, location, relative_to);
            lfd = self.length_for_drop(min_size, size_hint, location, relative_to);
        }
        if lfd.is_null() && !self.items.is_empty() {
            tracing::warn!(
                "No room to drop a widget of min size {:?} at {} (size {:?})",
                min_size,
                location.as_str(),
                self.size
            );
            return None;
        }
        Some(lfd)
    }

    /// Insert a hidden slot that remembers a position for a closed panel
    pub fn add_placeholder(&mut self, location: Location, relative_to: Option<ItemId>) -> Option<ItemId> {
        if !self.validate_inputs(None, true, location, relative_to, AddingOption::StartHidden) {
            return None;
        }

        let old_count = self.items.len();
        let old_visible = self.visible_count();
        let id = self.insert_item(
            ItemContent::Placeholder,
            Size::default(),
            Size::default(),
            location,
            relative_to,
            None,
        )?;
        self.update_anchor_following(None);
        self.emit_count_changes(old_count, old_visible);
        self.maybe_check_sanity();
        Some(id)
    }

    /// Create the item and the anchor that separates it from its neighbours
    ///
    /// Anchor positions are only computed when `lfd` is given.
    fn insert_item(
        &mut self,
        content: ItemContent,
        min_size: Size,
        size_hint: Size,
        location: Location,
        relative_to: Option<ItemId>,
        lfd: Option<Length>,
    ) -> Option<ItemId> {
        let orientation = location.anchor_orientation()?;
        let inward = location.inward_side()?;

        let id = self.next_item();

        if self.items.is_empty() {
            let mut item = Item::new(id, content, self.static_group, min_size);
            item.size_hint = size_hint;
            self.items.insert(id, item);
            self.register_item(id);
            return Some(id);
        }

        let target = match relative_to {
            Some(relative) => self.items.get(&relative)?.group,
            None => self.static_group,
        };
        let outward = inward.opposite();
        let source = target.anchor_at_side(outward, orientation);
        let source_effective = self.end_followee(source);
        let perpendicular = orientation.opposite();

        let new_anchor = self.create_anchor(orientation, AnchorType::Normal);
        let start_position = self.position_of(source_effective);
        self.set_anchor_position(new_anchor, start_position, true);
        if let Some(anchor) = self.anchors.get_mut(&new_anchor) {
            anchor.from = Some(target.anchor_at_side(Side::Side1, perpendicular));
            anchor.to = Some(target.anchor_at_side(Side::Side2, perpendicular));
        }

        // Move whatever sat against the source anchor over to the new anchor
        let moving: Vec<ItemId> = match relative_to {
            Some(relative) => vec![relative],
            None => self.items_on(source, inward),
        };
        for moved in &moving {
            if let Some(anchor) = self.anchors.get_mut(&source) {
                anchor.items_mut(inward).retain(|i| i != moved);
            }
            if let Some(anchor) = self.anchors.get_mut(&new_anchor) {
                anchor.add_item(*moved, inward);
            }
            if let Some(item) = self.items.get_mut(moved) {
                item.group.set_anchor_at_side(outward, orientation, new_anchor);
            }
        }

        if relative_to.is_none() {
            // Perpendicular anchors that started at the canvas edge now start at the new anchor
            let ids: Vec<AnchorId> = self
                .anchors
                .values()
                .filter(|a| a.orientation == perpendicular && !a.is_static())
                .map(|a| a.id)
                .collect();
            for anchor_id in ids {
                if let Some(anchor) = self.anchors.get_mut(&anchor_id) {
                    match inward {
                        Side::Side2 if anchor.from == Some(source) => {
                            anchor.from = Some(new_anchor)
                        }
                        Side::Side1 if anchor.to == Some(source) => anchor.to = Some(new_anchor),
                        _ => {}
                    }
                }
            }
        }

        let mut group = target;
        group.set_anchor_at_side(outward, orientation, source);
        group.set_anchor_at_side(inward, orientation, new_anchor);
        let mut item = Item::new(id, content, group, min_size);
        item.size_hint = size_hint;
        self.items.insert(id, item);
        self.register_item(id);

        if let Some(lfd) = lfd {
            self.position_inserted(source_effective, new_anchor, inward, lfd);
        }

        Some(id)
    }

    /// Move the source anchor and the freshly created anchor to make room
    fn position_inserted(&mut self, source: AnchorId, new_anchor: AnchorId, inward: Side, lfd: Length) {
        let new_thickness = self.config.separator_thickness;
        let length = lfd.length();
        let source_is_static = self.is_static(source);

        match inward {
            Side::Side2 => {
                if lfd.side1 > 0 && !source_is_static {
                    self.propagate_resize(lfd.side1, source, Side::Side1);
                    let moved = self.position_of(source) - lfd.side1;
                    self.set_anchor_position(source, moved, true);
                }
                let position = self.position_of(source) + self.thickness(source) + length;
                self.set_anchor_position(new_anchor, position, true);
                self.propagate_resize(lfd.side2 + new_thickness, new_anchor, Side::Side2);
            }
            Side::Side1 => {
                if lfd.side2 > 0 && !source_is_static {
                    self.propagate_resize(lfd.side2, source, Side::Side2);
                    let moved = self.position_of(source) + lfd.side2;
                    self.set_anchor_position(source, moved, true);
                }
                let position = self.position_of(source) - length - new_thickness;
                self.set_anchor_position(new_anchor, position, true);
                self.propagate_resize(lfd.side1 + new_thickness, new_anchor, Side::Side1);
            }
        }
    }

    /// Merge another layout into a new cell, returning old item id -> new item id
    pub fn add_layout(
        &mut self,
        other: SplitterLayout,
        location: Location,
        relative_to: Option<ItemId>,
    ) -> BTreeMap<ItemId, ItemId> {
        let mut mapping = BTreeMap::new();
        if other.is_empty() {
            tracing::warn!("Refusing to merge an empty layout");
            return mapping;
        }
        if !self.validate_inputs(None, false, location, relative_to, AddingOption::None) {
            return mapping;
        }

        let min_size = other.min_size();
        let lfd = if other.has_visible_items() {
            match self.resolve_drop_length(min_size, other.size(), location, relative_to) {
                Some(lfd) => Some(lfd),
                None => return mapping,
            }
        } else {
            None
        };

        let old_count = self.items.len();
        let old_visible = self.visible_count();
        let content = if lfd.is_some() {
            ItemContent::Region(MERGE_CELL)
        } else {
            ItemContent::Placeholder
        };
        let Some(cell) = self.insert_item(content, min_size, other.size(), location, relative_to, lfd)
        else {
            return mapping;
        };

        let Some(cell_item) = self.items.remove(&cell) else {
            return mapping;
        };
        let cell_group = cell_item.group;
        for anchor in cell_group.anchors() {
            if let Some(anchor) = self.anchors.get_mut(&anchor) {
                anchor.remove_item(cell);
            }
        }

        // Anchor mapping: the nested static anchors become the cell's anchors
        let mut anchor_map: BTreeMap<AnchorId, AnchorId> = BTreeMap::new();
        let other_static = other.static_group;
        anchor_map.insert(other_static.left, cell_group.left);
        anchor_map.insert(other_static.top, cell_group.top);
        anchor_map.insert(other_static.right, cell_group.right);
        anchor_map.insert(other_static.bottom, cell_group.bottom);

        for anchor in other.anchors.values().filter(|a| !a.is_static()) {
            let id = self.create_anchor(anchor.orientation, AnchorType::Normal);
            anchor_map.insert(anchor.id, id);
        }

        for item in other.items.values() {
            let id = self.next_item();
            mapping.insert(item.id, id);
        }

        let cell_rect = Rect::new(
            self.position_of(cell_group.left) + self.thickness(cell_group.left),
            self.position_of(cell_group.top) + self.thickness(cell_group.top),
            self.position_of(cell_group.right)
                - self.position_of(cell_group.left)
                - self.thickness(cell_group.left),
            self.position_of(cell_group.bottom)
                - self.position_of(cell_group.top)
                - self.thickness(cell_group.top),
        );
        let other_inner = Rect::new(0, 0, other.width(), other.height()).adjusted(
            other.config.static_separator_thickness,
            other.config.static_separator_thickness,
            -other.config.static_separator_thickness,
            -other.config.static_separator_thickness,
        );

        let map_anchor = |id: AnchorId| anchor_map.get(&id).copied();
        let map_items = |ids: &[ItemId]| -> Vec<ItemId> {
            ids.iter().filter_map(|i| mapping.get(i).copied()).collect()
        };

        for anchor in other.anchors.values() {
            let Some(new_id) = map_anchor(anchor.id) else {
                continue;
            };
            if anchor.is_static() {
                // The cell's anchors inherit the nested border items
                let side = match anchor.anchor_type {
                    AnchorType::LeftStatic | AnchorType::TopStatic => Side::Side2,
                    _ => Side::Side1,
                };
                let nested = map_items(anchor.items(side));
                if let Some(target) = self.anchors.get_mut(&new_id) {
                    for item in nested {
                        target.add_item(item, side);
                    }
                }
                continue;
            }

            let position = map_linear(
                anchor.position,
                other_inner.start(anchor.orientation),
                other_inner.length(anchor.orientation),
                cell_rect.start(anchor.orientation),
                cell_rect.length(anchor.orientation),
            );
            let side1 = map_items(&anchor.side1);
            let side2 = map_items(&anchor.side2);
            let from = anchor.from.and_then(map_anchor);
            let to = anchor.to.and_then(map_anchor);
            let followee = anchor.followee.and_then(map_anchor);
            if let Some(target) = self.anchors.get_mut(&new_id) {
                target.side1 = side1;
                target.side2 = side2;
                target.from = from;
                target.to = to;
                target.followee = followee;
            }
            self.set_anchor_position(new_id, position, true);
        }

        for item in other.items.values() {
            let Some(new_id) = mapping.get(&item.id).copied() else {
                continue;
            };
            let group = AnchorGroup {
                left: map_anchor(item.group.left).unwrap_or(cell_group.left),
                top: map_anchor(item.group.top).unwrap_or(cell_group.top),
                right: map_anchor(item.group.right).unwrap_or(cell_group.right),
                bottom: map_anchor(item.group.bottom).unwrap_or(cell_group.bottom),
            };
            let mut imported = Item::new(new_id, item.content, group, item.min_size);
            imported.size_hint = item.size_hint;
            imported.ref_count = item.ref_count;
            self.items.insert(new_id, imported);
            if let ItemContent::Region(_) = item.content {
                self.events.push(LayoutEvent::WidgetAdded(new_id));
            }
        }

        self.update_anchor_following(None);
        self.emit_count_changes(old_count, old_visible);
        self.maybe_check_sanity();
        mapping
    }

    // ========================================================================
    // Removal / placeholders
    // ========================================================================

    /// Delete an item, consuming anchors left with no items on one side
    pub fn remove_item(&mut self, id: ItemId) -> bool {
        let Some(item) = self.items.remove(&id) else {
            tracing::warn!("remove_item: unknown item {:?}", id);
            return false;
        };
        let old_count = self.items.len() + 1;
        let old_visible = self.visible_count() + usize::from(!item.is_placeholder());
        let group = item.group;

        for anchor in group.anchors() {
            if let Some(anchor) = self.anchors.get_mut(&anchor) {
                anchor.remove_item(id);
            }
        }

        for orientation in Orientation::ALL {
            let side1 = group.anchor_at_side(Side::Side1, orientation);
            let side2 = group.anchor_at_side(Side::Side2, orientation);
            if !self.is_static(side1) && !self.has_items(side1, Side::Side2) {
                self.consume_anchor(side1, side2, true);
            } else if !self.is_static(side2) && !self.has_items(side2, Side::Side1) {
                self.consume_anchor(side2, side1, false);
            }
        }

        self.update_anchor_following(Some(group));
        self.events.push(LayoutEvent::WidgetRemoved(id));
        self.emit_count_changes(old_count, old_visible);
        self.maybe_check_sanity();
        true
    }

    /// Fold `victim` into `survivor`, its parallel neighbour across a removed item
    fn consume_anchor(&mut self, victim: AnchorId, survivor: AnchorId, survivor_is_side2: bool) {
        let Some(victim_anchor) = self.anchors.get(&victim) else {
            return;
        };
        let orientation = victim_anchor.orientation;
        // Side of the survivor that faced the removed item
        let facing = if survivor_is_side2 {
            Side::Side1
        } else {
            Side::Side2
        };
        let facing_was_empty = !self.has_items(survivor, facing);

        let victim_effective = self.end_followee(victim);
        let survivor_effective = self.end_followee(survivor);
        let freed = if survivor_is_side2 {
            self.position_of(survivor_effective)
                - self.position_of(victim_effective)
                - self.thickness(victim_effective)
        } else {
            self.position_of(victim_effective)
                - self.position_of(survivor_effective)
                - self.thickness(survivor_effective)
        };

        tracing::debug!(
            "Consuming anchor {:?} into {:?} (freed {}px)",
            victim,
            survivor,
            freed
        );

        for side in [Side::Side1, Side::Side2] {
            for item_id in self.items_on(victim, side) {
                if let Some(item) = self.items.get_mut(&item_id) {
                    item.group
                        .set_anchor_at_side(side.opposite(), orientation, survivor);
                }
                if let Some(anchor) = self.anchors.get_mut(&survivor) {
                    anchor.add_item(item_id, side);
                }
            }
        }

        self.anchors.remove(&victim);
        for anchor in self.anchors.values_mut() {
            anchor.replace_extent(victim, survivor);
            if anchor.followee == Some(victim) {
                anchor.followee = None;
            }
        }

        let share = self.config.removed_group_share;
        if facing_was_empty
            && freed > 0
            && !self.is_static(survivor)
            && !self.is_following(survivor)
        {
            let shift = (freed as f64 * share) as i32;
            let position = if survivor_is_side2 {
                self.position_of(survivor) - shift
            } else {
                self.position_of(survivor) + shift
            };
            let (low, high) = self.bound_positions_for_anchor(survivor);
            let position = if low <= high { position.clamp(low, high) } else { position };
            self.set_anchor_position(survivor, position, true);
        }
    }

    /// Keep the item's slot but stop showing anything in it
    pub fn turn_into_placeholder(&mut self, id: ItemId) -> bool {
        let old_visible = self.visible_count();
        let Some(item) = self.items.get_mut(&id) else {
            tracing::warn!("turn_into_placeholder: unknown item {:?}", id);
            return false;
        };
        if item.is_placeholder() {
            return true;
        }
        item.content = ItemContent::Placeholder;
        let group = item.group;

        self.update_anchor_following(Some(group));
        self.emit_count_changes(self.items.len(), old_visible);
        self.maybe_check_sanity();
        true
    }

    /// Put a region back into a placeholder slot and reopen space for it
    pub fn restore_placeholder(
        &mut self,
        id: ItemId,
        region: RegionId,
        min_size: Size,
        size_hint: Size,
    ) -> bool {
        let old_visible = self.visible_count();
        let Some(item) = self.items.get_mut(&id) else {
            tracing::warn!("restore_placeholder: unknown item {:?}", id);
            return false;
        };
        if !item.is_placeholder() {
            tracing::warn!("restore_placeholder: item {:?} is not a placeholder", id);
            return false;
        }
        if self
            .items
            .values()
            .any(|i| i.region() == Some(region))
        {
            tracing::warn!("restore_placeholder: region {} already in layout", region);
            return false;
        }
        let Some(item) = self.items.get_mut(&id) else {
            return false;
        };
        item.content = ItemContent::Region(region);
        item.min_size = min_size;
        item.size_hint = size_hint;
        let group = item.group;

        self.clear_anchors_following();
        self.update_size_constraints();
        if self.size.width < self.min_size.width || self.size.height < self.min_size.height {
            let grown = self.size.expanded_to(self.min_size);
            self.set_size(grown);
        }

        for orientation in Orientation::ALL {
            self.reopen_space(id, group, orientation);
        }

        self.update_anchor_following(None);
        self.events.push(LayoutEvent::WidgetAdded(id));
        self.emit_count_changes(self.items.len(), old_visible);
        self.maybe_check_sanity();
        true
    }

    /// Push the item's anchors apart until it gets its preferred length
    fn reopen_space(&mut self, id: ItemId, group: AnchorGroup, orientation: Orientation) {
        let side1 = group.anchor_at_side(Side::Side1, orientation);
        let side2 = group.anchor_at_side(Side::Side2, orientation);
        let movable1 = !self.is_static(side1);
        let movable2 = !self.is_static(side2);
        if !movable1 && !movable2 {
            return;
        }

        let Some(item) = self.items.get(&id) else {
            return;
        };
        let min_length = item.min_size.length(orientation);
        let hint_length = item.size_hint.length(orientation);
        let canvas = self.length(orientation);
        let suggested = hint_length.min((self.config.drop_length_fraction * canvas as f64) as i32);
        let target = min_length.max(suggested);

        let current = self.position_of(side2) - self.position_of(side1) - self.thickness(side1);
        let needed = target - current;
        if needed <= 0 {
            return;
        }

        let room1 = if movable1 {
            (self.position_of(side1) - self.bound_positions_for_anchor(side1).0).max(0)
        } else {
            0
        };
        let room2 = if movable2 {
            (self.bound_positions_for_anchor(side2).1 - self.position_of(side2)).max(0)
        } else {
            0
        };
        if room1 + room2 == 0 {
            tracing::debug!("No room to reopen item {:?} along {:?}", id, orientation);
            return;
        }

        let mut delta1 = ((needed as f64) * room1 as f64 / (room1 + room2) as f64).round() as i32;
        let mut delta2 = needed - delta1;
        delta1 = delta1.min(room1);
        delta2 = delta2.min(room2);

        if delta1 > 0 {
            self.propagate_resize(delta1, side1, Side::Side1);
            let position = self.position_of(side1) - delta1;
            self.set_anchor_position(side1, position, true);
        }
        if delta2 > 0 {
            self.propagate_resize(delta2, side2, Side::Side2);
            let position = self.position_of(side2) + delta2;
            self.set_anchor_position(side2, position, true);
        }
    }

    /// Add a placeholder reference to an item
    pub fn ref_item(&mut self, id: ItemId) -> bool {
        match self.items.get_mut(&id) {
            Some(item) => {
                item.ref_count += 1;
                true
            }
            None => {
                tracing::warn!("ref_item: unknown item {:?}", id);
                false
            }
        }
    }

    /// Drop a placeholder reference; returns true when the item got deleted
    pub fn unref_item(&mut self, id: ItemId) -> bool {
        let Some(item) = self.items.get_mut(&id) else {
            return false;
        };
        item.ref_count = item.ref_count.saturating_sub(1);
        if item.ref_count == 0 && item.is_placeholder() {
            return self.remove_item(id);
        }
        false
    }

    /// Delete placeholders nobody remembers any more
    pub fn remove_unreferenced_placeholders(&mut self) -> usize {
        let stale: Vec<ItemId> = self
            .items
            .values()
            .filter(|i| i.is_placeholder() && i.ref_count == 0)
            .map(|i| i.id)
            .collect();
        for id in &stale {
            self.remove_item(*id);
        }
        stale.len()
    }

    /// Update an item's cached minimum size, growing the canvas if needed
    pub fn set_item_min_size(&mut self, id: ItemId, min_size: Size) -> bool {
        let Some(item) = self.items.get_mut(&id) else {
            tracing::warn!("set_item_min_size: unknown item {:?}", id);
            return false;
        };
        if item.min_size == min_size {
            return true;
        }
        item.min_size = min_size;
        self.update_size_constraints();
        if self.size.width < self.min_size.width || self.size.height < self.min_size.height {
            let grown = self.size.expanded_to(self.min_size);
            self.set_size(grown);
        } else {
            self.ensure_anchors_bounded(None);
        }
        true
    }
}

/// Map a position from one span onto another proportionally
fn map_linear(position: i32, from_start: i32, from_length: i32, to_start: i32, to_length: i32) -> i32 {
    if from_length <= 0 {
        return to_start;
    }
    let offset = (position - from_start) as f64 / from_length as f64;
    to_start + (offset * to_length as f64).round() as i32
}
