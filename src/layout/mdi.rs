//! Free-position layout
//!
//! Items sit anywhere on the canvas at their own geometry, like windows on a
//! desktop. Nothing splits the space: items may overlap and the most recently
//! raised one is on top. Items never shrink below their minimum size and are
//! kept inside the canvas whenever they fit.

use std::collections::BTreeMap;

use crate::model::{Orientation, Point, Rect, RegionId, Size};

use super::{ItemId, LayoutEvent, SanityIssue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MdiItem {
    pub id: ItemId,
    pub region: RegionId,
    pub geometry: Rect,
    pub min_size: Size,
}

#[derive(Debug, Clone, Default)]
pub struct MdiLayout {
    size: Size,
    min_size: Size,
    items: BTreeMap<ItemId, MdiItem>,
    /// Bottom to top
    stacking: Vec<ItemId>,
    next_item_id: u64,
    events: Vec<LayoutEvent>,
}

impl MdiLayout {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Smallest canvas that shows every item whole
    pub fn min_size(&self) -> Size {
        self.min_size
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items from bottom to top
    pub fn items(&self) -> impl Iterator<Item = &MdiItem> {
        self.stacking.iter().filter_map(|id| self.items.get(id))
    }

    pub fn item(&self, id: ItemId) -> Option<&MdiItem> {
        self.items.get(&id)
    }

    pub fn item_for_region(&self, region: RegionId) -> Option<ItemId> {
        self.items.values().find(|i| i.region == region).map(|i| i.id)
    }

    pub fn item_geometry(&self, id: ItemId) -> Option<Rect> {
        self.items.get(&id).map(|i| i.geometry)
    }

    /// Topmost item under `point`
    pub fn item_at(&self, point: Point) -> Option<ItemId> {
        self.stacking
            .iter()
            .rev()
            .copied()
            .find(|id| self.items.get(id).is_some_and(|i| i.geometry.contains(point)))
    }

    pub fn take_events(&mut self) -> Vec<LayoutEvent> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Show a region with its top-left corner at `point`
    ///
    /// A region already in the layout is taken out first and added again on top.
    pub fn add_region(&mut self, region: RegionId, min_size: Size, size_hint: Size, point: Point) -> ItemId {
        if let Some(existing) = self.item_for_region(region) {
            tracing::debug!("Region {} already in the MDI layout, re-adding it", region);
            self.remove_item(existing);
        }

        let id = ItemId(self.next_item_id);
        self.next_item_id += 1;

        let size = size_hint.expanded_to(min_size);
        let geometry = self.clamped(Rect::from_origin_size(point, size));
        self.items.insert(
            id,
            MdiItem {
                id,
                region,
                geometry,
                min_size,
            },
        );
        self.stacking.push(id);
        tracing::debug!("MDI item {:?} for region {} at {:?}", id, region, geometry);

        self.events.push(LayoutEvent::WidgetAdded(id));
        self.events.push(LayoutEvent::WidgetCountChanged(self.items.len()));
        self.update_size_constraints();
        id
    }

    pub fn remove_item(&mut self, id: ItemId) -> bool {
        if self.items.remove(&id).is_none() {
            tracing::warn!("MDI remove_item: unknown item {:?}", id);
            return false;
        }
        self.stacking.retain(|i| *i != id);
        self.events.push(LayoutEvent::WidgetRemoved(id));
        self.events.push(LayoutEvent::WidgetCountChanged(self.items.len()));
        self.update_size_constraints();
        true
    }

    /// Place an item; the size is raised to its minimum and the rect pulled inside the canvas
    pub fn set_item_geometry(&mut self, id: ItemId, geometry: Rect) -> bool {
        let Some(item) = self.items.get(&id) else {
            tracing::warn!("MDI set_item_geometry: item {:?} not in the layout", id);
            return false;
        };
        let size = geometry.size().expanded_to(item.min_size);
        let geometry = self.clamped(Rect::from_origin_size(geometry.origin(), size));
        self.set_geometry(id, geometry);
        true
    }

    /// Move an item's top-left corner, keeping its size
    pub fn move_item(&mut self, id: ItemId, position: Point) -> bool {
        let Some(item) = self.items.get(&id) else {
            tracing::warn!("MDI move_item: item {:?} not in the layout", id);
            return false;
        };
        let geometry = self.clamped(Rect::from_origin_size(position, item.geometry.size()));
        self.set_geometry(id, geometry);
        true
    }

    /// Resize an item in place, never below its minimum
    pub fn resize_item(&mut self, id: ItemId, size: Size) -> bool {
        let Some(item) = self.items.get(&id) else {
            tracing::warn!("MDI resize_item: item {:?} not in the layout", id);
            return false;
        };
        let size = size.expanded_to(item.min_size);
        let geometry = self.clamped(Rect::from_origin_size(item.geometry.origin(), size));
        self.set_geometry(id, geometry);
        true
    }

    /// Put an item on top of the others
    pub fn raise(&mut self, id: ItemId) -> bool {
        if !self.items.contains_key(&id) {
            return false;
        }
        self.stacking.retain(|i| *i != id);
        self.stacking.push(id);
        true
    }

    pub fn set_item_min_size(&mut self, id: ItemId, min_size: Size) -> bool {
        let Some(item) = self.items.get_mut(&id) else {
            tracing::warn!("MDI set_item_min_size: unknown item {:?}", id);
            return false;
        };
        item.min_size = min_size;
        let size = item.geometry.size().expanded_to(min_size);
        let origin = item.geometry.origin();
        let geometry = self.clamped(Rect::from_origin_size(origin, size));
        self.set_geometry(id, geometry);
        self.update_size_constraints();
        true
    }

    /// Resize the canvas, pulling items back inside
    pub fn set_size(&mut self, size: Size) -> bool {
        if size == self.size {
            return true;
        }
        if size.width < self.min_size.width || size.height < self.min_size.height {
            tracing::warn!(
                "Refusing to resize MDI layout to {:?}, below its minimum {:?}",
                size,
                self.min_size
            );
            return false;
        }
        self.size = size;
        let moved: Vec<(ItemId, Rect)> = self
            .items
            .values()
            .map(|i| (i.id, self.clamped(i.geometry)))
            .filter(|(id, rect)| self.item_geometry(*id) != Some(*rect))
            .collect();
        for (id, geometry) in moved {
            self.set_geometry(id, geometry);
        }
        self.events.push(LayoutEvent::SizeChanged(size));
        true
    }

    // ========================================================================
    // Checks
    // ========================================================================

    pub fn sanity_issues(&self) -> Vec<SanityIssue> {
        let mut issues = Vec::new();
        if self.stacking.len() != self.items.len() {
            issues.push(SanityIssue::StackingMismatch {
                stacked: self.stacking.len(),
                items: self.items.len(),
            });
        }
        let canvas = Rect::from_origin_size(Point::default(), self.size);
        for item in self.items.values() {
            for orientation in Orientation::ALL {
                let length = item.geometry.length(orientation);
                let min = item.min_size.length(orientation);
                if length < min {
                    issues.push(SanityIssue::ItemTooSmall {
                        item: item.id,
                        length,
                        min,
                        orientation,
                    });
                }
            }
            let fits = item.geometry.width <= self.size.width && item.geometry.height <= self.size.height;
            let inside = item.geometry.x >= canvas.x
                && item.geometry.y >= canvas.y
                && item.geometry.right() <= canvas.right()
                && item.geometry.bottom() <= canvas.bottom();
            if fits && !inside {
                issues.push(SanityIssue::ItemOutsideCanvas {
                    item: item.id,
                    geometry: item.geometry,
                });
            }
        }
        issues
    }

    pub fn check_sanity(&self) -> bool {
        let issues = self.sanity_issues();
        for issue in &issues {
            tracing::warn!("MDI layout sanity: {}", issue);
        }
        issues.is_empty()
    }

    fn set_geometry(&mut self, id: ItemId, geometry: Rect) {
        if let Some(item) = self.items.get_mut(&id) {
            item.geometry = geometry;
        }
    }

    /// Shift `rect` so it lies inside the canvas; oversized rects stick to the top-left
    fn clamped(&self, rect: Rect) -> Rect {
        let x = rect.x.min(self.size.width - rect.width).max(0);
        let y = rect.y.min(self.size.height - rect.height).max(0);
        Rect::new(x, y, rect.width, rect.height)
    }

    fn update_size_constraints(&mut self) {
        let min_size = self
            .items
            .values()
            .fold(Size::default(), |acc, i| acc.expanded_to(i.min_size));
        if min_size != self.min_size {
            self.min_size = min_size;
            self.events.push(LayoutEvent::MinimumSizeChanged(min_size));
        }
    }
}
