//! Drop geometry: how much room a widget gets when dropped next to an item

use crate::model::{Location, Rect, Side, Size};

use super::{ItemId, SplitterLayout};

/// Length available for (or assigned to) a drop, split by where it comes from
///
/// `side1` is taken from the items before the drop anchor, `side2` from the
/// items after it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Length {
    pub side1: i32,
    pub side2: i32,
}

impl Length {
    pub fn new(side1: i32, side2: i32) -> Self {
        Self { side1, side2 }
    }

    pub fn length(&self) -> i32 {
        self.side1 + self.side2
    }

    pub fn is_null(&self) -> bool {
        self.length() <= 0
    }

    /// Shrink to `new_length`, keeping the side1/side2 ratio
    pub fn set_length(&mut self, new_length: i32) {
        let length = self.length();
        if length <= 0 {
            self.side1 = new_length / 2;
            self.side2 = new_length - self.side1;
            return;
        }
        let delta = length - new_length;
        let ratio = self.side1 as f64 / length as f64;
        let side1_delta = (delta as f64 * ratio) as i32;
        let side2_delta = delta - side1_delta;
        self.side1 -= side1_delta;
        self.side2 -= side2_delta;
    }
}

impl SplitterLayout {
    /// Room that could be freed for a drop at `location`
    pub fn available_length_for_drop(&self, location: Location, relative_to: Option<ItemId>) -> Length {
        let (Some(orientation), Some(inward)) = (location.anchor_orientation(), location.inward_side())
        else {
            tracing::warn!("available_length_for_drop: no location");
            return Length::default();
        };

        let group = match relative_to {
            Some(id) => match self.items.get(&id) {
                Some(item) => item.group,
                None => {
                    tracing::warn!("available_length_for_drop: unknown item {:?}", id);
                    return Length::default();
                }
            },
            None => self.static_group,
        };

        let anchor = self.end_followee(group.anchor_at_side(inward.opposite(), orientation));
        let thickness = self.thickness(anchor);
        let position = self.position_of(anchor);

        let min_occupied1 = self.cumulative_min_length(anchor, Side::Side1) - thickness;
        let min_occupied2 = self.cumulative_min_length(anchor, Side::Side2) - thickness;
        let side1_available = (position - min_occupied1).max(0);
        let side2_available = (self.length(orientation) - (position + thickness) - min_occupied2).max(0);

        let new_thickness = if self.has_visible_items() {
            self.config.separator_thickness
        } else {
            0
        };
        let usable = (side1_available + side2_available - new_thickness).max(0);

        let mut result = Length::default();
        if usable > 0 {
            let total = side1_available + side2_available;
            result.side1 = ((usable as f64 * side1_available as f64) / total as f64).round() as i32;
            result.side2 = usable - result.side1;
        }
        result
    }

    /// Length a widget would get when dropped; null when it doesn't fit
    pub fn length_for_drop(
        &self,
        min_size: Size,
        size_hint: Size,
        location: Location,
        relative_to: Option<ItemId>,
    ) -> Length {
        let Some(orientation) = location.anchor_orientation() else {
            return Length::default();
        };

        let required = min_size.length(orientation);
        let mut available = self.available_length_for_drop(location, relative_to);
        if available.length() < required {
            tracing::debug!(
                "length_for_drop: need {} but only {} available",
                required,
                available.length()
            );
            return Length::default();
        }

        let canvas = self.length(orientation);
        let suggested = size_hint
            .length(orientation)
            .min((self.config.drop_length_fraction * canvas as f64) as i32);
        let new_length = required.max(suggested.min(available.length()));
        available.set_length(new_length);
        available
    }

    /// Rectangle a drop with a known length would occupy
    pub fn rect_for_drop_with_length(&self, lfd: Length, location: Location, relative_rect: Rect) -> Rect {
        let new_thickness = if self.is_empty() {
            0
        } else {
            self.config.separator_thickness
        };
        let static_thickness = self.config.static_separator_thickness;
        let length = lfd.length();

        match location {
            Location::OnLeft => Rect::new(
                (relative_rect.x - lfd.side1).max(0),
                relative_rect.y,
                length,
                relative_rect.height,
            ),
            Location::OnTop => Rect::new(
                relative_rect.x,
                (relative_rect.y - lfd.side1).max(0),
                relative_rect.width,
                length,
            ),
            Location::OnRight => Rect::new(
                (relative_rect.right() - lfd.side1 + new_thickness)
                    .min(self.width() - length - static_thickness),
                relative_rect.y,
                length,
                relative_rect.height,
            ),
            Location::OnBottom => Rect::new(
                relative_rect.x,
                (relative_rect.bottom() - lfd.side1 + new_thickness)
                    .min(self.height() - length - static_thickness),
                relative_rect.width,
                length,
            ),
            Location::None => Rect::default(),
        }
    }

    /// Where a drop indicator should be drawn
    pub fn rect_for_drop(
        &self,
        min_size: Size,
        size_hint: Size,
        location: Location,
        relative_to: Option<ItemId>,
    ) -> Rect {
        let Some(orientation) = location.anchor_orientation() else {
            return Rect::default();
        };

        let mut lfd = self.length_for_drop(min_size, size_hint, location, relative_to);
        if lfd.is_null() {
            let min_length = self.config.drop_indicator_min_length;
            lfd.side1 = min_length / 2;
            lfd.side2 = min_length - lfd.side1;
        }

        let st = self.config.static_separator_thickness;
        let relative_rect = relative_to
            .and_then(|id| self.item_geometry(id))
            .unwrap_or_else(|| Rect::new(0, 0, self.width(), self.height()).adjusted(st, st, -st, -st));

        tracing::trace!(
            "rect_for_drop {:?} along {:?} relative to {:?}",
            lfd,
            orientation,
            relative_rect
        );
        self.rect_for_drop_with_length(lfd, location, relative_rect)
    }

    /// Room left for a new widget in each dimension
    pub fn available_size(&self) -> Size {
        Size::new(
            self.available_length_for_drop(Location::OnLeft, None).length(),
            self.available_length_for_drop(Location::OnTop, None).length(),
        )
    }

    /// Grow the canvas until a widget of `min_size` fits at `location`
    pub fn ensure_enough_size(&mut self, min_size: Size, location: Location, relative_to: Option<ItemId>) {
        let needed_thickness = if self.is_empty() {
            0
        } else {
            self.config.separator_thickness
        };
        let mut new_size = self.size;
        let Some(orientation) = location.anchor_orientation() else {
            return;
        };

        let available = self.available_length_for_drop(location, relative_to).length();
        let needed = min_size.length(orientation) - available + needed_thickness;
        if needed > 0 {
            new_size.set_length(orientation, self.length(orientation) + needed);
        }

        // The widget spans the whole canvas in the other direction at most
        let perpendicular = orientation.opposite();
        let st = self.config.static_separator_thickness;
        let inner = self.length(perpendicular) - 2 * st;
        if min_size.length(perpendicular) > inner {
            new_size.set_length(perpendicular, min_size.length(perpendicular) + 2 * st);
        }
        new_size = new_size.expanded_to(self.min_size);

        if new_size != self.size {
            tracing::debug!("Growing layout from {:?} to {:?} to fit a drop", self.size, new_size);
            self.set_size(new_size);
        }
    }
}
