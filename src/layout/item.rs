//! Items - grid slots holding a region or a placeholder

use crate::model::{Orientation, RegionId, Side, Size};

use super::AnchorId;

/// Unique identifier for an item within one layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u64);

/// What an item shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemContent {
    Region(RegionId),
    /// Keeps a closed panel's slot without occupying space
    Placeholder,
}

/// The four anchors surrounding an item (or the whole canvas)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorGroup {
    pub left: AnchorId,
    pub top: AnchorId,
    pub right: AnchorId,
    pub bottom: AnchorId,
}

impl AnchorGroup {
    /// Anchor on `side` of the item for anchors of `orientation`
    pub fn anchor_at_side(&self, side: Side, orientation: Orientation) -> AnchorId {
        match (orientation, side) {
            (Orientation::Vertical, Side::Side1) => self.left,
            (Orientation::Vertical, Side::Side2) => self.right,
            (Orientation::Horizontal, Side::Side1) => self.top,
            (Orientation::Horizontal, Side::Side2) => self.bottom,
        }
    }

    pub(crate) fn set_anchor_at_side(&mut self, side: Side, orientation: Orientation, anchor: AnchorId) {
        match (orientation, side) {
            (Orientation::Vertical, Side::Side1) => self.left = anchor,
            (Orientation::Vertical, Side::Side2) => self.right = anchor,
            (Orientation::Horizontal, Side::Side1) => self.top = anchor,
            (Orientation::Horizontal, Side::Side2) => self.bottom = anchor,
        }
    }

    /// Whether `anchor` is this group's anchor on `side`
    pub fn contains_anchor(&self, anchor: AnchorId, side: Side) -> bool {
        match side {
            Side::Side1 => self.left == anchor || self.top == anchor,
            Side::Side2 => self.right == anchor || self.bottom == anchor,
        }
    }

    pub fn anchors(&self) -> [AnchorId; 4] {
        [self.left, self.top, self.right, self.bottom]
    }

    pub fn replace(&mut self, old: AnchorId, new: AnchorId) {
        for slot in [&mut self.left, &mut self.top, &mut self.right, &mut self.bottom] {
            if *slot == old {
                *slot = new;
            }
        }
    }
}

/// A grid slot
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub(crate) content: ItemContent,
    pub(crate) group: AnchorGroup,
    pub(crate) min_size: Size,
    pub(crate) size_hint: Size,
    pub(crate) ref_count: u32,
}

impl Item {
    pub(crate) fn new(id: ItemId, content: ItemContent, group: AnchorGroup, min_size: Size) -> Self {
        Self {
            id,
            content,
            group,
            min_size,
            size_hint: Size::default(),
            ref_count: 0,
        }
    }

    pub fn content(&self) -> ItemContent {
        self.content
    }

    pub fn region(&self) -> Option<RegionId> {
        match self.content {
            ItemContent::Region(id) => Some(id),
            ItemContent::Placeholder => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.content == ItemContent::Placeholder
    }

    pub fn group(&self) -> AnchorGroup {
        self.group
    }

    pub fn min_size(&self) -> Size {
        self.min_size
    }

    pub fn size_hint(&self) -> Size {
        self.size_hint
    }

    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    /// Minimum length along an anchor orientation; placeholders need none
    pub fn min_length(&self, orientation: Orientation) -> i32 {
        if self.is_placeholder() {
            0
        } else {
            self.min_size.length(orientation)
        }
    }

    pub fn anchor_at_side(&self, side: Side, orientation: Orientation) -> AnchorId {
        self.group.anchor_at_side(side, orientation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> AnchorGroup {
        AnchorGroup {
            left: AnchorId(0),
            top: AnchorId(1),
            right: AnchorId(2),
            bottom: AnchorId(3),
        }
    }

    #[test]
    fn test_anchor_at_side() {
        let g = group();
        assert_eq!(g.anchor_at_side(Side::Side1, Orientation::Vertical), AnchorId(0));
        assert_eq!(g.anchor_at_side(Side::Side2, Orientation::Horizontal), AnchorId(3));
        assert!(g.contains_anchor(AnchorId(1), Side::Side1));
        assert!(!g.contains_anchor(AnchorId(1), Side::Side2));
    }

    #[test]
    fn test_placeholder_has_no_min_length() {
        let mut item = Item::new(ItemId(1), ItemContent::Region(RegionId(4)), group(), Size::new(80, 90));
        assert_eq!(item.min_length(Orientation::Vertical), 80);
        item.content = ItemContent::Placeholder;
        assert_eq!(item.min_length(Orientation::Horizontal), 0);
        assert_eq!(item.region(), None);
    }

    #[test]
    fn test_group_replace() {
        let mut g = group();
        g.replace(AnchorId(2), AnchorId(7));
        assert_eq!(g.right, AnchorId(7));
        assert_eq!(g.left, AnchorId(0));
    }
}
