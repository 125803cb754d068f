//! Anchors - the separator lines of the layout grid

use crate::model::{Orientation, Side};

use super::ItemId;

/// Unique identifier for an anchor within one layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorId(pub u64);

/// Which canvas edge an anchor is pinned to, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum AnchorType {
    #[default]
    Normal,
    LeftStatic,
    TopStatic,
    RightStatic,
    BottomStatic,
}

impl AnchorType {
    pub fn is_static(self) -> bool {
        self != AnchorType::Normal
    }

    /// Document encoding
    pub fn code(self) -> i32 {
        match self {
            AnchorType::Normal => 0,
            AnchorType::LeftStatic => 1,
            AnchorType::TopStatic => 2,
            AnchorType::RightStatic => 4,
            AnchorType::BottomStatic => 8,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(AnchorType::Normal),
            1 => Some(AnchorType::LeftStatic),
            2 => Some(AnchorType::TopStatic),
            4 => Some(AnchorType::RightStatic),
            8 => Some(AnchorType::BottomStatic),
            _ => None,
        }
    }

    pub fn orientation(self) -> Option<Orientation> {
        match self {
            AnchorType::LeftStatic | AnchorType::RightStatic => Some(Orientation::Vertical),
            AnchorType::TopStatic | AnchorType::BottomStatic => Some(Orientation::Horizontal),
            AnchorType::Normal => None,
        }
    }
}

/// A separator line
///
/// Vertical anchors hold items to their left in `side1` and to their right in
/// `side2`; horizontal anchors use top/bottom. `from` and `to` are the
/// perpendicular anchors bounding the line's extent.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub id: AnchorId,
    pub orientation: Orientation,
    pub anchor_type: AnchorType,
    pub(crate) position: i32,
    pub(crate) position_percentage: f64,
    pub(crate) side1: Vec<ItemId>,
    pub(crate) side2: Vec<ItemId>,
    pub(crate) followee: Option<AnchorId>,
    pub(crate) from: Option<AnchorId>,
    pub(crate) to: Option<AnchorId>,
}

impl Anchor {
    pub(crate) fn new(id: AnchorId, orientation: Orientation, anchor_type: AnchorType) -> Self {
        Self {
            id,
            orientation,
            anchor_type,
            position: 0,
            position_percentage: 0.0,
            side1: Vec::new(),
            side2: Vec::new(),
            followee: None,
            from: None,
            to: None,
        }
    }

    pub fn is_static(&self) -> bool {
        self.anchor_type.is_static()
    }

    pub fn is_vertical(&self) -> bool {
        self.orientation == Orientation::Vertical
    }

    pub fn is_following(&self) -> bool {
        self.followee.is_some()
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn position_percentage(&self) -> f64 {
        self.position_percentage
    }

    pub fn followee(&self) -> Option<AnchorId> {
        self.followee
    }

    pub fn from(&self) -> Option<AnchorId> {
        self.from
    }

    pub fn to(&self) -> Option<AnchorId> {
        self.to
    }

    pub fn items(&self, side: Side) -> &[ItemId] {
        match side {
            Side::Side1 => &self.side1,
            Side::Side2 => &self.side2,
        }
    }

    pub(crate) fn items_mut(&mut self, side: Side) -> &mut Vec<ItemId> {
        match side {
            Side::Side1 => &mut self.side1,
            Side::Side2 => &mut self.side2,
        }
    }

    pub fn has_items(&self, side: Side) -> bool {
        !self.items(side).is_empty()
    }

    pub fn contains_item(&self, item: ItemId) -> bool {
        self.side1.contains(&item) || self.side2.contains(&item)
    }

    /// Side the item sits on, if it touches this anchor
    pub fn side_of(&self, item: ItemId) -> Option<Side> {
        if self.side1.contains(&item) {
            Some(Side::Side1)
        } else if self.side2.contains(&item) {
            Some(Side::Side2)
        } else {
            None
        }
    }

    pub(crate) fn add_item(&mut self, item: ItemId, side: Side) {
        let items = self.items_mut(side);
        if !items.contains(&item) {
            items.push(item);
        }
    }

    pub(crate) fn remove_item(&mut self, item: ItemId) -> bool {
        let before = self.side1.len() + self.side2.len();
        self.side1.retain(|i| *i != item);
        self.side2.retain(|i| *i != item);
        before != self.side1.len() + self.side2.len()
    }

    /// Replace `from`/`to` references to `old` with `new`
    pub(crate) fn replace_extent(&mut self, old: AnchorId, new: AnchorId) {
        if self.from == Some(old) {
            self.from = Some(new);
        }
        if self.to == Some(old) {
            self.to = Some(new);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_type_codes_round_trip() {
        for ty in [
            AnchorType::Normal,
            AnchorType::LeftStatic,
            AnchorType::TopStatic,
            AnchorType::RightStatic,
            AnchorType::BottomStatic,
        ] {
            assert_eq!(AnchorType::from_code(ty.code()), Some(ty));
        }
        assert_eq!(AnchorType::from_code(3), None);
    }

    #[test]
    fn test_add_item_is_idempotent() {
        let mut anchor = Anchor::new(AnchorId(9), Orientation::Vertical, AnchorType::Normal);
        anchor.add_item(ItemId(1), Side::Side1);
        anchor.add_item(ItemId(1), Side::Side1);
        anchor.add_item(ItemId(2), Side::Side2);
        assert_eq!(anchor.items(Side::Side1), &[ItemId(1)]);
        assert_eq!(anchor.side_of(ItemId(2)), Some(Side::Side2));
        assert!(anchor.remove_item(ItemId(1)));
        assert!(!anchor.has_items(Side::Side1));
    }

    #[test]
    fn test_replace_extent() {
        let mut anchor = Anchor::new(AnchorId(9), Orientation::Vertical, AnchorType::Normal);
        anchor.from = Some(AnchorId(1));
        anchor.to = Some(AnchorId(2));
        anchor.replace_extent(AnchorId(2), AnchorId(5));
        assert_eq!(anchor.from(), Some(AnchorId(1)));
        assert_eq!(anchor.to(), Some(AnchorId(5)));
    }
}
