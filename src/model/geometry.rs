//! Geometry primitives shared by the layout engine and the layout saver
//!
//! All values are integer pixels. Rectangles use exclusive right/bottom edges,
//! so a rect at x=0 with width=10 covers columns 0..10.

use serde::{Deserialize, Serialize};

// ============================================================================
// Point / Size / Rect
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Both dimensions strictly positive
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Component-wise maximum
    pub fn expanded_to(&self, other: Size) -> Size {
        Size::new(self.width.max(other.width), self.height.max(other.height))
    }

    /// Component-wise minimum
    pub fn bounded_to(&self, other: Size) -> Size {
        Size::new(self.width.min(other.width), self.height.min(other.height))
    }

    /// Length along an anchor orientation (width for vertical anchors)
    pub fn length(&self, orientation: Orientation) -> i32 {
        match orientation {
            Orientation::Vertical => self.width,
            Orientation::Horizontal => self.height,
        }
    }

    pub fn set_length(&mut self, orientation: Orientation, value: i32) {
        match orientation {
            Orientation::Vertical => self.width = value,
            Orientation::Horizontal => self.height = value,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Exclusive right edge
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// All four fields zero
    pub fn is_null(&self) -> bool {
        *self == Rect::default()
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Move the edges by the given deltas (positive dx2/dy2 grow the rect)
    pub fn adjusted(&self, dx1: i32, dy1: i32, dx2: i32, dy2: i32) -> Rect {
        Rect::new(
            self.x + dx1,
            self.y + dy1,
            self.width - dx1 + dx2,
            self.height - dy1 + dy2,
        )
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    pub fn move_to(&mut self, origin: Point) {
        self.x = origin.x;
        self.y = origin.y;
    }

    /// Start coordinate along an anchor orientation (x for vertical anchors)
    pub fn start(&self, orientation: Orientation) -> i32 {
        match orientation {
            Orientation::Vertical => self.x,
            Orientation::Horizontal => self.y,
        }
    }

    pub fn length(&self, orientation: Orientation) -> i32 {
        self.size().length(orientation)
    }
}

// ============================================================================
// Orientation / Side / Location
// ============================================================================

/// Orientation of a separator line
///
/// A vertical anchor is a vertical line: its position is an x offset and it
/// separates items to its left (side 1) from items to its right (side 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Vertical,
    Horizontal,
}

impl Orientation {
    pub fn opposite(self) -> Orientation {
        match self {
            Orientation::Vertical => Orientation::Horizontal,
            Orientation::Horizontal => Orientation::Vertical,
        }
    }

    pub const ALL: [Orientation; 2] = [Orientation::Vertical, Orientation::Horizontal];
}

/// Side of an anchor: left/top is side 1, right/bottom is side 2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Side1,
    Side2,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Side1 => Side::Side2,
            Side::Side2 => Side::Side1,
        }
    }

    /// +1 when moving towards side 2, -1 towards side 1
    pub fn sign(self) -> i32 {
        match self {
            Side::Side1 => -1,
            Side::Side2 => 1,
        }
    }
}

/// Where a widget is dropped relative to a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Location {
    #[default]
    None,
    OnLeft,
    OnTop,
    OnRight,
    OnBottom,
}

impl Location {
    /// Orientation of the separator created for a drop at this location
    pub fn anchor_orientation(self) -> Option<Orientation> {
        match self {
            Location::OnLeft | Location::OnRight => Some(Orientation::Vertical),
            Location::OnTop | Location::OnBottom => Some(Orientation::Horizontal),
            Location::None => None,
        }
    }

    /// Side of the source anchor on which the dropped item ends up
    pub fn inward_side(self) -> Option<Side> {
        match self {
            Location::OnLeft | Location::OnTop => Some(Side::Side2),
            Location::OnRight | Location::OnBottom => Some(Side::Side1),
            Location::None => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Location::None => "none",
            Location::OnLeft => "left",
            Location::OnTop => "top",
            Location::OnRight => "right",
            Location::OnBottom => "bottom",
        }
    }
}

/// Side bar slots of a main window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideBarLocation {
    North,
    East,
    West,
    South,
}

impl SideBarLocation {
    pub const ALL: [SideBarLocation; 4] = [
        SideBarLocation::North,
        SideBarLocation::East,
        SideBarLocation::West,
        SideBarLocation::South,
    ];

    /// Index used in `sidebar-<index>` document keys (0 is reserved for "none")
    pub fn index(self) -> u8 {
        match self {
            SideBarLocation::North => 1,
            SideBarLocation::East => 2,
            SideBarLocation::West => 3,
            SideBarLocation::South => 4,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        SideBarLocation::ALL.into_iter().find(|loc| loc.index() == index)
    }
}
