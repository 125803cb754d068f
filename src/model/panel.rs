//! Panels - the dockable content units
//!
//! A panel is identified by a process-unique name. It is docked into at most
//! one region at a time and remembers where it was via [`LastPosition`].

use std::collections::BTreeMap;

use super::geometry::{Rect, SideBarLocation, Size};
use super::region::RegionId;
use super::LayoutRef;
use crate::layout::ItemId;

/// Behaviour flags for a panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelOptions {
    /// The user can't close the panel
    pub not_closable: bool,
    /// The panel can float but never dock
    pub not_dockable: bool,
    /// Layout restore leaves this panel alone
    pub skip_restore: bool,
}

/// A reference to a layout item kept alive for a panel's position memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderRef {
    pub layout: LayoutRef,
    pub item: ItemId,
}

/// Where a panel was last seen
///
/// Every placeholder listed here holds a reference on its layout item; the
/// session keeps the item reference counts in step with this list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LastPosition {
    placeholders: Vec<PlaceholderRef>,
    pub last_floating_geometry: Rect,
    pub last_overlay_geometries: BTreeMap<SideBarLocation, Rect>,
    pub tab_index: usize,
    pub was_floating: bool,
}

impl LastPosition {
    pub fn placeholders(&self) -> &[PlaceholderRef] {
        &self.placeholders
    }

    /// The most recently remembered placeholder
    pub fn last_placeholder(&self) -> Option<&PlaceholderRef> {
        self.placeholders.last()
    }

    pub fn contains(&self, layout: &LayoutRef, item: ItemId) -> bool {
        self.placeholders
            .iter()
            .any(|p| &p.layout == layout && p.item == item)
    }

    /// Remember a new placeholder, returning the ones it displaces
    ///
    /// A main-window placeholder replaces everything; a floating one only
    /// replaces other floating placeholders.
    pub fn push_placeholder(&mut self, placeholder: PlaceholderRef) -> Vec<PlaceholderRef> {
        if self.contains(&placeholder.layout, placeholder.item) {
            return Vec::new();
        }

        let displaced = if placeholder.layout.is_main_window() {
            std::mem::take(&mut self.placeholders)
        } else {
            let (floating, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.placeholders)
                .into_iter()
                .partition(|p| !p.layout.is_main_window());
            self.placeholders = kept;
            floating
        };

        self.placeholders.push(placeholder);
        displaced
    }

    /// Forget every placeholder, returning them so their items can be unreferenced
    pub fn take_placeholders(&mut self) -> Vec<PlaceholderRef> {
        std::mem::take(&mut self.placeholders)
    }

    /// Forget the placeholders living in `layout`
    pub fn remove_layout(&mut self, layout: &LayoutRef) -> Vec<PlaceholderRef> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.placeholders)
            .into_iter()
            .partition(|p| &p.layout == layout);
        self.placeholders = kept;
        removed
    }

    /// Forget one placeholder without touching reference counts
    pub fn forget(&mut self, layout: &LayoutRef, item: ItemId) -> bool {
        let before = self.placeholders.len();
        self.placeholders
            .retain(|p| !(&p.layout == layout && p.item == item));
        before != self.placeholders.len()
    }

    /// Re-point placeholders after items moved between layouts
    pub fn remap(&mut self, from: &LayoutRef, to: &LayoutRef, items: &BTreeMap<ItemId, ItemId>) {
        for placeholder in &mut self.placeholders {
            if &placeholder.layout != from {
                continue;
            }
            if let Some(new_item) = items.get(&placeholder.item) {
                placeholder.layout = to.clone();
                placeholder.item = *new_item;
            }
        }
    }
}

/// A single dockable content unit
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    name: String,
    pub title: String,
    pub min_size: Size,
    pub size_hint: Size,
    pub affinities: Vec<String>,
    pub options: PanelOptions,
    pub(crate) visible: bool,
    pub(crate) region: Option<RegionId>,
    pub(crate) side_bar: Option<(String, SideBarLocation)>,
    pub(crate) last_position: LastPosition,
    pub(crate) was_restored: bool,
}

impl Panel {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            title: name.to_string(),
            min_size: Size::default(),
            size_hint: Size::default(),
            affinities: Vec::new(),
            options: PanelOptions::default(),
            visible: false,
            region: None,
            side_bar: None,
            last_position: LastPosition::default(),
            was_restored: false,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_min_size(mut self, min_size: Size) -> Self {
        self.min_size = min_size;
        self
    }

    pub fn with_size_hint(mut self, size_hint: Size) -> Self {
        self.size_hint = size_hint;
        self
    }

    pub fn with_affinities(mut self, affinities: &[&str]) -> Self {
        self.affinities = affinities.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_options(mut self, options: PanelOptions) -> Self {
        self.options = options;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Docked into a region and shown
    pub fn is_open(&self) -> bool {
        self.visible
    }

    pub fn region(&self) -> Option<RegionId> {
        self.region
    }

    /// Main window name and location when the panel is minimized to a side bar
    pub fn side_bar(&self) -> Option<(&str, SideBarLocation)> {
        self.side_bar
            .as_ref()
            .map(|(window, location)| (window.as_str(), *location))
    }

    pub fn last_position(&self) -> &LastPosition {
        &self.last_position
    }

    pub fn was_restored(&self) -> bool {
        self.was_restored
    }

    pub fn skips_restore(&self) -> bool {
        self.options.skip_restore
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FloatingWindowId;

    fn main_ref(item: u64) -> PlaceholderRef {
        PlaceholderRef {
            layout: LayoutRef::MainWindow("main".to_string()),
            item: ItemId(item),
        }
    }

    fn floating_ref(window: u64, item: u64) -> PlaceholderRef {
        PlaceholderRef {
            layout: LayoutRef::Floating(FloatingWindowId(window)),
            item: ItemId(item),
        }
    }

    #[test]
    fn test_main_window_placeholder_displaces_all() {
        let mut position = LastPosition::default();
        assert!(position.push_placeholder(floating_ref(1, 3)).is_empty());
        let displaced = position.push_placeholder(main_ref(4));
        assert_eq!(displaced, vec![floating_ref(1, 3)]);
        assert_eq!(position.placeholders(), &[main_ref(4)]);
    }

    #[test]
    fn test_floating_placeholder_keeps_main_window_one() {
        let mut position = LastPosition::default();
        position.push_placeholder(main_ref(4));
        position.push_placeholder(floating_ref(1, 3));
        let displaced = position.push_placeholder(floating_ref(2, 9));
        assert_eq!(displaced, vec![floating_ref(1, 3)]);
        assert_eq!(position.placeholders(), &[main_ref(4), floating_ref(2, 9)]);
    }

    #[test]
    fn test_duplicate_placeholder_is_ignored() {
        let mut position = LastPosition::default();
        position.push_placeholder(main_ref(4));
        assert!(position.push_placeholder(main_ref(4)).is_empty());
        assert_eq!(position.placeholders().len(), 1);
    }

    #[test]
    fn test_remap_moves_placeholders() {
        let mut position = LastPosition::default();
        position.push_placeholder(floating_ref(1, 3));
        let mut items = BTreeMap::new();
        items.insert(ItemId(3), ItemId(11));
        position.remap(
            &LayoutRef::Floating(FloatingWindowId(1)),
            &LayoutRef::MainWindow("main".to_string()),
            &items,
        );
        assert_eq!(position.placeholders(), &[main_ref(11)]);
    }

    #[test]
    fn test_panel_builder() {
        let panel = Panel::new("files")
            .with_min_size(Size::new(120, 100))
            .with_affinities(&["editor"]);
        assert_eq!(panel.name(), "files");
        assert_eq!(panel.title, "files");
        assert!(!panel.is_open());
        assert_eq!(panel.affinities, vec!["editor".to_string()]);
    }
}
