//! The session: every window, region and panel of one application
//!
//! The host builds a [`Session`] explicitly and passes it by reference. Panel
//! operations (dock, tab, close, float, reopen) update the regions and panels
//! here and call into the splitter layout of the window involved.

pub mod window;

use std::collections::BTreeMap;

pub use window::{
    FloatingWindow, MainWindow, MainWindowFactory, MainWindowOptions, PanelFactory, Screen,
    ScreenProvider, SingleScreen, WindowState, DEFAULT_FLOATING_SIZE, DEFAULT_MAIN_WINDOW_SIZE,
};

use crate::config::LayoutConfig;
use crate::layout::{AddingOption, AnchorId, Dockable, ItemId, SplitterLayout};
use crate::model::{
    FloatingWindowId, LayoutRef, Location, Panel, PlaceholderRef, Rect, Region, RegionId,
    RegionOptions, SideBarLocation, Size,
};

pub struct Session {
    config: LayoutConfig,
    pub(crate) panels: BTreeMap<String, Panel>,
    pub(crate) regions: BTreeMap<RegionId, Region>,
    next_region_id: u64,
    pub(crate) main_windows: Vec<MainWindow>,
    pub(crate) floating_windows: BTreeMap<FloatingWindowId, FloatingWindow>,
    next_floating_id: u64,
    main_window_factory: Option<MainWindowFactory>,
    panel_factory: Option<PanelFactory>,
    screens: Box<dyn ScreenProvider>,
    restoring: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl Session {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            panels: BTreeMap::new(),
            regions: BTreeMap::new(),
            next_region_id: 1,
            main_windows: Vec::new(),
            floating_windows: BTreeMap::new(),
            next_floating_id: 1,
            main_window_factory: None,
            panel_factory: None,
            screens: Box::new(SingleScreen::default()),
            restoring: false,
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// A saved layout is being loaded into this session
    pub fn is_restoring(&self) -> bool {
        self.restoring
    }

    pub(crate) fn set_restoring(&mut self, restoring: bool) {
        self.restoring = restoring;
    }

    // ========================================================================
    // Collaborator hooks
    // ========================================================================

    pub fn set_main_window_factory(&mut self, factory: impl Fn(&str) -> MainWindow + 'static) {
        self.main_window_factory = Some(Box::new(factory));
    }

    pub fn set_panel_factory(&mut self, factory: impl Fn(&str) -> Option<Panel> + 'static) {
        self.panel_factory = Some(Box::new(factory));
    }

    pub fn set_screen_provider(&mut self, provider: impl ScreenProvider + 'static) {
        self.screens = Box::new(provider);
    }

    pub fn screen_provider(&self) -> &dyn ScreenProvider {
        self.screens.as_ref()
    }

    pub(crate) fn build_main_window(&self, name: &str) -> Option<MainWindow> {
        self.main_window_factory.as_ref().map(|factory| factory(name))
    }

    pub(crate) fn build_panel(&self, name: &str) -> Option<Panel> {
        self.panel_factory.as_ref().and_then(|factory| factory(name))
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    pub fn panel(&self, name: &str) -> Option<&Panel> {
        self.panels.get(name)
    }

    pub(crate) fn panel_mut(&mut self, name: &str) -> Option<&mut Panel> {
        self.panels.get_mut(name)
    }

    pub fn panels(&self) -> impl Iterator<Item = &Panel> {
        self.panels.values()
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(&id)
    }

    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    pub fn region_of_panel(&self, name: &str) -> Option<&Region> {
        self.panels
            .get(name)
            .and_then(|p| p.region)
            .and_then(|r| self.regions.get(&r))
    }

    pub fn main_window_by_name(&self, name: &str) -> Option<&MainWindow> {
        self.main_windows.iter().find(|w| w.name() == name)
    }

    pub(crate) fn main_window_mut(&mut self, name: &str) -> Option<&mut MainWindow> {
        self.main_windows.iter_mut().find(|w| w.name() == name)
    }

    pub fn main_windows(&self) -> &[MainWindow] {
        &self.main_windows
    }

    pub fn floating_window(&self, id: FloatingWindowId) -> Option<&FloatingWindow> {
        self.floating_windows.get(&id)
    }

    pub fn floating_windows(&self) -> impl Iterator<Item = &FloatingWindow> {
        self.floating_windows.values()
    }

    pub fn layout(&self, layout: &LayoutRef) -> Option<&SplitterLayout> {
        match layout {
            LayoutRef::MainWindow(name) => self.main_window_by_name(name).map(|w| &w.layout),
            LayoutRef::Floating(id) => self.floating_windows.get(id).map(|w| &w.layout),
        }
    }

    pub(crate) fn layout_mut(&mut self, layout: &LayoutRef) -> Option<&mut SplitterLayout> {
        match layout {
            LayoutRef::MainWindow(name) => self.main_window_mut(name).map(|w| &mut w.layout),
            LayoutRef::Floating(id) => self.floating_windows.get_mut(id).map(|w| &mut w.layout),
        }
    }

    fn window_affinities(&self, layout: &LayoutRef) -> Option<&[String]> {
        match layout {
            LayoutRef::MainWindow(name) => self
                .main_window_by_name(name)
                .map(|w| w.affinities.as_slice()),
            LayoutRef::Floating(id) => self
                .floating_windows
                .get(id)
                .map(|w| w.affinities.as_slice()),
        }
    }

    /// Panels that are neither shown nor minimized to a side bar
    pub fn closed_panels(&self) -> Vec<&str> {
        self.panels
            .values()
            .filter(|p| !p.is_open() && p.side_bar.is_none())
            .map(|p| p.name())
            .collect()
    }

    /// Geometry of a docked panel's region within its window
    pub fn panel_geometry(&self, name: &str) -> Option<Rect> {
        let region = self.region_of_panel(name)?;
        let layout = self.layout(region.owner.as_ref()?)?;
        layout.item_geometry(region.item?)
    }

    /// Two affinity lists match when both are empty or they share a name
    pub fn affinities_match(first: &[String], second: &[String]) -> bool {
        if first.is_empty() && second.is_empty() {
            return true;
        }
        first.iter().any(|a| second.contains(a))
    }

    /// Cross-check panels, regions and layouts; logs every problem found
    pub fn is_sane(&self) -> bool {
        let mut sane = true;

        for window in &self.main_windows {
            if !window.layout.check_sanity() {
                tracing::warn!("Main window '{}' has an insane layout", window.name());
                sane = false;
            }
        }
        for window in self.floating_windows.values() {
            if !window.layout.check_sanity() {
                tracing::warn!("Floating window #{} has an insane layout", window.id().0);
                sane = false;
            }
        }

        for region in self.regions.values() {
            let Some(owner) = region.owner.as_ref() else {
                tracing::warn!("Region {} has no owner", region.id());
                sane = false;
                continue;
            };
            let item = self.layout(owner).and_then(|l| l.item_for_region(region.id()));
            if item.is_none() || item != region.item {
                tracing::warn!("Region {} is not in {}", region.id(), owner);
                sane = false;
            }
            if region.is_empty() && !region.is_central() {
                tracing::warn!("Region {} is empty", region.id());
                sane = false;
            }
            for name in region.panels() {
                if self.panels.get(name).and_then(|p| p.region) != Some(region.id()) {
                    tracing::warn!("Region {} lists panel '{}' docked elsewhere", region.id(), name);
                    sane = false;
                }
            }
        }

        for panel in self.panels.values() {
            if let Some(region) = panel.region {
                if !self.regions.get(&region).is_some_and(|r| r.contains(panel.name())) {
                    tracing::warn!("Panel '{}' points at region {} which lacks it", panel.name(), region);
                    sane = false;
                }
            }
            for placeholder in panel.last_position.placeholders() {
                let exists = self
                    .layout(&placeholder.layout)
                    .is_some_and(|l| l.contains(placeholder.item));
                if !exists {
                    tracing::warn!(
                        "Panel '{}' remembers a vanished item {:?} in {}",
                        panel.name(),
                        placeholder.item,
                        placeholder.layout
                    );
                    sane = false;
                }
            }
        }

        sane
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a panel; names must be unique and non-empty
    pub fn create_panel(&mut self, panel: Panel) -> bool {
        if panel.name().is_empty() {
            tracing::warn!("Refusing panel with an empty name");
            return false;
        }
        if self.panels.contains_key(panel.name()) {
            tracing::warn!("Panel '{}' already exists", panel.name());
            return false;
        }
        tracing::debug!("Created panel '{}'", panel.name());
        self.panels.insert(panel.name().to_string(), panel);
        true
    }

    /// Register a main window, giving it a fresh layout (and central region)
    pub fn add_main_window(&mut self, mut window: MainWindow) -> bool {
        if window.name().is_empty() || self.main_window_by_name(window.name()).is_some() {
            tracing::warn!("Refusing main window '{}': empty or duplicate name", window.name());
            return false;
        }

        let size = if window.geometry.is_valid() {
            window.geometry.size()
        } else {
            DEFAULT_MAIN_WINDOW_SIZE
        };
        window.layout = SplitterLayout::new(size, self.config.clone());
        window.central_region = None;
        let name = window.name().to_string();
        let has_central = window.options().has_central;
        self.main_windows.push(window);

        if has_central {
            self.create_central_region(&name);
        }
        self.sync_window_geometry(&LayoutRef::MainWindow(name));
        true
    }

    pub(crate) fn create_central_region(&mut self, window: &str) -> Option<RegionId> {
        let owner = LayoutRef::MainWindow(window.to_string());
        let region = self.create_region(owner.clone(), RegionOptions::central(), None);
        let min_size = self.region_min_size(region);
        let item = self.layout_mut(&owner).and_then(|layout| {
            layout
                .add_widget(
                    Dockable::Region {
                        id: region,
                        min_size,
                        size_hint: Size::default(),
                    },
                    Location::OnLeft,
                    None,
                    AddingOption::None,
                )
                .first()
                .copied()
        });

        let Some(item) = item else {
            tracing::warn!("Could not place the central region of '{}'", window);
            self.regions.remove(&region);
            return None;
        };
        if let Some(r) = self.regions.get_mut(&region) {
            r.item = Some(item);
        }
        if let Some(w) = self.main_window_mut(window) {
            w.central_region = Some(region);
        }
        Some(region)
    }

    /// New region owned by `owner`; `preferred` is used when still free
    pub(crate) fn create_region(
        &mut self,
        owner: LayoutRef,
        options: RegionOptions,
        preferred: Option<RegionId>,
    ) -> RegionId {
        let id = match preferred {
            Some(id) if !self.regions.contains_key(&id) => id,
            _ => {
                while self.regions.contains_key(&RegionId(self.next_region_id)) {
                    self.next_region_id += 1;
                }
                RegionId(self.next_region_id)
            }
        };
        self.next_region_id = self.next_region_id.max(id.0 + 1);

        let mut region = Region::new(id, options);
        region.owner = Some(owner);
        self.regions.insert(id, region);
        id
    }

    pub(crate) fn new_floating_id(&mut self) -> FloatingWindowId {
        let id = FloatingWindowId(self.next_floating_id);
        self.next_floating_id += 1;
        id
    }

    /// Largest panel minimum, never below the configured region minimum
    pub(crate) fn region_min_size(&self, region: RegionId) -> Size {
        let floor = Size::new(self.config.min_region_width, self.config.min_region_height);
        self.regions
            .get(&region)
            .map(|r| {
                r.panels()
                    .iter()
                    .filter_map(|name| self.panels.get(name))
                    .fold(floor, |acc, p| acc.expanded_to(p.min_size))
            })
            .unwrap_or(floor)
    }

    fn region_size_hint(&self, region: RegionId) -> Size {
        self.regions
            .get(&region)
            .map(|r| {
                r.panels()
                    .iter()
                    .filter_map(|name| self.panels.get(name))
                    .fold(Size::default(), |acc, p| acc.expanded_to(p.size_hint))
            })
            .unwrap_or_default()
    }

    // ========================================================================
    // Internal bookkeeping
    // ========================================================================

    /// Make the window geometry match its layout size
    pub(crate) fn sync_window_geometry(&mut self, layout: &LayoutRef) {
        match layout {
            LayoutRef::MainWindow(name) => {
                if let Some(window) = self.main_window_mut(name) {
                    let size = window.layout.size();
                    window.geometry.width = size.width;
                    window.geometry.height = size.height;
                }
            }
            LayoutRef::Floating(id) => {
                if let Some(window) = self.floating_windows.get_mut(id) {
                    let size = window.layout.size();
                    window.geometry.width = size.width;
                    window.geometry.height = size.height;
                }
            }
        }
    }

    /// Record a placeholder for a panel, referencing its item
    pub(crate) fn remember_placeholder(&mut self, panel: &str, layout: LayoutRef, item: ItemId) {
        let Some(p) = self.panels.get_mut(panel) else {
            return;
        };
        if p.last_position.contains(&layout, item) {
            return;
        }
        let placeholder = PlaceholderRef {
            layout: layout.clone(),
            item,
        };
        let displaced = p.last_position.push_placeholder(placeholder);
        if let Some(l) = self.layout_mut(&layout) {
            l.ref_item(item);
        }
        for old in displaced {
            self.unref_placeholder(&old);
        }
    }

    pub(crate) fn unref_placeholder(&mut self, placeholder: &PlaceholderRef) {
        if let Some(layout) = self.layout_mut(&placeholder.layout) {
            layout.unref_item(placeholder.item);
        }
        self.remove_floating_window_if_empty(&placeholder.layout);
    }

    fn remove_floating_window_if_empty(&mut self, layout: &LayoutRef) {
        if let LayoutRef::Floating(id) = layout {
            let empty = self
                .floating_windows
                .get(id)
                .is_some_and(|w| !w.layout.has_visible_items());
            if empty {
                self.remove_floating_window(*id);
            }
        }
    }

    /// Take a panel out of its region, disposing the region if it empties
    fn detach_panel(&mut self, name: &str) -> Option<RegionId> {
        let region_id = self.panels.get(name)?.region?;
        let index = self
            .regions
            .get_mut(&region_id)
            .and_then(|r| r.remove_panel(name));
        let floating_geometry = match self.regions.get(&region_id).and_then(|r| r.owner.as_ref()) {
            Some(LayoutRef::Floating(id)) => self.floating_windows.get(id).map(|w| w.geometry),
            _ => None,
        };

        let restoring = self.restoring;
        if let Some(panel) = self.panels.get_mut(name) {
            panel.region = None;
            panel.visible = false;
        }
        // A restore rewrites the last position from the document
        if let Some(panel) = self.panels.get_mut(name).filter(|_| !restoring) {
            panel.last_position.was_floating = floating_geometry.is_some();
            if let Some(geometry) = floating_geometry {
                panel.last_position.last_floating_geometry = geometry;
            }
            if let Some(index) = index {
                panel.last_position.tab_index = index;
            }
        }

        self.after_region_changed(region_id);
        Some(region_id)
    }

    /// Dispose an emptied region or refresh its item's minimum size
    fn after_region_changed(&mut self, region_id: RegionId) {
        let Some(region) = self.regions.get(&region_id) else {
            return;
        };
        if region.is_empty() && !region.is_central() {
            self.dispose_region(region_id);
            return;
        }

        let (Some(owner), Some(item)) = (region.owner.clone(), region.item) else {
            return;
        };
        let min_size = self.region_min_size(region_id);
        if let Some(layout) = self.layout_mut(&owner) {
            layout.set_item_min_size(item, min_size);
        }
        self.sync_window_geometry(&owner);
    }

    /// Delete a region; its item stays as a placeholder while anyone remembers it
    pub(crate) fn dispose_region(&mut self, region_id: RegionId) {
        let Some(region) = self.regions.remove(&region_id) else {
            return;
        };
        tracing::debug!("Disposing region {}", region_id);

        for name in region.panels() {
            if let Some(panel) = self.panels.get_mut(name) {
                panel.region = None;
                panel.visible = false;
            }
        }

        let Some(owner) = region.owner.clone() else {
            return;
        };
        if let (Some(layout), Some(item)) = (self.layout_mut(&owner), region.item) {
            let referenced = layout.item(item).is_some_and(|i| i.ref_count() > 0);
            if referenced {
                layout.turn_into_placeholder(item);
            } else {
                layout.remove_item(item);
            }
        }

        if let LayoutRef::MainWindow(name) = &owner {
            if let Some(window) = self.main_window_mut(name) {
                if window.central_region == Some(region_id) {
                    window.central_region = None;
                }
            }
        }

        self.remove_floating_window_if_empty(&owner);
        self.sync_window_geometry(&owner);
    }

    /// Delete a floating window, closing its panels and forgetting its placeholders
    pub(crate) fn remove_floating_window(&mut self, id: FloatingWindowId) -> bool {
        let Some(_window) = self.floating_windows.remove(&id) else {
            return false;
        };
        tracing::debug!("Removing floating window #{}", id.0);
        let owner = LayoutRef::Floating(id);

        let owned: Vec<RegionId> = self
            .regions
            .values()
            .filter(|r| r.owner.as_ref() == Some(&owner))
            .map(|r| r.id())
            .collect();
        for region_id in owned {
            if let Some(region) = self.regions.remove(&region_id) {
                for name in region.panels() {
                    if let Some(panel) = self.panels.get_mut(name) {
                        panel.region = None;
                        panel.visible = false;
                    }
                }
            }
        }

        for panel in self.panels.values_mut() {
            panel.last_position.remove_layout(&owner);
        }
        true
    }

    pub(crate) fn dock_into_region(&mut self, name: &str, region_id: RegionId) {
        let owner = self.regions.get(&region_id).and_then(|r| r.owner.clone());
        if let Some(panel) = self.panels.get_mut(name) {
            panel.region = Some(region_id);
            panel.visible = true;
            panel.side_bar = None;
            panel.was_restored = false;
            if let Some(owner) = owner {
                panel.last_position.was_floating = !owner.is_main_window();
            }
        }
    }

    // ========================================================================
    // Docking
    // ========================================================================

    /// Dock a panel into a window, in a new region next to `relative_to`
    ///
    /// With [`AddingOption::StartHidden`] only a placeholder is created and the
    /// panel stays closed until opened.
    pub fn add_panel(
        &mut self,
        name: &str,
        target: &LayoutRef,
        location: Location,
        relative_to: Option<RegionId>,
        option: AddingOption,
    ) -> bool {
        let Some(panel) = self.panels.get(name) else {
            tracing::warn!("add_panel: unknown panel '{}'", name);
            return false;
        };
        if panel.options.not_dockable {
            tracing::warn!("Panel '{}' can't be docked", name);
            return false;
        }
        let Some(target_affinities) = self.window_affinities(target) else {
            tracing::warn!("add_panel: unknown window {}", target);
            return false;
        };
        if !Self::affinities_match(&panel.affinities, target_affinities) {
            tracing::warn!("Panel '{}' doesn't match the affinities of {}", name, target);
            return false;
        }

        if let Some(relative) = relative_to {
            let Some(region) = self.regions.get(&relative) else {
                tracing::warn!("add_panel: unknown relative region {}", relative);
                return false;
            };
            if region.owner.as_ref() != Some(target) {
                tracing::warn!("add_panel: region {} is not in {}", relative, target);
                return false;
            }
            if panel.region == Some(relative) && region.len() == 1 {
                tracing::warn!("add_panel: can't dock '{}' next to itself", name);
                return false;
            }
        }

        if option == AddingOption::None && panel.region.is_some() {
            self.detach_panel(name);
        }
        if self.layout(target).is_none() {
            tracing::warn!("add_panel: {} went away while undocking '{}'", target, name);
            return false;
        }
        let relative_item = relative_to.and_then(|r| self.regions.get(&r)).and_then(|r| r.item);

        if option == AddingOption::StartHidden {
            let item = self
                .layout_mut(target)
                .and_then(|layout| layout.add_placeholder(location, relative_item));
            let Some(item) = item else {
                return false;
            };
            self.remember_placeholder(name, target.clone(), item);
            return true;
        }

        if !self.place_in_new_region(name, target, location, relative_item) {
            return false;
        }
        tracing::debug!("Docked '{}' into {} at {}", name, target, location.as_str());
        true
    }

    /// Put a panel into a fresh region inserted into `target`
    fn place_in_new_region(
        &mut self,
        name: &str,
        target: &LayoutRef,
        location: Location,
        relative_item: Option<ItemId>,
    ) -> bool {
        let region_id = self.create_region(target.clone(), RegionOptions::default(), None);
        if let Some(region) = self.regions.get_mut(&region_id) {
            region.insert_panel(name, None);
        }
        let min_size = self.region_min_size(region_id);
        let size_hint = self.region_size_hint(region_id);

        let item = self.layout_mut(target).and_then(|layout| {
            layout
                .add_widget(
                    Dockable::Region {
                        id: region_id,
                        min_size,
                        size_hint,
                    },
                    location,
                    relative_item,
                    AddingOption::None,
                )
                .first()
                .copied()
        });
        let Some(item) = item else {
            self.regions.remove(&region_id);
            return false;
        };

        if let Some(region) = self.regions.get_mut(&region_id) {
            region.item = Some(item);
        }
        self.dock_into_region(name, region_id);
        self.remember_placeholder(name, target.clone(), item);
        self.sync_window_geometry(target);
        true
    }

    /// Add a panel as a tab of an existing region
    pub fn add_panel_as_tab(&mut self, name: &str, region_id: RegionId, index: Option<usize>) -> bool {
        let Some(panel) = self.panels.get(name) else {
            tracing::warn!("add_panel_as_tab: unknown panel '{}'", name);
            return false;
        };
        let Some(owner) = self.regions.get(&region_id).and_then(|r| r.owner.clone()) else {
            tracing::warn!("add_panel_as_tab: unknown region {}", region_id);
            return false;
        };
        if panel.region == Some(region_id) {
            return true;
        }
        let affinities_ok = self
            .window_affinities(&owner)
            .is_some_and(|a| Self::affinities_match(&panel.affinities, a));
        if !affinities_ok {
            tracing::warn!("Panel '{}' doesn't match the affinities of {}", name, owner);
            return false;
        }

        if panel.region.is_some() {
            self.detach_panel(name);
        }
        let Some(region) = self.regions.get_mut(&region_id) else {
            tracing::warn!("add_panel_as_tab: region {} went away", region_id);
            return false;
        };
        let position = region.insert_panel(name, index);
        region.set_current_tab(position);
        let item = region.item;

        self.dock_into_region(name, region_id);
        if let Some(panel) = self.panels.get_mut(name) {
            panel.last_position.tab_index = position;
        }
        self.after_region_changed(region_id);
        if let Some(item) = item {
            self.remember_placeholder(name, owner, item);
        }
        true
    }

    /// Close a panel, keeping a placeholder where it was
    pub fn close_panel(&mut self, name: &str) -> bool {
        let Some(panel) = self.panels.get(name) else {
            tracing::warn!("close_panel: unknown panel '{}'", name);
            return false;
        };
        if panel.options.not_closable {
            tracing::warn!("Panel '{}' can't be closed", name);
            return false;
        }

        if panel.side_bar.is_some() {
            self.remove_from_side_bar(name);
            return true;
        }
        if panel.region.is_none() {
            return true;
        }

        self.detach_panel(name);
        tracing::debug!("Closed panel '{}'", name);
        true
    }

    /// Float a panel in a new window
    pub fn float_panel(&mut self, name: &str, geometry: Option<Rect>) -> Option<FloatingWindowId> {
        let Some(panel) = self.panels.get(name) else {
            tracing::warn!("float_panel: unknown panel '{}'", name);
            return None;
        };

        // Already alone in a floating window
        if let Some(region) = panel.region.and_then(|r| self.regions.get(&r)) {
            if let Some(LayoutRef::Floating(id)) = region.owner.clone() {
                let alone = region.len() == 1
                    && self
                        .floating_windows
                        .get(&id)
                        .is_some_and(|w| w.layout.visible_count() == 1);
                if alone {
                    return Some(id);
                }
            }
        }

        let hint = panel.size_hint;
        let last = panel.last_position.last_floating_geometry;
        if panel.region.is_some() || panel.side_bar.is_some() {
            self.remove_from_side_bar(name);
            self.detach_panel(name);
        }

        let geometry = geometry
            .filter(|g| g.is_valid())
            .or(Some(last).filter(|g| g.is_valid()))
            .unwrap_or_else(|| {
                let size = if hint.is_valid() { hint } else { DEFAULT_FLOATING_SIZE };
                Rect::new(100, 100, size.width, size.height)
            });

        let id = self.new_floating_id();
        let mut window = FloatingWindow::new(id, geometry, self.config.clone());
        window.affinities = self
            .panels
            .get(name)
            .map(|p| p.affinities.clone())
            .unwrap_or_default();
        window.screen_index = self.screens.screen_index_for(geometry);
        self.floating_windows.insert(id, window);

        let owner = LayoutRef::Floating(id);
        if !self.place_in_new_region(name, &owner, Location::OnLeft, None) {
            self.floating_windows.remove(&id);
            return None;
        }

        let geometry = self.floating_windows.get(&id).map(|w| w.geometry);
        if let (Some(panel), Some(geometry)) = (self.panels.get_mut(name), geometry) {
            panel.last_position.last_floating_geometry = geometry;
        }
        tracing::debug!("Floated '{}' in window #{}", name, id.0);
        Some(id)
    }

    /// Merge a floating window's whole layout into a main window
    pub fn dock_floating_window(
        &mut self,
        id: FloatingWindowId,
        main_window: &str,
        location: Location,
        relative_to: Option<RegionId>,
    ) -> bool {
        let Some(floating) = self.floating_windows.get(&id) else {
            tracing::warn!("dock_floating_window: unknown window #{}", id.0);
            return false;
        };
        let Some(target) = self.main_window_by_name(main_window) else {
            tracing::warn!("dock_floating_window: unknown main window '{}'", main_window);
            return false;
        };
        if !Self::affinities_match(&floating.affinities, &target.affinities) {
            tracing::warn!("Floating window #{} doesn't match '{}'", id.0, main_window);
            return false;
        }

        let from = LayoutRef::Floating(id);
        let to = LayoutRef::MainWindow(main_window.to_string());
        let relative_item = match relative_to {
            Some(region) => match self.regions.get(&region) {
                Some(r) if r.owner.as_ref() == Some(&to) => r.item,
                _ => {
                    tracing::warn!("dock_floating_window: region {} is not in '{}'", region, main_window);
                    return false;
                }
            },
            None => None,
        };

        let Some(floating) = self.floating_windows.remove(&id) else {
            return false;
        };
        let mapping = match self.main_window_mut(main_window) {
            Some(window) => window
                .layout
                .add_layout(floating.layout.clone(), location, relative_item),
            None => BTreeMap::new(),
        };
        if mapping.is_empty() {
            tracing::warn!("Could not dock floating window #{}", id.0);
            self.floating_windows.insert(id, floating);
            return false;
        }

        for region in self.regions.values_mut() {
            if region.owner.as_ref() == Some(&from) {
                region.owner = Some(to.clone());
                region.item = region.item.and_then(|item| mapping.get(&item).copied());
            }
        }
        for panel in self.panels.values_mut() {
            panel.last_position.remap(&from, &to, &mapping);
        }
        let docked: Vec<String> = self
            .regions
            .values()
            .filter(|r| r.owner.as_ref() == Some(&to))
            .flat_map(|r| r.panels().to_vec())
            .collect();
        for name in docked {
            if let Some(panel) = self.panels.get_mut(&name) {
                panel.last_position.was_floating = false;
            }
        }

        self.sync_window_geometry(&to);
        tracing::debug!("Docked floating window #{} into '{}'", id.0, main_window);
        true
    }

    /// Show a closed panel where it was last seen
    ///
    /// Goes back into the remembered region as a tab, re-fills a remembered
    /// placeholder, or floats at the last floating geometry.
    pub fn open_panel(&mut self, name: &str) -> bool {
        let Some(panel) = self.panels.get(name) else {
            tracing::warn!("open_panel: unknown panel '{}'", name);
            return false;
        };
        if panel.is_open() {
            return true;
        }
        if panel.side_bar.is_some() {
            return self.restore_from_sidebar(name);
        }

        let tab_index = panel.last_position.tab_index;
        if let Some(placeholder) = panel.last_position.last_placeholder().cloned() {
            let target = self
                .layout(&placeholder.layout)
                .and_then(|l| l.item(placeholder.item))
                .map(|item| item.region());
            match target {
                Some(Some(region)) => return self.add_panel_as_tab(name, region, Some(tab_index)),
                Some(None) => return self.restore_into_placeholder(name, &placeholder),
                None => {
                    tracing::debug!("Placeholder of '{}' vanished, floating instead", name);
                }
            }
        }

        self.float_panel(name, None).is_some()
    }

    fn restore_into_placeholder(&mut self, name: &str, placeholder: &PlaceholderRef) -> bool {
        let region_id = self.create_region(placeholder.layout.clone(), RegionOptions::default(), None);
        if let Some(region) = self.regions.get_mut(&region_id) {
            region.insert_panel(name, None);
            region.item = Some(placeholder.item);
        }
        let min_size = self.region_min_size(region_id);
        let size_hint = self.region_size_hint(region_id);

        let restored = self
            .layout_mut(&placeholder.layout)
            .is_some_and(|l| l.restore_placeholder(placeholder.item, region_id, min_size, size_hint));
        if !restored {
            self.regions.remove(&region_id);
            return false;
        }

        self.dock_into_region(name, region_id);
        self.sync_window_geometry(&placeholder.layout);
        tracing::debug!("Restored '{}' into its placeholder in {}", name, placeholder.layout);
        true
    }

    pub fn set_current_tab(&mut self, region: RegionId, index: usize) -> bool {
        match self.regions.get_mut(&region) {
            Some(r) => r.set_current_tab(index),
            None => {
                tracing::warn!("set_current_tab: unknown region {}", region);
                false
            }
        }
    }

    // ========================================================================
    // Windows
    // ========================================================================

    /// Resize a window's layout, never below its minimum size
    pub fn resize_window(&mut self, layout: &LayoutRef, size: Size) -> bool {
        let Some(l) = self.layout_mut(layout) else {
            tracing::warn!("resize_window: unknown window {}", layout);
            return false;
        };
        let target = size.expanded_to(l.min_size());
        if target != size {
            tracing::debug!("Clamping resize of {} from {:?} to {:?}", layout, size, target);
        }
        let applied = l.set_size(target);
        self.sync_window_geometry(layout);
        applied && target == size
    }

    pub fn resize_main_window(&mut self, name: &str, size: Size) -> bool {
        self.resize_window(&LayoutRef::MainWindow(name.to_string()), size)
    }

    /// Drag a separator; returns where it ended up
    pub fn move_separator(&mut self, layout: &LayoutRef, anchor: AnchorId, position: i32) -> Option<i32> {
        self.layout_mut(layout)?.move_anchor(anchor, position)
    }

    // ========================================================================
    // Side bars
    // ========================================================================

    /// Minimize a docked panel to a side bar of its main window
    pub fn move_to_sidebar(&mut self, name: &str, location: SideBarLocation) -> bool {
        let Some(owner) = self.region_of_panel(name).and_then(|r| r.owner.clone()) else {
            tracing::warn!("move_to_sidebar: panel '{}' is not docked", name);
            return false;
        };
        let LayoutRef::MainWindow(window) = owner else {
            tracing::warn!("move_to_sidebar: panel '{}' is floating", name);
            return false;
        };

        self.detach_panel(name);
        self.add_to_side_bar(name, &window, location)
    }

    pub(crate) fn add_to_side_bar(&mut self, name: &str, window: &str, location: SideBarLocation) -> bool {
        let Some(main_window) = self.main_window_mut(window) else {
            return false;
        };
        let names = main_window.side_bars.entry(location).or_default();
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
        if let Some(panel) = self.panels.get_mut(name) {
            panel.side_bar = Some((window.to_string(), location));
        }
        true
    }

    pub(crate) fn remove_from_side_bar(&mut self, name: &str) {
        let Some((window, location)) = self.panels.get_mut(name).and_then(|p| p.side_bar.take()) else {
            return;
        };
        if let Some(main_window) = self.main_window_mut(&window) {
            if let Some(names) = main_window.side_bars.get_mut(&location) {
                names.retain(|n| n != name);
                if names.is_empty() {
                    main_window.side_bars.remove(&location);
                }
            }
        }
    }

    /// Take a panel off its side bar and show it where it was docked
    pub fn restore_from_sidebar(&mut self, name: &str) -> bool {
        if self.panels.get(name).and_then(|p| p.side_bar.as_ref()).is_none() {
            tracing::warn!("restore_from_sidebar: panel '{}' is not in a side bar", name);
            return false;
        }
        self.remove_from_side_bar(name);
        self.open_panel(name)
    }

    // ========================================================================
    // Restore support
    // ========================================================================

    /// Close a panel for a restore: no closability check, placeholders dropped
    pub(crate) fn close_panel_for_restore(&mut self, name: &str) {
        self.remove_from_side_bar(name);
        self.detach_panel(name);
        let placeholders = self
            .panels
            .get_mut(name)
            .map(|p| p.last_position.take_placeholders())
            .unwrap_or_default();
        for placeholder in placeholders {
            self.unref_placeholder(&placeholder);
        }
    }

    /// Empty a main window completely so a saved layout can be loaded into it
    pub(crate) fn clear_main_window(&mut self, name: &str) {
        let owner = LayoutRef::MainWindow(name.to_string());
        let owned: Vec<RegionId> = self
            .regions
            .values()
            .filter(|r| r.owner.as_ref() == Some(&owner))
            .map(|r| r.id())
            .collect();
        for region_id in owned {
            if let Some(region) = self.regions.remove(&region_id) {
                for panel in region.panels() {
                    if let Some(p) = self.panels.get_mut(panel) {
                        p.region = None;
                        p.visible = false;
                    }
                }
            }
        }
        for panel in self.panels.values_mut() {
            panel.last_position.remove_layout(&owner);
            if panel.side_bar.as_ref().is_some_and(|(w, _)| w == name) {
                panel.side_bar = None;
            }
        }

        let config = self.config.clone();
        if let Some(window) = self.main_window_mut(name) {
            let size = window.layout.size();
            window.layout = SplitterLayout::new(size, config);
            window.side_bars.clear();
            window.central_region = None;
        }
    }

    /// Delete every empty non-central region
    pub(crate) fn cleanup_empty_regions(&mut self) {
        let empty: Vec<RegionId> = self
            .regions
            .values()
            .filter(|r| r.is_empty() && !r.is_central())
            .map(|r| r.id())
            .collect();
        for region in empty {
            self.dispose_region(region);
        }
    }

    /// Drop placeholders no panel remembers, then floating windows left empty
    pub(crate) fn remove_unreferenced_placeholders(&mut self) {
        for window in &mut self.main_windows {
            window.layout.remove_unreferenced_placeholders();
        }
        for window in self.floating_windows.values_mut() {
            window.layout.remove_unreferenced_placeholders();
        }
        let empty: Vec<FloatingWindowId> = self
            .floating_windows
            .values()
            .filter(|w| !w.layout.has_visible_items())
            .map(|w| w.id())
            .collect();
        for id in empty {
            self.remove_floating_window(id);
        }
    }
}
