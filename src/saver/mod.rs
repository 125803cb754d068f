//! Saving and restoring whole-session layouts
//!
//! [`LayoutSaver::serialize_layout`] turns a sane session into a JSON
//! document. [`LayoutSaver::restore_layout`] validates a document before it
//! touches anything, then rebuilds main windows, floating windows, closed
//! panels and placeholders in that order.

mod document;
mod options;
mod scaling;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

pub use document::{
    FloatingWindowRecord, LayoutDocument, MainWindowRecord, MultiSplitterRecord, PanelRecord,
    PlaceholderRecord, PositionRecord, RegionRecord, ScreenInfo, FLOATING_FLAGS_FROM_GLOBAL_CONFIG,
    SERIALIZATION_VERSION,
};
pub use options::{InternalRestoreOptions, RestoreOptions};
pub use scaling::ScalingInfo;

use crate::layout::SplitterLayout;
use crate::model::{FloatingWindowId, LastPosition, LayoutRef, RegionId, RegionOptions, Size};
use crate::session::{FloatingWindow, Session, WindowState};

#[derive(Debug, Clone, Default)]
pub struct LayoutSaver {
    options: RestoreOptions,
    affinity_names: Vec<String>,
}

impl LayoutSaver {
    pub fn new(options: RestoreOptions) -> Self {
        Self {
            options,
            affinity_names: Vec::new(),
        }
    }

    pub fn options(&self) -> RestoreOptions {
        self.options
    }

    /// Only save and restore windows and panels with one of these affinities
    pub fn set_affinity_names(&mut self, names: &[&str]) {
        self.affinity_names = names.iter().map(|n| n.to_string()).collect();
    }

    pub fn affinity_names(&self) -> &[String] {
        &self.affinity_names
    }

    /// An empty filter matches everything, and so does an empty affinity list
    pub fn matches_affinity(&self, affinities: &[String]) -> bool {
        self.affinity_names.is_empty()
            || affinities.is_empty()
            || Session::affinities_match(&self.affinity_names, affinities)
    }

    // ========================================================================
    // Save
    // ========================================================================

    /// Encoded document, or `None` when the session fails its sanity check
    pub fn serialize_layout(&self, session: &Session) -> Option<Vec<u8>> {
        self.document(session).map(|document| document.to_json())
    }

    pub fn document(&self, session: &Session) -> Option<LayoutDocument> {
        if !session.is_sane() {
            tracing::error!("Refusing to save an inconsistent session, see previous warnings");
            return None;
        }

        let screens = session.screen_provider().screens();
        let screen_size = |index: i32| {
            usize::try_from(index)
                .ok()
                .and_then(|i| screens.get(i))
                .map(|s| s.geometry.size())
                .unwrap_or(Size::new(800, 600))
        };

        let main_windows: Vec<_> = session
            .main_windows()
            .iter()
            .filter(|w| self.matches_affinity(&w.affinities))
            .collect();
        let floating_windows: Vec<&FloatingWindow> = session
            .floating_windows()
            .filter(|w| self.matches_affinity(&w.affinities))
            .collect();
        let floating_index: BTreeMap<FloatingWindowId, i32> = floating_windows
            .iter()
            .enumerate()
            .map(|(i, w)| (w.id(), i as i32))
            .collect();
        let saved_main_windows: Vec<&str> = main_windows.iter().map(|w| w.name()).collect();

        let main_window_records = main_windows
            .iter()
            .map(|window| MainWindowRecord {
                options: window.options().bits(),
                multi_splitter_layout: multi_splitter_record(session, window.layout(), window.name()),
                unique_name: window.name().to_string(),
                geometry: window.geometry,
                normal_geometry: window.normal_geometry,
                screen_index: window.screen_index,
                screen_size: screen_size(window.screen_index),
                is_visible: window.is_visible,
                affinities: window.affinities.clone(),
                window_state: window.window_state.code(),
                side_bars: window.side_bars.clone(),
            })
            .collect();

        let floating_window_records = floating_windows
            .iter()
            .map(|window| {
                let parent_index = window
                    .parent
                    .as_deref()
                    .and_then(|p| session.main_windows().iter().position(|m| m.name() == p))
                    .map_or(-1, |i| i as i32);
                FloatingWindowRecord {
                    multi_splitter_layout: multi_splitter_record(
                        session,
                        window.layout(),
                        window.parent.as_deref().unwrap_or_default(),
                    ),
                    parent_index,
                    geometry: window.geometry,
                    normal_geometry: window.normal_geometry,
                    screen_index: window.screen_index,
                    screen_size: screen_size(window.screen_index),
                    is_visible: window.is_visible,
                    flags: window.flags,
                    window_state: window.window_state.code(),
                    affinities: window.affinities.clone(),
                }
            })
            .collect();

        let closed_panels = session
            .closed_panels()
            .into_iter()
            .filter(|name| {
                session
                    .panel(name)
                    .is_some_and(|p| self.matches_affinity(&p.affinities))
            })
            .map(str::to_string)
            .collect();

        let panels = session
            .panels()
            .filter(|p| self.matches_affinity(&p.affinities))
            .map(|panel| PanelRecord {
                affinities: panel.affinities.clone(),
                unique_name: panel.name().to_string(),
                last_position: position_record(
                    session,
                    panel.last_position(),
                    &saved_main_windows,
                    &floating_index,
                ),
            })
            .collect();

        let screen_info = screens
            .iter()
            .enumerate()
            .map(|(index, screen)| ScreenInfo {
                index: index as i32,
                geometry: screen.geometry,
                name: screen.name.clone(),
                device_pixel_ratio: screen.device_pixel_ratio,
            })
            .collect();

        Some(LayoutDocument {
            serialization_version: SERIALIZATION_VERSION,
            main_windows: main_window_records,
            floating_windows: floating_window_records,
            closed_panels,
            panels,
            screen_info,
        })
    }

    pub fn save_to_file(&self, session: &Session, path: &Path) -> bool {
        let Some(data) = self.serialize_layout(session) else {
            return false;
        };
        match write_file(path, &data) {
            Ok(()) => {
                tracing::info!("Saved layout to {}", path.display());
                true
            }
            Err(e) => {
                tracing::error!("{:#}", e);
                false
            }
        }
    }

    // ========================================================================
    // Restore
    // ========================================================================

    /// Load a saved document into the session
    ///
    /// Empty input is a successful no-op. Parse and validation failures leave
    /// the session untouched.
    pub fn restore_layout(&self, session: &mut Session, data: &[u8]) -> bool {
        if data.is_empty() {
            return true;
        }

        let Some(document) = LayoutDocument::from_json(data) else {
            return false;
        };
        if !document.is_valid() {
            return false;
        }

        for panel in session.panels.values_mut() {
            panel.was_restored = false;
        }

        let mut context = RestoreContext::new(session, self);
        match context.run(document) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to restore layout: {:#}", e);
                false
            }
        }
    }

    pub fn restore_from_file(&self, session: &mut Session, path: &Path) -> bool {
        let data = fs::read(path).with_context(|| format!("Failed to read layout from {}", path.display()));
        match data {
            Ok(data) => self.restore_layout(session, &data),
            Err(e) => {
                tracing::error!("{:#}", e);
                false
            }
        }
    }

    /// Panels placed by the last restore
    pub fn restored_panels<'s>(&self, session: &'s Session) -> Vec<&'s str> {
        session
            .panels()
            .filter(|p| p.was_restored())
            .map(|p| p.name())
            .collect()
    }
}

fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, data).with_context(|| format!("Failed to write layout to {}", path.display()))
}

fn multi_splitter_record(session: &Session, layout: &SplitterLayout, main_window: &str) -> MultiSplitterRecord {
    let regions = layout
        .items()
        .filter_map(|item| {
            let id = item.region()?;
            let region = session.region(id)?;
            let record = RegionRecord {
                id: id.to_string(),
                is_null: false,
                object_name: region.current_panel().unwrap_or_default().to_string(),
                geometry: layout.item_geometry(item.id).unwrap_or_default(),
                options: region.options().bits(),
                current_tab_index: region.current_tab() as i32,
                main_window_unique_name: main_window.to_string(),
                panels: region.panels().to_vec(),
            };
            Some((id.to_string(), record))
        })
        .collect();

    MultiSplitterRecord {
        layout: layout.serialize(),
        regions,
    }
}

fn position_record(
    session: &Session,
    position: &LastPosition,
    saved_main_windows: &[&str],
    floating_index: &BTreeMap<FloatingWindowId, i32>,
) -> PositionRecord {
    let placeholders = position
        .placeholders()
        .iter()
        .filter_map(|placeholder| {
            let item_index = session
                .layout(&placeholder.layout)?
                .item_index(placeholder.item)? as i32;
            match &placeholder.layout {
                LayoutRef::MainWindow(name) => saved_main_windows.contains(&name.as_str()).then(|| {
                    PlaceholderRecord {
                        is_floating_window: false,
                        item_index,
                        index_of_floating_window: -1,
                        main_window_unique_name: name.clone(),
                    }
                }),
                LayoutRef::Floating(id) => floating_index.get(id).map(|index| PlaceholderRecord {
                    is_floating_window: true,
                    item_index,
                    index_of_floating_window: *index,
                    main_window_unique_name: String::new(),
                }),
            }
        })
        .collect();

    PositionRecord {
        last_floating_geometry: position.last_floating_geometry,
        last_overlay_geometries: position.last_overlay_geometries.clone(),
        tab_index: position.tab_index as i32,
        was_floating: position.was_floating,
        placeholders,
    }
}

// ============================================================================
// Restore context
// ============================================================================

/// State of one restore in progress
///
/// Holds the session for the duration of the restore. Dropping it deletes the
/// regions the restore left empty and clears the session's restoring flag, on
/// success and failure alike.
pub struct RestoreContext<'a> {
    session: &'a mut Session,
    saver: &'a LayoutSaver,
    options: InternalRestoreOptions,
    /// Document floating window index -> the window created for it
    floating: Vec<Option<FloatingWindowId>>,
}

impl<'a> RestoreContext<'a> {
    fn new(session: &'a mut Session, saver: &'a LayoutSaver) -> Self {
        session.set_restoring(true);
        Self {
            session,
            saver,
            options: InternalRestoreOptions::from(saver.options),
            floating: Vec::new(),
        }
    }

    pub fn is_restoring(&self) -> bool {
        self.session.is_restoring()
    }

    fn run(&mut self, mut document: LayoutDocument) -> Result<()> {
        self.scale(&mut document);
        self.prepare(&document);
        self.restore_main_windows(&document)?;
        self.restore_floating_windows(&document)?;
        self.restore_closed_panels(&document);
        self.restore_placeholders(&document);
        self.session.remove_unreferenced_placeholders();
        Ok(())
    }

    /// Map saved floating geometries onto the current main window sizes
    fn scale(&self, document: &mut LayoutDocument) {
        if document.main_windows.is_empty() || !self.options.skip_main_window_geometry {
            return;
        }

        let scaling: Vec<Option<ScalingInfo>> = document
            .main_windows
            .iter()
            .map(|w| ScalingInfo::new(self.session, &w.unique_name, w.geometry, w.screen_index))
            .collect();

        if self.options.relative_floating_window_geometry {
            for window in &mut document.floating_windows {
                let info = usize::try_from(window.parent_index)
                    .ok()
                    .and_then(|i| scaling.get(i))
                    .and_then(Option::as_ref);
                if let Some(info) = info {
                    window.geometry = info.apply_to_rect(window.geometry);
                }
            }
        }

        if let Some(Some(first)) = scaling.first() {
            for panel in &mut document.panels {
                let geometry = &mut panel.last_position.last_floating_geometry;
                *geometry = first.apply_to_rect(*geometry);
            }
        }
    }

    /// Float what the document won't place, close what it will, empty the target windows
    fn prepare(&mut self, document: &LayoutDocument) {
        let names = document.main_window_names();

        let to_float: Vec<String> = self
            .session
            .panels()
            .filter(|panel| {
                let in_reloaded_window = self
                    .session
                    .region_of_panel(panel.name())
                    .and_then(|r| r.owner())
                    .and_then(|o| o.main_window_name())
                    .is_some_and(|n| names.iter().any(|m| m == n));
                in_reloaded_window && (panel.skips_restore() || !document.contains_panel(panel.name()))
            })
            .map(|panel| panel.name().to_string())
            .collect();
        for name in to_float {
            tracing::debug!("Floating '{}' out of a window being restored", name);
            self.session.float_panel(&name, None);
        }

        let to_close: Vec<String> = document
            .panels
            .iter()
            .filter_map(|record| {
                let panel = self.session.panel(&record.unique_name)?;
                if !self.saver.matches_affinity(&panel.affinities) {
                    return None;
                }
                let keep = panel.skips_restore() && self.in_skip_restore_floating_window(panel.name());
                (!keep).then(|| record.unique_name.clone())
            })
            .collect();
        for name in &to_close {
            self.session.close_panel_for_restore(name);
        }

        for name in &names {
            let matches = self
                .session
                .main_window_by_name(name)
                .is_some_and(|w| self.saver.matches_affinity(&w.affinities));
            if matches {
                self.session.clear_main_window(name);
            }
        }
    }

    fn in_skip_restore_floating_window(&self, name: &str) -> bool {
        let owner = self
            .session
            .region_of_panel(name)
            .and_then(|r| r.owner().cloned());
        let Some(owner @ LayoutRef::Floating(_)) = owner else {
            return false;
        };
        self.session
            .regions()
            .filter(|r| r.owner() == Some(&owner))
            .flat_map(|r| r.panels())
            .all(|n| self.session.panel(n).is_some_and(|p| p.skips_restore()))
    }

    fn skips_restore(&self, record: &MultiSplitterRecord) -> bool {
        record
            .panel_names()
            .all(|n| self.session.panel(n).is_some_and(|p| p.skips_restore()))
    }

    fn restore_main_windows(&mut self, document: &LayoutDocument) -> Result<()> {
        for record in &document.main_windows {
            let name = record.unique_name.as_str();
            if self.session.main_window_by_name(name).is_none() {
                let Some(window) = self.session.build_main_window(name) else {
                    bail!("main window '{}' doesn't exist and there is no factory to create it", name);
                };
                if window.name() != name {
                    bail!("main window factory returned '{}' for '{}'", window.name(), name);
                }
                if !self.session.add_main_window(window) {
                    bail!("could not register main window '{}'", name);
                }
                self.session.clear_main_window(name);
            }

            let matches = self
                .session
                .main_window_by_name(name)
                .is_some_and(|w| self.saver.matches_affinity(&w.affinities));
            if !matches {
                continue;
            }

            if !self.options.skip_main_window_geometry {
                if let Some(window) = self.session.main_window_mut(name) {
                    window.geometry = record.geometry;
                    window.normal_geometry = record.normal_geometry;
                    window.is_visible = record.is_visible;
                    window.window_state = WindowState::from_code(record.window_state);
                    window.screen_index = record.screen_index;
                }
            }

            let owner = LayoutRef::MainWindow(name.to_string());
            self.restore_window_layout(&owner, &record.multi_splitter_layout)
                .with_context(|| format!("restoring main window '{}'", name))?;

            let needs_central = self
                .session
                .main_window_by_name(name)
                .is_some_and(|w| w.options().has_central && w.central_region().is_none());
            if needs_central {
                self.session.create_central_region(name);
            }

            for (location, panels) in &record.side_bars {
                for panel in panels {
                    if !self.ensure_panel(panel) {
                        continue;
                    }
                    self.session.close_panel_for_restore(panel);
                    self.session.add_to_side_bar(panel, name, *location);
                    if let Some(p) = self.session.panel_mut(panel) {
                        p.was_restored = true;
                    }
                }
            }
            tracing::debug!("Restored main window '{}'", name);
        }
        Ok(())
    }

    fn restore_floating_windows(&mut self, document: &LayoutDocument) -> Result<()> {
        self.floating = vec![None; document.floating_windows.len()];

        for (index, record) in document.floating_windows.iter().enumerate() {
            if !self.saver.matches_affinity(&record.affinities) || self.skips_restore(&record.multi_splitter_layout) {
                continue;
            }

            let id = self.session.new_floating_id();
            let mut window = FloatingWindow::new(id, record.geometry, self.session.config().clone());
            window.normal_geometry = record.normal_geometry;
            window.is_visible = record.is_visible;
            window.window_state = WindowState::from_code(record.window_state);
            window.flags = record.flags;
            window.affinities = record.affinities.clone();
            window.screen_index = record.screen_index;
            window.parent = document
                .main_window_for_index(record.parent_index)
                .and_then(|saved| self.session.main_window_by_name(&saved.unique_name))
                .map(|w| w.name().to_string());
            self.session.floating_windows.insert(id, window);

            let owner = LayoutRef::Floating(id);
            self.restore_window_layout(&owner, &record.multi_splitter_layout)
                .with_context(|| format!("restoring floating window {}", index))?;

            let empty = self
                .session
                .floating_window(id)
                .is_some_and(|w| !w.layout().has_visible_items());
            if empty {
                tracing::warn!("Floating window {} has no known panels, dropping it", index);
                self.session.remove_floating_window(id);
                continue;
            }
            self.floating[index] = Some(id);
        }
        Ok(())
    }

    /// Rebuild the regions and the splitter layout of one window
    fn restore_window_layout(&mut self, owner: &LayoutRef, record: &MultiSplitterRecord) -> Result<()> {
        let mut region_ids: BTreeMap<String, RegionId> = BTreeMap::new();
        for (key, saved) in &record.regions {
            if saved.is_null {
                continue;
            }
            let preferred = saved.id.parse::<RegionId>().ok();
            let id = self
                .session
                .create_region(owner.clone(), RegionOptions::from_bits(saved.options), preferred);
            for panel in &saved.panels {
                self.dock_restored_panel(panel, id);
            }
            if let Some(region) = self.session.regions.get_mut(&id) {
                let tab = usize::try_from(saved.current_tab_index).unwrap_or(0);
                if tab < region.len() {
                    region.set_current_tab(tab);
                }
            }
            region_ids.insert(key.clone(), id);
        }

        let config = self.session.config().clone();
        let session = &*self.session;
        let layout = SplitterLayout::deserialize(&record.layout, config, |saved| {
            region_ids
                .get(saved)
                .map(|id| (*id, session.region_min_size(*id)))
        });
        let mut layout = match layout {
            Ok(layout) => layout,
            Err(e) => {
                for id in region_ids.values() {
                    self.session.dispose_region(*id);
                }
                return Err(e.context(format!("invalid layout for {}", owner)));
            }
        };

        for id in region_ids.values() {
            let item = layout.item_for_region(*id);
            if item.is_none() {
                tracing::warn!("Region {} is not in the saved layout of {}", id, owner);
            }
            if let Some(region) = self.session.regions.get_mut(id) {
                region.item = item;
            }
            if item.is_none() {
                self.session.dispose_region(*id);
            }
        }

        let window_size = match owner {
            LayoutRef::MainWindow(name) => self.session.main_window_by_name(name).map(|w| w.geometry.size()),
            LayoutRef::Floating(id) => self.session.floating_window(*id).map(|w| w.geometry.size()),
        };
        if let Some(size) = window_size.filter(|s| s.is_valid() && *s != layout.size()) {
            tracing::debug!("Fitting restored layout of {} from {:?} to {:?}", owner, layout.size(), size);
            layout.set_size(size.expanded_to(layout.min_size()));
        }

        match self.session.layout_mut(owner) {
            Some(slot) => *slot = layout,
            None => bail!("{} vanished during restore", owner),
        }
        if let LayoutRef::MainWindow(name) = owner {
            let central = region_ids
                .values()
                .copied()
                .find(|id| self.session.region(*id).is_some_and(|r| r.is_central()));
            if let Some(window) = self.session.main_window_mut(name) {
                window.central_region = central;
            }
        }
        self.session.sync_window_geometry(owner);
        Ok(())
    }

    /// Make sure a panel exists, asking the panel factory when it doesn't
    fn ensure_panel(&mut self, name: &str) -> bool {
        if self.session.panel(name).is_some() {
            return true;
        }
        match self.session.build_panel(name) {
            Some(panel) if panel.name() == name => self.session.create_panel(panel),
            _ => {
                tracing::warn!("Saved layout refers to unknown panel '{}'", name);
                false
            }
        }
    }

    fn dock_restored_panel(&mut self, name: &str, region: RegionId) {
        if !self.ensure_panel(name) {
            return;
        }
        let Some(panel) = self.session.panel(name) else {
            return;
        };
        if !self.saver.matches_affinity(&panel.affinities) {
            return;
        }
        if panel.skips_restore() && panel.is_open() {
            tracing::debug!("Leaving '{}' where it is", name);
            return;
        }
        if panel.region().is_some() || panel.side_bar().is_some() {
            self.session.close_panel_for_restore(name);
        }

        if let Some(r) = self.session.regions.get_mut(&region) {
            r.insert_panel(name, None);
        }
        self.session.dock_into_region(name, region);
        if let Some(panel) = self.session.panel_mut(name) {
            panel.was_restored = true;
        }
    }

    fn restore_closed_panels(&mut self, document: &LayoutDocument) {
        for name in &document.closed_panels {
            let affinities = document
                .panel(name)
                .map(|p| p.affinities.clone())
                .unwrap_or_default();
            if !self.saver.matches_affinity(&affinities) || !self.ensure_panel(name) {
                continue;
            }
            let open = self
                .session
                .panel(name)
                .is_some_and(|p| p.is_open() && !p.skips_restore());
            if open {
                self.session.close_panel_for_restore(name);
            }
            if let Some(panel) = self.session.panel_mut(name) {
                panel.was_restored = true;
            }
        }
    }

    /// Re-point every panel's position memory at the rebuilt items
    fn restore_placeholders(&mut self, document: &LayoutDocument) {
        for record in &document.panels {
            if !self.saver.matches_affinity(&record.affinities) {
                continue;
            }
            let name = record.unique_name.as_str();
            let Some(panel) = self.session.panel(name) else {
                tracing::warn!("Couldn't find panel '{}' to restore its position", name);
                continue;
            };
            if panel.skips_restore() && panel.is_open() {
                continue;
            }

            let old = self
                .session
                .panel_mut(name)
                .map(|p| p.last_position.take_placeholders())
                .unwrap_or_default();
            for placeholder in &old {
                self.session.unref_placeholder(placeholder);
            }

            for saved in &record.last_position.placeholders {
                let layout = if saved.is_floating_window {
                    usize::try_from(saved.index_of_floating_window)
                        .ok()
                        .and_then(|i| self.floating.get(i).copied().flatten())
                        .map(LayoutRef::Floating)
                } else {
                    self.session
                        .main_window_by_name(&saved.main_window_unique_name)
                        .map(|w| LayoutRef::MainWindow(w.name().to_string()))
                };
                let item = layout.as_ref().and_then(|l| {
                    let index = usize::try_from(saved.item_index).ok()?;
                    self.session.layout(l)?.item_at_index(index)
                });
                match (layout, item) {
                    (Some(layout), Some(item)) => self.session.remember_placeholder(name, layout, item),
                    _ => tracing::warn!("Dropping unresolvable placeholder {:?} of '{}'", saved, name),
                }
            }

            if let Some(panel) = self.session.panel_mut(name) {
                let position = &mut panel.last_position;
                position.last_floating_geometry = record.last_position.last_floating_geometry;
                position.last_overlay_geometries = record.last_position.last_overlay_geometries.clone();
                position.tab_index = usize::try_from(record.last_position.tab_index).unwrap_or(0);
                position.was_floating = record.last_position.was_floating;
            }
        }
    }
}

impl Drop for RestoreContext<'_> {
    fn drop(&mut self) {
        self.session.cleanup_empty_regions();
        self.session.set_restoring(false);
    }
}
