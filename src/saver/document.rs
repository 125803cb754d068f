//! The saved layout document
//!
//! Plain records mirroring the JSON layout. Nothing here touches live state;
//! [`LayoutDocument::is_valid`] is checked before a restore mutates anything.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::layout::SplitterLayoutRecord;
use crate::model::{Rect, SideBarLocation, Size};

/// Documents with any other version are rejected
pub const SERIALIZATION_VERSION: i32 = 3;

/// Floating window flags value meaning "use the global defaults"
pub const FLOATING_FLAGS_FROM_GLOBAL_CONFIG: i32 = 1;

const SIDEBAR_KEY_PREFIX: &str = "sidebar-";

fn default_screen_size() -> Size {
    Size::new(800, 600)
}

fn default_parent_index() -> i32 {
    -1
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Document
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutDocument {
    pub serialization_version: i32,
    pub main_windows: Vec<MainWindowRecord>,
    pub floating_windows: Vec<FloatingWindowRecord>,
    #[serde(rename = "closedDockWidgets")]
    pub closed_panels: Vec<String>,
    #[serde(rename = "allDockWidgets")]
    pub panels: Vec<PanelRecord>,
    pub screen_info: Vec<ScreenInfo>,
}

impl LayoutDocument {
    /// Parse a document; malformed input is logged and yields `None`
    pub fn from_json(data: &[u8]) -> Option<Self> {
        match serde_json::from_slice::<LayoutDocument>(data) {
            Ok(document) => Some(document),
            Err(e) => {
                tracing::error!("Failed to parse layout document: {}", e);
                None
            }
        }
    }

    /// Encode with 4-space indentation
    pub fn to_json(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        if let Err(e) = self.serialize(&mut serializer) {
            tracing::error!("Failed to encode layout document: {}", e);
            return Vec::new();
        }
        out
    }

    pub fn is_valid(&self) -> bool {
        if self.serialization_version != SERIALIZATION_VERSION {
            tracing::error!(
                "Layout document version {} is not supported, expected {}",
                self.serialization_version,
                SERIALIZATION_VERSION
            );
            return false;
        }

        self.main_windows.iter().all(MainWindowRecord::is_valid)
            && self.floating_windows.iter().all(FloatingWindowRecord::is_valid)
            && self.panels.iter().all(PanelRecord::is_valid)
    }

    pub fn main_window_names(&self) -> Vec<String> {
        self.main_windows
            .iter()
            .map(|w| w.unique_name.clone())
            .collect()
    }

    pub fn panel_names(&self) -> Vec<String> {
        self.panels.iter().map(|p| p.unique_name.clone()).collect()
    }

    pub fn contains_panel(&self, name: &str) -> bool {
        self.panels.iter().any(|p| p.unique_name == name)
    }

    pub fn panel(&self, name: &str) -> Option<&PanelRecord> {
        self.panels.iter().find(|p| p.unique_name == name)
    }

    pub fn main_window_for_index(&self, index: i32) -> Option<&MainWindowRecord> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.main_windows.get(i))
    }
}

// ============================================================================
// Layout + regions
// ============================================================================

/// A window's splitter layout together with the regions it shows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MultiSplitterRecord {
    pub layout: SplitterLayoutRecord,
    /// Regions keyed by their id
    #[serde(rename = "frames", deserialize_with = "null_as_default")]
    pub regions: BTreeMap<String, RegionRecord>,
}

impl MultiSplitterRecord {
    pub fn is_valid(&self) -> bool {
        if let Err(e) = self.layout.validate() {
            tracing::error!("Layout record is corrupt: {:#}", e);
            return false;
        }
        self.regions.values().all(RegionRecord::is_valid)
    }

    pub fn panel_names(&self) -> impl Iterator<Item = &str> {
        self.regions
            .values()
            .flat_map(|r| r.panels.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegionRecord {
    pub id: String,
    pub is_null: bool,
    pub object_name: String,
    pub geometry: Rect,
    pub options: i32,
    pub current_tab_index: i32,
    pub main_window_unique_name: String,
    #[serde(rename = "dockWidgets")]
    pub panels: Vec<String>,
}

impl Default for RegionRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            is_null: true,
            object_name: String::new(),
            geometry: Rect::default(),
            options: 0,
            current_tab_index: 0,
            main_window_unique_name: String::new(),
            panels: Vec::new(),
        }
    }
}

impl RegionRecord {
    pub fn is_valid(&self) -> bool {
        if self.is_null {
            return true;
        }
        if !self.geometry.is_valid() {
            tracing::error!("Region '{}' has invalid geometry {:?}", self.id, self.geometry);
            return false;
        }
        if self.id.is_empty() {
            tracing::error!("Region record without id");
            return false;
        }
        if !self.panels.is_empty()
            && (self.current_tab_index < 0 || self.current_tab_index as usize >= self.panels.len())
        {
            tracing::error!(
                "Region '{}' has tab index {} but {} panels",
                self.id,
                self.current_tab_index,
                self.panels.len()
            );
            return false;
        }
        if self.panels.iter().any(String::is_empty) {
            tracing::error!("Region '{}' lists a panel without name", self.id);
            return false;
        }
        true
    }
}

// ============================================================================
// Windows
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawMainWindow", into = "RawMainWindow")]
pub struct MainWindowRecord {
    pub options: i32,
    pub multi_splitter_layout: MultiSplitterRecord,
    pub unique_name: String,
    pub geometry: Rect,
    pub normal_geometry: Rect,
    pub screen_index: i32,
    pub screen_size: Size,
    pub is_visible: bool,
    pub affinities: Vec<String>,
    pub window_state: i32,
    pub side_bars: BTreeMap<SideBarLocation, Vec<String>>,
}

impl Default for MainWindowRecord {
    fn default() -> Self {
        RawMainWindow::default().into()
    }
}

impl MainWindowRecord {
    pub fn is_valid(&self) -> bool {
        if self.unique_name.is_empty() {
            tracing::error!("Main window record without name");
            return false;
        }
        self.multi_splitter_layout.is_valid()
    }

    pub fn side_bar(&self, location: SideBarLocation) -> &[String] {
        self.side_bars
            .get(&location)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Wire shape of a main window: side bars live in `sidebar-<n>` keys and old
/// documents carry a single `affinityName`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawMainWindow {
    options: i32,
    multi_splitter_layout: MultiSplitterRecord,
    unique_name: String,
    geometry: Rect,
    normal_geometry: Rect,
    screen_index: i32,
    screen_size: Size,
    is_visible: bool,
    affinities: Vec<String>,
    window_state: i32,
    #[serde(skip_serializing)]
    affinity_name: Option<String>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

impl Default for RawMainWindow {
    fn default() -> Self {
        Self {
            options: 0,
            multi_splitter_layout: MultiSplitterRecord::default(),
            unique_name: String::new(),
            geometry: Rect::default(),
            normal_geometry: Rect::default(),
            screen_index: 0,
            screen_size: default_screen_size(),
            is_visible: false,
            affinities: Vec::new(),
            window_state: 0,
            affinity_name: None,
            extra: BTreeMap::new(),
        }
    }
}

impl From<RawMainWindow> for MainWindowRecord {
    fn from(raw: RawMainWindow) -> Self {
        let mut affinities = raw.affinities;
        if let Some(legacy) = raw.affinity_name.filter(|a| !a.is_empty()) {
            if !affinities.contains(&legacy) {
                affinities.push(legacy);
            }
        }

        let mut side_bars = BTreeMap::new();
        for (key, value) in raw.extra {
            let Some(index) = key.strip_prefix(SIDEBAR_KEY_PREFIX) else {
                continue;
            };
            let Some(location) = index.parse::<u8>().ok().and_then(SideBarLocation::from_index) else {
                tracing::warn!("Ignoring unknown side bar key '{}'", key);
                continue;
            };
            match serde_json::from_value::<Vec<String>>(value) {
                Ok(names) if !names.is_empty() => {
                    side_bars.insert(location, names);
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Ignoring malformed side bar '{}': {}", key, e),
            }
        }

        Self {
            options: raw.options,
            multi_splitter_layout: raw.multi_splitter_layout,
            unique_name: raw.unique_name,
            geometry: raw.geometry,
            normal_geometry: raw.normal_geometry,
            screen_index: raw.screen_index,
            screen_size: raw.screen_size,
            is_visible: raw.is_visible,
            affinities,
            window_state: raw.window_state,
            side_bars,
        }
    }
}

impl From<MainWindowRecord> for RawMainWindow {
    fn from(record: MainWindowRecord) -> Self {
        let extra = record
            .side_bars
            .into_iter()
            .filter(|(_, names)| !names.is_empty())
            .map(|(location, names)| {
                let key = format!("{}{}", SIDEBAR_KEY_PREFIX, location.index());
                let names = names.into_iter().map(Value::String).collect();
                (key, Value::Array(names))
            })
            .collect();

        Self {
            options: record.options,
            multi_splitter_layout: record.multi_splitter_layout,
            unique_name: record.unique_name,
            geometry: record.geometry,
            normal_geometry: record.normal_geometry,
            screen_index: record.screen_index,
            screen_size: record.screen_size,
            is_visible: record.is_visible,
            affinities: record.affinities,
            window_state: record.window_state,
            affinity_name: None,
            extra,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawFloatingWindow", into = "RawFloatingWindow")]
pub struct FloatingWindowRecord {
    pub multi_splitter_layout: MultiSplitterRecord,
    /// Index of the parent main window, -1 for none
    pub parent_index: i32,
    pub geometry: Rect,
    pub normal_geometry: Rect,
    pub screen_index: i32,
    pub screen_size: Size,
    pub is_visible: bool,
    pub flags: i32,
    pub window_state: i32,
    pub affinities: Vec<String>,
}

impl Default for FloatingWindowRecord {
    fn default() -> Self {
        RawFloatingWindow::default().into()
    }
}

impl FloatingWindowRecord {
    pub fn is_valid(&self) -> bool {
        if !self.multi_splitter_layout.is_valid() {
            return false;
        }
        if !self.geometry.is_valid() {
            tracing::error!("Floating window has invalid geometry {:?}", self.geometry);
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawFloatingWindow {
    multi_splitter_layout: MultiSplitterRecord,
    parent_index: i32,
    geometry: Rect,
    normal_geometry: Rect,
    screen_index: i32,
    screen_size: Size,
    flags: i32,
    is_visible: bool,
    window_state: i32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    affinities: Vec<String>,
    #[serde(skip_serializing)]
    affinity_name: Option<String>,
}

impl Default for RawFloatingWindow {
    fn default() -> Self {
        Self {
            multi_splitter_layout: MultiSplitterRecord::default(),
            parent_index: default_parent_index(),
            geometry: Rect::default(),
            normal_geometry: Rect::default(),
            screen_index: 0,
            screen_size: default_screen_size(),
            flags: FLOATING_FLAGS_FROM_GLOBAL_CONFIG,
            is_visible: false,
            window_state: 0,
            affinities: Vec::new(),
            affinity_name: None,
        }
    }
}

impl From<RawFloatingWindow> for FloatingWindowRecord {
    fn from(raw: RawFloatingWindow) -> Self {
        let mut affinities = raw.affinities;
        if let Some(legacy) = raw.affinity_name.filter(|a| !a.is_empty()) {
            if !affinities.contains(&legacy) {
                affinities.push(legacy);
            }
        }
        Self {
            multi_splitter_layout: raw.multi_splitter_layout,
            parent_index: raw.parent_index,
            geometry: raw.geometry,
            normal_geometry: raw.normal_geometry,
            screen_index: raw.screen_index,
            screen_size: raw.screen_size,
            is_visible: raw.is_visible,
            flags: raw.flags,
            window_state: raw.window_state,
            affinities,
        }
    }
}

impl From<FloatingWindowRecord> for RawFloatingWindow {
    fn from(record: FloatingWindowRecord) -> Self {
        Self {
            multi_splitter_layout: record.multi_splitter_layout,
            parent_index: record.parent_index,
            geometry: record.geometry,
            normal_geometry: record.normal_geometry,
            screen_index: record.screen_index,
            screen_size: record.screen_size,
            flags: record.flags,
            is_visible: record.is_visible,
            window_state: record.window_state,
            affinities: record.affinities,
            affinity_name: None,
        }
    }
}

// ============================================================================
// Panels
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PanelRecord {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub affinities: Vec<String>,
    pub unique_name: String,
    pub last_position: PositionRecord,
}

impl PanelRecord {
    pub fn is_valid(&self) -> bool {
        if self.unique_name.is_empty() {
            tracing::error!("Panel record without name");
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PositionRecord {
    pub last_floating_geometry: Rect,
    #[serde(rename = "lastOverlayedGeometries")]
    pub last_overlay_geometries: BTreeMap<SideBarLocation, Rect>,
    pub tab_index: i32,
    pub was_floating: bool,
    pub placeholders: Vec<PlaceholderRecord>,
}

/// A remembered item: `itemIndex` into either a floating window's layout
/// (`indexOfFloatingWindow`) or a main window's layout (`mainWindowUniqueName`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaceholderRecord {
    pub is_floating_window: bool,
    pub item_index: i32,
    #[serde(skip_serializing_if = "is_negative")]
    pub index_of_floating_window: i32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub main_window_unique_name: String,
}

fn is_negative(value: &i32) -> bool {
    *value < 0
}

impl Default for PlaceholderRecord {
    fn default() -> Self {
        Self {
            is_floating_window: false,
            item_index: 0,
            index_of_floating_window: -1,
            main_window_unique_name: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScreenInfo {
    pub index: i32,
    pub geometry: Rect,
    pub name: String,
    pub device_pixel_ratio: f64,
}

impl Default for ScreenInfo {
    fn default() -> Self {
        Self {
            index: 0,
            geometry: Rect::default(),
            name: String::new(),
            device_pixel_ratio: 1.0,
        }
    }
}
