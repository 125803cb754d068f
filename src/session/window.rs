//! Top-level windows and the collaborator hooks the session calls out to

use std::collections::BTreeMap;

use crate::config::LayoutConfig;
use crate::layout::SplitterLayout;
use crate::model::{FloatingWindowId, Panel, Rect, RegionId, SideBarLocation, Size};

/// Geometry a main window gets when the host doesn't provide one
pub const DEFAULT_MAIN_WINDOW_SIZE: Size = Size::new(1000, 800);

/// Geometry a floating window gets when nothing better is known
pub const DEFAULT_FLOATING_SIZE: Size = Size::new(400, 300);

/// Builds a main window the document refers to but the session lacks
pub type MainWindowFactory = Box<dyn Fn(&str) -> MainWindow>;

/// Builds a panel the document refers to but the session lacks
pub type PanelFactory = Box<dyn Fn(&str) -> Option<Panel>>;

// ============================================================================
// Window state
// ============================================================================

/// Window manager state, encoded like the toolkit's window state flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WindowState {
    #[default]
    Normal,
    Minimized,
    Maximized,
    FullScreen,
}

impl WindowState {
    pub fn code(self) -> i32 {
        match self {
            WindowState::Normal => 0,
            WindowState::Minimized => 1,
            WindowState::Maximized => 2,
            WindowState::FullScreen => 4,
        }
    }

    pub fn from_code(code: i32) -> Self {
        if code & 4 != 0 {
            WindowState::FullScreen
        } else if code & 2 != 0 {
            WindowState::Maximized
        } else if code & 1 != 0 {
            WindowState::Minimized
        } else {
            WindowState::Normal
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MainWindowOptions {
    /// Keep a central region that survives even when empty
    pub has_central: bool,
}

impl MainWindowOptions {
    pub const HAS_CENTRAL_BIT: i32 = 1;

    pub fn bits(&self) -> i32 {
        if self.has_central {
            Self::HAS_CENTRAL_BIT
        } else {
            0
        }
    }

    pub fn from_bits(bits: i32) -> Self {
        Self {
            has_central: bits & Self::HAS_CENTRAL_BIT != 0,
        }
    }
}

// ============================================================================
// Main window
// ============================================================================

#[derive(Debug, Clone)]
pub struct MainWindow {
    name: String,
    pub geometry: Rect,
    pub normal_geometry: Rect,
    pub is_visible: bool,
    pub window_state: WindowState,
    pub affinities: Vec<String>,
    pub screen_index: i32,
    options: MainWindowOptions,
    pub(crate) layout: SplitterLayout,
    pub(crate) side_bars: BTreeMap<SideBarLocation, Vec<String>>,
    pub(crate) central_region: Option<RegionId>,
}

impl MainWindow {
    pub fn new(name: &str) -> Self {
        let geometry = Rect::from_origin_size(Default::default(), DEFAULT_MAIN_WINDOW_SIZE);
        Self {
            name: name.to_string(),
            geometry,
            normal_geometry: geometry,
            is_visible: true,
            window_state: WindowState::Normal,
            affinities: Vec::new(),
            screen_index: 0,
            options: MainWindowOptions::default(),
            layout: SplitterLayout::new(geometry.size(), LayoutConfig::default()),
            side_bars: BTreeMap::new(),
            central_region: None,
        }
    }

    pub fn with_geometry(mut self, geometry: Rect) -> Self {
        self.geometry = geometry;
        self.normal_geometry = geometry;
        self
    }

    pub fn with_options(mut self, options: MainWindowOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_affinities(mut self, affinities: &[&str]) -> Self {
        self.affinities = affinities.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> MainWindowOptions {
        self.options
    }

    pub fn layout(&self) -> &SplitterLayout {
        &self.layout
    }

    pub fn central_region(&self) -> Option<RegionId> {
        self.central_region
    }

    /// Panels minimized to one side bar
    pub fn side_bar(&self, location: SideBarLocation) -> &[String] {
        self.side_bars
            .get(&location)
            .map(|names| names.as_slice())
            .unwrap_or(&[])
    }

    pub fn side_bar_of(&self, panel: &str) -> Option<SideBarLocation> {
        self.side_bars
            .iter()
            .find(|(_, names)| names.iter().any(|n| n == panel))
            .map(|(location, _)| *location)
    }
}

// ============================================================================
// Floating window
// ============================================================================

#[derive(Debug, Clone)]
pub struct FloatingWindow {
    id: FloatingWindowId,
    pub geometry: Rect,
    pub normal_geometry: Rect,
    pub is_visible: bool,
    pub window_state: WindowState,
    pub flags: i32,
    pub affinities: Vec<String>,
    pub screen_index: i32,
    /// Main window this window stays on top of
    pub parent: Option<String>,
    pub(crate) layout: SplitterLayout,
}

impl FloatingWindow {
    pub(crate) fn new(id: FloatingWindowId, geometry: Rect, config: LayoutConfig) -> Self {
        Self {
            id,
            geometry,
            normal_geometry: geometry,
            is_visible: true,
            window_state: WindowState::Normal,
            flags: 0,
            affinities: Vec::new(),
            screen_index: 0,
            parent: None,
            layout: SplitterLayout::new(geometry.size(), config),
        }
    }

    pub fn id(&self) -> FloatingWindowId {
        self.id
    }

    pub fn layout(&self) -> &SplitterLayout {
        &self.layout
    }
}

// ============================================================================
// Screens
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    pub name: String,
    pub geometry: Rect,
    pub device_pixel_ratio: f64,
}

/// The host's view of the attached screens
pub trait ScreenProvider {
    fn screens(&self) -> Vec<Screen>;

    /// Index of the screen showing most of `rect`
    fn screen_index_for(&self, rect: Rect) -> i32 {
        let center = crate::model::Point::new(rect.x + rect.width / 2, rect.y + rect.height / 2);
        self.screens()
            .iter()
            .position(|s| s.geometry.contains(center))
            .map_or(0, |i| i as i32)
    }
}

/// A single 1920x1080 screen
#[derive(Debug, Clone)]
pub struct SingleScreen {
    screen: Screen,
}

impl SingleScreen {
    pub fn new(geometry: Rect) -> Self {
        Self {
            screen: Screen {
                name: "primary".to_string(),
                geometry,
                device_pixel_ratio: 1.0,
            },
        }
    }
}

impl Default for SingleScreen {
    fn default() -> Self {
        Self::new(Rect::new(0, 0, 1920, 1080))
    }
}

impl ScreenProvider for SingleScreen {
    fn screens(&self) -> Vec<Screen> {
        vec![self.screen.clone()]
    }
}
