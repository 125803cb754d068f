//! Regions - tab stacks of panels occupying one grid cell

use std::fmt;
use std::str::FromStr;

use super::LayoutRef;
use crate::layout::ItemId;

/// Unique identifier for a region, rendered as a decimal string in documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub u64);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RegionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(RegionId)
    }
}

/// Per-region flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionOptions {
    /// The central region of a main window survives even when empty
    pub is_central: bool,
}

impl RegionOptions {
    pub const CENTRAL_BIT: i32 = 2;

    pub fn central() -> Self {
        Self { is_central: true }
    }

    pub fn bits(&self) -> i32 {
        if self.is_central {
            Self::CENTRAL_BIT
        } else {
            0
        }
    }

    pub fn from_bits(bits: i32) -> Self {
        Self {
            is_central: bits & Self::CENTRAL_BIT != 0,
        }
    }
}

/// An ordered stack of tabbed panels
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    id: RegionId,
    panels: Vec<String>,
    current_tab: usize,
    options: RegionOptions,
    pub(crate) owner: Option<LayoutRef>,
    pub(crate) item: Option<ItemId>,
}

impl Region {
    pub fn new(id: RegionId, options: RegionOptions) -> Self {
        Self {
            id,
            panels: Vec::new(),
            current_tab: 0,
            options,
            owner: None,
            item: None,
        }
    }

    pub fn id(&self) -> RegionId {
        self.id
    }

    pub fn panels(&self) -> &[String] {
        &self.panels
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    pub fn is_central(&self) -> bool {
        self.options.is_central
    }

    pub fn options(&self) -> RegionOptions {
        self.options
    }

    pub fn owner(&self) -> Option<&LayoutRef> {
        self.owner.as_ref()
    }

    pub fn item(&self) -> Option<ItemId> {
        self.item
    }

    pub fn current_tab(&self) -> usize {
        self.current_tab
    }

    /// Name of the panel on the visible tab
    pub fn current_panel(&self) -> Option<&str> {
        self.panels.get(self.current_tab).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.panels.iter().any(|p| p == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.panels.iter().position(|p| p == name)
    }

    /// Select a tab; out-of-range indices are ignored
    pub fn set_current_tab(&mut self, index: usize) -> bool {
        if index >= self.panels.len() {
            tracing::warn!(
                "Region {} has {} tabs, ignoring tab index {}",
                self.id,
                self.panels.len(),
                index
            );
            return false;
        }
        self.current_tab = index;
        true
    }

    /// Insert a panel tab and make it current, returning the index used
    pub fn insert_panel(&mut self, name: &str, index: Option<usize>) -> usize {
        if let Some(existing) = self.index_of(name) {
            self.current_tab = existing;
            return existing;
        }
        let index = index.unwrap_or(self.panels.len()).min(self.panels.len());
        self.panels.insert(index, name.to_string());
        self.current_tab = index;
        index
    }

    /// Remove a panel tab, returning the index it occupied
    pub fn remove_panel(&mut self, name: &str) -> Option<usize> {
        let index = self.index_of(name)?;
        self.panels.remove(index);
        if self.panels.is_empty() {
            self.current_tab = 0;
        } else if self.current_tab > index || self.current_tab >= self.panels.len() {
            self.current_tab = self.current_tab.saturating_sub(1);
        }
        Some(index)
    }
}
