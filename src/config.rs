//! Layout engine configuration persistence
//!
//! Stores tuning knobs in `~/.config/dockyard/config.yaml`

use serde::{Deserialize, Serialize};

/// Layout engine configuration that persists across sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Thickness of a movable separator in pixels
    #[serde(default = "default_separator_thickness")]
    pub separator_thickness: i32,

    /// Thickness of the four border separators in pixels
    #[serde(default = "default_static_separator_thickness")]
    pub static_separator_thickness: i32,

    /// Smallest width a region may shrink to
    #[serde(default = "default_min_region_width")]
    pub min_region_width: i32,

    /// Smallest height a region may shrink to
    #[serde(default = "default_min_region_height")]
    pub min_region_height: i32,

    /// Length of the drop indicator when there is no room for the drop
    #[serde(default = "default_drop_indicator_min_length")]
    pub drop_indicator_min_length: i32,

    /// Largest share of the canvas a dropped widget is offered
    #[serde(default = "default_drop_length_fraction")]
    pub drop_length_fraction: f64,

    /// Resize propagation steps below this many pixels are skipped
    #[serde(default = "default_min_propagation_step")]
    pub min_propagation_step: i32,

    /// Share of a removed region's space handed to the neighbour beyond the surviving separator
    #[serde(default = "default_removed_group_share")]
    pub removed_group_share: f64,

    /// Run the sanity audit after every mutating layout operation
    #[serde(default)]
    pub check_sanity_after_ops: bool,
}

fn default_separator_thickness() -> i32 {
    5
}

fn default_static_separator_thickness() -> i32 {
    1
}

fn default_min_region_width() -> i32 {
    80
}

fn default_min_region_height() -> i32 {
    90
}

fn default_drop_indicator_min_length() -> i32 {
    100
}

fn default_drop_length_fraction() -> f64 {
    0.4
}

fn default_min_propagation_step() -> i32 {
    5
}

fn default_removed_group_share() -> f64 {
    0.5
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            separator_thickness: default_separator_thickness(),
            static_separator_thickness: default_static_separator_thickness(),
            min_region_width: default_min_region_width(),
            min_region_height: default_min_region_height(),
            drop_indicator_min_length: default_drop_indicator_min_length(),
            drop_length_fraction: default_drop_length_fraction(),
            min_propagation_step: default_min_propagation_step(),
            removed_group_share: default_removed_group_share(),
            check_sanity_after_ops: false,
        }
    }
}

impl LayoutConfig {
    /// Load config from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };

        Self::load_from(&path)
    }

    /// Load config from an explicit path, falling back to defaults
    pub fn load_from(path: &std::path::Path) -> Self {
        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str::<LayoutConfig>(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config.sanitized()
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config at {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save config to disk
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> Result<(), String> {
        let path = crate::config_paths::config_file()
            .ok_or_else(|| "No config directory available".to_string())?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        std::fs::write(path, content)
            .map_err(|e| format!("Failed to write config to {}: {}", path.display(), e))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Replace nonsensical values with their defaults
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.separator_thickness < 0 {
            tracing::warn!(
                "separator_thickness {} is negative, using {}",
                self.separator_thickness,
                defaults.separator_thickness
            );
            self.separator_thickness = defaults.separator_thickness;
        }
        if self.static_separator_thickness < 0 {
            self.static_separator_thickness = defaults.static_separator_thickness;
        }
        if self.min_region_width < 0 {
            self.min_region_width = defaults.min_region_width;
        }
        if self.min_region_height < 0 {
            self.min_region_height = defaults.min_region_height;
        }
        if self.drop_indicator_min_length <= 0 {
            self.drop_indicator_min_length = defaults.drop_indicator_min_length;
        }
        if !(0.0..=1.0).contains(&self.drop_length_fraction) {
            tracing::warn!(
                "drop_length_fraction {} out of range, using {}",
                self.drop_length_fraction,
                defaults.drop_length_fraction
            );
            self.drop_length_fraction = defaults.drop_length_fraction;
        }
        if self.min_propagation_step < 0 {
            self.min_propagation_step = defaults.min_propagation_step;
        }
        if !(0.0..=1.0).contains(&self.removed_group_share) {
            self.removed_group_share = defaults.removed_group_share;
        }
        self
    }
}
