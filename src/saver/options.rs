//! Restore options

use std::ops::BitOr;

/// Caller-facing restore flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreOptions(u32);

impl RestoreOptions {
    pub const NONE: RestoreOptions = RestoreOptions(0);
    /// Keep the main windows' current geometry and scale the saved layout into it
    pub const RELATIVE_TO_MAIN_WINDOW: RestoreOptions = RestoreOptions(1);
    /// With a relative restore, still put floating windows at their saved geometry
    pub const ABSOLUTE_FLOATING_DOCK_WINDOWS: RestoreOptions = RestoreOptions(2);

    const KNOWN: u32 = 1 | 2;

    pub const fn from_bits(bits: u32) -> Self {
        RestoreOptions(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: RestoreOptions) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for RestoreOptions {
    type Output = RestoreOptions;

    fn bitor(self, rhs: RestoreOptions) -> RestoreOptions {
        RestoreOptions(self.0 | rhs.0)
    }
}

/// What a restore actually does, derived from [`RestoreOptions`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InternalRestoreOptions {
    pub skip_main_window_geometry: bool,
    pub relative_floating_window_geometry: bool,
}

impl From<RestoreOptions> for InternalRestoreOptions {
    fn from(options: RestoreOptions) -> Self {
        let mut internal = InternalRestoreOptions::default();
        if options.contains(RestoreOptions::RELATIVE_TO_MAIN_WINDOW) {
            internal.skip_main_window_geometry = true;
            internal.relative_floating_window_geometry = true;
        }
        if options.contains(RestoreOptions::ABSOLUTE_FLOATING_DOCK_WINDOWS) {
            internal.relative_floating_window_geometry = false;
        }

        let unknown = options.bits() & !RestoreOptions::KNOWN;
        if unknown != 0 {
            tracing::error!("Ignoring unknown restore option bits {:#x}", unknown);
        }
        internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_restore_scales_floating_windows() {
        let internal = InternalRestoreOptions::from(RestoreOptions::RELATIVE_TO_MAIN_WINDOW);
        assert!(internal.skip_main_window_geometry);
        assert!(internal.relative_floating_window_geometry);
    }

    #[test]
    fn test_absolute_floating_overrides_relative() {
        let options = RestoreOptions::RELATIVE_TO_MAIN_WINDOW | RestoreOptions::ABSOLUTE_FLOATING_DOCK_WINDOWS;
        let internal = InternalRestoreOptions::from(options);
        assert!(internal.skip_main_window_geometry);
        assert!(!internal.relative_floating_window_geometry);
    }

    #[test]
    fn test_unknown_bits_are_ignored() {
        let internal = InternalRestoreOptions::from(RestoreOptions::from_bits(8));
        assert_eq!(internal, InternalRestoreOptions::default());
    }
}
