//! Debug tracing infrastructure for development diagnostics
//!
//! Provides structured logging with scoped filtering for debugging anchor
//! movement, restore ordering and session state transitions.
//!
//! # Usage
//!
//! Configure via RUST_LOG environment variable:
//! - `RUST_LOG=debug` - all debug logs
//! - `RUST_LOG=anchors=debug,message=debug` - scoped filtering
//! - `RUST_LOG=dockyard::saver=debug` - module-level filtering
//!
//! # Log Files
//!
//! Logs are written to `~/.config/dockyard/logs/dockyard.log` with daily rotation.
//! File logging uses debug level by default for more verbose troubleshooting.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config_paths::LOG_FILE_PREFIX;
use crate::layout::{AnchorId, SplitterLayout};

/// Initialize tracing subscriber with console and file logging
///
/// Console output respects RUST_LOG and defaults to `warn`.
/// File logging writes to `~/.config/dockyard/logs/dockyard.log` with daily rotation.
pub fn init() {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // Console layer - respects RUST_LOG
    let console_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_filter(console_filter);

    // File layer - always debug level for troubleshooting
    let file_layer = match crate::config_paths::ensure_logs_dir() {
        Ok(logs_dir) => {
            let file_appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
            Some(
                fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new("debug")),
            )
        }
        Err(e) => {
            eprintln!("Warning: Could not initialize file logging: {}", e);
            None
        }
    };

    // A second init (tests, embedding hosts) keeps the first subscriber
    if let Err(e) = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
    {
        tracing::debug!("Tracing already initialized: {}", e);
    }
}

/// Anchor positions of one layout, for diffing before/after an operation
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorSnapshot {
    pub size: (i32, i32),
    pub anchors: Vec<AnchorInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnchorInfo {
    pub id: AnchorId,
    pub position: i32,
    pub followee: Option<AnchorId>,
}

impl AnchorSnapshot {
    pub fn from_layout(layout: &SplitterLayout) -> Self {
        let size = layout.size();
        Self {
            size: (size.width, size.height),
            anchors: layout
                .anchor_ids()
                .into_iter()
                .filter_map(|id| layout.anchor(id))
                .map(|a| AnchorInfo {
                    id: a.id,
                    position: a.position(),
                    followee: a.followee(),
                })
                .collect(),
        }
    }

    /// Generate a diff description between two snapshots
    pub fn diff(&self, other: &AnchorSnapshot) -> Option<String> {
        let mut changes = Vec::new();
        if self.size != other.size {
            changes.push(format!(
                "size: {}x{} → {}x{}",
                self.size.0, self.size.1, other.size.0, other.size.1
            ));
        }
        if self.anchors.len() != other.anchors.len() {
            changes.push(format!(
                "anchor count: {} → {}",
                self.anchors.len(),
                other.anchors.len()
            ));
            return Some(changes.join("; "));
        }

        for (before, after) in self.anchors.iter().zip(&other.anchors) {
            if before.id != after.id {
                changes.push(format!("anchor #{} replaced by #{}", before.id.0, after.id.0));
                continue;
            }
            if before.position != after.position {
                changes.push(format!(
                    "#{}: {} → {}",
                    before.id.0, before.position, after.position
                ));
            }
            if before.followee != after.followee {
                match after.followee {
                    Some(f) => changes.push(format!("#{}: follows #{}", before.id.0, f.0)),
                    None => changes.push(format!("#{}: stopped following", before.id.0)),
                }
            }
        }

        if changes.is_empty() {
            None
        } else {
            Some(changes.join("; "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::model::Size;

    #[test]
    fn test_identical_snapshots_have_no_diff() {
        let layout = SplitterLayout::new(Size::new(800, 600), LayoutConfig::default());
        let a = AnchorSnapshot::from_layout(&layout);
        assert_eq!(a.anchors.len(), 4);
        assert_eq!(a.diff(&a.clone()), None);
    }

    #[test]
    fn test_resize_shows_in_diff() {
        let mut layout = SplitterLayout::new(Size::new(800, 600), LayoutConfig::default());
        let before = AnchorSnapshot::from_layout(&layout);
        layout.set_size(Size::new(900, 600));
        let after = AnchorSnapshot::from_layout(&layout);

        let diff = before.diff(&after).unwrap();
        assert!(diff.contains("800x600 → 900x600"));
    }

    #[test]
    fn test_second_init_is_harmless() {
        init();
        init();
        tracing::debug!("still logging");
    }
}
