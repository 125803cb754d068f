//! Command-line interface for working with saved layout documents
//!
//! Supports:
//! - Validating a document the way a restore would, without a live session
//! - Printing a summary of its windows, regions, anchors and panels
//!
//! Without a FILE argument both commands read the saved default layout,
//! `~/.config/dockyard/layouts/default.json`.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::LayoutConfig;
use crate::layout::SplitterLayout;
use crate::model::{RegionId, Size};
use crate::saver::{LayoutDocument, MultiSplitterRecord};

/// Inspect and validate dockable panel layouts
#[derive(Parser, Debug)]
#[command(name = "dockyard", version, about = "Inspect and validate dockable panel layouts")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Check that a saved layout would be accepted by a restore
    Validate {
        /// Saved layout file (defaults to the saved default layout)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
    /// Print the windows, regions and panels of a saved layout
    Inspect {
        /// Saved layout file (defaults to the saved default layout)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

/// Name of the layout read when no file is given
pub const DEFAULT_LAYOUT: &str = "default";

/// The given file, or the default layout in the config directory
pub fn resolve_file(file: Option<PathBuf>) -> Result<PathBuf> {
    match file {
        Some(path) => Ok(path),
        None => crate::config_paths::layout_file(DEFAULT_LAYOUT)
            .context("No layout file given and no config directory available"),
    }
}

/// Read and parse a layout document
pub fn load_document(path: &Path) -> Result<LayoutDocument> {
    let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    LayoutDocument::from_json(&data)
        .with_context(|| format!("{} is not a layout document", path.display()))
}

/// Problems a restore would trip over; empty when the document is good
pub fn validate(document: &LayoutDocument, config: &LayoutConfig) -> Vec<String> {
    let mut problems = Vec::new();
    if !document.is_valid() {
        problems.push("document failed validation (see log for details)".to_string());
        return problems;
    }

    let layouts = document
        .main_windows
        .iter()
        .map(|w| (format!("main window '{}'", w.unique_name), &w.multi_splitter_layout))
        .chain(
            document
                .floating_windows
                .iter()
                .enumerate()
                .map(|(i, w)| (format!("floating window {}", i), &w.multi_splitter_layout)),
        );
    for (label, record) in layouts {
        if let Err(e) = check_layout(record, config) {
            problems.push(format!("{}: {:#}", label, e));
        }
    }
    problems
}

/// Rebuild a window's layout against stand-in regions and audit it
fn check_layout(record: &MultiSplitterRecord, config: &LayoutConfig) -> Result<()> {
    let min = Size::new(config.min_region_width, config.min_region_height);
    let mut next = 0;
    let layout = SplitterLayout::deserialize(&record.layout, config.clone(), |key| {
        record.regions.get(key).filter(|r| !r.is_null)?;
        next += 1;
        Some((RegionId(next), min))
    })?;
    anyhow::ensure!(layout.check_sanity(), "restored layout is not sane");
    Ok(())
}

/// Human-readable summary of a document
pub fn inspect(document: &LayoutDocument) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "serialization version {}", document.serialization_version);

    for window in &document.main_windows {
        let g = window.geometry;
        let _ = writeln!(
            out,
            "main window '{}' at {},{} {}x{}",
            window.unique_name, g.x, g.y, g.width, g.height
        );
        describe_layout(&mut out, &window.multi_splitter_layout);
        for (location, panels) in &window.side_bars {
            let _ = writeln!(out, "  side bar {:?}: {}", location, panels.join(", "));
        }
    }
    for (index, window) in document.floating_windows.iter().enumerate() {
        let g = window.geometry;
        let _ = writeln!(
            out,
            "floating window {} at {},{} {}x{}",
            index, g.x, g.y, g.width, g.height
        );
        describe_layout(&mut out, &window.multi_splitter_layout);
    }

    if !document.closed_panels.is_empty() {
        let _ = writeln!(out, "closed: {}", document.closed_panels.join(", "));
    }
    let _ = writeln!(out, "{} panels", document.panels.len());
    out
}

fn describe_layout(out: &mut String, record: &MultiSplitterRecord) {
    let layout = &record.layout;
    let placeholders = layout.items.iter().filter(|i| i.is_placeholder).count();
    let _ = writeln!(
        out,
        "  {} anchors, {} items ({} placeholders)",
        layout.anchors.len(),
        layout.items.len(),
        placeholders
    );
    for (id, region) in record.regions.iter().filter(|(_, r)| !r.is_null) {
        let g = region.geometry;
        let _ = writeln!(
            out,
            "  region {} at {},{} {}x{}: {}",
            id,
            g.x,
            g.y,
            g.width,
            g.height,
            region.panels.join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_validate() {
        let args = CliArgs::try_parse_from(["dockyard", "validate", "layout.json"]).unwrap();
        assert_eq!(
            args.command,
            Command::Validate {
                file: Some(PathBuf::from("layout.json"))
            }
        );
    }

    #[test]
    fn test_file_defaults_to_saved_layout() {
        let args = CliArgs::try_parse_from(["dockyard", "validate"]).unwrap();
        let Command::Validate { file } = args.command else {
            panic!("expected validate");
        };
        assert_eq!(file, None);

        let path = resolve_file(file).unwrap();
        assert_eq!(path.file_name().unwrap(), "default.json");
        assert_eq!(path.parent(), crate::config_paths::layouts_dir().as_deref());

        let given = resolve_file(Some(PathBuf::from("mine.json"))).unwrap();
        assert_eq!(given, PathBuf::from("mine.json"));
    }

    #[test]
    fn test_parse_inspect() {
        let args = CliArgs::try_parse_from(["dockyard", "inspect", "saved.json"]).unwrap();
        assert!(matches!(args.command, Command::Inspect { .. }));
    }

    #[test]
    fn test_missing_subcommand_is_an_error() {
        assert!(CliArgs::try_parse_from(["dockyard"]).is_err());
    }

    #[test]
    fn test_wrong_version_reports_a_problem() {
        let document = LayoutDocument {
            serialization_version: 1,
            ..Default::default()
        };
        assert_eq!(validate(&document, &LayoutConfig::default()).len(), 1);
    }

    #[test]
    fn test_inspect_empty_document() {
        let document = LayoutDocument::default();
        let summary = inspect(&document);
        assert!(summary.contains("serialization version 0"));
        assert!(summary.contains("0 panels"));
    }
}
