//! Configuration system tests
//!
//! Tests for config paths and layout config loading/saving.

use dockyard::config::LayoutConfig;
use dockyard::config_paths;

// ========================================================================
// Config Paths Tests
// ========================================================================

#[test]
fn test_config_dir_returns_some() {
    assert!(config_paths::config_dir().is_some());
}

#[test]
fn test_config_dir_contains_dockyard() {
    let dir = config_paths::config_dir().unwrap();
    assert!(dir.to_string_lossy().contains("dockyard"));
}

#[test]
fn test_config_file_ends_with_yaml() {
    let path = config_paths::config_file().unwrap();
    assert_eq!(path.file_name().unwrap(), "config.yaml");
}

#[test]
fn test_layout_file_lives_in_layouts_dir() {
    let path = config_paths::layout_file("default").unwrap();
    assert_eq!(path.file_name().unwrap(), "default.json");
    assert_eq!(path.parent(), config_paths::layouts_dir().as_deref());
}

// ========================================================================
// LayoutConfig Tests
// ========================================================================

#[test]
fn test_missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = LayoutConfig::load_from(&dir.path().join("nope.yaml"));
    assert_eq!(config, LayoutConfig::default());
}

#[test]
fn test_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.yaml");

    let config = LayoutConfig {
        separator_thickness: 3,
        min_region_width: 120,
        check_sanity_after_ops: true,
        ..LayoutConfig::default()
    };
    config.save_to(&path).unwrap();

    assert_eq!(LayoutConfig::load_from(&path), config);
}

#[test]
fn test_partial_file_fills_in_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "min_region_height: 40\n").unwrap();

    let config = LayoutConfig::load_from(&path);
    assert_eq!(config.min_region_height, 40);
    assert_eq!(config.separator_thickness, 5);
    assert_eq!(config.static_separator_thickness, 1);
}

#[test]
fn test_invalid_yaml_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "separator_thickness: [not, a, number]\n").unwrap();

    assert_eq!(LayoutConfig::load_from(&path), LayoutConfig::default());
}

#[test]
fn test_out_of_range_values_are_sanitized() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "drop_length_fraction: 3.5\nseparator_thickness: -2\n").unwrap();

    let config = LayoutConfig::load_from(&path);
    assert_eq!(config.drop_length_fraction, 0.4);
    assert_eq!(config.separator_thickness, 5);
}
