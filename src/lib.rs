//! dockyard - dockable panel layouts
//!
//! This crate provides an anchor-based splitter layout engine, a session
//! registry of windows, regions and panels, and a layout saver that writes
//! and restores whole-session layouts as JSON documents. Host UIs drive the
//! session through Elm-style messages.

pub mod cli;
pub mod commands;
pub mod config;
pub mod config_paths;
pub mod layout;
pub mod messages;
pub mod model;
pub mod saver;
pub mod session;
pub mod tracing;
pub mod update;

// Re-export commonly used types
pub use commands::Cmd;
pub use config::LayoutConfig;
pub use layout::SplitterLayout;
pub use messages::Msg;
pub use saver::{LayoutSaver, RestoreOptions};
pub use session::Session;
