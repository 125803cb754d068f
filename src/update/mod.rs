//! Update functions for the Elm-style architecture
//!
//! All session changes driven by host messages flow through [`update`].

mod dock;
mod window;

use crate::commands::Cmd;
use crate::messages::{Msg, WindowMsg};
use crate::session::Session;

#[cfg(debug_assertions)]
use crate::tracing::AnchorSnapshot;
#[cfg(debug_assertions)]
use tracing::{debug, span, Level};

pub use dock::update_dock;
pub use window::update_window;

/// Main update function - dispatches to sub-handlers
///
/// In debug builds, this wraps with tracing instrumentation.
/// In release builds, it's a direct dispatch with zero overhead.
#[inline]
pub fn update(session: &mut Session, msg: Msg) -> Option<Cmd> {
    #[cfg(debug_assertions)]
    {
        update_traced(session, msg)
    }
    #[cfg(not(debug_assertions))]
    {
        update_inner(session, msg)
    }
}

/// Inner update logic (no tracing)
fn update_inner(session: &mut Session, msg: Msg) -> Option<Cmd> {
    match msg {
        Msg::Dock(m) => dock::update_dock(session, m),
        Msg::Window(m) => window::update_window(session, m),
    }
}

/// Traced update wrapper (debug builds only)
///
/// Captures the anchors of the affected window before and after and logs the
/// difference, then audits the whole session.
#[cfg(debug_assertions)]
fn update_traced(session: &mut Session, msg: Msg) -> Option<Cmd> {
    let msg_name = msg_type_name(&msg);
    let _span = span!(Level::DEBUG, "update", msg = %msg_name).entered();
    debug!(target: "message", msg = %msg_name, "processing");

    let target = match &msg {
        Msg::Window(WindowMsg::Resize { layout, .. })
        | Msg::Window(WindowMsg::MoveSeparator { layout, .. }) => Some(layout.clone()),
        Msg::Dock(_) => None,
    };
    let before = target
        .as_ref()
        .and_then(|t| session.layout(t))
        .map(AnchorSnapshot::from_layout);

    let result = update_inner(session, msg);

    if let (Some(before), Some(layout)) = (&before, target.as_ref().and_then(|t| session.layout(t))) {
        if let Some(diff) = before.diff(&AnchorSnapshot::from_layout(layout)) {
            debug!(target: "anchors", %diff, "state changed");
        }
    }

    if !session.is_sane() {
        tracing::error!("Session inconsistent after {}", msg_name);
    }

    result
}

/// Get a display name for a message type
///
/// Uses Debug formatting to include variant names and arguments.
/// Example outputs:
/// - `Dock::ClosePanel("console")`
/// - `Window::Resize { .. }`
#[cfg(debug_assertions)]
fn msg_type_name(msg: &Msg) -> String {
    match msg {
        Msg::Dock(m) => format!("Dock::{:?}", m),
        Msg::Window(m) => format!("Window::{:?}", m),
    }
}
