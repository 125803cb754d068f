//! Window geometry update handlers

use crate::commands::Cmd;
use crate::messages::WindowMsg;
use crate::session::Session;

/// Update function for window messages
pub fn update_window(session: &mut Session, msg: WindowMsg) -> Option<Cmd> {
    match msg {
        WindowMsg::Resize { layout, size } => {
            // A clamped resize still changed something worth repainting
            let before = session.layout(&layout).map(|l| l.size());
            session.resize_window(&layout, size);
            let after = session.layout(&layout).map(|l| l.size());
            (before != after).then_some(Cmd::RedrawWindow(layout))
        }

        WindowMsg::MoveSeparator {
            layout,
            anchor,
            position,
        } => {
            let applied = session.move_separator(&layout, anchor, position)?;
            tracing::debug!("Separator #{} moved to {}", anchor.0, applied);
            Some(Cmd::RedrawWindow(layout))
        }
    }
}
