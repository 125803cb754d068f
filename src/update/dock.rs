//! Dock update handlers
//!
//! Handles panel docking, closing, floating and side bar messages.

use crate::commands::Cmd;
use crate::messages::DockMsg;
use crate::session::Session;

/// Redraw when the session changed, nothing otherwise
fn redraw_if(changed: bool) -> Option<Cmd> {
    changed.then_some(Cmd::Redraw)
}

/// Update function for dock messages
pub fn update_dock(session: &mut Session, msg: DockMsg) -> Option<Cmd> {
    match msg {
        DockMsg::AddPanel {
            name,
            target,
            location,
            relative_to,
            option,
        } => redraw_if(session.add_panel(&name, &target, location, relative_to, option)),

        DockMsg::AddPanelAsTab { name, region, index } => {
            redraw_if(session.add_panel_as_tab(&name, region, index))
        }

        DockMsg::ClosePanel(name) => redraw_if(session.close_panel(&name)),

        DockMsg::OpenPanel(name) => redraw_if(session.open_panel(&name)),

        DockMsg::FloatPanel { name, geometry } => {
            redraw_if(session.float_panel(&name, geometry).is_some())
        }

        DockMsg::DockFloatingWindow {
            window,
            main_window,
            location,
            relative_to,
        } => redraw_if(session.dock_floating_window(window, &main_window, location, relative_to)),

        DockMsg::SetCurrentTab { region, index } => {
            // Only the region's own window repaints
            let owner = session.region(region).and_then(|r| r.owner().cloned());
            match owner {
                Some(owner) if session.set_current_tab(region, index) => Some(Cmd::RedrawWindow(owner)),
                _ => None,
            }
        }

        DockMsg::MoveToSideBar { name, location } => redraw_if(session.move_to_sidebar(&name, location)),

        DockMsg::RestoreFromSideBar(name) => redraw_if(session.restore_from_sidebar(&name)),
    }
}
