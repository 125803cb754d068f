//! Scaling a saved layout into main windows of a different size

use crate::model::{Point, Rect, Size};
use crate::session::Session;

/// How a main window's saved geometry maps onto its current one
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingInfo {
    pub main_window_name: String,
    pub saved_main_window_geometry: Rect,
    pub real_main_window_geometry: Rect,
    pub width_factor: f64,
    pub height_factor: f64,
    /// Positions aren't translated once the window moved to another screen
    pub main_window_changed_screen: bool,
}

impl ScalingInfo {
    /// `None` (with a log line) when either geometry is unusable
    pub fn new(session: &Session, name: &str, saved: Rect, saved_screen_index: i32) -> Option<Self> {
        let Some(window) = session.main_window_by_name(name) else {
            tracing::error!("No main window '{}' to scale against", name);
            return None;
        };
        if !saved.is_valid() {
            tracing::error!("Invalid saved main window geometry {:?}", saved);
            return None;
        }
        let real = window.geometry;
        if !real.is_valid() {
            tracing::error!("Invalid main window geometry {:?}", real);
            return None;
        }

        let current_screen = session.screen_provider().screen_index_for(real);
        Some(Self {
            main_window_name: name.to_string(),
            saved_main_window_geometry: saved,
            real_main_window_geometry: real,
            width_factor: real.width as f64 / saved.width as f64,
            height_factor: real.height as f64 / saved.height as f64,
            main_window_changed_screen: current_screen != saved_screen_index,
        })
    }

    pub fn translate_pos(&self, point: Point) -> Point {
        let origin = self.saved_main_window_geometry.origin();
        let dx = (point.x - origin.x) as f64 * self.width_factor;
        let dy = (point.y - origin.y) as f64 * self.height_factor;
        Point::new(
            (origin.x as f64 + dx).ceil() as i32,
            (origin.y as f64 + dy).ceil() as i32,
        )
    }

    pub fn apply_to_size(&self, size: Size) -> Size {
        Size::new(
            (self.width_factor * size.width as f64) as i32,
            (self.height_factor * size.height as f64) as i32,
        )
    }

    /// Scale a rect's size and, unless the screen changed, its position
    pub fn apply_to_rect(&self, rect: Rect) -> Rect {
        if rect.is_empty() {
            return rect;
        }
        let origin = if self.main_window_changed_screen {
            rect.origin()
        } else {
            self.translate_pos(rect.origin())
        };
        Rect::from_origin_size(origin, self.apply_to_size(rect.size()))
    }
}
