//! Layout helpers.

use ratatui::prelude::*;

/// Frame split into the active view and the status bar.
pub struct MainLayout {
    pub body: Rect,
    pub status_bar: Rect,
}

/// Competitions view: dial on the left third, content on the rest.
pub struct DialLayout {
    pub dial: Rect,
    pub content: Rect,
}

pub fn create_main_layout(area: Rect) -> MainLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // view
            Constraint::Length(1), // status
        ])
        .split(area);

    MainLayout {
        body: chunks[0],
        status_bar: chunks[1],
    }
}

pub fn create_dial_layout(area: Rect) -> DialLayout {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3), Constraint::Ratio(2, 3)])
        .split(area);

    DialLayout {
        dial: chunks[0],
        content: chunks[1],
    }
}

/// Rectangle of `width`×`height` centred on (`cx`, `cy`), clipped to `area`.
pub fn centered_at(area: Rect, cx: u16, cy: u16, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = cx
        .saturating_sub(width / 2)
        .clamp(area.x, area.right().saturating_sub(width));
    let y = cy
        .saturating_sub(height / 2)
        .clamp(area.y, area.bottom().saturating_sub(height));
    Rect::new(x, y, width, height)
}

/// Cell at fractional position (`fx`, `fy`) of `area`.
pub fn point_at(area: Rect, fx: f64, fy: f64) -> (u16, u16) {
    let fx = fx.clamp(0.0, 1.0);
    let fy = fy.clamp(0.0, 1.0);
    let x = area.x + (fx * f64::from(area.width.saturating_sub(1))).round() as u16;
    let y = area.y + (fy * f64::from(area.height.saturating_sub(1))).round() as u16;
    (x, y)
}

/// Fractional position of cell (`x`, `y`) inside `area`.
pub fn fraction_of(area: Rect, x: u16, y: u16) -> (f64, f64) {
    let span = |len: u16| f64::from(len.saturating_sub(1).max(1));
    let fx = f64::from(x.saturating_sub(area.x)) / span(area.width);
    let fy = f64::from(y.saturating_sub(area.y)) / span(area.height);
    (fx.clamp(0.0, 1.0), fy.clamp(0.0, 1.0))
}
