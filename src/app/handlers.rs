//! Key and mouse handlers.

use anyhow::Result;
use chrono::Utc;
use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::{Position, Rect};

use crate::{
    dial::Direction as DialDirection,
    events::{SequenceAction, View},
    layout::fraction_of,
    shortcuts::matches_shortcut,
    worker::WorkerCmd,
};

use super::{
    App,
    render::{body, board_area, dial_area, dial_item_at, die_rect, link_rects, skip_rect},
};

/// Whether the key is Ctrl+C.
pub fn is_ctrl_c(k: &KeyEvent) -> bool {
    k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c')
}

/// Handle one key press.
///
/// Global bindings win over the bindings of the active view.
pub async fn handle_key(app: &mut App, k: KeyEvent) -> Result<()> {
    // Repeat and release events are ignored.
    if k.kind != KeyEventKind::Press {
        return Ok(());
    }
    let global = &app.shortcuts.global;
    if matches_shortcut(&k, &global.quit) {
        app.quit = true;
        return Ok(());
    }
    if matches_shortcut(&k, &global.restart) {
        return app.dispatch(SequenceAction::Reset).await;
    }
    // Intro and entrance have nothing to go back to.
    if matches_shortcut(&k, &global.back) && !matches!(app.ui.view(), View::Intro | View::Entrance)
    {
        return app.dispatch(SequenceAction::SetView(View::Entrance)).await;
    }

    // Per-view bindings.
    match app.ui.view() {
        View::Intro => {
            if matches_shortcut(&k, &app.shortcuts.intro.skip) {
                app.skip_intro().await?;
            }
        }
        View::Entrance => handle_entrance_key(app, k).await?,
        View::Competitions => handle_dial_key(app, k),
        View::Guestboard => {
            if matches_shortcut(&k, &app.shortcuts.guestboard.place)
                && let Some(c) = app.board.cursor()
            {
                place_note(app, c.x, c.y).await?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Roll the die, move the link focus or open the focused link.
async fn handle_entrance_key(app: &mut App, k: KeyEvent) -> Result<()> {
    let sc = &app.shortcuts.entrance;
    let count = app.links.links().len();

    if matches_shortcut(&k, &sc.roll) {
        app.links.roll(app.clock);
    } else if matches_shortcut(&k, &sc.next_link) && count > 0 {
        // Focus wraps around in both directions.
        app.link_focus = (app.link_focus + 1) % count;
    } else if matches_shortcut(&k, &sc.prev_link) && count > 0 {
        app.link_focus = (app.link_focus + count - 1) % count;
    } else if matches_shortcut(&k, &sc.open)
        && let Some(view) = app.links.activate(app.link_focus)
    {
        app.dispatch(SequenceAction::SetView(view)).await?;
    }
    Ok(())
}

/// Toggle dial focus or step the selection.
fn handle_dial_key(app: &mut App, k: KeyEvent) {
    let sc = &app.shortcuts.dial;
    if matches_shortcut(&k, &sc.focus) {
        let focused = app.dial.is_focused();
        app.dial.set_focused(!focused);
    } else if matches_shortcut(&k, &sc.up) {
        // Navigation is ignored unless the dial has focus.
        app.dial.key_nav(DialDirection::Up);
    } else if matches_shortcut(&k, &sc.down) {
        app.dial.key_nav(DialDirection::Down);
    }
}

/// Handle one mouse event.
pub async fn handle_mouse(app: &mut App, m: MouseEvent) -> Result<()> {
    let pos = Position::new(m.column, m.row);
    match app.ui.view() {
        View::Intro => {
            // Only a click on the skip label aborts the reveal.
            if m.kind == MouseEventKind::Down(MouseButton::Left) && skip_rect(app).contains(pos) {
                app.skip_intro().await?;
            }
        }
        View::Entrance => handle_entrance_mouse(app, m, pos).await?,
        View::Competitions => handle_dial_mouse(app, m, pos),
        View::Guestboard => handle_board_mouse(app, m, pos).await?,
        _ => {}
    }
    Ok(())
}

/// Drive the cursor overlay, then handle clicks on the die and the links.
async fn handle_entrance_mouse(app: &mut App, m: MouseEvent, pos: Position) -> Result<()> {
    // The overlay only lives inside the view; the status bar gets the plain pointer.
    if !body(app).contains(pos) {
        app.cursor.hide();
        return Ok(());
    }
    app.cursor.update_hover(pos);
    if m.kind != MouseEventKind::Down(MouseButton::Left) {
        return Ok(());
    }
    if die_rect(app).contains(pos) {
        app.links.roll(app.clock);
        return Ok(());
    }
    let hit = link_rects(app).iter().position(|r| r.contains(pos));
    if let Some(i) = hit {
        // A click also moves keyboard focus to the link.
        app.link_focus = i;
        if let Some(view) = app.links.activate(i) {
            app.dispatch(SequenceAction::SetView(view)).await?;
        }
    }
    Ok(())
}

/// Drag, click and wheel input on the dial column.
fn handle_dial_mouse(app: &mut App, m: MouseEvent, pos: Position) {
    let area = dial_area(app);
    let step = app.cfg.dial.wheel_step;
    match m.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            // Clicking outside the column drops focus.
            let inside = area.contains(pos);
            app.dial.set_focused(inside);
            if inside {
                app.dial.start_drag();
                app.press_row = Some(m.row);
                app.drag_row = Some(m.row);
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            if app.dial.is_dragging()
                && let Some(last) = app.drag_row
            {
                let delta = (f64::from(m.row) - f64::from(last)) * px_per_row(app);
                app.dial.drag(delta);
                app.drag_row = Some(m.row);
            }
        }
        MouseEventKind::Up(MouseButton::Left) => {
            let clicked = app.press_row.take() == Some(m.row) && app.drag_row == Some(m.row);
            app.drag_row = None;
            app.dial.end_drag();
            // A press and release on the same row selects the item there.
            if clicked && let Some(i) = dial_item_at(app, m.row) {
                app.dial.select(i);
            }
        }
        // Scrolling down moves toward later items.
        MouseEventKind::ScrollDown if area.contains(pos) => app.dial.wheel(-step),
        MouseEventKind::ScrollUp if area.contains(pos) => app.dial.wheel(step),
        _ => {}
    }
}

/// Scroll units covered by one terminal row.
fn px_per_row(app: &App) -> f64 {
    app.dial.settings().item_height / f64::from(app.cfg.dial.item_rows.max(1))
}

/// Move the cursor note, or place it on click.
async fn handle_board_mouse(app: &mut App, m: MouseEvent, pos: Position) -> Result<()> {
    let area = board_area(app);
    if !area.contains(pos) {
        return Ok(());
    }
    // Note positions are stored as percentages of the board.
    let (x, y) = percent_in(area, pos);
    match m.kind {
        MouseEventKind::Moved | MouseEventKind::Drag(_) => app.board.pointer_moved(x, y),
        MouseEventKind::Down(MouseButton::Left) => place_note(app, x, y).await?,
        _ => {}
    }
    Ok(())
}

/// Position inside `area` as percentages on both axes.
fn percent_in(area: Rect, pos: Position) -> (f64, f64) {
    let (fx, fy) = fraction_of(area, pos.x, pos.y);
    (fx * 100.0, fy * 100.0)
}

/// Place the visitor's note and hand it to the worker for saving.
async fn place_note(app: &mut App, x: f64, y: f64) -> Result<()> {
    // `None` when the visitor already signed or the city is still unknown.
    if let Some(note) = app.board.place_at(x, y, Utc::now()) {
        app.ui.status = format!("Placed a note from {}", note.city);
        app.worker_tx.send(WorkerCmd::AddNote(note)).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctrl_c_detection() {
        assert!(is_ctrl_c(&KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL
        )));
        assert!(!is_ctrl_c(&KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::empty()
        )));
    }

    #[test]
    fn percent_spans_board() {
        let area = Rect::new(0, 3, 101, 21);
        assert_eq!(percent_in(area, Position::new(0, 3)), (0.0, 0.0));
        assert_eq!(percent_in(area, Position::new(100, 23)), (100.0, 100.0));
        assert_eq!(percent_in(area, Position::new(50, 13)), (50.0, 50.0));
    }
}
