//! Drawing of every view plus the screen geometry shared with input handling.

use ratatui::{
    Frame,
    prelude::*,
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::{
    cursor::{CursorArea, CursorKind},
    dial::item_look,
    events::View,
    guestboard::board::Shade,
    layout::{self, centered_at, point_at},
    links::ShufflePhase,
    reveal::{RevealPhase, WordKey},
};

use super::App;

const NOTE_WIDTH: u16 = 22;
const NOTE_HEIGHT: u16 = 3;
const BOARD_BG: Color = Color::Rgb(241, 245, 249);
const NO_CONTENT: &str = "No content available for this item";
const SKIP_LABEL: &str = "SKIP ↗";

/// Area of the active view.
pub(super) fn body(app: &App) -> Rect {
    layout::create_main_layout(app.screen).body
}

/// Dial column of the competitions view, inside its border.
pub(super) fn dial_area(app: &App) -> Rect {
    Block::bordered().inner(layout::create_dial_layout(body(app)).dial)
}

/// Board surface of the guestboard view, below the header.
pub(super) fn board_area(app: &App) -> Rect {
    let b = body(app);
    let header = 3.min(b.height);
    Rect::new(b.x, b.y + header, b.width, b.height - header)
}

/// Clickable label of each entrance link.
pub(super) fn link_rects(app: &App) -> Vec<Rect> {
    let area = body(app);
    app.links
        .links()
        .iter()
        .zip(app.links.positions())
        .map(|(link, &(fx, fy))| {
            let (cx, cy) = point_at(area, fx, fy);
            centered_at(area, cx, cy, link.label.chars().count() as u16 + 2, 1)
        })
        .collect()
}

/// The die in the bottom-right corner of the entrance view.
pub(super) fn die_rect(app: &App) -> Rect {
    let area = body(app);
    Rect::new(
        area.right().saturating_sub(7),
        area.bottom().saturating_sub(2),
        5.min(area.width),
        1.min(area.height),
    )
}

/// The skip label in the bottom-right corner of the intro.
pub(super) fn skip_rect(app: &App) -> Rect {
    let area = body(app);
    let width = SKIP_LABEL.chars().count() as u16;
    Rect::new(
        area.right().saturating_sub(width + 2),
        area.bottom().saturating_sub(2),
        width.min(area.width),
        1.min(area.height),
    )
}

/// Dial item under a terminal row, if any.
pub(super) fn dial_item_at(app: &App, row: u16) -> Option<usize> {
    let inner = dial_area(app);
    let rows = f64::from(app.cfg.dial.item_rows.max(1));
    let center = f64::from(inner.y) + f64::from(inner.height) / 2.0;
    // Items are drawn on the floor of their row, so measure from the cell centre.
    app.dial.item_at((f64::from(row) + 0.5 - center) / rows)
}

/// Regions of the entrance view that restyle the cursor.
pub(super) fn entrance_cursor_areas(app: &App) -> Vec<CursorArea> {
    let mut areas: Vec<CursorArea> = link_rects(app)
        .into_iter()
        .map(|r| CursorArea::new(r, CursorKind::Line))
        .collect();
    areas.push(
        CursorArea::new(die_rect(app), CursorKind::SquareWithText)
            .with_color(app.cfg.dial.highlight_color.clone())
            .with_text("roll"),
    );
    areas
}

fn parse_color(s: &str) -> Option<Color> {
    s.parse::<Color>().ok()
}

fn gray(v: u8) -> Color {
    Color::Rgb(v, v, v)
}

/// Draw the whole frame.
pub fn draw(f: &mut Frame, app: &App) {
    let main = layout::create_main_layout(f.area());
    match app.ui.view() {
        View::Intro => draw_intro(f, main.body, app),
        View::Entrance => draw_entrance(f, main.body, app),
        View::Competitions => draw_competitions(f, main.body, app),
        View::Guestboard => draw_guestboard(f, main.body, app),
        other => draw_placeholder(f, main.body, other),
    }
    draw_status(f, main.status_bar, app);
    if app.ui.view() == View::Entrance {
        draw_cursor(f, app);
    }
}

fn draw_intro(f: &mut Frame, area: Rect, app: &App) {
    let lines = app.reveal.lines();
    let spacing: u16 = if usize::from(area.height) >= lines.len() * 2 {
        2
    } else {
        1
    };
    let used = (lines.len() as u16).saturating_mul(spacing);
    let top = area.y + area.height.saturating_sub(used) / 2;
    let buf = f.buffer_mut();

    for (li, line) in lines.iter().enumerate() {
        let row = top + li as u16 * spacing;
        let mut x = area.x + 2 + line.indent as u16;
        for (wi, word) in line.words.iter().enumerate() {
            let look = app.reveal.look(WordKey { line: li, word: wi }, app.clock);
            let y = row + u16::from(look.rise > 0.5);
            if look.opacity > 0.02 && y < area.bottom() && x < area.right() {
                let style = Style::new().fg(gray((look.opacity * 255.0).round() as u8));
                buf.set_stringn(x, y, word, usize::from(area.right() - x), style);
            }
            x = x.saturating_add(word.chars().count() as u16 + 1);
        }
    }

    if app.reveal.phase() == RevealPhase::Running {
        f.render_widget(Paragraph::new(SKIP_LABEL).dim(), skip_rect(app));
    }
}

fn draw_entrance(f: &mut Frame, area: Rect, app: &App) {
    let links = &app.links;
    if links.phase() == ShufflePhase::Rolling {
        let v = links.aura().saturating_mul(3);
        f.render_widget(Block::bordered().border_style(Style::new().fg(gray(v))), area);
    }

    let busy = links.is_busy();
    let hovered = app.cursor.hovered().map(|a| a.rect);
    for (i, (link, rect)) in links.links().iter().zip(link_rects(app)).enumerate() {
        let mut style = Style::new();
        if busy {
            style = style.add_modifier(Modifier::DIM);
        } else if i == app.link_focus {
            style = style.add_modifier(Modifier::REVERSED);
        }
        if !busy && hovered == Some(rect) {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        f.render_widget(
            Paragraph::new(link.label.as_str())
                .style(style)
                .alignment(Alignment::Center),
            rect,
        );
    }

    let die = die_rect(app);
    f.render_widget(Paragraph::new(links.face()).bold(), die);
    let countdown = links.countdown_face();
    if !countdown.is_empty() {
        let at = Rect::new(die.x.saturating_sub(3), die.y, 2.min(die.width), die.height);
        f.render_widget(Paragraph::new(countdown).dim(), at);
    }

    if let Some(text) = links.text() {
        let y = area.bottom().saturating_sub(4).max(area.y);
        let rect = Rect::new(area.x, y, area.width, 1.min(area.height));
        f.render_widget(
            Paragraph::new(text).italic().alignment(Alignment::Center),
            rect,
        );
    }
}

fn draw_competitions(f: &mut Frame, area: Rect, app: &App) {
    let split = layout::create_dial_layout(area);
    let dial = &app.dial;
    let highlight = parse_color(&app.cfg.dial.highlight_color).unwrap_or(Color::Red);

    let border = if dial.is_focused() {
        Style::new().fg(highlight)
    } else {
        Style::new().fg(Color::DarkGray)
    };
    let block = Block::bordered().title("competitions").border_style(border);
    let inner = block.inner(split.dial);
    f.render_widget(block, split.dial);

    let rows = f64::from(app.cfg.dial.item_rows.max(1));
    let height = dial.settings().item_height.max(f64::EPSILON);
    let center = f64::from(inner.y) + f64::from(inner.height) / 2.0;

    // Centre indicator band.
    let band_h = (rows as u16).min(inner.height);
    let band_y = (center - rows / 2.0).round().max(f64::from(inner.y)) as u16;
    let band = Rect::new(inner.x, band_y, inner.width, band_h).intersection(inner);
    f.render_widget(Block::new().style(Style::new().bg(gray(30))), band);

    let buf = f.buffer_mut();
    let selected = dial.selected_index();
    for (i, item) in dial.items().iter().enumerate() {
        let y = center + (dial.offset() + i as f64 * height) / height * rows;
        let y = y.floor();
        if y < f64::from(inner.y) || y >= f64::from(inner.bottom()) {
            continue;
        }
        let y = y as u16;
        let look = item_look(i.abs_diff(selected), item.disabled);

        let mut style = if look.muted {
            Style::new().fg(Color::DarkGray)
        } else {
            let base = item
                .color
                .as_deref()
                .and_then(parse_color)
                .unwrap_or_else(|| gray((look.opacity * 255.0) as u8));
            Style::new().fg(base)
        };
        if look.blur >= 2 {
            style = style.add_modifier(Modifier::DIM);
        }
        if i == selected && !item.disabled {
            style = style.add_modifier(Modifier::BOLD);
            buf.set_string(inner.x, y, "▌", Style::new().fg(highlight));
        }
        let x = inner.x + 2;
        if x < inner.right() {
            buf.set_stringn(x, y, &item.label, usize::from(inner.right() - x), style);
        }
    }

    let (title, content) = match dial.selected_item() {
        Some(item) => (
            item.label.as_str(),
            item.content.as_deref().unwrap_or(NO_CONTENT),
        ),
        None => ("", NO_CONTENT),
    };
    f.render_widget(
        Paragraph::new(content)
            .wrap(Wrap { trim: true })
            .block(Block::bordered().title(title)),
        split.content,
    );
}

fn draw_note(f: &mut Frame, area: Rect, cx: u16, cy: u16, message: &str, shade: Shade, tilt: f64) {
    let rect = centered_at(area, cx, cy, NOTE_WIDTH, NOTE_HEIGHT);
    let alignment = if tilt < -1.0 {
        Alignment::Left
    } else if tilt > 1.0 {
        Alignment::Right
    } else {
        Alignment::Center
    };
    f.render_widget(Clear, rect);
    f.render_widget(
        Paragraph::new(message.to_uppercase())
            .wrap(Wrap { trim: true })
            .alignment(alignment)
            .style(Style::new().bg(gray(shade.fill)).fg(gray(shade.text))),
        rect,
    );
}

fn draw_guestboard(f: &mut Frame, area: Rect, app: &App) {
    let board = &app.board;
    let header = Rect::new(area.x, area.y, area.width, 3.min(area.height));
    let hint = if board.is_loading() {
        "loading notes...".to_string()
    } else if board.is_placing() {
        format!(
            "click anywhere to leave a note from {}",
            board.city().unwrap_or_default()
        )
    } else if board.is_signed() {
        "thanks for signing".to_string()
    } else {
        String::new()
    };
    // Title, state hint and the latest background message.
    let mut lines = vec![Line::from("GUESTBOARD").bold(), Line::from(hint).dim()];
    if let Some(msg) = app.ui.last_log() {
        lines.push(Line::from(msg).fg(Color::Red).dim());
    }
    f.render_widget(Paragraph::new(lines), header);

    let surface = board_area(app);
    f.render_widget(Block::new().style(Style::new().bg(BOARD_BG)), surface);
    for note in board.notes() {
        let (cx, cy) = point_at(surface, note.x / 100.0, note.y / 100.0);
        draw_note(f, surface, cx, cy, &note.message, note.shade, note.tilt);
    }
    if let Some(c) = board.cursor() {
        let (cx, cy) = point_at(surface, c.x / 100.0, c.y / 100.0);
        draw_note(f, surface, cx, cy, &c.message, c.shade, 3.0);
    }
}

fn draw_placeholder(f: &mut Frame, area: Rect, view: View) {
    let y = area.y + area.height / 2;
    let rect = Rect::new(area.x, y.min(area.bottom().saturating_sub(1)), area.width, 2.min(area.height));
    f.render_widget(
        Paragraph::new(vec![
            Line::from(view.name().to_uppercase()).bold(),
            Line::from("esc to go back").dim(),
        ])
        .alignment(Alignment::Center),
        rect,
    );
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let help = match app.ui.view() {
        View::Intro => "enter skip",
        View::Entrance => "tab/arrows move  enter open  r roll  q quit",
        View::Competitions => "tab focus  up/down select  wheel/drag scroll  esc back",
        View::Guestboard => "click/enter place note  esc back",
        _ => "esc back  q quit",
    };
    let mut spans = vec![
        Span::from(format!(" {} ", app.ui.view().name())).reversed(),
        Span::from(format!(" {} ", app.ui.status)),
    ];
    if let Some(err) = &app.ui.error {
        spans.push(Span::from(format!(" {err} ")).fg(Color::Red));
    }
    spans.push(Span::from(format!("  {help}")).dim());
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_cursor(f: &mut Frame, app: &App) {
    let state = &app.cursor.state;
    if !state.is_visible() {
        return;
    }
    let pos = state.position();
    let (w, h) = state.kind().cells();
    let screen = f.area();
    let rect = Rect::new(pos.x, pos.y, w, h).intersection(screen);
    let color = parse_color(state.color()).unwrap_or(Color::Blue);
    f.render_widget(Block::new().style(Style::new().bg(color)), rect);
    if let Some(text) = state.text() {
        let x = rect.right().saturating_add(1);
        if x < screen.right() && pos.y < screen.bottom() {
            f.buffer_mut().set_stringn(
                x,
                pos.y,
                text,
                usize::from(screen.right() - x),
                Style::new().fg(color),
            );
        }
    }
}
