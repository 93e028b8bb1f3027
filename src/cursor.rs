//! Custom pointer overlay state.
//!
//! Regions of a view register as [`CursorArea`]s; hovering one changes the
//! overlay's shape, colour and label. Everything goes through the small
//! setter surface on [`CursorState`].

use ratatui::layout::{Position, Rect};

pub const DEFAULT_CURSOR_COLOR: &str = "#002FA7";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CursorKind {
    #[default]
    Square,
    Line,
    SquareWithText,
}

impl CursorKind {
    /// Size in terminal cells (width, height).
    pub fn cells(self) -> (u16, u16) {
        match self {
            CursorKind::Square | CursorKind::SquareWithText => (2, 1),
            CursorKind::Line => (1, 3),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CursorState {
    kind: CursorKind,
    color: String,
    text: Option<String>,
    position: Position,
    visible: bool,
}

impl CursorState {
    pub fn new() -> Self {
        Self {
            kind: CursorKind::Square,
            color: DEFAULT_CURSOR_COLOR.into(),
            text: None,
            position: Position::default(),
            visible: false,
        }
    }

    pub fn kind(&self) -> CursorKind {
        self.kind
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_kind(&mut self, kind: CursorKind) {
        self.kind = kind;
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.color = color.into();
    }

    pub fn set_text(&mut self, text: Option<String>) {
        self.text = text;
    }

    pub fn move_to(&mut self, position: Position) {
        self.position = position;
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Back to the default square look.
    pub fn reset(&mut self) {
        self.kind = CursorKind::Square;
        self.color = DEFAULT_CURSOR_COLOR.into();
        self.text = None;
    }
}

impl Default for CursorState {
    fn default() -> Self {
        Self::new()
    }
}

/// A screen region that restyles the cursor while hovered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CursorArea {
    pub rect: Rect,
    pub kind: CursorKind,
    pub color: String,
    pub text: String,
}

impl CursorArea {
    pub fn new(rect: Rect, kind: CursorKind) -> Self {
        Self {
            rect,
            kind,
            color: DEFAULT_CURSOR_COLOR.into(),
            text: "info".into(),
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    fn enter(&self, cursor: &mut CursorState) {
        cursor.set_kind(self.kind);
        cursor.set_color(self.color.clone());
        if self.kind == CursorKind::SquareWithText {
            cursor.set_text(Some(self.text.clone()));
        }
    }

    fn leave(cursor: &mut CursorState) {
        cursor.reset();
    }
}

/// Cursor state plus the areas registered for the current frame.
#[derive(Clone, Debug, Default)]
pub struct CursorOverlay {
    pub state: CursorState,
    areas: Vec<CursorArea>,
    hovered: Option<usize>,
}

impl CursorOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the registered areas; a hover that no longer exists is left.
    pub fn set_areas(&mut self, areas: Vec<CursorArea>) {
        if self.areas != areas {
            self.areas = areas;
            if self.hovered.take().is_some() {
                CursorArea::leave(&mut self.state);
            }
            self.update_hover(self.state.position());
        }
    }

    /// Track the pointer and enter/leave areas as it crosses them.
    pub fn update_hover(&mut self, pos: Position) {
        self.state.move_to(pos);
        let hit = self.areas.iter().position(|a| a.rect.contains(pos));
        if hit == self.hovered {
            return;
        }
        if self.hovered.is_some() {
            CursorArea::leave(&mut self.state);
        }
        if let Some(i) = hit {
            self.areas[i].enter(&mut self.state);
        }
        self.hovered = hit;
    }

    pub fn hovered(&self) -> Option<&CursorArea> {
        self.hovered.and_then(|i| self.areas.get(i))
    }

    /// Pointer left the view: drop every area and hide the overlay.
    pub fn hide(&mut self) {
        self.areas.clear();
        if self.hovered.take().is_some() {
            CursorArea::leave(&mut self.state);
        }
        self.state.hide();
    }
}
