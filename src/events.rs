//! View routing state and UI status shared with rendering.

use serde::{Deserialize, Serialize};

/// Background messages kept for display.
const LOG_LIMIT: usize = 8;

/// Top-level view currently on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// Word-by-word intro poem.
    Intro,
    /// Shuffled link landing page.
    Entrance,
    About,
    Works,
    Designs,
    /// Competition dial.
    Competitions,
    Philosophy,
    Products,
    /// Visitor note board.
    Guestboard,
}

impl View {
    pub fn name(self) -> &'static str {
        match self {
            View::Intro => "intro",
            View::Entrance => "entrance",
            View::About => "about",
            View::Works => "works",
            View::Designs => "designs",
            View::Competitions => "competitions",
            View::Philosophy => "philosophy",
            View::Products => "products",
            View::Guestboard => "guestboard",
        }
    }
}

/// Transitions accepted by [`Sequence::apply`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceAction {
    SetView(View),
    /// The intro finished or was skipped.
    CompleteIntro,
    /// Back to the intro as on first launch.
    Reset,
}

/// Which view is active and whether the intro has been seen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sequence {
    pub current_view: View,
    pub intro_completed: bool,
}

impl Sequence {
    pub fn new() -> Self {
        Self {
            current_view: View::Intro,
            intro_completed: false,
        }
    }

    /// Apply one transition; returns `true` when the active view changed.
    pub fn apply(&mut self, action: SequenceAction) -> bool {
        let before = self.current_view;
        match action {
            SequenceAction::SetView(view) => self.current_view = view,
            SequenceAction::CompleteIntro => {
                self.intro_completed = true;
                self.current_view = View::Entrance;
            }
            SequenceAction::Reset => *self = Self::new(),
        }
        if before != self.current_view {
            tracing::info!("view {} -> {}", before.name(), self.current_view.name());
        }
        before != self.current_view
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new()
    }
}

/// UI state shared with the renderer.
#[derive(Clone, Debug)]
pub struct UiState {
    /// Routing state.
    pub sequence: Sequence,
    /// Status line text.
    pub status: String,
    /// Recent background messages, oldest first.
    pub log: Vec<String>,
    /// Last error worth highlighting.
    pub error: Option<String>,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            sequence: Sequence::new(),
            status: "Ready".into(),
            log: vec![],
            error: None,
        }
    }

    pub fn view(&self) -> View {
        self.sequence.current_view
    }

    /// Append a background message, dropping the oldest past the limit.
    pub fn push_log(&mut self, message: String) {
        self.log.push(message);
        if self.log.len() > LOG_LIMIT {
            let excess = self.log.len() - LOG_LIMIT;
            self.log.drain(..excess);
        }
    }

    /// Most recent background message.
    pub fn last_log(&self) -> Option<&str> {
        self.log.last().map(String::as_str)
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_intro() {
        let seq = Sequence::new();
        assert_eq!(seq.current_view, View::Intro);
        assert!(!seq.intro_completed);
    }

    #[test]
    fn complete_intro_forces_entrance() {
        let mut seq = Sequence::new();
        seq.apply(SequenceAction::SetView(View::Competitions));
        assert!(seq.apply(SequenceAction::CompleteIntro));
        assert_eq!(seq.current_view, View::Entrance);
        assert!(seq.intro_completed);

        // a second completion keeps the flag and view
        assert!(!seq.apply(SequenceAction::CompleteIntro));
    }

    #[test]
    fn reset_returns_to_intro() {
        let mut seq = Sequence::new();
        seq.apply(SequenceAction::CompleteIntro);
        seq.apply(SequenceAction::SetView(View::Guestboard));
        seq.apply(SequenceAction::Reset);
        assert_eq!(seq, Sequence::new());
    }

    #[test]
    fn view_names_round_trip_through_serde() {
        let v: View = serde_json::from_str("\"guestboard\"").unwrap();
        assert_eq!(v, View::Guestboard);
        assert_eq!(v.name(), "guestboard");
    }

    #[test]
    fn log_keeps_only_recent_messages() {
        let mut ui = UiState::new();
        assert_eq!(ui.last_log(), None);
        for i in 0..20 {
            ui.push_log(format!("msg {i}"));
        }
        assert_eq!(ui.log.len(), LOG_LIMIT);
        assert_eq!(ui.log[0], "msg 12");
        assert_eq!(ui.last_log(), Some("msg 19"));
    }
}
