//! Guestboard state: fetched notes, placement mode and the note-shaped cursor.

use chrono::{DateTime, Utc};
use rand::{Rng, rngs::StdRng, seq::IndexedRandom};
use std::time::Duration;

use super::{GuestNote, NewNote, NotePosition, flag::SignedFlag};
use crate::{spring::Chaser, timeline::Timeline};

const CURSOR_STRENGTH: f64 = 0.15;
const MAX_TILT_DEG: f64 = 3.0;
const UNKNOWN_CITY: &str = "Somewhere";

/// Grayscale fill and its inverted text shade.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shade {
    pub fill: u8,
    pub text: u8,
}

/// A note as drawn on the board, position in percent.
#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub city: String,
    pub message: String,
    pub shade: Shade,
    pub tilt: f64,
    /// Placed in this session and not yet confirmed by the store.
    pub local: bool,
}

/// Note-shaped cursor shown while placing.
#[derive(Clone, Debug, PartialEq)]
pub struct CursorNote {
    pub x: f64,
    pub y: f64,
    pub message: String,
    pub shade: Shade,
}

/// Dark gray in `34..102` with the inverted text shade.
pub fn random_dark_shade(rng: &mut impl Rng) -> Shade {
    let fill: u8 = rng.random_range(34..102);
    Shade {
        fill,
        text: 255 - fill,
    }
}

pub fn random_greeting(rng: &mut impl Rng, city: &str) -> String {
    let templates: [fn(&str) -> String; 4] = [
        |c| format!("Hello from {c}"),
        |c| format!("Someone says hi from {c}"),
        |c| format!("Someone from {c} was here"),
        |c| format!("Hailing from {c}"),
    ];
    templates
        .choose(rng)
        .map(|t| t(city))
        .unwrap_or_else(|| format!("Hello from {city}"))
}

#[derive(Debug)]
pub struct Board {
    notes: Vec<Note>,
    loading: bool,
    reveal_delay: Duration,
    pending: Timeline<Vec<Note>>,
    flag: SignedFlag,
    signed: bool,
    city: Option<String>,
    placing: bool,
    cursor: Chaser,
    pointer: (f64, f64),
    cursor_message: String,
    cursor_shade: Shade,
    rng: StdRng,
}

impl Board {
    pub fn new(flag: SignedFlag, reveal_delay: Duration, rng: StdRng) -> Self {
        Self {
            notes: vec![],
            loading: false,
            reveal_delay,
            pending: Timeline::new(),
            flag,
            signed: false,
            city: None,
            placing: false,
            cursor: Chaser::new(50.0, 50.0, CURSOR_STRENGTH),
            pointer: (50.0, 50.0),
            cursor_message: String::new(),
            cursor_shade: Shade { fill: 51, text: 204 },
            rng,
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_placing(&self) -> bool {
        self.placing
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    /// Re-read the persisted flag. Returns true when the visitor may still sign.
    pub fn refresh_signed(&mut self, now: DateTime<Utc>) -> bool {
        self.signed = self.flag.is_signed(now);
        if self.signed {
            self.placing = false;
        }
        !self.signed
    }

    /// Mark a fetch as in flight; pending reveals from earlier fetches are dropped.
    pub fn begin_loading(&mut self) {
        self.pending.cancel_all();
        self.loading = true;
    }

    /// Fetched notes appear after the reveal delay.
    pub fn notes_loaded(&mut self, fetched: Vec<GuestNote>, now: Duration) {
        let notes: Vec<Note> = fetched.into_iter().map(|n| self.decorate(n)).collect();
        tracing::debug!("{} notes fetched", notes.len());
        self.pending.schedule(now + self.reveal_delay, notes);
    }

    pub fn load_failed(&mut self) {
        self.pending.cancel_all();
        self.loading = false;
    }

    /// Enter placing mode when a city is known and the visitor has not signed.
    pub fn city_resolved(&mut self, city: Option<String>) {
        let Some(city) = city else {
            return;
        };
        if self.signed {
            return;
        }
        self.cursor_message = random_greeting(&mut self.rng, &city);
        self.cursor_shade = random_dark_shade(&mut self.rng);
        self.city = Some(city);
        self.placing = true;
    }

    /// Pointer position in percent of the board.
    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        self.pointer = (x, y);
    }

    pub fn tick(&mut self, now: Duration) {
        for fetched in self.pending.drain_due(now) {
            let local: Vec<Note> = std::mem::take(&mut self.notes)
                .into_iter()
                .filter(|n| n.local)
                .collect();
            self.notes = fetched;
            self.notes.extend(local);
            self.loading = false;
        }
        if self.placing {
            self.cursor.step_toward(self.pointer.0, self.pointer.1);
        }
    }

    pub fn cursor(&self) -> Option<CursorNote> {
        self.placing.then(|| CursorNote {
            x: self.cursor.x,
            y: self.cursor.y,
            message: self.cursor_message.clone(),
            shade: self.cursor_shade,
        })
    }

    /// Drop the note at `(x, y)` percent and return what should be persisted.
    pub fn place_at(&mut self, x: f64, y: f64, now: DateTime<Utc>) -> Option<NewNote> {
        if !self.placing || self.signed {
            return None;
        }
        let city = self.city.clone()?;
        let (x, y) = (x.clamp(0.0, 100.0), y.clamp(0.0, 100.0));

        let note = Note {
            id: uuid::Uuid::new_v4().to_string(),
            x,
            y,
            city: city.clone(),
            message: self.cursor_message.clone(),
            shade: random_dark_shade(&mut self.rng),
            tilt: self.random_tilt(),
            local: true,
        };
        self.notes.push(note);

        if let Err(e) = self.flag.mark(now) {
            tracing::warn!("failed to persist signed flag: {e}");
        }
        self.signed = true;
        self.placing = false;
        tracing::info!("note placed at {x:.1}%, {y:.1}%");

        Some(NewNote {
            name: String::new(),
            city,
            message: self.cursor_message.clone(),
            position: NotePosition { x, y },
        })
    }

    /// Attach the store id to the newest local note.
    pub fn note_saved(&mut self, id: Option<String>) {
        let Some(id) = id else {
            return;
        };
        if let Some(note) = self.notes.iter_mut().rev().find(|n| n.local) {
            note.id = id;
            note.local = false;
        }
    }

    fn random_tilt(&mut self) -> f64 {
        self.rng.random_range(-MAX_TILT_DEG..=MAX_TILT_DEG)
    }

    fn decorate(&mut self, note: GuestNote) -> Note {
        let city = if note.city.is_empty() {
            UNKNOWN_CITY.to_string()
        } else {
            note.city
        };
        let message = if note.message.is_empty() {
            format!("Hello from {city}")
        } else {
            note.message
        };
        Note {
            id: note.id,
            x: note.position.x,
            y: note.position.y,
            city,
            message,
            shade: random_dark_shade(&mut self.rng),
            tilt: self.random_tilt(),
            local: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn board(dir: &tempfile::TempDir) -> Board {
        let flag = SignedFlag::new(dir.path().join("signed.json"), 365);
        Board::new(flag, Duration::from_millis(800), StdRng::seed_from_u64(9))
    }

    fn fetched(id: &str, city: &str, message: &str) -> GuestNote {
        GuestNote {
            id: id.into(),
            name: "".into(),
            city: city.into(),
            message: message.into(),
            date: Utc::now(),
            position: NotePosition { x: 10.0, y: 20.0 },
        }
    }

    #[test]
    fn shades_are_dark_and_inverted() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..500 {
            let s = random_dark_shade(&mut rng);
            assert!((34..102).contains(&s.fill));
            assert_eq!(u16::from(s.fill) + u16::from(s.text), 255);
        }
    }

    #[test]
    fn greeting_mentions_city() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..20 {
            assert!(random_greeting(&mut rng, "Davis").ends_with("Davis"));
        }
    }

    #[test]
    fn notes_appear_after_reveal_delay() {
        let dir = tempfile::tempdir().unwrap();
        let mut b = board(&dir);
        b.begin_loading();
        b.notes_loaded(vec![fetched("a", "", ""), fetched("b", "Oakland", "hi")], Duration::ZERO);

        b.tick(Duration::from_millis(799));
        assert!(b.is_loading());
        assert!(b.notes().is_empty());

        b.tick(Duration::from_millis(800));
        assert!(!b.is_loading());
        assert_eq!(b.notes().len(), 2);
        assert_eq!(b.notes()[0].city, "Somewhere");
        assert_eq!(b.notes()[0].message, "Hello from Somewhere");
        assert_eq!(b.notes()[1].message, "hi");
        assert!(b.notes().iter().all(|n| n.tilt.abs() <= 3.0));
    }

    #[test]
    fn placement_requires_city() {
        let dir = tempfile::tempdir().unwrap();
        let mut b = board(&dir);
        assert!(b.refresh_signed(Utc::now()));
        b.city_resolved(None);
        assert!(!b.is_placing());
        assert_eq!(b.place_at(50.0, 50.0, Utc::now()), None);
    }

    #[test]
    fn place_once_then_signed() {
        let dir = tempfile::tempdir().unwrap();
        let mut b = board(&dir);
        b.city_resolved(Some("Berkeley".into()));
        assert!(b.is_placing());
        let cursor = b.cursor().unwrap();
        assert!(cursor.message.ends_with("Berkeley"));

        let new = b.place_at(25.0, 140.0, Utc::now()).unwrap();
        assert_eq!(new.city, "Berkeley");
        assert_eq!(new.position, NotePosition { x: 25.0, y: 100.0 });
        assert_eq!(new.message, cursor.message);
        assert!(b.is_signed());
        assert!(!b.is_placing());
        assert_eq!(b.cursor(), None);
        assert_eq!(b.notes().len(), 1);
        assert!(b.notes()[0].local);

        assert_eq!(b.place_at(30.0, 30.0, Utc::now()), None);

        let mut again = board(&dir);
        assert!(!again.refresh_signed(Utc::now()));
        again.city_resolved(Some("Berkeley".into()));
        assert!(!again.is_placing());
    }

    #[test]
    fn local_note_survives_late_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let mut b = board(&dir);
        b.begin_loading();
        b.city_resolved(Some("Davis".into()));
        b.place_at(5.0, 5.0, Utc::now()).unwrap();
        b.notes_loaded(vec![fetched("remote", "Oakland", "yo")], Duration::ZERO);
        b.tick(Duration::from_secs(1));

        let ids: Vec<_> = b.notes().iter().map(|n| n.local).collect();
        assert_eq!(ids, vec![false, true]);

        b.note_saved(Some("stored".into()));
        assert_eq!(b.notes()[1].id, "stored");
        assert!(!b.notes()[1].local);
    }

    #[test]
    fn cursor_chases_pointer() {
        let dir = tempfile::tempdir().unwrap();
        let mut b = board(&dir);
        b.city_resolved(Some("Davis".into()));
        b.pointer_moved(100.0, 0.0);
        b.tick(Duration::ZERO);
        let c = b.cursor().unwrap();
        assert!((c.x - 57.5).abs() < 1e-9);
        assert!((c.y - 42.5).abs() < 1e-9);
        for _ in 0..200 {
            b.tick(Duration::ZERO);
        }
        let c = b.cursor().unwrap();
        assert!((c.x - 100.0).abs() < 1e-3);
    }

    #[test]
    fn failed_load_clears_loading() {
        let dir = tempfile::tempdir().unwrap();
        let mut b = board(&dir);
        b.begin_loading();
        b.load_failed();
        assert!(!b.is_loading());
    }
}
