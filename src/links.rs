//! Entrance page: scattered links and the die that reshuffles them.

use rand::{Rng, rngs::StdRng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{events::View, timeline::Timeline};

pub const DIE_FACES: [&str; 6] = ["⚀", "⚁", "⚂", "⚃", "⚄", "⚅"];

/// Gray levels of the edge aura while rolling.
pub const AURA_SHADES: [u8; 6] = [0, 20, 30, 40, 50, 60];

pub const PLACEHOLDER_TEXTS: [&str; 4] = [
    "fortuitous?",
    "chaos theory doesn't apply here",
    "nice",
    "beautiful",
];

const DIE_FRAME: Duration = Duration::from_millis(100);
const SHUFFLE_GAP: Duration = Duration::from_secs(1);
const TEXT_VISIBLE_FOR: Duration = Duration::from_secs(4);

/// Links are placed inside this band of the view, as fractions.
const BOUND_START: f64 = 0.4;
const BOUND_SPAN: f64 = 0.2;

/// One link on the entrance page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTarget {
    pub label: String,
    pub view: View,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    DieFrame,
    Shuffle { count: u8 },
    HideText,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShufflePhase {
    Idle,
    Rolling,
    /// Link shuffles in progress; `remaining` is the visible countdown.
    Shuffling { remaining: u8 },
}

#[derive(Debug)]
pub struct LinkShuffler {
    links: Vec<LinkTarget>,
    /// Centre of each link as fractions of the view size.
    positions: Vec<(f64, f64)>,
    shuffle_count: u32,
    face: usize,
    aura: u8,
    phase: ShufflePhase,
    roll_started: Duration,
    roll_for: Duration,
    text: &'static str,
    text_visible: bool,
    pending: Timeline<Step>,
    rng: StdRng,
}

impl LinkShuffler {
    pub fn new(links: Vec<LinkTarget>, rng: StdRng) -> Self {
        let mut shuffler = Self {
            links,
            positions: vec![],
            shuffle_count: 0,
            face: 0,
            aura: AURA_SHADES[0],
            phase: ShufflePhase::Idle,
            roll_started: Duration::ZERO,
            roll_for: Duration::ZERO,
            text: "",
            text_visible: false,
            pending: Timeline::new(),
            rng,
        };
        shuffler.reshuffle();
        shuffler
    }

    pub fn links(&self) -> &[LinkTarget] {
        &self.links
    }

    pub fn positions(&self) -> &[(f64, f64)] {
        &self.positions
    }

    /// Number of times positions were regenerated.
    #[cfg(test)]
    pub fn shuffle_count(&self) -> u32 {
        self.shuffle_count
    }

    pub fn phase(&self) -> ShufflePhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase != ShufflePhase::Idle
    }

    pub fn face(&self) -> &'static str {
        DIE_FACES[self.face]
    }

    pub fn aura(&self) -> u8 {
        self.aura
    }

    /// Die face matching the countdown, empty when nothing is left.
    pub fn countdown_face(&self) -> &'static str {
        match self.phase {
            ShufflePhase::Shuffling { remaining } if remaining > 0 => {
                DIE_FACES[usize::from(remaining - 1).min(DIE_FACES.len() - 1)]
            }
            _ => "",
        }
    }

    /// Placeholder text shown after a shuffle, if currently visible.
    pub fn text(&self) -> Option<&'static str> {
        self.text_visible.then_some(self.text)
    }

    /// Scatter every link at a new random spot.
    pub fn reshuffle(&mut self) {
        let rng = &mut self.rng;
        self.positions = self
            .links
            .iter()
            .map(|_| {
                (
                    BOUND_START + rng.random::<f64>() * BOUND_SPAN,
                    BOUND_START + rng.random::<f64>() * BOUND_SPAN,
                )
            })
            .collect();
        self.shuffle_count += 1;
        tracing::debug!("links shuffled ({} so far)", self.shuffle_count);
    }

    /// Start a die roll; ignored while a roll or shuffle is running.
    pub fn roll(&mut self, now: Duration) -> bool {
        if self.is_busy() {
            return false;
        }
        self.text_visible = false;
        self.pending.cancel_all();
        self.phase = ShufflePhase::Rolling;
        self.roll_started = now;
        self.roll_for = Duration::from_millis(self.rng.random_range(1_000..3_000));
        tracing::debug!("die roll for {:?}", self.roll_for);
        self.die_frame(now);
        true
    }

    /// Target view of the link at `index`, unless the page is busy.
    pub fn activate(&self, index: usize) -> Option<View> {
        if self.is_busy() {
            return None;
        }
        self.links.get(index).map(|l| l.view)
    }

    pub fn tick(&mut self, now: Duration) {
        for step in self.pending.drain_due(now) {
            match step {
                Step::DieFrame => self.die_frame(now),
                Step::Shuffle { count } => self.shuffle_step(count, now),
                Step::HideText => self.text_visible = false,
            }
        }
    }

    fn die_frame(&mut self, now: Duration) {
        self.aura = AURA_SHADES[self.rng.random_range(0..AURA_SHADES.len())];
        self.face = self.rng.random_range(0..DIE_FACES.len());

        if now.saturating_sub(self.roll_started) < self.roll_for {
            self.pending.schedule(now + DIE_FRAME, Step::DieFrame);
            return;
        }

        self.face = self.rng.random_range(0..DIE_FACES.len());
        let count = self.face as u8 + 1;
        tracing::info!("die landed on {count}");
        self.phase = ShufflePhase::Shuffling { remaining: count };
        self.shuffle_step(count, now);
    }

    fn shuffle_step(&mut self, count: u8, now: Duration) {
        if count == 0 {
            self.phase = ShufflePhase::Idle;
            self.text = PLACEHOLDER_TEXTS
                .choose(&mut self.rng)
                .copied()
                .unwrap_or_default();
            self.text_visible = true;
            self.pending.schedule(now + TEXT_VISIBLE_FOR, Step::HideText);
            return;
        }
        self.reshuffle();
        self.phase = ShufflePhase::Shuffling {
            remaining: count - 1,
        };
        self.pending
            .schedule(now + SHUFFLE_GAP, Step::Shuffle { count: count - 1 });
    }
}
