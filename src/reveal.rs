//! Word-by-word text reveal.
//!
//! Each line's words rise in one after another, stay on screen for a while and
//! fade out. The whole run is one [`Timeline`], so skipping cancels every
//! pending transition at once.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::timeline::Timeline;

/// Timing parameters of a reveal run, in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealTimings {
    /// Delay before the first word of a line appears.
    pub word_delay: f64,
    /// Extra delay per word position within a line.
    pub stagger: f64,
    /// Rise-in time of a single word.
    pub move_duration: f64,
    /// How long a word stays fully visible before fading.
    pub display_duration: f64,
    /// Fade-out time of a single word.
    pub fade_out_duration: f64,
    /// Offset between the start of consecutive lines.
    pub inter_line_delay: f64,
}

impl Default for RevealTimings {
    fn default() -> Self {
        Self {
            word_delay: 1.2,
            stagger: 0.4,
            move_duration: 1.5,
            display_duration: 10.0,
            fade_out_duration: 4.0,
            inter_line_delay: 5.0,
        }
    }
}

/// Seconds to a millisecond-exact duration; negatives clamp to zero.
fn secs(v: f64) -> Duration {
    Duration::from_millis((v.max(0.0) * 1000.0).round() as u64)
}

/// One line of text split into words.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    /// Number of leading whitespace characters.
    pub indent: usize,
    /// Non-empty words in order.
    pub words: Vec<String>,
}

impl Line {
    /// Split raw text into indentation and words.
    pub fn parse(raw: &str) -> Self {
        let indent = raw.chars().take_while(|c| c.is_whitespace()).count();
        let words = raw.split_whitespace().map(str::to_owned).collect();
        Self { indent, words }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Visibility of one word.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WordState {
    pub visible: bool,
    pub fading: bool,
}

/// Position of a word: line index and index among that line's words.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WordKey {
    pub line: usize,
    pub word: usize,
}

/// Times at which one word changes state, relative to run start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WordTiming {
    pub appear: Duration,
    pub fade: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Appear(WordKey),
    Fade(WordKey),
    Complete,
}

/// Lifecycle of a reveal run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealPhase {
    Idle,
    Running,
    Completed,
    Skipped,
}

/// Notifications produced by the sequencer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealSignal {
    /// The last word finished fading.
    Completed,
    /// The run was aborted.
    Skipped,
}

/// How a word should be drawn at a given instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WordLook {
    /// 0.0 (invisible) ..= 1.0 (fully drawn).
    pub opacity: f64,
    /// Fraction of the rise-in travel still ahead, 1.0 = fully below.
    pub rise: f64,
}

impl WordLook {
    const HIDDEN: Self = Self {
        opacity: 0.0,
        rise: 1.0,
    };
}

/// Drives the reveal of a fixed set of lines.
#[derive(Debug)]
pub struct RevealSequencer {
    lines: Vec<Line>,
    timings: RevealTimings,
    states: Vec<Vec<WordState>>,
    pending: Timeline<Step>,
    phase: RevealPhase,
    started_at: Duration,
}

impl RevealSequencer {
    pub fn new<S: AsRef<str>>(lines: &[S], timings: RevealTimings) -> Self {
        let lines: Vec<Line> = lines.iter().map(|l| Line::parse(l.as_ref())).collect();
        let states = lines
            .iter()
            .map(|l| vec![WordState::default(); l.words.len()])
            .collect();
        Self {
            lines,
            timings,
            states,
            pending: Timeline::new(),
            phase: RevealPhase::Idle,
            started_at: Duration::ZERO,
        }
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    /// Number of transitions still scheduled.
    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Schedule the whole run starting at `now`.
    ///
    /// Only an idle sequencer starts; any later call returns `false` and
    /// schedules nothing.
    pub fn start(&mut self, now: Duration) -> bool {
        if self.phase != RevealPhase::Idle {
            return false;
        }
        self.phase = RevealPhase::Running;
        self.started_at = now;

        let last = self.last_word();
        for (line, words) in self.lines.iter().enumerate() {
            for word in 0..words.words.len() {
                let key = WordKey { line, word };
                let Some(timing) = self.word_timing(key) else {
                    continue;
                };
                self.pending.schedule(now + timing.appear, Step::Appear(key));
                self.pending.schedule(now + timing.fade, Step::Fade(key));
            }
        }

        match last.and_then(|key| self.word_timing(key)) {
            Some(timing) => {
                let done = timing.fade + secs(self.timings.fade_out_duration);
                self.pending.schedule(now + done, Step::Complete);
            }
            // nothing to show: finish on the first tick
            None => self.pending.schedule(now, Step::Complete),
        }

        tracing::info!(
            "reveal started: {} lines, {} transitions",
            self.lines.len(),
            self.pending.len()
        );
        true
    }

    /// Apply every transition due at `now`.
    pub fn tick(&mut self, now: Duration) -> Option<RevealSignal> {
        if self.phase != RevealPhase::Running {
            return None;
        }
        let mut signal = None;
        for step in self.pending.drain_due(now) {
            match step {
                Step::Appear(key) => self.set_state(key, true, false),
                Step::Fade(key) => self.set_state(key, true, true),
                Step::Complete => {
                    self.phase = RevealPhase::Completed;
                    signal = Some(RevealSignal::Completed);
                    tracing::info!("reveal completed");
                }
            }
        }
        signal
    }

    /// Abort the run and drop every pending transition.
    ///
    /// Reports `Skipped` only the first time, and never after completion.
    pub fn skip(&mut self) -> Option<RevealSignal> {
        match self.phase {
            RevealPhase::Idle | RevealPhase::Running => {
                self.pending.cancel_all();
                self.phase = RevealPhase::Skipped;
                tracing::info!("reveal skipped");
                Some(RevealSignal::Skipped)
            }
            RevealPhase::Completed | RevealPhase::Skipped => None,
        }
    }

    pub fn word_state(&self, key: WordKey) -> WordState {
        self.states
            .get(key.line)
            .and_then(|l| l.get(key.word))
            .copied()
            .unwrap_or_default()
    }

    /// Scheduled appear/fade times of a word, relative to run start.
    pub fn word_timing(&self, key: WordKey) -> Option<WordTiming> {
        let line = self.lines.get(key.line)?;
        if key.word >= line.words.len() {
            return None;
        }
        let t = &self.timings;
        let base = secs(t.inter_line_delay) * key.line as u32;
        let appear = base + secs(t.word_delay) + secs(t.stagger) * key.word as u32;
        let fade = appear + secs(t.display_duration);
        Some(WordTiming { appear, fade })
    }

    /// Last word of the last line that has any words.
    pub fn last_word(&self) -> Option<WordKey> {
        self.lines
            .iter()
            .enumerate()
            .rev()
            .find(|(_, l)| !l.is_empty())
            .map(|(line, l)| WordKey {
                line,
                word: l.words.len() - 1,
            })
    }

    /// Opacity and rise offset of a word at `now`.
    pub fn look(&self, key: WordKey, now: Duration) -> WordLook {
        let state = self.word_state(key);
        let Some(timing) = self.word_timing(key) else {
            return WordLook::HIDDEN;
        };
        if !state.visible || self.phase == RevealPhase::Skipped {
            return WordLook::HIDDEN;
        }

        let t = &self.timings;
        let local = now.saturating_sub(self.started_at);
        let rise_in = progress(local.saturating_sub(timing.appear), secs(t.move_duration));
        let rise = 1.0 - ease_in_out(rise_in);
        if state.fading {
            let out = progress(local.saturating_sub(timing.fade), secs(t.fade_out_duration));
            WordLook {
                opacity: 1.0 - ease_in_out(out),
                rise,
            }
        } else {
            WordLook {
                opacity: ease_in_out(rise_in),
                rise,
            }
        }
    }

    fn set_state(&mut self, key: WordKey, visible: bool, fading: bool) {
        if let Some(state) = self
            .states
            .get_mut(key.line)
            .and_then(|l| l.get_mut(key.word))
        {
            *state = WordState { visible, fading };
        }
    }
}

fn progress(elapsed: Duration, total: Duration) -> f64 {
    if total.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
}

/// Cubic S-curve on 0..=1.
fn ease_in_out(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let inv = -2.0 * t + 2.0;
        1.0 - inv * inv * inv / 2.0
    }
}
