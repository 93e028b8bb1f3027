//! Scrollable selection dial.
//!
//! The dial keeps a continuous scroll offset (0 at the first item, negative
//! further down). Drag, wheel and keyboard input move a raw target; a spring
//! smooths the visible offset toward it, and the selected index is always
//! derived from the visible offset.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::spring::{Spring, SpringParams};

/// A single dial entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DialItem {
    pub label: String,
    #[serde(default)]
    pub disabled: bool,
    /// Label colour as `#rrggbb` or a named colour.
    #[serde(default)]
    pub color: Option<String>,
    /// Text shown in the content pane while selected.
    #[serde(default)]
    pub content: Option<String>,
}

impl DialItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

/// Tuning constants of the dial.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialSettings {
    /// Height of one item in scroll units.
    pub item_height: f64,
    pub drag_sensitivity: f64,
    /// Scale applied to drag movement past the first/last item.
    pub overscroll_resistance: f64,
    pub wheel_factor: f64,
    /// Quiet period after the last wheel event before snapping.
    pub wheel_idle_ms: u64,
    pub spring: SpringParams,
    pub rest_epsilon: f64,
    pub default_index: usize,
}

impl Default for DialSettings {
    fn default() -> Self {
        Self {
            item_height: 60.0,
            drag_sensitivity: 0.5,
            overscroll_resistance: 0.2,
            wheel_factor: 0.5,
            wheel_idle_ms: 150,
            spring: SpringParams::default(),
            rest_epsilon: 0.01,
            default_index: 0,
        }
    }
}

/// Which input currently owns the offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialPhase {
    Idle,
    Dragging,
    /// Wheel input; snaps once the clock passes `snap_at`.
    Wheeling { snap_at: Duration },
    Settling,
}

/// Keyboard direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    fn step(self) -> isize {
        match self {
            Direction::Up => -1,
            Direction::Down => 1,
        }
    }
}

/// Emitted when a settle ends on a new, enabled item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selected {
    pub index: usize,
}

/// Presentation of one item relative to the selection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ItemLook {
    /// 0 = sharp ..= 3 = most blurred.
    pub blur: u8,
    pub opacity: f64,
    /// Draw in the neutral disabled colour.
    pub muted: bool,
}

/// Blur/opacity band for an item `distance` rows away from the selection.
pub fn item_look(distance: usize, disabled: bool) -> ItemLook {
    if disabled {
        return ItemLook {
            blur: 2,
            opacity: 0.5,
            muted: true,
        };
    }
    let (blur, opacity) = match distance {
        0 => (0, 1.0),
        1 => (1, 0.9),
        2 => (2, 0.8),
        _ => (3, 0.7),
    };
    ItemLook {
        blur,
        opacity,
        muted: false,
    }
}

/// Round half toward positive infinity.
fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

#[derive(Debug)]
pub struct Dial {
    items: Vec<DialItem>,
    settings: DialSettings,
    /// Raw scroll position written by input.
    target: f64,
    /// Smoothed visible offset.
    spring: Spring,
    selected: usize,
    phase: DialPhase,
    focused: bool,
    /// Index the last settle ended on, disabled items included.
    last_settled: Option<usize>,
    clock: Duration,
}

impl Dial {
    pub fn new(items: Vec<DialItem>, mut settings: DialSettings) -> Self {
        // Every offset clamp needs a positive item height.
        if !(settings.item_height.is_finite() && settings.item_height > 0.0) {
            tracing::warn!(
                "invalid dial item_height {}, using default",
                settings.item_height
            );
            settings.item_height = DialSettings::default().item_height;
        }
        let start = if items.is_empty() {
            0
        } else {
            settings.default_index.min(items.len() - 1)
        };
        let offset = -(start as f64) * settings.item_height;
        let spring = Spring::new(offset, settings.spring, settings.rest_epsilon);
        Self {
            items,
            settings,
            target: offset,
            spring,
            selected: start,
            phase: DialPhase::Idle,
            focused: false,
            last_settled: None,
            clock: Duration::ZERO,
        }
    }

    pub fn items(&self) -> &[DialItem] {
        &self.items
    }

    pub fn settings(&self) -> &DialSettings {
        &self.settings
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_item(&self) -> Option<&DialItem> {
        self.items.get(self.selected)
    }

    /// Visible (smoothed) offset.
    pub fn offset(&self) -> f64 {
        self.spring.value()
    }

    /// Raw offset the spring is pulled toward.
    #[cfg(test)]
    pub fn target(&self) -> f64 {
        self.target
    }

    #[cfg(test)]
    pub fn phase(&self) -> DialPhase {
        self.phase
    }

    pub fn is_dragging(&self) -> bool {
        self.phase == DialPhase::Dragging
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// Lowest allowed offset (last item centred).
    pub fn min_offset(&self) -> f64 {
        match self.items.len() {
            0 => 0.0,
            n => -((n - 1) as f64) * self.settings.item_height,
        }
    }

    /// Offset at which `index` is centred.
    pub fn offset_for(&self, index: usize) -> f64 {
        -(index as f64) * self.settings.item_height
    }

    /// Item drawn `items_from_centre` item heights below the centre line.
    pub fn item_at(&self, items_from_centre: f64) -> Option<usize> {
        let raw = round_half_up(items_from_centre - self.offset() / self.settings.item_height);
        if raw < 0.0 || raw >= self.items.len() as f64 {
            return None;
        }
        Some(raw as usize)
    }

    /// Index centred at `offset`, clamped to the item range.
    pub fn index_at(&self, offset: f64) -> usize {
        if self.items.is_empty() {
            return 0;
        }
        let raw = round_half_up(-offset / self.settings.item_height);
        raw.clamp(0.0, (self.items.len() - 1) as f64) as usize
    }

    pub fn start_drag(&mut self) {
        self.phase = DialPhase::Dragging;
    }

    /// Move by a pointer delta; past either end the movement is damped.
    pub fn drag(&mut self, delta_y: f64) {
        if self.phase != DialPhase::Dragging {
            return;
        }
        let next = self.target + delta_y * self.settings.drag_sensitivity;
        let (min, max) = (self.min_offset(), 0.0);
        let k = self.settings.overscroll_resistance;
        self.target = if next > max {
            max + (next - max) * k
        } else if next < min {
            min + (next - min) * k
        } else {
            next
        };
        self.spring.set_target(self.target);
    }

    pub fn end_drag(&mut self) {
        if self.phase == DialPhase::Dragging {
            self.snap_to_nearest();
        }
    }

    /// Scroll by a wheel delta; clamps hard at both ends.
    pub fn wheel(&mut self, delta_y: f64) {
        if self.phase == DialPhase::Dragging {
            return;
        }
        self.target = (self.target + delta_y * self.settings.wheel_factor)
            .clamp(self.min_offset(), 0.0);
        self.spring.set_target(self.target);
        self.phase = DialPhase::Wheeling {
            snap_at: self.clock + Duration::from_millis(self.settings.wheel_idle_ms),
        };
    }

    /// Step to the adjacent enabled item. Ignored unless focused.
    ///
    /// Returns the index being settled to, if any.
    pub fn key_nav(&mut self, direction: Direction) -> Option<usize> {
        if !self.focused || self.phase == DialPhase::Dragging {
            return None;
        }
        let step = direction.step();
        let mut idx = self.selected as isize + step;
        while idx >= 0 && (idx as usize) < self.items.len() {
            if !self.items[idx as usize].disabled {
                let idx = idx as usize;
                self.settle_to(idx);
                return Some(idx);
            }
            idx += step;
        }
        None
    }

    /// Settle onto `index`; out-of-range indices are rejected.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.items.len() || self.phase == DialPhase::Dragging {
            return false;
        }
        self.settle_to(index);
        true
    }

    /// Advance the clock and the spring by `dt`.
    pub fn tick(&mut self, dt: Duration) -> Option<Selected> {
        self.clock += dt;
        if let DialPhase::Wheeling { snap_at } = self.phase
            && self.clock >= snap_at
        {
            self.snap_to_nearest();
        }

        let at_rest = self.spring.step(dt);
        self.selected = self.index_at(self.spring.value());

        if self.phase == DialPhase::Settling && at_rest {
            self.phase = DialPhase::Idle;
            return self.notify();
        }
        None
    }

    fn snap_to_nearest(&mut self) {
        let h = self.settings.item_height;
        let snapped = (round_half_up(self.target / h) * h).clamp(self.min_offset(), 0.0);
        self.begin_settle(snapped);
    }

    fn settle_to(&mut self, index: usize) {
        self.begin_settle(self.offset_for(index));
    }

    fn begin_settle(&mut self, offset: f64) {
        self.target = offset;
        self.spring.set_target(offset);
        self.phase = DialPhase::Settling;
    }

    /// Report a settle that ended on a different, enabled item.
    fn notify(&mut self) -> Option<Selected> {
        let index = self.selected;
        let changed = self.last_settled != Some(index);
        self.last_settled = Some(index);
        let item = self.items.get(index)?;
        if item.disabled || !changed {
            return None;
        }
        tracing::debug!("dial settled on {index}: {}", item.label);
        Some(Selected { index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FRAME: Duration = Duration::from_millis(16);

    fn items(n: usize) -> Vec<DialItem> {
        (0..n).map(|i| DialItem::new(format!("item {i}"))).collect()
    }

    fn dial(items: Vec<DialItem>) -> Dial {
        Dial::new(items, DialSettings::default())
    }

    /// Tick until the dial is idle, collecting selection events.
    fn run_until_idle(d: &mut Dial) -> Vec<usize> {
        let mut events = vec![];
        for _ in 0..2_000 {
            if let Some(sel) = d.tick(FRAME) {
                events.push(sel.index);
            }
            if d.phase() == DialPhase::Idle {
                break;
            }
        }
        events
    }

    #[test]
    fn drag_applies_sensitivity_and_snaps_on_release() {
        let mut d = dial(items(5));
        d.start_drag();
        d.drag(-200.0);
        assert_eq!(d.target(), -100.0);

        d.end_drag();
        assert_eq!(d.target(), -120.0);
        let events = run_until_idle(&mut d);
        assert_eq!(d.offset(), -120.0);
        assert_eq!(d.selected_index(), 2);
        assert_eq!(events, vec![2]);
    }

    #[test]
    fn drag_past_top_is_damped() {
        let mut d = dial(items(5));
        d.start_drag();
        d.drag(100.0);
        assert!((d.target() - 10.0).abs() < 1e-9);

        d.end_drag();
        run_until_idle(&mut d);
        assert_eq!(d.offset(), 0.0);
        assert_eq!(d.selected_index(), 0);
    }

    #[test]
    fn drag_past_bottom_is_damped_then_clamped() {
        let mut d = dial(items(3));
        d.start_drag();
        d.drag(-400.0);
        // -200 raw, 80 past the -120 floor
        assert!((d.target() - (-136.0)).abs() < 1e-9);
        d.end_drag();
        assert_eq!(d.target(), -120.0);
    }

    #[test]
    fn no_selection_event_while_dragging() {
        let mut d = dial(items(5));
        d.start_drag();
        d.drag(-240.0);
        for _ in 0..200 {
            assert_eq!(d.tick(FRAME), None);
        }
        assert_eq!(d.selected_index(), 2);
    }

    #[test]
    fn wheel_clamps_and_snaps_after_idle() {
        let mut d = dial(items(4));
        d.wheel(-1_000.0);
        assert_eq!(d.target(), -180.0);
        d.wheel(-50.0);
        assert_eq!(d.target(), -180.0);
        d.wheel(1_000.0);
        assert_eq!(d.target(), 0.0);

        let mut d = dial(items(4));
        d.wheel(-100.0);
        assert_eq!(d.target(), -50.0);
        // still inside the idle window
        d.tick(Duration::from_millis(100));
        assert!(matches!(d.phase(), DialPhase::Wheeling { .. }));
        d.tick(Duration::from_millis(60));
        assert_eq!(d.phase(), DialPhase::Settling);
        assert_eq!(d.target(), -60.0);

        let events = run_until_idle(&mut d);
        assert_eq!(events, vec![1]);
        assert_eq!(d.offset(), -60.0);
    }

    #[test]
    fn wheel_input_restarts_idle_window() {
        let mut d = dial(items(4));
        d.wheel(-40.0);
        d.tick(Duration::from_millis(100));
        d.wheel(-40.0);
        d.tick(Duration::from_millis(100));
        assert!(matches!(d.phase(), DialPhase::Wheeling { .. }));
        d.tick(Duration::from_millis(60));
        assert_eq!(d.phase(), DialPhase::Settling);
    }

    #[test]
    fn keyboard_skips_disabled_items() {
        let list = vec![
            DialItem::new("a"),
            DialItem::new("b").disabled(),
            DialItem::new("c"),
        ];
        let mut d = dial(list);
        d.set_focused(true);
        assert_eq!(d.key_nav(Direction::Down), Some(2));
        let events = run_until_idle(&mut d);
        assert_eq!(events, vec![2]);
        assert_eq!(d.offset(), -120.0);
    }

    #[test]
    fn keyboard_requires_focus() {
        let mut d = dial(items(3));
        assert_eq!(d.key_nav(Direction::Down), None);
        assert_eq!(d.phase(), DialPhase::Idle);
    }

    #[test]
    fn keyboard_stops_at_bounds_and_trailing_disabled() {
        let list = vec![DialItem::new("a"), DialItem::new("b").disabled()];
        let mut d = dial(list);
        d.set_focused(true);
        assert_eq!(d.key_nav(Direction::Up), None);
        assert_eq!(d.key_nav(Direction::Down), None);
        assert_eq!(d.selected_index(), 0);
    }

    #[test]
    fn all_disabled_never_notifies() {
        let list = vec![
            DialItem::new("a").disabled(),
            DialItem::new("b").disabled(),
            DialItem::new("c").disabled(),
        ];
        let mut d = dial(list);
        d.set_focused(true);
        assert_eq!(d.key_nav(Direction::Down), None);

        let mut events = vec![];
        d.start_drag();
        d.drag(-130.0);
        d.end_drag();
        events.extend(run_until_idle(&mut d));
        d.wheel(-300.0);
        events.extend(run_until_idle(&mut d));
        assert!(d.select(2));
        events.extend(run_until_idle(&mut d));

        assert!(events.is_empty());
    }

    #[test]
    fn repeated_settle_on_same_index_notifies_once() {
        let mut d = dial(items(3));
        assert!(d.select(1));
        assert_eq!(run_until_idle(&mut d), vec![1]);

        d.start_drag();
        d.drag(10.0);
        d.end_drag();
        assert_eq!(run_until_idle(&mut d), Vec::<usize>::new());
        assert_eq!(d.selected_index(), 1);
    }

    #[test]
    fn return_from_disabled_item_notifies_again() {
        let list = vec![
            DialItem::new("a"),
            DialItem::new("b"),
            DialItem::new("c").disabled(),
        ];
        let mut d = dial(list);
        assert!(d.select(1));
        assert_eq!(run_until_idle(&mut d), vec![1]);
        assert!(d.select(2));
        assert_eq!(run_until_idle(&mut d), Vec::<usize>::new());
        assert!(d.select(1));
        assert_eq!(run_until_idle(&mut d), vec![1]);
        assert_eq!(d.selected_index(), 1);
    }

    #[test]
    fn drag_onto_disabled_then_key_back_notifies() {
        let list = vec![DialItem::new("a"), DialItem::new("b").disabled()];
        let mut d = dial(list);
        d.set_focused(true);
        assert!(d.select(0));
        assert_eq!(run_until_idle(&mut d), vec![0]);

        d.start_drag();
        d.drag(-120.0);
        d.end_drag();
        assert_eq!(run_until_idle(&mut d), Vec::<usize>::new());
        assert_eq!(d.selected_index(), 1);

        assert_eq!(d.key_nav(Direction::Up), Some(0));
        assert_eq!(run_until_idle(&mut d), vec![0]);
    }

    #[test]
    fn bad_item_height_falls_back_to_default() {
        for h in [-30.0, 0.0, f64::NAN, f64::INFINITY] {
            let settings = DialSettings {
                item_height: h,
                ..DialSettings::default()
            };
            let mut d = Dial::new(items(3), settings);
            assert_eq!(d.settings().item_height, 60.0);
            d.wheel(-500.0);
            d.start_drag();
            d.drag(-500.0);
            d.end_drag();
            run_until_idle(&mut d);
            assert_eq!(d.selected_index(), 2);
        }
    }

    #[test]
    fn item_at_maps_rows_to_items() {
        let mut d = dial(items(4));
        assert_eq!(d.item_at(0.0), Some(0));
        assert_eq!(d.item_at(1.2), Some(1));
        assert_eq!(d.item_at(-1.0), None);
        assert_eq!(d.item_at(4.0), None);

        assert!(d.select(2));
        run_until_idle(&mut d);
        assert_eq!(d.item_at(0.0), Some(2));
        assert_eq!(d.item_at(-2.0), Some(0));
    }

    #[test]
    fn select_rejects_out_of_range() {
        let mut d = dial(items(3));
        assert!(!d.select(3));
        assert_eq!(d.phase(), DialPhase::Idle);
    }

    #[test]
    fn empty_dial_is_inert() {
        let mut d = dial(vec![]);
        assert_eq!(d.selected_index(), 0);
        assert!(d.selected_item().is_none());
        d.start_drag();
        d.drag(-500.0);
        d.end_drag();
        assert!(run_until_idle(&mut d).is_empty());
        assert_eq!(d.offset(), 0.0);
        assert!(!d.select(0));
    }

    #[test]
    fn default_index_sets_initial_offset() {
        let settings = DialSettings {
            default_index: 2,
            ..DialSettings::default()
        };
        let d = Dial::new(items(4), settings);
        assert_eq!(d.selected_index(), 2);
        assert_eq!(d.offset(), -120.0);
    }

    #[test]
    fn looks_step_down_with_distance() {
        assert_eq!(item_look(0, false).opacity, 1.0);
        assert_eq!(item_look(0, false).blur, 0);
        assert_eq!(item_look(1, false).opacity, 0.9);
        assert_eq!(item_look(2, false).opacity, 0.8);
        assert_eq!(item_look(3, false).blur, 3);
        assert_eq!(item_look(17, false).opacity, 0.7);

        let off = item_look(0, true);
        assert!(off.muted);
        assert_eq!(off.opacity, 0.5);
    }

    #[derive(Clone, Debug)]
    enum Input {
        Start,
        Drag(f64),
        End,
        Wheel(f64),
        Tick(u64),
    }

    fn arb_input() -> impl Strategy<Value = Input> {
        prop_oneof![
            Just(Input::Start),
            (-400.0f64..400.0).prop_map(Input::Drag),
            Just(Input::End),
            (-300.0f64..300.0).prop_map(Input::Wheel),
            (1u64..200).prop_map(Input::Tick),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn index_stays_in_range_and_settles_exactly(
            n in 1usize..8,
            inputs in prop::collection::vec(arb_input(), 1..60),
        ) {
            let mut d = dial(items(n));
            for input in inputs {
                match input {
                    Input::Start => d.start_drag(),
                    Input::Drag(dy) => d.drag(dy),
                    Input::End => d.end_drag(),
                    Input::Wheel(dy) => d.wheel(dy),
                    Input::Tick(ms) => { d.tick(Duration::from_millis(ms)); }
                }
                prop_assert!(d.selected_index() < n);
            }

            d.end_drag();
            d.tick(Duration::from_millis(200));
            run_until_idle(&mut d);
            prop_assert_eq!(d.phase(), DialPhase::Idle);
            prop_assert_eq!(d.offset(), d.offset_for(d.selected_index()));
        }
    }
}
