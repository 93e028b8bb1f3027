//! Deadline queue driven by the frame clock.
//!
//! Every delayed effect in the app (word reveals, die rolls, wheel idle) is an
//! entry in a `Timeline`. Dropping a whole run is a single `cancel_all` call.

use std::time::Duration;

/// Ordered set of pending `(deadline, event)` entries.
#[derive(Clone, Debug)]
pub struct Timeline<E> {
    entries: Vec<(Duration, E)>,
}

impl<E> Timeline<E> {
    /// Create an empty timeline.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Schedule `event` to fire once the clock reaches `at`.
    ///
    /// Entries with equal deadlines fire in insertion order.
    pub fn schedule(&mut self, at: Duration, event: E) {
        let idx = self.entries.partition_point(|(t, _)| *t <= at);
        self.entries.insert(idx, (at, event));
    }

    /// Remove and return every entry whose deadline is `<= now`, in order.
    pub fn drain_due(&mut self, now: Duration) -> Vec<E> {
        let due = self.entries.partition_point(|(t, _)| *t <= now);
        self.entries.drain(..due).map(|(_, e)| e).collect()
    }

    /// Drop every pending entry.
    pub fn cancel_all(&mut self) {
        if !self.is_empty() {
            tracing::debug!("timeline cancelled with {} pending", self.len());
        }
        self.entries.clear();
    }

    /// Deadline of the earliest pending entry.
    #[cfg(test)]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.entries.first().map(|(t, _)| *t)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E> Default for Timeline<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn drains_in_deadline_order() {
        let mut tl = Timeline::new();
        tl.schedule(ms(300), "c");
        tl.schedule(ms(100), "a");
        tl.schedule(ms(200), "b");

        assert_eq!(tl.drain_due(ms(150)), vec!["a"]);
        assert_eq!(tl.drain_due(ms(300)), vec!["b", "c"]);
        assert!(tl.is_empty());
    }

    #[test]
    fn equal_deadlines_keep_insertion_order() {
        let mut tl = Timeline::new();
        tl.schedule(ms(50), 1);
        tl.schedule(ms(50), 2);
        tl.schedule(ms(10), 0);
        tl.schedule(ms(50), 3);

        assert_eq!(tl.drain_due(ms(50)), vec![0, 1, 2, 3]);
    }

    #[test]
    fn cancel_all_is_idempotent() {
        let mut tl = Timeline::new();
        tl.schedule(ms(10), ());
        tl.schedule(ms(20), ());
        tl.cancel_all();
        tl.cancel_all();

        assert!(tl.is_empty());
        assert!(tl.drain_due(ms(1_000)).is_empty());
        assert_eq!(tl.next_deadline(), None);
    }

    #[test]
    fn next_deadline_tracks_earliest_entry() {
        let mut tl = Timeline::new();
        tl.schedule(ms(40), 'x');
        tl.schedule(ms(20), 'y');
        assert_eq!(tl.next_deadline(), Some(ms(20)));
        assert_eq!(tl.len(), 2);
    }
}
