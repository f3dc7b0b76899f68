//! Queue store: ordered tracks plus a cursor.
//!
//! Invariant: whenever the queue is non-empty, `cursor` references a valid
//! in-bounds track. Shuffling permutes the items in place; the original
//! order stays recoverable through each track's stable `position` key.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

use rand::seq::SliceRandom;
use rand::thread_rng;
use tonearm_core::{QueueDiscipline, Requester, Track};

/// The playback queue.
#[derive(Debug, Clone, Default)]
pub struct Queue {
    items: Vec<Track>,
    cursor: usize,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    /// All queued tracks, in playback order.
    pub fn items(&self) -> &[Track] {
        &self.items
    }

    pub const fn len(&self) -> usize {
        self.items.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// The track at the cursor.
    pub fn current(&self) -> Option<&Track> {
        self.items.get(self.cursor)
    }

    /// The track before the cursor, when one is retained.
    pub fn previous(&self) -> Option<&Track> {
        self.cursor.checked_sub(1).and_then(|i| self.items.get(i))
    }

    /// Append a resolved track, assigning its stable queue position.
    /// Returns the new queue length.
    pub fn append(&mut self, mut track: Track, requester: Requester) -> usize {
        track.requester = requester;
        track.position = self.items.len();
        self.items.push(track);
        self.items.len()
    }

    /// Randomly permute the queue in place. The cursor index is untouched
    /// and stays in bounds.
    pub fn shuffle(&mut self) {
        self.items.shuffle(&mut thread_rng());
    }

    /// Restore ascending enqueue order.
    pub fn unshuffle(&mut self) {
        self.items.sort_by_key(|t| t.position);
    }

    /// Advance past a finished track under `discipline`. Returns the track
    /// whose cached artifact should be evicted, or `None` on an empty queue.
    ///
    /// Under the default discipline the just-finished track is kept at the
    /// front the first time (so `play_previous` works); afterwards the front
    /// is removed as the cursor moves on. Forward-only always discards the
    /// consumed head.
    pub fn advance(&mut self, discipline: QueueDiscipline) -> Option<Track> {
        if self.items.is_empty() {
            return None;
        }
        match discipline {
            QueueDiscipline::Default => {
                if self.cursor == 0 {
                    self.cursor = 1;
                    self.items.first().cloned()
                } else {
                    Some(self.items.remove(0))
                }
            }
            QueueDiscipline::ForwardOnly => {
                self.cursor = 0;
                Some(self.items.remove(0))
            }
        }
    }

    /// Advance the cursor circularly, wrapping past the end.
    pub fn advance_circular(&mut self) {
        if self.items.is_empty() {
            return;
        }
        if self.cursor >= self.items.len() - 1 {
            self.cursor = 0;
        } else {
            self.cursor += 1;
        }
    }

    /// Reposition to `position` (1-based). Tracks ahead of the target are
    /// discarded from the front, or rotated to the tail when `rotate` is
    /// set (loop-queue). Returns the discarded tracks, or `None` when the
    /// position is out of range and the queue is untouched.
    pub fn skip_to(&mut self, position: usize, rotate: bool) -> Option<Vec<Track>> {
        if position == 0 || position > self.items.len() {
            return None;
        }
        let mut discarded = Vec::new();
        for _ in 0..position - 1 {
            let track = self.items.remove(0);
            if rotate {
                self.items.push(track);
            } else {
                discarded.push(track);
            }
        }
        self.cursor = 0;
        Some(discarded)
    }

    /// Step the cursor back one track. Returns false (and does nothing)
    /// when there is no history to step into; the cursor never wraps.
    pub fn step_back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    /// Remove the track at `index`, fixing up the cursor.
    pub fn remove_at(&mut self, index: usize) -> Option<Track> {
        if index >= self.items.len() {
            return None;
        }
        let track = self.items.remove(index);
        if index < self.cursor {
            self.cursor -= 1;
        } else if self.cursor >= self.items.len() && !self.items.is_empty() {
            self.cursor = self.items.len() - 1;
        }
        Some(track)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.cursor = 0;
    }

    /// Positional slice for page/limit-bounded rendering.
    pub fn page(&self, page: usize, limit: usize) -> &[Track] {
        let page = page.max(1);
        let start = (page - 1).saturating_mul(limit).min(self.items.len());
        let end = page.saturating_mul(limit).min(self.items.len());
        &self.items[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tonearm_core::SourceKind;

    fn make_track(id: &str) -> Track {
        Track::new(id, format!("Track {id}"), SourceKind::Url)
    }

    fn filled(n: usize) -> Queue {
        let mut queue = Queue::new();
        for i in 0..n {
            queue.append(make_track(&i.to_string()), Requester::default());
        }
        queue
    }

    #[test]
    fn test_append_assigns_positions() {
        let queue = filled(3);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.items()[0].position, 0);
        assert_eq!(queue.items()[2].position, 2);
        assert_eq!(queue.current().unwrap().id, "0");
    }

    #[test]
    fn test_advance_default_keeps_one_track_of_history() {
        let mut queue = filled(3);
        // First advance keeps the finished head for play_previous.
        let evicted = queue.advance(QueueDiscipline::Default).unwrap();
        assert_eq!(evicted.id, "0");
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.cursor(), 1);
        assert_eq!(queue.current().unwrap().id, "1");
        assert_eq!(queue.previous().unwrap().id, "0");

        // Later advances discard the front.
        let evicted = queue.advance(QueueDiscipline::Default).unwrap();
        assert_eq!(evicted.id, "0");
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.current().unwrap().id, "2");
    }

    #[test]
    fn test_advance_forward_only_discards_head() {
        let mut queue = filled(3);
        let evicted = queue.advance(QueueDiscipline::ForwardOnly).unwrap();
        assert_eq!(evicted.id, "0");
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.cursor(), 0);
        assert_eq!(queue.current().unwrap().id, "1");
    }

    #[test]
    fn test_advance_circular_wraps() {
        let mut queue = filled(3);
        queue.advance_circular();
        queue.advance_circular();
        assert_eq!(queue.cursor(), 2);
        queue.advance_circular();
        assert_eq!(queue.cursor(), 0);
    }

    #[test]
    fn test_skip_to_discards_leading_tracks() {
        let mut queue = filled(4);
        let discarded = queue.skip_to(3, false).unwrap();
        assert_eq!(discarded.len(), 2);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.current().unwrap().id, "2");
    }

    #[test]
    fn test_skip_to_rotates_under_loop_queue() {
        let mut queue = filled(4);
        let discarded = queue.skip_to(3, true).unwrap();
        assert!(discarded.is_empty());
        assert_eq!(queue.len(), 4);
        assert_eq!(queue.current().unwrap().id, "2");
        assert_eq!(queue.items()[3].id, "1");
    }

    #[test]
    fn test_skip_to_past_end_is_noop() {
        let mut queue = filled(2);
        assert!(queue.skip_to(3, false).is_none());
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.cursor(), 0);
    }

    #[test]
    fn test_step_back_does_not_wrap() {
        let mut queue = filled(2);
        assert!(!queue.step_back());
        queue.advance(QueueDiscipline::Default);
        assert!(queue.step_back());
        assert_eq!(queue.cursor(), 0);
    }

    #[test]
    fn test_remove_at_fixes_cursor() {
        let mut queue = filled(3);
        queue.advance(QueueDiscipline::Default);
        assert_eq!(queue.cursor(), 1);

        queue.remove_at(0);
        assert_eq!(queue.cursor(), 0);
        assert_eq!(queue.current().unwrap().id, "1");

        queue.remove_at(1);
        queue.remove_at(0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_page_slicing() {
        let queue = filled(5);
        assert_eq!(queue.page(1, 2).len(), 2);
        assert_eq!(queue.page(3, 2).len(), 1);
        assert_eq!(queue.page(4, 2).len(), 0);
        assert_eq!(queue.page(1, 2)[1].id, "1");
    }

    #[test]
    fn test_shuffle_keeps_cursor_in_bounds() {
        let mut queue = filled(8);
        queue.shuffle();
        assert_eq!(queue.len(), 8);
        assert!(queue.current().is_some());
    }

    proptest! {
        #[test]
        fn prop_unshuffle_restores_order(len in 1usize..32, shuffles in 1usize..4) {
            let mut queue = filled(len);
            let original: Vec<String> =
                queue.items().iter().map(|t| t.id.clone()).collect();

            for _ in 0..shuffles {
                queue.shuffle();
            }
            queue.unshuffle();

            let restored: Vec<String> =
                queue.items().iter().map(|t| t.id.clone()).collect();
            prop_assert_eq!(original, restored);
        }
    }
}
