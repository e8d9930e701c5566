//! Resumable walk over a [`RecordStore`].
//!
//! A session drives a [`SeqIter`] through `start`, `next` and `stop`:
//!
//! ```text
//! NotStarted --start--> Positioned(b) --next--> Positioned(b+1) ... --next--> Exhausted
//!      \__________________start (empty store)________________________________/
//! ```
//!
//! The machine never copies or owns store data, it only tracks a [`Bookmark`].
//! Every session gets its own machine, so concurrent readers of the same store
//! have independent positions. A session cut short (for example because the
//! caller's buffer filled up) is continued with [`SeqIter::resume`] from the
//! last bookmark it emitted, which neither repeats nor skips a record.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::record::Record;
use crate::store::RecordStore;

/// Typed cursor naming one position in a store.
///
/// For a counter table this is the counter index. For the single fork slot
/// the only position is 0, so "emitted or not" is all it encodes.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Bookmark(usize);

impl Bookmark {
    pub const START: Bookmark = Bookmark(0);

    pub const fn new(position: usize) -> Self {
        Bookmark(position)
    }

    pub const fn position(self) -> usize {
        self.0
    }

    fn advance(self) -> Self {
        Bookmark(self.0.saturating_add(1))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeqState {
    NotStarted,
    Positioned(Bookmark),
    Exhausted,
}

/// Per-session iterator state machine.
pub struct SeqIter<S> {
    store: S,
    state: SeqState,
    stopped: bool,
    stopped_at: Option<Bookmark>,
}

impl<S: RecordStore> SeqIter<S> {
    pub fn new(store: S) -> Self {
        SeqIter {
            store,
            state: SeqState::NotStarted,
            stopped: false,
            stopped_at: None,
        }
    }

    /// A fresh session positioned at a bookmark returned by an earlier one.
    ///
    /// The first call must be `next(bookmark)`, which yields the record after
    /// `bookmark`.
    pub fn resume(store: S, bookmark: Bookmark) -> Self {
        debug!(position = bookmark.position(), "resuming session");
        SeqIter {
            store,
            state: SeqState::Positioned(bookmark),
            stopped: false,
            stopped_at: None,
        }
    }

    pub fn state(&self) -> SeqState {
        self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Position the session at the first record.
    ///
    /// Returns `None` if the store is empty or not populated yet; the session is
    /// then `Exhausted`.
    ///
    /// # Panics
    ///
    /// If the session has already been started or resumed.
    pub fn start(&mut self) -> Option<(Bookmark, Record)> {
        assert!(
            self.state == SeqState::NotStarted && !self.stopped,
            "start called on a session in state {:?}",
            self.state
        );
        debug!(count = self.store.count(), "starting session");
        self.fetch(Bookmark::START)
    }

    /// Advance past `bookmark` and return the next record, or `None` once the
    /// store has been walked to the end.
    ///
    /// # Panics
    ///
    /// If the session is not `Positioned`, has been stopped, or `bookmark` is
    /// not the one this session last returned.
    pub fn next(&mut self, bookmark: Bookmark) -> Option<(Bookmark, Record)> {
        assert!(!self.stopped, "next called on a stopped session");
        match self.state {
            SeqState::Positioned(current) => assert_eq!(
                current, bookmark,
                "next called with a bookmark this session did not hand out"
            ),
            other => panic!("next called on a session in state {other:?}"),
        }
        self.fetch(bookmark.advance())
    }

    /// End the session. `bookmark` is the last one returned by `start`/`next`,
    /// or `None` if `start` found nothing.
    ///
    /// Holds no resources today; safe to call more than once and in any state.
    pub fn stop(&mut self, bookmark: Option<Bookmark>) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.stopped_at = bookmark;
        debug!(
            position = bookmark.map(Bookmark::position),
            state = ?self.state,
            "stopping session"
        );
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Bookmark the session was stopped with.
    pub fn stopped_at(&self) -> Option<Bookmark> {
        self.stopped_at
    }

    /// Consume the session as a plain iterator over the whole store.
    pub fn walk(self) -> Walk<S> {
        let last = match self.state {
            SeqState::Positioned(bookmark) => Some(bookmark),
            _ => None,
        };
        Walk { iter: self, last }
    }

    fn fetch(&mut self, bookmark: Bookmark) -> Option<(Bookmark, Record)> {
        let position = bookmark.position();
        let record = if position < self.store.count() {
            self.store.get(position)
        } else {
            None
        };

        match record {
            Some(record) => {
                trace!(position, "positioned");
                self.state = SeqState::Positioned(bookmark);
                Some((bookmark, record))
            }
            None => {
                trace!(position, "exhausted");
                self.state = SeqState::Exhausted;
                None
            }
        }
    }
}

/// Iterator adapter returned by [`SeqIter::walk`]. Stops the session when the
/// walk reaches the end.
pub struct Walk<S> {
    iter: SeqIter<S>,
    last: Option<Bookmark>,
}

impl<S> Walk<S> {
    pub fn session(&self) -> &SeqIter<S> {
        &self.iter
    }
}

impl<S: RecordStore> Iterator for Walk<S> {
    type Item = (Bookmark, Record);

    fn next(&mut self) -> Option<Self::Item> {
        let item = match self.iter.state {
            SeqState::NotStarted => self.iter.start(),
            SeqState::Positioned(bookmark) => self.iter.next(bookmark),
            SeqState::Exhausted => return None,
        };
        match item {
            Some((bookmark, _)) => self.last = Some(bookmark),
            None => self.iter.stop(self.last),
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CommName, CounterRecord, ForkRecord};
    use crate::store::{CounterTable, ForkSlot, InMemoryStore};

    fn counters(values: &[u64]) -> InMemoryStore {
        values
            .iter()
            .enumerate()
            .map(|(index, &value)| CounterRecord { index, value })
            .collect()
    }

    fn positions(store: &InMemoryStore) -> Vec<usize> {
        SeqIter::new(store)
            .walk()
            .map(|(bookmark, _)| bookmark.position())
            .collect()
    }

    #[test]
    fn test_full_walk_visits_each_position_once() {
        let store = counters(&[5, 0, 42]);
        let mut iter = SeqIter::new(&store);

        let (b0, r0) = iter.start().unwrap();
        assert_eq!(b0, Bookmark::new(0));
        assert_eq!(r0, Record::Counter(CounterRecord { index: 0, value: 5 }));
        let (b1, r1) = iter.next(b0).unwrap();
        assert_eq!(r1, Record::Counter(CounterRecord { index: 1, value: 0 }));
        let (b2, r2) = iter.next(b1).unwrap();
        assert_eq!(r2, Record::Counter(CounterRecord { index: 2, value: 42 }));
        assert_eq!(iter.state(), SeqState::Positioned(b2));

        assert!(iter.next(b2).is_none());
        assert_eq!(iter.state(), SeqState::Exhausted);
        iter.stop(None);
        assert!(iter.is_stopped());
    }

    #[test]
    fn test_walk_positions_ascending() {
        let store = counters(&[1; 17]);
        assert_eq!(positions(&store), (0..17).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_store_exhausts_on_start() {
        let store = CounterTable::new(0);
        let mut iter = SeqIter::new(&store);
        assert!(iter.start().is_none());
        assert_eq!(iter.state(), SeqState::Exhausted);
        iter.stop(None);
    }

    #[test]
    fn test_resume_continues_after_bookmark() {
        let store = counters(&[10, 11, 12, 13, 14]);
        let mut first = SeqIter::new(&store);
        let (b0, _) = first.start().unwrap();
        let (b1, _) = first.next(b0).unwrap();
        first.stop(Some(b1));

        let rest: Vec<usize> = SeqIter::resume(&store, b1)
            .walk()
            .map(|(bookmark, _)| bookmark.position())
            .collect();
        assert_eq!(rest, vec![2, 3, 4]);
    }

    #[test]
    fn test_resume_at_last_position_is_exhausted() {
        let store = counters(&[1, 2]);
        let mut iter = SeqIter::resume(&store, Bookmark::new(1));
        assert!(iter.next(Bookmark::new(1)).is_none());
        assert_eq!(iter.state(), SeqState::Exhausted);
    }

    #[test]
    fn test_fork_slot_is_single_record_per_session() {
        let slot = ForkSlot::new();
        slot.publish(ForkRecord {
            clone_flags: 0x11,
            parent_pid: 1,
            child_pid: 2,
            parent_uid: 0,
            command_name: CommName::from("init"),
            child_return: 2,
        });

        let mut iter = SeqIter::new(&slot);
        let (bookmark, _) = iter.start().unwrap();
        // A newer event mid-session is not re-polled
        slot.publish(ForkRecord::default());
        assert!(iter.next(bookmark).is_none());
    }

    #[test]
    fn test_unpopulated_fork_slot() {
        let slot = ForkSlot::new();
        let mut iter = SeqIter::new(&slot);
        assert!(iter.start().is_none());
        assert_eq!(iter.state(), SeqState::Exhausted);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let store = counters(&[1]);
        let mut iter = SeqIter::new(&store);
        let (bookmark, _) = iter.start().unwrap();
        iter.stop(Some(bookmark));
        iter.stop(Some(bookmark));
        assert!(iter.is_stopped());
    }

    #[test]
    fn test_sessions_are_independent() {
        let store = counters(&[1, 2, 3]);
        let mut a = SeqIter::new(&store);
        let mut b = SeqIter::new(&store);
        let (a0, _) = a.start().unwrap();
        let (a1, _) = a.next(a0).unwrap();
        let (b0, _) = b.start().unwrap();
        assert_eq!(a1.position(), 1);
        assert_eq!(b0.position(), 0);
    }

    #[test]
    #[should_panic(expected = "NotStarted")]
    fn test_next_before_start_panics() {
        let store = counters(&[1]);
        let mut iter = SeqIter::new(&store);
        iter.next(Bookmark::START);
    }

    #[test]
    #[should_panic(expected = "Exhausted")]
    fn test_next_after_exhausted_panics() {
        let store = counters(&[1]);
        let mut iter = SeqIter::new(&store);
        let (bookmark, _) = iter.start().unwrap();
        assert!(iter.next(bookmark).is_none());
        iter.next(bookmark);
    }

    #[test]
    #[should_panic(expected = "did not hand out")]
    fn test_next_with_foreign_bookmark_panics() {
        let store = counters(&[1, 2, 3]);
        let mut iter = SeqIter::new(&store);
        iter.start().unwrap();
        iter.next(Bookmark::new(2));
    }

    #[test]
    #[should_panic(expected = "start called on a session")]
    fn test_start_twice_panics() {
        let store = counters(&[1, 2]);
        let mut iter = SeqIter::new(&store);
        iter.start().unwrap();
        iter.start();
    }

    #[test]
    #[should_panic(expected = "next called on a stopped session")]
    fn test_next_after_stop_panics() {
        let store = counters(&[1, 2]);
        let mut iter = SeqIter::new(&store);
        let (bookmark, _) = iter.start().unwrap();
        iter.stop(Some(bookmark));
        iter.next(bookmark);
    }

    #[test]
    fn test_walk_stops_with_last_bookmark() {
        let store = counters(&[7, 8, 9]);
        let mut walk = SeqIter::new(&store).walk();
        assert_eq!(walk.by_ref().count(), 3);
        assert!(walk.session().is_stopped());
        assert_eq!(walk.session().stopped_at(), Some(Bookmark::new(2)));

        let empty = counters(&[]);
        let mut walk = SeqIter::new(&empty).walk();
        assert!(walk.next().is_none());
        assert_eq!(walk.session().stopped_at(), None);
    }

    #[test]
    fn test_resumed_walk_at_end_stops_with_resume_bookmark() {
        let store = counters(&[1, 2]);
        let mut walk = SeqIter::resume(&store, Bookmark::new(1)).walk();
        assert!(walk.next().is_none());
        assert_eq!(walk.session().stopped_at(), Some(Bookmark::new(1)));
    }

    #[test]
    fn test_bookmark_serializes_as_position() {
        let json = serde_json::to_string(&Bookmark::new(7)).unwrap();
        assert_eq!(json, "7");
        let back: Bookmark = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Bookmark::new(7));
    }
}
