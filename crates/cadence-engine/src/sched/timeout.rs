use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::hash::Hash;

use super::callback::TimerFn;
use super::class::ClassId;
use super::due::DueKey;

/// Stale heap keys tolerated before the heap is rebuilt from live entries.
const COMPACT_SLACK: usize = 64;

struct TimeoutEntry<E> {
    class: ClassId,
    event: E,
    callback: TimerFn,
    due: f64,
}

impl<E: Clone> TimeoutEntry<E> {
    fn identity(&self) -> Identity<E> {
        Identity::new(self.class, self.event.clone(), &self.callback, self.due)
    }
}

/// `(class, event, callback, due)` tuple of a pending entry.
#[derive(PartialEq, Eq, Hash)]
struct Identity<E> {
    class: ClassId,
    event: E,
    callback: usize,
    due: u64,
}

impl<E> Identity<E> {
    fn new(class: ClassId, event: E, callback: &TimerFn, due: f64) -> Self {
        Self {
            class,
            event,
            callback: callback.addr(),
            due: due.to_bits(),
        }
    }
}

/// Min-heap of absolute-delay entries.
///
/// The heap only holds `(due, seq)` keys; entries live in a side table keyed
/// by `seq`. Removal drops the entry and leaves the key to be skipped when it
/// reaches the top. `identities` mirrors `entries` for duplicate checks.
pub(crate) struct TimeoutQueue<E> {
    heap: BinaryHeap<Reverse<DueKey>>,
    entries: HashMap<u64, TimeoutEntry<E>>,
    identities: HashSet<Identity<E>>,
    next_seq: u64,
}

impl<E> TimeoutQueue<E>
where
    E: Clone + Eq + Hash,
{
    pub(crate) fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            entries: HashMap::new(),
            identities: HashSet::new(),
            next_seq: 0,
        }
    }

    /// Sequence number the next insertion will receive.
    pub(crate) fn watermark(&self) -> u64 {
        self.next_seq
    }

    /// Inserts an entry. Returns `false` if an identical
    /// `(class, event, callback, due)` entry is already pending.
    pub(crate) fn insert(
        &mut self,
        class: ClassId,
        event: E,
        callback: &TimerFn,
        due: f64,
    ) -> bool {
        if !self.identities.insert(Identity::new(class, event.clone(), callback, due)) {
            return false;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(
            seq,
            TimeoutEntry {
                class,
                event,
                callback: callback.clone(),
                due,
            },
        );
        self.heap.push(Reverse(DueKey { due, seq }));
        true
    }

    /// Removes the earliest pending entry matching the triple.
    pub(crate) fn remove(&mut self, class: ClassId, event: &E, callback: &TimerFn) -> bool {
        let first = self
            .entries
            .iter()
            .filter(|(_, e)| e.class == class && &e.event == event && e.callback.same(callback))
            .map(|(&seq, e)| DueKey { due: e.due, seq })
            .min();

        match first {
            Some(key) => {
                if let Some(entry) = self.entries.remove(&key.seq) {
                    self.identities.remove(&entry.identity());
                }
                self.maybe_compact();
                true
            }
            None => false,
        }
    }

    /// Drops every entry belonging to `class`.
    pub(crate) fn drop_class(&mut self, class: ClassId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.class != class);
        self.identities.retain(|id| id.class != class);
        self.maybe_compact();
        before - self.entries.len()
    }

    /// Pops the earliest entry due at or before `now`.
    ///
    /// Entries with a sequence number at or above `limit` were inserted during
    /// the current sweep and are left for a later one.
    pub(crate) fn pop_due(&mut self, now: f64, limit: u64) -> Option<TimerFn> {
        while let Some(&Reverse(key)) = self.heap.peek() {
            if key.due > now || key.seq >= limit {
                return None;
            }
            self.heap.pop();
            if let Some(entry) = self.entries.remove(&key.seq) {
                self.identities.remove(&entry.identity());
                return Some(entry.callback);
            }
        }
        None
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Due time of the earliest live entry. Drops stale keys off the top.
    pub(crate) fn next_due(&mut self) -> Option<f64> {
        while let Some(&Reverse(key)) = self.heap.peek() {
            if self.entries.contains_key(&key.seq) {
                return Some(key.due);
            }
            self.heap.pop();
        }
        None
    }

    fn maybe_compact(&mut self) {
        if self.heap.len() > self.entries.len() * 2 + COMPACT_SLACK {
            self.heap = self
                .entries
                .iter()
                .map(|(&seq, e)| Reverse(DueKey { due: e.due, seq }))
                .collect();
        }
    }
}
