use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::hash::Hash;

use super::callback::TimerFn;
use super::class::ClassId;
use super::due::DueKey;

const COMPACT_SLACK: usize = 64;

struct WindowEntry {
    seq: u64,
    callback: TimerFn,
    next_due: f64,
}

/// Class-scoped window entries.
///
/// Entries are grouped class → event type. A global min-heap of `(next_due,
/// seq)` markers answers "is anything due" without walking the groups; markers
/// for removed entries are skipped lazily. Each entry fires once and is then
/// removed from its group.
pub(crate) struct WindowQueue<E> {
    groups: HashMap<ClassId, HashMap<E, Vec<WindowEntry>>>,
    pending: BinaryHeap<Reverse<DueKey>>,
    locations: HashMap<u64, (ClassId, E)>,
    next_seq: u64,
}

impl<E> WindowQueue<E>
where
    E: Clone + Eq + Hash,
{
    pub(crate) fn new() -> Self {
        Self {
            groups: HashMap::new(),
            pending: BinaryHeap::new(),
            locations: HashMap::new(),
            next_seq: 0,
        }
    }

    pub(crate) fn watermark(&self) -> u64 {
        self.next_seq
    }

    /// Adds an entry due at `next_due`. Returns `false` if the same callback is
    /// already pending for the pair at that exact time.
    pub(crate) fn insert(
        &mut self,
        class: ClassId,
        event: E,
        callback: &TimerFn,
        next_due: f64,
    ) -> bool {
        let group = self
            .groups
            .entry(class)
            .or_default()
            .entry(event.clone())
            .or_default();
        if group
            .iter()
            .any(|w| w.callback.same(callback) && w.next_due == next_due)
        {
            return false;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        group.push(WindowEntry {
            seq,
            callback: callback.clone(),
            next_due,
        });
        self.locations.insert(seq, (class, event));
        self.pending.push(Reverse(DueKey { due: next_due, seq }));
        true
    }

    /// Removes the first entry in the pair's group holding `callback`.
    pub(crate) fn remove(&mut self, class: ClassId, event: &E, callback: &TimerFn) -> bool {
        let Some(events) = self.groups.get_mut(&class) else {
            return false;
        };
        let Some(group) = events.get_mut(event) else {
            return false;
        };
        let Some(pos) = group.iter().position(|w| w.callback.same(callback)) else {
            return false;
        };

        let entry = group.remove(pos);
        if group.is_empty() {
            events.remove(event);
        }
        self.locations.remove(&entry.seq);
        self.maybe_compact();
        true
    }

    pub(crate) fn drop_class(&mut self, class: ClassId) -> usize {
        let Some(events) = self.groups.remove(&class) else {
            return 0;
        };
        let mut dropped = 0;
        for entry in events.values().flatten() {
            self.locations.remove(&entry.seq);
            dropped += 1;
        }
        self.maybe_compact();
        dropped
    }

    /// Pops the earliest entry due at or before `now` across all classes.
    ///
    /// Entries at or above `limit` were added during the current sweep and
    /// wait for a later one.
    pub(crate) fn pop_due(&mut self, now: f64, limit: u64) -> Option<TimerFn> {
        while let Some(&Reverse(key)) = self.pending.peek() {
            if key.due > now || key.seq >= limit {
                return None;
            }
            self.pending.pop();

            let Some((class, event)) = self.locations.remove(&key.seq) else {
                continue;
            };
            let Some(events) = self.groups.get_mut(&class) else {
                continue;
            };
            let Some(group) = events.get_mut(&event) else {
                continue;
            };
            let Some(pos) = group.iter().position(|w| w.seq == key.seq) else {
                continue;
            };

            let entry = group.remove(pos);
            if group.is_empty() {
                events.remove(&event);
            }
            return Some(entry.callback);
        }
        None
    }

    pub(crate) fn len(&self) -> usize {
        self.locations.len()
    }

    pub(crate) fn count(&self, class: ClassId, event: &E) -> usize {
        self.groups
            .get(&class)
            .and_then(|events| events.get(event))
            .map_or(0, Vec::len)
    }

    /// Due time of the earliest live entry. Drops stale markers off the top.
    pub(crate) fn next_due(&mut self) -> Option<f64> {
        while let Some(&Reverse(key)) = self.pending.peek() {
            if self.locations.contains_key(&key.seq) {
                return Some(key.due);
            }
            self.pending.pop();
        }
        None
    }

    fn maybe_compact(&mut self) {
        if self.pending.len() > self.locations.len() * 2 + COMPACT_SLACK {
            self.pending = self
                .groups
                .values()
                .flat_map(|events| events.values().flatten())
                .map(|w| Reverse(DueKey { due: w.next_due, seq: w.seq }))
                .collect();
        }
    }
}
