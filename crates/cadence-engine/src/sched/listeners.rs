use std::collections::HashMap;
use std::hash::Hash;

use super::callback::Listener;
use super::class::ClassId;

/// Per-class, per-event ordered listener lists.
///
/// Used twice by the scheduler: once for continuous subscriptions, once for
/// one-shot subscriptions.
pub(crate) struct ListenerTable<E, P> {
    classes: HashMap<ClassId, HashMap<E, Vec<Listener<P>>>>,
}

impl<E, P> ListenerTable<E, P>
where
    E: Eq + Hash,
{
    pub(crate) fn new() -> Self {
        Self { classes: HashMap::new() }
    }

    pub(crate) fn add_class(&mut self, class: ClassId) {
        self.classes.entry(class).or_default();
    }

    pub(crate) fn drop_class(&mut self, class: ClassId) -> usize {
        self.classes
            .remove(&class)
            .map(|events| events.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Appends `listener`. Returns `false` if the same listener is already
    /// subscribed for the pair or the class has no table.
    pub(crate) fn add(&mut self, class: ClassId, event: E, listener: &Listener<P>) -> bool {
        let Some(events) = self.classes.get_mut(&class) else {
            return false;
        };
        let list = events.entry(event).or_default();
        if list.iter().any(|l| l.same(listener)) {
            return false;
        }
        list.push(listener.clone());
        true
    }

    pub(crate) fn remove(&mut self, class: ClassId, event: &E, listener: &Listener<P>) -> bool {
        let Some(events) = self.classes.get_mut(&class) else {
            return false;
        };
        let Some(list) = events.get_mut(event) else {
            return false;
        };
        let Some(pos) = list.iter().position(|l| l.same(listener)) else {
            return false;
        };
        list.remove(pos);
        if list.is_empty() {
            events.remove(event);
        }
        true
    }

    /// Copy of the current list, in subscription order.
    pub(crate) fn snapshot(&self, class: ClassId, event: &E) -> Vec<Listener<P>> {
        self.classes
            .get(&class)
            .and_then(|events| events.get(event))
            .cloned()
            .unwrap_or_default()
    }

    /// Removes and returns the whole list for the pair.
    pub(crate) fn take(&mut self, class: ClassId, event: &E) -> Vec<Listener<P>> {
        self.classes
            .get_mut(&class)
            .and_then(|events| events.remove(event))
            .unwrap_or_default()
    }

    pub(crate) fn count(&self, class: ClassId, event: &E) -> usize {
        self.classes
            .get(&class)
            .and_then(|events| events.get(event))
            .map_or(0, Vec::len)
    }
}
