use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_OWNER: AtomicU32 = AtomicU32::new(1);

/// Registration token for one consumer module.
///
/// Tokens are generational: a token stays valid until its class is
/// unregistered, and a token minted by one scheduler is never accepted by
/// another.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ClassId {
    owner: u32,
    index: u32,
    generation: u32,
}

impl ClassId {
    /// Slot index within the owning scheduler.
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}@{}", self.index, self.generation, self.owner)
    }
}

#[derive(Debug)]
struct Slot {
    name: String,
    generation: u32,
    live: bool,
}

/// Name → token table with slot reuse.
#[derive(Debug)]
pub(crate) struct ClassTable {
    owner: u32,
    slots: Vec<Slot>,
    by_name: HashMap<String, u32>,
    free: Vec<u32>,
}

impl ClassTable {
    pub(crate) fn new() -> Self {
        Self {
            owner: NEXT_OWNER.fetch_add(1, Ordering::Relaxed),
            slots: Vec::new(),
            by_name: HashMap::new(),
            free: Vec::new(),
        }
    }

    /// Returns the token for `name` and whether it was newly registered.
    pub(crate) fn register(&mut self, name: &str) -> (ClassId, bool) {
        if let Some(&index) = self.by_name.get(name) {
            return (self.token(index), false);
        }

        let index = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.name = name.to_owned();
                slot.live = true;
                index
            }
            None => {
                self.slots.push(Slot {
                    name: name.to_owned(),
                    generation: 0,
                    live: true,
                });
                (self.slots.len() - 1) as u32
            }
        };

        self.by_name.insert(name.to_owned(), index);
        (self.token(index), true)
    }

    /// Retires the token. Returns `false` if it was not live.
    pub(crate) fn unregister(&mut self, id: ClassId) -> bool {
        if !self.contains(id) {
            return false;
        }
        let slot = &mut self.slots[id.index as usize];
        slot.live = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.by_name.remove(&slot.name);
        self.free.push(id.index);
        true
    }

    pub(crate) fn contains(&self, id: ClassId) -> bool {
        id.owner == self.owner
            && self
                .slots
                .get(id.index as usize)
                .is_some_and(|s| s.live && s.generation == id.generation)
    }

    pub(crate) fn name(&self, id: ClassId) -> Option<&str> {
        if self.contains(id) {
            Some(self.slots[id.index as usize].name.as_str())
        } else {
            None
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.by_name.len()
    }

    fn token(&self, index: u32) -> ClassId {
        ClassId {
            owner: self.owner,
            index,
            generation: self.slots[index as usize].generation,
        }
    }
}
