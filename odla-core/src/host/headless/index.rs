use std::collections::BTreeMap;

use odla_types::Tick;

/// Values keyed by score position, answering "which one is in effect at
/// this tick" with a predecessor query.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionIndex<T> {
    entries: BTreeMap<Tick, T>,
}

impl<T> Default for PositionIndex<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> PositionIndex<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the value starting at `tick`.
    pub fn insert(&mut self, tick: Tick, value: T) {
        self.entries.insert(tick, value);
    }

    pub fn remove(&mut self, tick: Tick) -> Option<T> {
        self.entries.remove(&tick)
    }

    /// The last value at or before `tick`.
    pub fn at(&self, tick: Tick) -> Option<&T> {
        self.entries.range(..=tick).next_back().map(|(_, v)| v)
    }

    /// The last key strictly before `tick`.
    pub fn key_before(&self, tick: Tick) -> Option<Tick> {
        self.entries.range(..tick).next_back().map(|(k, _)| *k)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tick, &T)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    /// Move every key through `map`. Later keys win on collision.
    pub fn remap(&mut self, mut map: impl FnMut(Tick) -> Tick) {
        let old = std::mem::take(&mut self.entries);
        for (tick, value) in old {
            self.entries.insert(map(tick), value);
        }
    }
}
