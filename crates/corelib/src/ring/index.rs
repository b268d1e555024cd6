//! Ordered index of virtual node placements.
//!
//! A [`RingIndex`] is one immutable generation of the ring: placements sorted
//! by token with no duplicate positions. Lookups binary-search the first
//! placement at or after a position and walk clockwise, wrapping past the
//! maximum token back to the minimum, for at most one full cycle.

use std::collections::HashMap;
use std::iter::FusedIterator;
use std::sync::Arc;

use crate::ring::lookup::{Lookup, LookupMode};
use crate::token::Token;
use crate::vnode::VirtualNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    token: Token,
    slot: u32,
}

/// Sorted placements plus the name table they point into.
#[derive(Debug, Clone, Default)]
pub struct RingIndex {
    entries: Vec<Entry>,
    names: Vec<Arc<str>>,
}

impl RingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from a full placement set.
    pub fn from_placements(placements: Vec<VirtualNode>) -> Self {
        let mut index = Self::new();
        index.rebuild(placements);
        index
    }

    /// Replace the entire index. O(n log n).
    ///
    /// Placements sharing a token keep only the lexically smallest node name.
    /// Returns the number of placements dropped that way.
    pub fn rebuild(&mut self, mut placements: Vec<VirtualNode>) -> usize {
        placements.sort_unstable();
        let before = placements.len();
        placements.dedup_by(|next, kept| next.token == kept.token);
        let dropped = before - placements.len();

        let mut slots: HashMap<Arc<str>, u32> = HashMap::new();
        let mut names = Vec::new();
        let mut entries = Vec::with_capacity(placements.len());
        for vnode in placements {
            let slot = *slots.entry(Arc::clone(&vnode.node)).or_insert_with(|| {
                names.push(Arc::clone(&vnode.node));
                (names.len() - 1) as u32
            });
            entries.push(Entry {
                token: vnode.token,
                slot,
            });
        }

        self.entries = entries;
        self.names = names;
        dropped
    }

    /// Number of placements (virtual nodes).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct nodes with at least one placement.
    pub fn node_count(&self) -> usize {
        self.names.len()
    }

    /// All placements in ring order.
    pub fn tokens(&self) -> Vec<(Token, &str)> {
        self.entries
            .iter()
            .map(|e| (e.token, &*self.names[e.slot as usize]))
            .collect()
    }

    /// Index of the first placement at or after `position`, wrapping to 0.
    fn start(&self, position: Token) -> usize {
        let idx = self.entries.partition_point(|e| e.token < position);
        if idx == self.entries.len() {
            0
        } else {
            idx
        }
    }

    /// The node owning `position`: first placement at or after it.
    pub fn owner(&self, position: Token) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        let entry = self.entries[self.start(position)];
        Some(&*self.names[entry.slot as usize])
    }

    /// Distinct nodes in ring order starting at `position`.
    pub fn successors(&self, position: Token) -> Successors<'_> {
        Successors {
            index: self,
            start: if self.entries.is_empty() {
                0
            } else {
                self.start(position)
            },
            walked: 0,
            seen: vec![false; self.names.len()],
            remaining: self.names.len(),
        }
    }

    /// Walk clockwise from `position` collecting node names.
    ///
    /// With `distinct_only`, stops after `count` distinct names; otherwise
    /// returns the owner of each of the next `count` placements. A `count`
    /// of zero walks the whole index. Never visits a placement twice.
    pub fn lookup(&self, position: Token, count: usize, distinct_only: bool) -> Vec<String> {
        let limit = if count == 0 { usize::MAX } else { count };
        if distinct_only {
            return self
                .successors(position)
                .take(limit)
                .map(str::to_string)
                .collect();
        }

        if self.entries.is_empty() {
            return Vec::new();
        }
        let start = self.start(position);
        let len = self.entries.len();
        (0..len.min(limit))
            .map(|step| {
                let entry = self.entries[(start + step) % len];
                self.names[entry.slot as usize].to_string()
            })
            .collect()
    }

    /// Resolve a lookup mode against this generation.
    pub fn get(&self, position: Token, mode: LookupMode) -> Lookup {
        match mode {
            LookupMode::Single => Lookup::One(self.owner(position).map(str::to_string)),
            LookupMode::Count(0) => Lookup::Many(Vec::new()),
            LookupMode::Count(n) => Lookup::Many(self.lookup(position, n, true)),
            LookupMode::All => Lookup::Many(self.lookup(position, 0, true)),
        }
    }
}

/// Iterator over distinct nodes clockwise from a position.
///
/// Created by [`RingIndex::successors`].
#[derive(Debug, Clone)]
pub struct Successors<'a> {
    index: &'a RingIndex,
    start: usize,
    walked: usize,
    seen: Vec<bool>,
    remaining: usize,
}

impl<'a> Iterator for Successors<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.index;
        let entries = &index.entries;
        while self.remaining > 0 && self.walked < entries.len() {
            let entry = entries[(self.start + self.walked) % entries.len()];
            self.walked += 1;

            let slot = entry.slot as usize;
            if !self.seen[slot] {
                self.seen[slot] = true;
                self.remaining -= 1;
                return Some(&*index.names[slot]);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl FusedIterator for Successors<'_> {}
