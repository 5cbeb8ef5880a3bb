//! Shared transposition table.
//!
//! A fixed-capacity array of slots indexed by `key % len`. Replacement
//! prefers fresh generations and deeper entries; `new_search` ages the table
//! without invalidating it. Mate scores are stored relative to the node so
//! the mate distance survives probing at a different ply.

use chess_core::Move;

use crate::search::{MATE, MAX_PLY};

/// Qualifies a stored score: exact, a fail-high lower bound, or a fail-low
/// upper bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    Exact,
    Lower,
    Upper,
}

#[derive(Clone, Copy, Debug)]
pub struct TtEntry {
    pub key: u64,
    pub depth: i32,
    pub score: i32,
    pub bound: Bound,
    pub best: Move,
    pub generation: u8,
}

pub struct TranspositionTable {
    entries: Vec<Option<TtEntry>>,
    generation: u8,
}

const ENTRY_SIZE: usize = std::mem::size_of::<Option<TtEntry>>();

impl TranspositionTable {
    /// Create a table of `bytes / entry-size` slots. A capacity too small
    /// for even one entry falls back to the minimum viable size.
    pub fn new(bytes: usize) -> Self {
        let mut slots = bytes / ENTRY_SIZE;
        if slots == 0 {
            log::warn!("hash capacity of {bytes} bytes is below one entry; clamping to one slot");
            slots = 1;
        }
        Self {
            entries: vec![None; slots],
            generation: 0,
        }
    }

    pub fn with_megabytes(mb: usize) -> Self {
        Self::new(mb * 1024 * 1024)
    }

    /// Drop all entries and reinitialize to the given byte budget.
    pub fn resize(&mut self, bytes: usize) {
        *self = Self::new(bytes);
    }

    pub fn clear(&mut self) {
        self.entries.iter_mut().for_each(|e| *e = None);
        self.generation = 0;
    }

    /// Age the table for a new search; entries stay probeable but become
    /// preferred victims for replacement.
    pub fn new_search(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn generation(&self) -> u8 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    fn index(&self, key: u64) -> usize {
        (key % self.entries.len() as u64) as usize
    }

    /// A stale or foreign slot is a miss.
    pub fn probe(&self, key: u64) -> Option<TtEntry> {
        let slot = self.entries[self.index(key)]?;
        (slot.key == key).then_some(slot)
    }

    /// Replace when the slot is empty, holds a different key, belongs to an
    /// older generation, or the incoming depth is at least the occupant's.
    pub fn store(&mut self, key: u64, depth: i32, score: i32, bound: Bound, best: Move) {
        let idx = self.index(key);
        let replace = match self.entries[idx] {
            None => true,
            Some(slot) => {
                slot.key != key || slot.generation != self.generation || depth >= slot.depth
            }
        };
        if replace {
            self.entries[idx] = Some(TtEntry {
                key,
                depth,
                score,
                bound,
                best,
                generation: self.generation,
            });
        }
    }
}

const MATE_BOUND: i32 = MATE - MAX_PLY as i32;

/// Make a mate score ply-relative before storing: "mate in k from here"
/// rather than "from the root".
#[inline]
pub fn score_to_tt(score: i32, ply: usize) -> i32 {
    if score >= MATE_BOUND {
        score + ply as i32
    } else if score <= -MATE_BOUND {
        score - ply as i32
    } else {
        score
    }
}

/// Reverse of `score_to_tt`, reanchoring the mate distance at the probing
/// node's ply.
#[inline]
pub fn score_from_tt(score: i32, ply: usize) -> i32 {
    if score >= MATE_BOUND {
        score - ply as i32
    } else if score <= -MATE_BOUND {
        score + ply as i32
    } else {
        score
    }
}

#[cfg(test)]
#[path = "tt_tests.rs"]
mod tt_tests;
