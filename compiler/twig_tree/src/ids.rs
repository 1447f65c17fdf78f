//! Sequence IDs for the tree arena.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Index into the sequence arena of a [`Tree`](crate::Tree).
///
/// # Design
/// Children refer to nested sequences by id instead of owning them, so a
/// capture can be stored as `(SeqId, start, len)` and stay meaningful while
/// the tree is edited.
/// - Memory: 4 bytes
/// - Equality: O(1) integer compare (identity, not structure)
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
#[repr(transparent)]
pub struct SeqId(u32);

impl SeqId {
    /// Create a new `SeqId`.
    #[inline]
    pub const fn new(index: u32) -> Self {
        SeqId(index)
    }

    /// Get the index into the arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl Hash for SeqId {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for SeqId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SeqId({})", self.0)
    }
}

#[cfg(test)]
mod tests;
