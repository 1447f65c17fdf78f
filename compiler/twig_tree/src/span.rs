//! Spans of consecutive children within one sequence.

use std::fmt;
use std::ops::Range;

use crate::SeqId;

/// A window of `len` consecutive children of `seq`, starting at `start`.
///
/// Captures and whole-match results are spans. A span does not own the
/// nodes it covers; it is only meaningful against the tree it came from.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Span {
    pub seq: SeqId,
    pub start: u32,
    pub len: u32,
}

impl Span {
    /// Create a new span.
    #[inline]
    pub const fn new(seq: SeqId, start: u32, len: u32) -> Self {
        Span { seq, start, len }
    }

    /// Exclusive end index.
    #[inline]
    pub const fn end(self) -> u32 {
        self.start + self.len
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    /// The covered child indices as a `usize` range.
    #[inline]
    pub fn range(self) -> Range<usize> {
        self.start as usize..self.end() as usize
    }

    /// Whether two spans share at least one position in the same sequence.
    ///
    /// An empty span overlaps a span that strictly surrounds its position,
    /// since splicing there would cut that span in two.
    #[inline]
    pub fn overlaps(self, other: Span) -> bool {
        self.seq == other.seq && self.start < other.end() && other.start < self.end()
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}[{}..{}]", self.seq, self.start, self.end())
    }
}
