//! Capture handles: reading and rewriting matched spans.
//!
//! A [`Match`] is handed to the search callback. It owns the spans bound by
//! one successful match and the exclusive borrow of the tree, so every edit
//! made through a handle can keep the other handles of the same match
//! consistent:
//!
//! - the replaced handle spans the new content
//! - a handle after the edit in the same sequence is shifted
//! - any other handle overlapping the replaced range is invalidated, and so
//!   is every handle inside a sequence detached by the edit
//!
//! `swap` moves content instead of replacing it, so handles inside either
//! swapped span follow their content to its new position and handles
//! enclosing a swapped span grow or shrink with it.
//!
//! Edits made through [`Match::tree_mut`] bypass this bookkeeping.

use std::fmt;

use rustc_hash::FxHashSet;
use twig_tree::{Node, NodeRef, SeqId, Span, Tree, Value};

use crate::compile::CompiledPattern;
use crate::errors::CaptureError;
use crate::matcher::Bindings;

/// Name under which [`Match::get`] returns the whole-match handle.
pub const WHOLE_MATCH: &str = "$match";

/// A copyable reference to one capture of one match.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Handle {
    match_id: u32,
    /// 0 is the whole match; `i + 1` is slot `i`.
    index: u32,
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}#{})", self.match_id, self.index)
    }
}

#[derive(Copy, Clone, Debug)]
struct Slot {
    span: Span,
    valid: bool,
}

/// One successful match, with mutable access to the tree.
pub struct Match<'a> {
    id: u32,
    tree: &'a mut Tree,
    pattern: &'a CompiledPattern,
    /// Index 0 is the whole match; unbound captures are `None`.
    slots: Vec<Option<Slot>>,
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "sequence lengths fit u32, see Tree::alloc"
)]
fn len_u32(len: usize) -> u32 {
    len as u32
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "adjusted positions stay inside their sequence"
)]
fn offset(position: u32, delta: i64) -> u32 {
    (i64::from(position) + delta) as u32
}

fn contains(outer: Span, inner: Span) -> bool {
    outer.seq == inner.seq && outer.start <= inner.start && inner.end() <= outer.end()
}

/// Every sequence reachable from `nodes`, including nested ones.
fn reachable(tree: &Tree, nodes: &[Node]) -> FxHashSet<SeqId> {
    let mut seen = FxHashSet::default();
    let mut stack: Vec<SeqId> = nodes.iter().filter_map(Node::as_seq).collect();
    while let Some(id) = stack.pop() {
        if seen.insert(id) {
            stack.extend(tree.children(id).iter().filter_map(Node::as_seq));
        }
    }
    seen
}

/// `outer`, which encloses `old`, after `old` is replaced by `new_len` nodes.
fn resize(outer: Span, old: Span, new_len: u32) -> Span {
    let delta = i64::from(new_len) - i64::from(old.len);
    Span::new(outer.seq, outer.start, offset(outer.len, delta))
}

/// Where `span` ends up after `old` is replaced by `new_len` nodes; `None`
/// when the two overlap.
fn after_replace(span: Span, old: Span, new_len: u32) -> Option<Span> {
    if span.seq != old.seq {
        return Some(span);
    }
    let delta = i64::from(new_len) - i64::from(old.len);
    if span.end() <= old.start {
        Some(span)
    } else if span.start >= old.end() {
        Some(Span::new(span.seq, offset(span.start, delta), span.len))
    } else {
        None
    }
}

/// Where `span` ends up after swapping `a` and `b`, with `a` ordered first
/// when both live in one sequence.
fn after_swap(span: Span, a: Span, b: Span) -> Option<Span> {
    let moved = |from: Span, to_seq: SeqId, to_start: u32| {
        Span::new(to_seq, to_start + (span.start - from.start), span.len)
    };

    if a.seq != b.seq {
        return if contains(a, span) {
            Some(moved(a, b.seq, b.start))
        } else if contains(b, span) {
            Some(moved(b, a.seq, a.start))
        } else if contains(span, a) {
            Some(resize(span, a, b.len))
        } else if contains(span, b) {
            Some(resize(span, b, a.len))
        } else if span.seq == a.seq {
            after_replace(span, a, b.len)
        } else {
            after_replace(span, b, a.len)
        };
    }

    if span.seq != a.seq {
        return Some(span);
    }
    // Layout after the swap: [..a.start] B [a.end..b.start] A [b.end..]
    let delta = i64::from(b.len) - i64::from(a.len);
    let new_a = offset(b.start, delta);
    if contains(a, span) {
        Some(moved(a, a.seq, new_a))
    } else if contains(b, span) {
        Some(moved(b, a.seq, a.start))
    } else if span.end() <= a.start || span.start >= b.end() {
        Some(span)
    } else if span.start >= a.end() && span.end() <= b.start {
        Some(Span::new(span.seq, offset(span.start, delta), span.len))
    } else if span.start <= a.start && span.end() >= b.end() {
        Some(span)
    } else {
        None
    }
}

impl<'a> Match<'a> {
    pub(crate) fn new(
        id: u32,
        tree: &'a mut Tree,
        pattern: &'a CompiledPattern,
        bindings: &Bindings,
    ) -> Self {
        let whole = Slot { span: bindings.whole(), valid: true };
        let slots = std::iter::once(Some(whole))
            .chain(
                bindings
                    .slots()
                    .iter()
                    .map(|bound| bound.map(|span| Slot { span, valid: true })),
            )
            .collect();
        Match { id, tree, pattern, slots }
    }

    /// Sequence number of this match within its search.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Handle to the span consumed by the whole pattern.
    pub fn whole(&self) -> Handle {
        Handle { match_id: self.id, index: 0 }
    }

    /// Handle to a bound capture; `None` if the name is unknown or was not
    /// bound in this match. [`WHOLE_MATCH`] names the whole match.
    pub fn get(&self, name: &str) -> Option<Handle> {
        if name == WHOLE_MATCH {
            return Some(self.whole());
        }
        let slot = self.pattern.slot(name)?;
        let index = slot.index() + 1;
        self.slots[index]?;
        Some(Handle { match_id: self.id, index: len_u32(index) })
    }

    /// Names of the captures bound in this match, in slot order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.pattern
            .names()
            .zip(&self.slots[1..])
            .filter_map(|(name, slot)| slot.map(|_| name))
    }

    fn name(&self, handle: Handle) -> String {
        match handle.index {
            0 => WHOLE_MATCH.to_owned(),
            i => self
                .pattern
                .names()
                .nth(i as usize - 1)
                .unwrap_or_default()
                .to_owned(),
        }
    }

    fn slot(&self, handle: Handle) -> Result<Slot, CaptureError> {
        if handle.match_id != self.id {
            return Err(CaptureError::ForeignHandle);
        }
        self.slots
            .get(handle.index as usize)
            .copied()
            .flatten()
            .ok_or(CaptureError::ForeignHandle)
    }

    /// Current span of a handle.
    pub fn span(&self, handle: Handle) -> Result<Span, CaptureError> {
        let slot = self.slot(handle)?;
        if slot.valid {
            Ok(slot.span)
        } else {
            Err(CaptureError::HandleInvalidated { name: self.name(handle) })
        }
    }

    /// Whether the handle belongs to this match and is still usable.
    pub fn is_valid(&self, handle: Handle) -> bool {
        self.span(handle).is_ok()
    }

    /// The nodes currently covered by a handle.
    pub fn content(&self, handle: Handle) -> Result<&[Node], CaptureError> {
        let span = self.span(handle)?;
        self.tree
            .span_nodes(span)
            .ok_or_else(|| CaptureError::HandleInvalidated { name: self.name(handle) })
    }

    /// The first node of a capture.
    pub fn first(&self, handle: Handle) -> Result<NodeRef<'_>, CaptureError> {
        let node = self
            .content(handle)?
            .first()
            .ok_or_else(|| CaptureError::EmptyCapture { name: self.name(handle) })?;
        Ok(self.tree.node_ref(node))
    }

    /// Owned copy of a capture's content.
    pub fn to_values(&self, handle: Handle) -> Result<Vec<Value>, CaptureError> {
        Ok(self
            .content(handle)?
            .iter()
            .map(|node| self.tree.node_to_value(node))
            .collect())
    }

    /// Replace a capture's content with `nodes`.
    ///
    /// Nodes may refer to sequences already in the tree (for example the
    /// children of a capture being unwrapped); those sequences stay live and
    /// handles inside them stay valid. Nodes that reach the capture's own
    /// sequence are rejected with [`CaptureError::CyclicReplace`].
    ///
    /// Every other handle overlapping the replaced range is invalidated,
    /// including handles that enclose it.
    pub fn replace(&mut self, handle: Handle, nodes: Vec<Node>) -> Result<(), CaptureError> {
        let old = self.span(handle)?;
        if self.tree.span_nodes(old).is_none() {
            return Err(CaptureError::HandleInvalidated { name: self.name(handle) });
        }

        // Reaching `old.seq` also covers its ancestors, whose closure
        // includes it.
        let kept = reachable(self.tree, &nodes);
        if kept.contains(&old.seq) {
            return Err(CaptureError::CyclicReplace { name: self.name(handle) });
        }

        let new_len = len_u32(nodes.len());
        let removed = self.tree.splice(old.seq, old.range(), nodes);
        let detached: FxHashSet<SeqId> = reachable(self.tree, &removed)
            .into_iter()
            .filter(|id| !kept.contains(id))
            .collect();

        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(slot) = slot.as_mut().filter(|slot| slot.valid) else {
                continue;
            };
            let moved = if index == handle.index as usize {
                Some(Span::new(old.seq, old.start, new_len))
            } else {
                after_replace(slot.span, old, new_len)
            };
            match moved {
                Some(span) if !detached.contains(&span.seq) => slot.span = span,
                _ => slot.valid = false,
            }
        }

        tracing::trace!(
            handle = ?handle,
            removed = removed.len(),
            inserted = new_len,
            detached = detached.len(),
            "replaced capture"
        );
        Ok(())
    }

    /// Replace a capture's content with freshly allocated values.
    pub fn replace_values<I>(&mut self, handle: Handle, values: I) -> Result<(), CaptureError>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        // Validate before allocating so a rejected call leaves no garbage.
        self.content(handle)?;
        let nodes = values
            .into_iter()
            .map(|value| self.tree.alloc_value(&value.into()))
            .collect();
        self.replace(handle, nodes)
    }

    /// Replace a capture's content with a deep copy of another capture's.
    pub fn replace_with(&mut self, handle: Handle, source: Handle) -> Result<(), CaptureError> {
        self.content(handle)?;
        let original = self.content(source)?.to_vec();
        let copies = original.iter().map(|node| self.tree.deep_clone(node)).collect();
        self.replace(handle, copies)
    }

    /// Exchange the contents of two captures.
    ///
    /// Each handle follows its content. The captures may live in different
    /// sequences, but must not overlap and neither may contain the other's
    /// sequence.
    pub fn swap(&mut self, a: Handle, b: Handle) -> Result<(), CaptureError> {
        let (first, second) = (self.span(a)?, self.span(b)?);
        let (first_nodes, second_nodes) = match (
            self.tree.span_nodes(first),
            self.tree.span_nodes(second),
        ) {
            (Some(x), Some(y)) => (x.to_vec(), y.to_vec()),
            (None, _) => return Err(CaptureError::HandleInvalidated { name: self.name(a) }),
            (_, None) => return Err(CaptureError::HandleInvalidated { name: self.name(b) }),
        };

        let nested = reachable(self.tree, &first_nodes).contains(&second.seq)
            || reachable(self.tree, &second_nodes).contains(&first.seq);
        if first.overlaps(second) || nested {
            return Err(CaptureError::SwapOverlap { first: self.name(a), second: self.name(b) });
        }

        // Within one sequence, splice the later span first so the earlier
        // range is still addressed by its original indices.
        let (x, y, x_nodes, y_nodes) = if first.seq == second.seq
            && (second.start, second.end()) < (first.start, first.end())
        {
            (second, first, second_nodes, first_nodes)
        } else {
            (first, second, first_nodes, second_nodes)
        };
        if x.seq == y.seq {
            self.tree.splice(y.seq, y.range(), x_nodes);
            self.tree.splice(x.seq, x.range(), y_nodes);
        } else {
            self.tree.splice(x.seq, x.range(), y_nodes);
            self.tree.splice(y.seq, y.range(), x_nodes);
        }

        for slot in self.slots.iter_mut().flatten() {
            if !slot.valid {
                continue;
            }
            match after_swap(slot.span, x, y) {
                Some(span) => slot.span = span,
                None => slot.valid = false,
            }
        }

        tracing::trace!(first = ?a, second = ?b, "swapped captures");
        Ok(())
    }

    /// The tree being searched.
    pub fn tree(&self) -> &Tree {
        &*self.tree
    }

    /// Direct mutable access to the tree. Edits made here are not tracked;
    /// keep sequence lengths unchanged or stop using affected handles.
    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut *self.tree
    }

    /// The pattern that produced this match.
    pub fn pattern(&self) -> &CompiledPattern {
        self.pattern
    }
}

impl fmt::Debug for Match<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (index, slot) in self.slots.iter().enumerate() {
            if let Some(slot) = slot {
                let handle = Handle { match_id: self.id, index: len_u32(index) };
                if slot.valid {
                    map.entry(&self.name(handle), &slot.span);
                } else {
                    map.entry(&self.name(handle), &"<invalidated>");
                }
            }
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests;
