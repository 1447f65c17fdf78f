//! Backtracking matcher.
//!
//! Runs a compiled program at one position of one sequence. Backtracking is
//! global: every `Split` pushes a choice point, and any later failure (in the
//! same alternative, in a nested sequence, or in items after a repetition)
//! resumes at the most recent choice point.
//!
//! # State
//!
//! - `choices`: stack of choice points (program counter, position, trail
//!   length)
//! - `trail`: undo log of capture and frame changes since the match began;
//!   backtracking unwinds it to the choice point's length, so a failed
//!   alternative never leaks bindings into the next one
//! - `frames`: enclosing sequences while inside `Enter`/`Exit`
//!
//! Captures are stored as spans into the live tree, so a backreference always
//! compares against current content.

use smallvec::SmallVec;
use twig_tree::{Node, SeqId, Span, Tree};

use crate::compile::{CompiledPattern, Inst, SlotId};
use crate::errors::PredicateError;

/// Spans bound by one successful match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bindings {
    whole: Span,
    slots: Vec<Option<Span>>,
}

impl Bindings {
    /// The span consumed by the whole pattern.
    #[inline]
    pub fn whole(&self) -> Span {
        self.whole
    }

    /// Span bound to a slot, if it was bound in this match.
    #[inline]
    pub fn slot(&self, slot: SlotId) -> Option<Span> {
        self.slots.get(slot.index()).copied().flatten()
    }

    /// Span bound to a capture name, if declared and bound.
    pub fn get(&self, pattern: &CompiledPattern, name: &str) -> Option<Span> {
        self.slot(pattern.slot(name)?)
    }

    pub(crate) fn slots(&self) -> &[Option<Span>] {
        &self.slots
    }
}

/// Result of one match attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched(Bindings),
    NoMatch,
}

/// Attempt to match `pattern` against the children of `seq`, starting at
/// child `start`.
///
/// Returns `Err` only when a predicate fails; that error is meant to abort
/// the surrounding search.
pub fn try_match(
    tree: &Tree,
    pattern: &CompiledPattern,
    seq: SeqId,
    start: usize,
) -> Result<MatchOutcome, PredicateError> {
    let mut machine = Machine::default();
    Ok(match machine.run(tree, pattern, seq, start)? {
        Some(bindings) => MatchOutcome::Matched(bindings),
        None => MatchOutcome::NoMatch,
    })
}

/// Where to resume after a nested sequence is fully matched.
#[derive(Copy, Clone, Debug)]
struct Frame {
    seq: SeqId,
    resume: usize,
}

#[derive(Copy, Clone, Debug)]
struct ChoicePoint {
    pc: usize,
    seq: SeqId,
    pos: usize,
    trail_len: usize,
}

/// One reversible state change.
#[derive(Copy, Clone, Debug)]
enum Undo {
    Binding { slot: SlotId, prev: Option<Span> },
    Start { slot: SlotId, prev: usize },
    Entered,
    Exited(Frame),
}

/// Reusable matcher state. Buffers keep their capacity across attempts.
#[derive(Default)]
pub(crate) struct Machine {
    choices: Vec<ChoicePoint>,
    trail: Vec<Undo>,
    frames: SmallVec<[Frame; 8]>,
    bindings: Vec<Option<Span>>,
    starts: Vec<usize>,
    /// Instructions executed over the machine's lifetime.
    steps: u64,
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "positions come from tree sequences, whose lengths fit u32"
)]
fn span(seq: SeqId, start: usize, end: usize) -> Span {
    Span::new(seq, start as u32, (end - start) as u32)
}

impl Machine {
    pub(crate) fn steps(&self) -> u64 {
        self.steps
    }

    fn reset(&mut self, slot_count: usize) {
        self.choices.clear();
        self.trail.clear();
        self.frames.clear();
        self.bindings.clear();
        self.bindings.resize(slot_count, None);
        self.starts.clear();
        self.starts.resize(slot_count, 0);
    }

    /// Run the program at `start`. `Ok(None)` means no match there.
    pub(crate) fn run(
        &mut self,
        tree: &Tree,
        pattern: &CompiledPattern,
        seq: SeqId,
        start: usize,
    ) -> Result<Option<Bindings>, PredicateError> {
        self.reset(pattern.slot_count());
        let program = pattern.program();

        let mut pc = 0;
        let mut cur = seq;
        let mut pos = start;

        loop {
            self.steps += 1;
            let next = match &program[pc] {
                Inst::Scalar(expected) => match tree.get(cur, pos) {
                    Some(Node::Scalar(found)) if found == expected => {
                        pos += 1;
                        Some(pc + 1)
                    }
                    _ => None,
                },
                Inst::Any => {
                    if pos < tree.len(cur) {
                        pos += 1;
                        Some(pc + 1)
                    } else {
                        None
                    }
                }
                Inst::Enter => match tree.get(cur, pos) {
                    Some(Node::Seq(child)) => {
                        self.frames.push(Frame { seq: cur, resume: pos + 1 });
                        self.trail.push(Undo::Entered);
                        cur = *child;
                        pos = 0;
                        Some(pc + 1)
                    }
                    _ => None,
                },
                Inst::Exit => {
                    if pos == tree.len(cur) {
                        self.frames.pop().map(|frame| {
                            self.trail.push(Undo::Exited(frame));
                            cur = frame.seq;
                            pos = frame.resume;
                            pc + 1
                        })
                    } else {
                        None
                    }
                }
                Inst::End => (pos == tree.len(cur)).then_some(pc + 1),
                Inst::Open(slot) => {
                    let prev = self.starts[slot.index()];
                    self.trail.push(Undo::Start { slot: *slot, prev });
                    self.starts[slot.index()] = pos;
                    Some(pc + 1)
                }
                Inst::Close(slot) => {
                    let prev = self.bindings[slot.index()];
                    self.trail.push(Undo::Binding { slot: *slot, prev });
                    self.bindings[slot.index()] =
                        Some(span(cur, self.starts[slot.index()], pos));
                    Some(pc + 1)
                }
                Inst::BackRef(slot) => {
                    let len = self.backref_len(tree, *slot, cur, pos);
                    len.map(|len| {
                        pos += len;
                        pc + 1
                    })
                }
                Inst::Check(index) => match tree.get(cur, pos) {
                    Some(node) => {
                        let (name, check) = pattern.check(*index);
                        let ok = check(tree.node_ref(node)).map_err(|message| PredicateError {
                            check: name.to_owned(),
                            message,
                        })?;
                        if ok {
                            pos += 1;
                            Some(pc + 1)
                        } else {
                            None
                        }
                    }
                    None => None,
                },
                Inst::Split { first, second } => {
                    self.choices.push(ChoicePoint {
                        pc: *second as usize,
                        seq: cur,
                        pos,
                        trail_len: self.trail.len(),
                    });
                    Some(*first as usize)
                }
                Inst::Jump(target) => Some(*target as usize),
                Inst::Match => {
                    return Ok(Some(Bindings {
                        whole: span(seq, start, pos),
                        slots: self.bindings.clone(),
                    }));
                }
            };

            match next {
                Some(next_pc) => pc = next_pc,
                None => match self.backtrack() {
                    Some(choice) => {
                        pc = choice.pc;
                        cur = choice.seq;
                        pos = choice.pos;
                    }
                    None => return Ok(None),
                },
            }
        }
    }

    /// Length consumed by a backreference at `pos`, or `None` if the
    /// capture is unbound or the nodes there differ.
    fn backref_len(&self, tree: &Tree, slot: SlotId, cur: SeqId, pos: usize) -> Option<usize> {
        let bound = self.bindings[slot.index()]?;
        let want = tree.span_nodes(bound)?;
        let have = tree.children(cur).get(pos..pos + want.len())?;
        tree.nodes_eq(want, have).then_some(want.len())
    }

    /// Pop the latest choice point and undo everything done after it.
    fn backtrack(&mut self) -> Option<ChoicePoint> {
        let choice = self.choices.pop()?;
        while self.trail.len() > choice.trail_len {
            let Some(undo) = self.trail.pop() else {
                break;
            };
            match undo {
                Undo::Binding { slot, prev } => self.bindings[slot.index()] = prev,
                Undo::Start { slot, prev } => self.starts[slot.index()] = prev,
                Undo::Entered => {
                    self.frames.pop();
                }
                Undo::Exited(frame) => self.frames.push(frame),
            }
        }
        Some(choice)
    }
}
