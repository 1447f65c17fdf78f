//! Pattern compilation — combinator trees to backtracking programs.
//!
//! Compilation runs two passes over the pattern:
//!
//! 1. **Declare**: collect capture names into the symbol table (name →
//!    [`SlotId`]) and reject names that could bind twice in one match.
//!    Alternatives of one alternation are mutually exclusive, so the same
//!    name may appear in several of them and they share a slot.
//! 2. **Emit**: lower each node to instructions, resolving backreferences
//!    against the complete table (forward references are fine) and checking
//!    anchor placement.
//!
//! # Instruction Set
//!
//! | Instruction | Effect |
//! |---|---|
//! | `Scalar(v)` | current node is the scalar `v`; advance |
//! | `Any` | a node exists; advance |
//! | `Enter` | current node is a sequence; descend to its first child |
//! | `Exit` | nested sequence fully consumed; resume after it |
//! | `End` | at end of the current sequence |
//! | `Open(s)` / `Close(s)` | mark start / bind span of capture `s` |
//! | `BackRef(s)` | nodes deep-equal to capture `s`; advance past them |
//! | `Check(i)` | predicate `i` holds for the current node; advance |
//! | `Split` | choice point: try `first`, fall back to `second` |
//! | `Jump(t)` | continue at `t` |
//! | `Match` | success |
//!
//! `Or(a, b, c)` becomes `Split(L1, L2); L1: a; Jump(E); L2: Split(L2', L3);
//! L2': b; Jump(E); L3: c; E:`. `More(p)` becomes `L: p; Split(L, next)`,
//! which is greedy and gives back one repetition per backtrack.

use std::fmt;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use twig_tree::Scalar;

use crate::errors::{CompileError, CompileErrorKind, PathStep, PatternPath};
use crate::pattern::{Pattern, PredicateFn};

/// Compiled index of a capture name.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SlotId(u32);

impl SlotId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// One matcher instruction. Jump targets are program indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Inst {
    Scalar(Scalar),
    Any,
    Enter,
    Exit,
    End,
    Open(SlotId),
    Close(SlotId),
    BackRef(SlotId),
    Check(u32),
    Split { first: u32, second: u32 },
    Jump(u32),
    Match,
}

/// An immutable, validated pattern ready for matching.
///
/// Cheap to share: checks are reference counted and the whole value is
/// `Send + Sync`, so one compiled pattern can serve many searches.
#[derive(Clone)]
pub struct CompiledPattern {
    program: Vec<Inst>,
    /// Capture names indexed by `SlotId`.
    names: Vec<String>,
    slots: FxHashMap<String, SlotId>,
    /// Predicate name and function, indexed by `Inst::Check`.
    checks: Vec<(String, PredicateFn)>,
}

impl CompiledPattern {
    /// Slot of a capture name, if the pattern declares it.
    pub fn slot(&self, name: &str) -> Option<SlotId> {
        self.slots.get(name).copied()
    }

    /// Name of a capture slot.
    ///
    /// # Panics
    /// Panics if `slot` does not come from this pattern.
    pub fn slot_name(&self, slot: SlotId) -> &str {
        &self.names[slot.index()]
    }

    /// Number of distinct capture names.
    pub fn slot_count(&self) -> usize {
        self.names.len()
    }

    /// Declared capture names in slot order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Length of the compiled program.
    pub fn instruction_count(&self) -> usize {
        self.program.len()
    }

    #[inline]
    pub(crate) fn program(&self) -> &[Inst] {
        &self.program
    }

    #[inline]
    pub(crate) fn check(&self, index: u32) -> (&str, &PredicateFn) {
        let (name, check) = &self.checks[index as usize];
        (name, check)
    }
}

impl fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let checks: Vec<&str> = self.checks.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("CompiledPattern")
            .field("names", &self.names)
            .field("checks", &checks)
            .field("program", &self.program)
            .finish()
    }
}

/// Compile `pattern` as the single top-level item.
///
/// The compiled pattern matches one or more consecutive children of any
/// sequence; a `Pattern::Sequence` root therefore matches a child that is
/// itself a sequence. Use [`compile_items`] to match a run of items.
pub fn compile(pattern: &Pattern) -> Result<CompiledPattern, CompileError> {
    compile_items(std::slice::from_ref(pattern))
}

/// Compile a top-level item list, matched against consecutive children.
pub fn compile_items(items: &[Pattern]) -> Result<CompiledPattern, CompileError> {
    let mut compiler = Compiler::default();
    if items.is_empty() {
        return Err(CompileError::new(CompileErrorKind::EmptyPattern, &compiler.path));
    }

    compiler.declare_items(items, &mut FxHashSet::default())?;
    compiler.emit_items(items, true)?;
    compiler.push(Inst::Match);

    tracing::debug!(
        slots = compiler.names.len(),
        checks = compiler.checks.len(),
        instructions = compiler.program.len(),
        "compiled pattern"
    );

    Ok(CompiledPattern {
        program: compiler.program,
        names: compiler.names,
        slots: compiler.slots,
        checks: compiler.checks,
    })
}

#[derive(Default)]
struct Compiler {
    program: Vec<Inst>,
    names: Vec<String>,
    slots: FxHashMap<String, SlotId>,
    checks: Vec<(String, PredicateFn)>,
    /// Location of the node being visited, for error reporting.
    path: PatternPath,
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "pattern programs and item lists are far below u32::MAX"
)]
fn index_u32(index: usize) -> u32 {
    index as u32
}

impl Compiler {
    fn error(&self, kind: CompileErrorKind) -> CompileError {
        CompileError::new(kind, &self.path)
    }

    /// Get or assign the slot for a capture name.
    fn intern(&mut self, name: &str) -> SlotId {
        if let Some(&slot) = self.slots.get(name) {
            return slot;
        }
        let slot = SlotId(index_u32(self.names.len()));
        self.names.push(name.to_owned());
        self.slots.insert(name.to_owned(), slot);
        slot
    }

    // Pass 1: declarations

    /// `live` holds the names already declared on the current match path.
    fn declare_items(
        &mut self,
        items: &[Pattern],
        live: &mut FxHashSet<String>,
    ) -> Result<(), CompileError> {
        for (i, item) in items.iter().enumerate() {
            self.path.push(PathStep::Item(index_u32(i)));
            self.declare(item, live)?;
            self.path.pop();
        }
        Ok(())
    }

    fn declare(
        &mut self,
        pattern: &Pattern,
        live: &mut FxHashSet<String>,
    ) -> Result<(), CompileError> {
        match pattern {
            Pattern::Named { name, inner } => {
                if name.is_empty() {
                    return Err(self.error(CompileErrorKind::EmptyCaptureName));
                }
                if !live.insert(name.clone()) {
                    return Err(
                        self.error(CompileErrorKind::DuplicateCapture { name: name.clone() })
                    );
                }
                self.intern(name);
                self.declare_items(inner, live)
            }
            Pattern::Sequence(items) => self.declare_items(items, live),
            Pattern::Alternation(alts) => {
                let before = live.clone();
                for (i, alt) in alts.iter().enumerate() {
                    let mut branch = before.clone();
                    self.path.push(PathStep::Alt(index_u32(i)));
                    self.declare(alt, &mut branch)?;
                    self.path.pop();
                    live.extend(branch);
                }
                Ok(())
            }
            Pattern::Repeat1(inner) => {
                self.path.push(PathStep::Repeat);
                self.declare(inner, live)?;
                self.path.pop();
                Ok(())
            }
            Pattern::Literal(_)
            | Pattern::Wildcard
            | Pattern::BackRef(_)
            | Pattern::Predicate { .. }
            | Pattern::EndAnchor => Ok(()),
        }
    }

    // Pass 2: code generation

    fn push(&mut self, inst: Inst) -> usize {
        self.program.push(inst);
        self.program.len() - 1
    }

    fn next_pc(&self) -> u32 {
        index_u32(self.program.len())
    }

    /// Emit an item list. With `anchored_tail`, the last item may be an end
    /// anchor.
    fn emit_items(&mut self, items: &[Pattern], anchored_tail: bool) -> Result<(), CompileError> {
        for (i, item) in items.iter().enumerate() {
            let anchor_ok = anchored_tail && i + 1 == items.len();
            self.path.push(PathStep::Item(index_u32(i)));
            self.emit(item, anchor_ok)?;
            self.path.pop();
        }
        Ok(())
    }

    fn emit(&mut self, pattern: &Pattern, anchor_ok: bool) -> Result<(), CompileError> {
        match pattern {
            Pattern::Literal(value) => {
                self.push(Inst::Scalar(value.clone()));
            }
            Pattern::Sequence(items) => {
                self.push(Inst::Enter);
                self.emit_items(items, true)?;
                self.push(Inst::Exit);
            }
            Pattern::Wildcard => {
                self.push(Inst::Any);
            }
            Pattern::Named { name, inner } => {
                let slot = self.intern(name);
                self.push(Inst::Open(slot));
                if inner.is_empty() {
                    self.push(Inst::Any);
                } else {
                    self.emit_items(inner, false)?;
                }
                self.push(Inst::Close(slot));
            }
            Pattern::Alternation(alts) => self.emit_alternation(alts)?,
            Pattern::Repeat1(inner) => {
                self.path.push(PathStep::Repeat);
                if matches!(**inner, Pattern::EndAnchor) {
                    return Err(self.error(CompileErrorKind::AnchorInRepeat));
                }
                let top = self.next_pc();
                self.emit(inner, false)?;
                self.path.pop();
                let after = self.next_pc() + 1;
                self.push(Inst::Split { first: top, second: after });
            }
            Pattern::BackRef(name) => {
                let Some(&slot) = self.slots.get(name.as_str()) else {
                    return Err(
                        self.error(CompileErrorKind::UndeclaredBackRef { name: name.clone() })
                    );
                };
                self.push(Inst::BackRef(slot));
            }
            Pattern::Predicate { name, check } => {
                let index = index_u32(self.checks.len());
                self.checks.push((name.clone(), Arc::clone(check)));
                self.push(Inst::Check(index));
            }
            Pattern::EndAnchor => {
                if !anchor_ok {
                    return Err(self.error(CompileErrorKind::MisplacedAnchor));
                }
                self.push(Inst::End);
            }
        }
        Ok(())
    }

    fn emit_alternation(&mut self, alts: &[Pattern]) -> Result<(), CompileError> {
        if alts.is_empty() {
            return Err(self.error(CompileErrorKind::EmptyAlternation));
        }

        let mut exits = Vec::with_capacity(alts.len() - 1);
        for (i, alt) in alts.iter().enumerate() {
            let is_last = i + 1 == alts.len();
            let split = if is_last {
                None
            } else {
                let first = self.next_pc() + 1;
                // `second` is patched once the alternative's length is known.
                Some(self.push(Inst::Split { first, second: 0 }))
            };

            self.path.push(PathStep::Alt(index_u32(i)));
            self.emit(alt, false)?;
            self.path.pop();

            if let Some(split) = split {
                exits.push(self.push(Inst::Jump(0)));
                let next_alt = self.next_pc();
                if let Inst::Split { second, .. } = &mut self.program[split] {
                    *second = next_alt;
                }
            }
        }

        let end = self.next_pc();
        for exit in exits {
            self.program[exit] = Inst::Jump(end);
        }
        Ok(())
    }
}
