//! Error types for pattern compilation, matching, and rewriting.
//!
//! # Categories
//!
//! - [`CompileError`]: static problems in a pattern, raised only by the
//!   compiler. Carries a [`PatternPath`] to the offending node.
//! - [`PredicateError`]: a user check failed while matching; aborts the
//!   whole search.
//! - [`CaptureError`]: misuse of a capture handle inside a match callback.
//! - [`SearchError`]: everything that can end a search early.
//!
//! "No match at this position" is not an error; the matcher handles it
//! internally by backtracking.

use std::fmt;

// Pattern paths

/// One step from a parent pattern node to a child.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathStep {
    /// Item at index in an item list (top level, nested sequence, or a
    /// named span).
    Item(u32),
    /// Alternative at index in an alternation.
    Alt(u32),
    /// The body of a one-or-more repetition.
    Repeat,
}

/// Location of a node inside a pattern, from the top-level item list down.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PatternPath(Vec<PathStep>);

impl PatternPath {
    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    pub(crate) fn push(&mut self, step: PathStep) {
        self.0.push(step);
    }

    pub(crate) fn pop(&mut self) {
        self.0.pop();
    }
}

impl From<Vec<PathStep>> for PatternPath {
    fn from(steps: Vec<PathStep>) -> Self {
        PatternPath(steps)
    }
}

impl fmt::Display for PatternPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<root>");
        }
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " / ")?;
            }
            match step {
                PathStep::Item(n) => write!(f, "item {n}")?,
                PathStep::Alt(n) => write!(f, "alt {n}")?,
                PathStep::Repeat => write!(f, "repeat")?,
            }
        }
        Ok(())
    }
}

// Compile errors

/// What is wrong with a pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// A capture name is declared twice on one match path.
    DuplicateCapture { name: String },
    /// A backreference names a capture that is never declared.
    UndeclaredBackRef { name: String },
    /// An end anchor that is not the last item of a sequence.
    MisplacedAnchor,
    /// A repetition whose body is an end anchor and so consumes nothing.
    AnchorInRepeat,
    /// An alternation with no alternatives can never match.
    EmptyAlternation,
    /// A pattern with no items.
    EmptyPattern,
    /// A capture declared with an empty name.
    EmptyCaptureName,
}

impl fmt::Display for CompileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateCapture { name } => {
                write!(f, "capture `{name}` is declared more than once")
            }
            Self::UndeclaredBackRef { name } => {
                write!(f, "backreference to undeclared capture `{name}`")
            }
            Self::MisplacedAnchor => {
                write!(f, "end anchor must be the last item of a sequence")
            }
            Self::AnchorInRepeat => write!(f, "repetition of an end anchor matches nothing"),
            Self::EmptyAlternation => write!(f, "alternation has no alternatives"),
            Self::EmptyPattern => write!(f, "pattern has no items"),
            Self::EmptyCaptureName => write!(f, "capture name is empty"),
        }
    }
}

/// A static error found while compiling a pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub path: PatternPath,
}

impl CompileError {
    pub(crate) fn new(kind: CompileErrorKind, path: &PatternPath) -> Self {
        CompileError { kind, path: path.clone() }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at {})", self.kind, self.path)
    }
}

impl std::error::Error for CompileError {}

// Runtime errors

/// A user predicate reported failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PredicateError {
    /// Name the check was declared with.
    pub check: String,
    pub message: String,
}

impl fmt::Display for PredicateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "check `{}` failed: {}", self.check, self.message)
    }
}

impl std::error::Error for PredicateError {}

/// Misuse of a capture handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureError {
    /// `first()` on a capture that currently spans zero nodes.
    EmptyCapture { name: String },
    /// The handle's span was invalidated by an earlier overlapping edit.
    HandleInvalidated { name: String },
    /// The handle belongs to a different match.
    ForeignHandle,
    /// `swap` of two spans that overlap in the same sequence.
    SwapOverlap { first: String, second: String },
    /// `replace` with nodes that reach the capture's own sequence, which
    /// would make the tree cyclic.
    CyclicReplace { name: String },
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCapture { name } => write!(f, "capture `{name}` is empty"),
            Self::HandleInvalidated { name } => {
                write!(f, "capture `{name}` was invalidated by an overlapping edit")
            }
            Self::ForeignHandle => write!(f, "handle does not belong to this match"),
            Self::SwapOverlap { first, second } => {
                write!(f, "cannot swap overlapping captures `{first}` and `{second}`")
            }
            Self::CyclicReplace { name } => {
                write!(f, "replacement for capture `{name}` contains its own sequence")
            }
        }
    }
}

impl std::error::Error for CaptureError {}

/// Why a search stopped before visiting the whole tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchError {
    Predicate(PredicateError),
    Capture(CaptureError),
    /// Raised by the match callback itself.
    Callback(String),
}

impl SearchError {
    /// Abort a search from inside the callback with a message.
    pub fn callback(message: impl Into<String>) -> Self {
        SearchError::Callback(message.into())
    }
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Predicate(e) => write!(f, "{e}"),
            Self::Capture(e) => write!(f, "{e}"),
            Self::Callback(message) => write!(f, "match callback failed: {message}"),
        }
    }
}

impl std::error::Error for SearchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Predicate(e) => Some(e),
            Self::Capture(e) => Some(e),
            Self::Callback(_) => None,
        }
    }
}

impl From<PredicateError> for SearchError {
    fn from(e: PredicateError) -> Self {
        SearchError::Predicate(e)
    }
}

impl From<CaptureError> for SearchError {
    fn from(e: CaptureError) -> Self {
        SearchError::Capture(e)
    }
}

#[cfg(test)]
mod tests;
