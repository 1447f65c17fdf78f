//! Twig Patterns - regular expressions over nested sequences.
//!
//! This crate provides:
//! - The combinator pattern model (`Pattern`)
//! - The compiler that resolves capture names and lowers patterns to a
//!   backtracking program (`compile`, `CompiledPattern`)
//! - The matcher that runs that program at one position (`try_match`)
//! - The search driver that walks a whole tree (`search`, `Searcher`)
//! - Per-match capture handles that read and rewrite the tree (`Match`)
//!
//! # Pipeline
//!
//! ```text
//! Pattern → compile → CompiledPattern → Searcher ⇄ Matcher → Match → callback
//! ```
//!
//! The callback may edit the tree through its handles; the searcher keeps
//! walking the edited tree.
//!
//! # Example
//!
//! ```
//! use twig_pattern::{search, Flow, Pattern};
//! use twig_tree::{value, Tree};
//!
//! let mut tree = Tree::from_value(&value!([["name", "a"], ["num", 1], ["name", "b"]]));
//! let pattern = Pattern::seq(["name".into(), Pattern::named("thing")]).compile()?;
//!
//! search(&mut tree, &pattern, |m| {
//!     if let Some(thing) = m.get("thing") {
//!         let upper = m.first(thing)?.as_str().unwrap_or_default().to_uppercase();
//!         m.replace_values(thing, [upper])?;
//!     }
//!     Ok(Flow::Continue)
//! })?;
//!
//! assert_eq!(tree.to_value(), value!([["name", "A"], ["num", 1], ["name", "B"]]));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Cost
//!
//! Matching backtracks exhaustively. Nested repetitions whose continuation
//! keeps failing can take exponential time; bounding pattern shape is the
//! caller's job, the engine has no step limit or timeout.

mod capture;
mod compile;
mod errors;
mod matcher;
mod pattern;
mod search;

pub use capture::{Handle, Match, WHOLE_MATCH};
pub use compile::{compile, compile_items, CompiledPattern, SlotId};
pub use errors::{
    CaptureError, CompileError, CompileErrorKind, PathStep, PatternPath, PredicateError,
    SearchError,
};
pub use matcher::{try_match, Bindings, MatchOutcome};
pub use pattern::{Pattern, PredicateFn};
pub use search::{search, Flow, SearchConfig, SearchSummary, Searcher};
