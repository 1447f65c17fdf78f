//! The combinator pattern model.
//!
//! Patterns are plain immutable trees built with the constructor functions on
//! [`Pattern`]. Nothing is validated here; [`Pattern::compile`] does that.
//!
//! # Variants
//!
//! | Constructor | Matches |
//! |---|---|
//! | `literal(v)` / `"x".into()` | a scalar equal to `v` |
//! | `seq([..])` / `vec![..].into()` | a sequence node fully matched by the items |
//! | `any()` | any single node |
//! | `named(n)`, `named_with(n, p)`, `named_span(n, [..])` | its inner span, recorded as `n` |
//! | `or([..])` | the first alternative that lets the whole pattern succeed |
//! | `more(p)` | one or more consecutive `p`, greedy |
//! | `backref(n)` | nodes deep-equal to what `n` captured |
//! | `check(name, f)` | one node for which `f` holds |
//! | `end()` | the end of the enclosing sequence |

use std::fmt;
use std::sync::Arc;

use twig_tree::{NodeRef, Scalar};

use crate::{compile, CompileError, CompiledPattern};

/// A node check. Returns `Err` to abort the search.
pub type PredicateFn = Arc<dyn Fn(NodeRef<'_>) -> Result<bool, String> + Send + Sync>;

/// One node of a pattern.
#[derive(Clone)]
pub enum Pattern {
    Literal(Scalar),
    /// A nested sequence: the node must be a sequence whose children are
    /// matched completely by these items.
    Sequence(Vec<Pattern>),
    Wildcard,
    /// A capture over a span of one or more items. An empty `inner` behaves
    /// as a single wildcard.
    Named {
        name: String,
        inner: Vec<Pattern>,
    },
    Alternation(Vec<Pattern>),
    Repeat1(Box<Pattern>),
    BackRef(String),
    Predicate {
        name: String,
        check: PredicateFn,
    },
    EndAnchor,
}

impl Pattern {
    /// Match a scalar equal to `value`.
    pub fn literal(value: impl Into<Scalar>) -> Self {
        Pattern::Literal(value.into())
    }

    /// Match any single node.
    pub fn any() -> Self {
        Pattern::Wildcard
    }

    /// Capture any single node as `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Pattern::Named { name: name.into(), inner: vec![Pattern::Wildcard] }
    }

    /// Capture whatever `inner` matches as `name`.
    pub fn named_with(name: impl Into<String>, inner: impl Into<Pattern>) -> Self {
        Pattern::Named { name: name.into(), inner: vec![inner.into()] }
    }

    /// Capture the consecutive nodes matched by `items` as `name`.
    pub fn named_span<I, T>(name: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Pattern>,
    {
        let mut inner: Vec<Pattern> = items.into_iter().map(Into::into).collect();
        if inner.is_empty() {
            inner.push(Pattern::Wildcard);
        }
        Pattern::Named { name: name.into(), inner }
    }

    /// Try each alternative in order.
    pub fn or<I, T>(alternatives: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Pattern>,
    {
        Pattern::Alternation(alternatives.into_iter().map(Into::into).collect())
    }

    /// One or more consecutive matches of `inner`, as many as possible.
    ///
    /// Nesting repetitions whose continuation fails can backtrack
    /// exponentially; keep such patterns small.
    pub fn more(inner: impl Into<Pattern>) -> Self {
        Pattern::Repeat1(Box::new(inner.into()))
    }

    /// Match nodes deep-equal to the content captured as `name`.
    pub fn backref(name: impl Into<String>) -> Self {
        Pattern::BackRef(name.into())
    }

    /// Match one node for which `check` returns true.
    pub fn check<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(NodeRef<'_>) -> bool + Send + Sync + 'static,
    {
        let check: PredicateFn =
            Arc::new(move |node: NodeRef<'_>| -> Result<bool, String> { Ok(check(node)) });
        Pattern::Predicate { name: name.into(), check }
    }

    /// Like [`Pattern::check`], but the check may fail; a failure aborts the
    /// search with a `PredicateError`.
    pub fn try_check<F, E>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(NodeRef<'_>) -> Result<bool, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        let check: PredicateFn = Arc::new(move |node: NodeRef<'_>| -> Result<bool, String> {
            check(node).map_err(|e| e.to_string())
        });
        Pattern::Predicate { name: name.into(), check }
    }

    /// Match only at the end of the enclosing sequence.
    pub fn end() -> Self {
        Pattern::EndAnchor
    }

    /// Match a nested sequence fully.
    pub fn seq<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Pattern>,
    {
        Pattern::Sequence(items.into_iter().map(Into::into).collect())
    }

    /// Compile this pattern as the single top-level item.
    ///
    /// A [`Pattern::seq`] root therefore matches one child that is itself a
    /// sequence. To match a run of sibling items, pass the items to
    /// [`compile_items`](crate::compile_items) instead.
    ///
    /// ```
    /// use twig_pattern::{compile_items, try_match, MatchOutcome, Pattern};
    /// use twig_tree::{value, Tree};
    ///
    /// let tree = Tree::from_value(&value!(["a", "b", ["a", "b"]]));
    /// let items = [Pattern::from("a"), Pattern::from("b")];
    ///
    /// let nested = Pattern::seq(items.clone()).compile()?;
    /// assert!(matches!(try_match(&tree, &nested, tree.root(), 0)?, MatchOutcome::NoMatch));
    /// assert!(matches!(try_match(&tree, &nested, tree.root(), 2)?, MatchOutcome::Matched(_)));
    ///
    /// let run = compile_items(&items)?;
    /// assert!(matches!(try_match(&tree, &run, tree.root(), 0)?, MatchOutcome::Matched(_)));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn compile(&self) -> Result<CompiledPattern, CompileError> {
        compile(self)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Literal(s) => write!(f, "{s:?}"),
            Pattern::Sequence(items) => f.debug_list().entries(items).finish(),
            Pattern::Wildcard => write!(f, "Any"),
            Pattern::Named { name, inner } => {
                f.debug_tuple("Named").field(name).field(inner).finish()
            }
            Pattern::Alternation(alts) => f.debug_tuple("Or").field(alts).finish(),
            Pattern::Repeat1(inner) => f.debug_tuple("More").field(inner).finish(),
            Pattern::BackRef(name) => f.debug_tuple("Ref").field(name).finish(),
            Pattern::Predicate { name, .. } => f.debug_tuple("Check").field(name).finish(),
            Pattern::EndAnchor => write!(f, "End"),
        }
    }
}

impl From<Scalar> for Pattern {
    fn from(value: Scalar) -> Self {
        Pattern::Literal(value)
    }
}

impl From<&str> for Pattern {
    fn from(value: &str) -> Self {
        Pattern::Literal(value.into())
    }
}

impl From<String> for Pattern {
    fn from(value: String) -> Self {
        Pattern::Literal(value.into())
    }
}

impl From<i64> for Pattern {
    fn from(value: i64) -> Self {
        Pattern::Literal(value.into())
    }
}

impl From<i32> for Pattern {
    fn from(value: i32) -> Self {
        Pattern::Literal(value.into())
    }
}

impl From<bool> for Pattern {
    fn from(value: bool) -> Self {
        Pattern::Literal(value.into())
    }
}

impl From<Vec<Pattern>> for Pattern {
    fn from(items: Vec<Pattern>) -> Self {
        Pattern::Sequence(items)
    }
}
