//! Twig Tree - nested sequence trees for pattern matching.
//!
//! This crate contains the data model the Twig pattern engine searches and
//! rewrites:
//! - `Scalar` atoms with total equality
//! - `Tree`, an arena of sequences addressed by `SeqId`
//! - `Node`, a child slot holding either a scalar or a sequence id
//! - `Span`, a `(sequence, start, len)` window used by captures
//! - `Value`, the owned nested form exchanged with producers and consumers
//!
//! # Design Philosophy
//!
//! - **Flatten Everything**: sequences live in one arena and children refer to
//!   them by `SeqId(u32)`, so a capture can name a position without holding a
//!   borrow into the tree.
//! - **Structural Equality**: `Tree::deep_eq` compares shape and scalars,
//!   never ids. `Node`'s derived `PartialEq` is shallow and only useful inside
//!   one arena.
//! - **Stack Safety**: recursive walks go through [`ensure_sufficient_stack`]
//!   so deeply nested input cannot overflow the thread stack.
//!
//! # Example
//!
//! ```
//! use twig_tree::{value, Tree};
//!
//! let tree = Tree::from_value(&value!([1, 2, [3, "mak", "bar"]]));
//! assert_eq!(tree.len(tree.root()), 3);
//! assert_eq!(tree.to_value(), value!([1, 2, [3, "mak", "bar"]]));
//! ```

mod ids;
mod scalar;
mod span;
mod stack;
mod tree;
mod value;

pub use ids::SeqId;
pub use scalar::Scalar;
pub use span::Span;
pub use stack::ensure_sufficient_stack;
pub use tree::{Node, NodeRef, Tree};
pub use value::Value;

/// Build a [`Value`] from a JSON-like literal.
///
/// Brackets become sequences; `null` becomes [`Scalar::Null`]; any other
/// token goes through `Value::from`.
///
/// ```
/// use twig_tree::{value, Scalar, Value};
///
/// let v = value!(["if", null, [true, 2]]);
/// assert_eq!(
///     v,
///     Value::Seq(vec![
///         Value::from("if"),
///         Value::Scalar(Scalar::Null),
///         Value::Seq(vec![Value::from(true), Value::from(2)]),
///     ])
/// );
/// ```
#[macro_export]
macro_rules! value {
    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Seq(vec![$($crate::value!($elem)),*])
    };
    (null) => {
        $crate::Value::Scalar($crate::Scalar::Null)
    };
    ($lit:expr) => {
        $crate::Value::from($lit)
    };
}

/// Convert an arena length to a `u32` index.
///
/// # Panics
/// Panics if `value` exceeds `u32::MAX`; trees of that size are unsupported.
#[inline]
pub(crate) fn to_u32(value: usize, what: &str) -> u32 {
    match u32::try_from(value) {
        Ok(v) => v,
        Err(_) => panic!("too many {what}: {value} exceeds u32::MAX"),
    }
}
