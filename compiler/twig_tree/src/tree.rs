//! The sequence arena.
//!
//! A [`Tree`] stores every sequence as a `Vec<Node>` indexed by [`SeqId`].
//! Children that are themselves sequences hold the child's id, so editing a
//! sequence never moves any other sequence and ids stay stable for the life
//! of the tree.
//!
//! # Index Spaces
//!
//! - `seqs`: indexed by [`SeqId`]
//! - child positions: `u32` offsets into one sequence, used by [`Span`]
//!
//! Sequences that become unreachable after an edit are left in the arena;
//! [`Tree::to_value`] only follows ids reachable from the root.

use std::ops::Range;

use crate::{ensure_sufficient_stack, to_u32, Scalar, SeqId, Span, Value};

/// One child slot of a sequence.
///
/// The derived equality is shallow: two `Seq` nodes are equal only if they
/// name the same arena entry. Use [`Tree::deep_eq`] for structural equality.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Node {
    Scalar(Scalar),
    Seq(SeqId),
}

impl Node {
    #[inline]
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(s) => Some(s),
            Node::Seq(_) => None,
        }
    }

    #[inline]
    pub fn as_seq(&self) -> Option<SeqId> {
        match self {
            Node::Seq(id) => Some(*id),
            Node::Scalar(_) => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Scalar::as_str)
    }

    #[inline]
    pub fn is_seq(&self) -> bool {
        matches!(self, Node::Seq(_))
    }
}

impl From<Scalar> for Node {
    fn from(value: Scalar) -> Self {
        Node::Scalar(value)
    }
}

impl From<SeqId> for Node {
    fn from(value: SeqId) -> Self {
        Node::Seq(value)
    }
}

/// Arena of sequences with a designated root.
#[derive(Clone, Debug)]
pub struct Tree {
    /// Children of each sequence, indexed by `SeqId`.
    seqs: Vec<Vec<Node>>,
    root: SeqId,
}

impl Tree {
    /// Create a tree whose root is an empty sequence.
    pub fn new() -> Self {
        Tree {
            seqs: vec![Vec::new()],
            root: SeqId::new(0),
        }
    }

    /// Load an owned value into a fresh arena.
    ///
    /// A scalar value becomes the single child of the root sequence, since
    /// matching always happens inside a sequence.
    pub fn from_value(value: &Value) -> Self {
        let mut tree = Tree { seqs: Vec::new(), root: SeqId::new(0) };
        tree.root = match value {
            Value::Seq(items) => tree.alloc_values(items),
            Value::Scalar(s) => tree.alloc(vec![Node::Scalar(s.clone())]),
        };
        tree
    }

    #[inline]
    pub fn root(&self) -> SeqId {
        self.root
    }

    /// Number of sequences in the arena, including unreachable ones.
    #[inline]
    pub fn seq_count(&self) -> usize {
        self.seqs.len()
    }

    /// Whether `id` names a sequence of this arena.
    #[inline]
    pub fn contains(&self, id: SeqId) -> bool {
        id.index() < self.seqs.len()
    }

    /// Allocate a new sequence, returning its id.
    pub fn alloc(&mut self, children: Vec<Node>) -> SeqId {
        let id = SeqId::new(to_u32(self.seqs.len(), "sequences"));
        self.seqs.push(children);
        id
    }

    /// Allocate the sequences of a value, returning the node that refers to it.
    pub fn alloc_value(&mut self, value: &Value) -> Node {
        match value {
            Value::Scalar(s) => Node::Scalar(s.clone()),
            Value::Seq(items) => Node::Seq(self.alloc_values(items)),
        }
    }

    fn alloc_values(&mut self, items: &[Value]) -> SeqId {
        ensure_sufficient_stack(|| {
            let children = items.iter().map(|item| self.alloc_value(item)).collect();
            self.alloc(children)
        })
    }

    /// Children of a sequence.
    ///
    /// # Panics
    /// Panics if `id` does not belong to this arena.
    #[inline]
    pub fn children(&self, id: SeqId) -> &[Node] {
        &self.seqs[id.index()]
    }

    /// Mutable access to the children of a sequence. The length is fixed;
    /// use [`Tree::splice`] to insert or remove children.
    #[inline]
    pub fn children_mut(&mut self, id: SeqId) -> &mut [Node] {
        &mut self.seqs[id.index()]
    }

    #[inline]
    pub fn len(&self, id: SeqId) -> usize {
        self.seqs[id.index()].len()
    }

    #[inline]
    pub fn is_empty(&self, id: SeqId) -> bool {
        self.seqs[id.index()].is_empty()
    }

    /// Child at `index`, or `None` past the end.
    #[inline]
    pub fn get(&self, id: SeqId, index: usize) -> Option<&Node> {
        self.seqs[id.index()].get(index)
    }

    /// The nodes covered by a span, or `None` if the span runs past the end
    /// of its sequence (e.g. after an untracked edit).
    #[inline]
    pub fn span_nodes(&self, span: Span) -> Option<&[Node]> {
        self.seqs.get(span.seq.index())?.get(span.range())
    }

    /// Replace the children in `range` with `nodes`, returning the removed
    /// children.
    ///
    /// # Panics
    /// Panics if `range` is out of bounds for the sequence.
    pub fn splice(&mut self, id: SeqId, range: Range<usize>, nodes: Vec<Node>) -> Vec<Node> {
        self.seqs[id.index()].splice(range, nodes).collect()
    }

    /// Borrow a node together with this tree for inspection.
    #[inline]
    pub fn node_ref<'t>(&'t self, node: &'t Node) -> NodeRef<'t> {
        NodeRef { tree: self, node }
    }

    /// Structural equality of two nodes of this tree.
    pub fn deep_eq(&self, a: &Node, b: &Node) -> bool {
        match (a, b) {
            (Node::Scalar(x), Node::Scalar(y)) => x == y,
            (Node::Seq(x), Node::Seq(y)) => {
                x == y || self.nodes_eq(self.children(*x), self.children(*y))
            }
            _ => false,
        }
    }

    /// Element-wise structural equality of two node lists.
    pub fn nodes_eq(&self, a: &[Node], b: &[Node]) -> bool {
        a.len() == b.len()
            && ensure_sufficient_stack(|| a.iter().zip(b).all(|(x, y)| self.deep_eq(x, y)))
    }

    /// Copy a node, allocating fresh sequences for everything below it.
    pub fn deep_clone(&mut self, node: &Node) -> Node {
        match node {
            Node::Scalar(s) => Node::Scalar(s.clone()),
            Node::Seq(id) => {
                let value = self.seq_to_value(*id);
                self.alloc_value(&value)
            }
        }
    }

    /// Convert the tree reachable from the root into an owned value.
    pub fn to_value(&self) -> Value {
        self.seq_to_value(self.root)
    }

    /// Convert one sequence into an owned value.
    pub fn seq_to_value(&self, id: SeqId) -> Value {
        ensure_sufficient_stack(|| {
            Value::Seq(self.children(id).iter().map(|n| self.node_to_value(n)).collect())
        })
    }

    /// Convert one node into an owned value.
    pub fn node_to_value(&self, node: &Node) -> Value {
        match node {
            Node::Scalar(s) => Value::Scalar(s.clone()),
            Node::Seq(id) => self.seq_to_value(*id),
        }
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

/// A node borrowed together with its tree.
///
/// This is what predicates receive: it can walk into nested sequences
/// without exposing mutation.
#[derive(Copy, Clone, Debug)]
pub struct NodeRef<'t> {
    tree: &'t Tree,
    node: &'t Node,
}

impl<'t> NodeRef<'t> {
    #[inline]
    pub fn node(self) -> &'t Node {
        self.node
    }

    #[inline]
    pub fn tree(self) -> &'t Tree {
        self.tree
    }

    #[inline]
    pub fn scalar(self) -> Option<&'t Scalar> {
        self.node.as_scalar()
    }

    #[inline]
    pub fn as_str(self) -> Option<&'t str> {
        self.node.as_str()
    }

    /// True for the null scalar.
    #[inline]
    pub fn is_null(self) -> bool {
        matches!(self.node, Node::Scalar(Scalar::Null))
    }

    /// Children, if this node is a sequence.
    #[inline]
    pub fn children(self) -> Option<&'t [Node]> {
        self.node.as_seq().map(|id| self.tree.children(id))
    }

    /// Child at `index`, if this node is a sequence long enough.
    pub fn child(self, index: usize) -> Option<NodeRef<'t>> {
        let node = self.children()?.get(index)?;
        Some(NodeRef { tree: self.tree, node })
    }

    /// The leading string scalar of a sequence, i.e. its tuple tag.
    pub fn tag(self) -> Option<&'t str> {
        self.child(0)?.as_str()
    }

    pub fn to_value(self) -> Value {
        self.tree.node_to_value(self.node)
    }
}
