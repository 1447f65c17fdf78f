use super::*;
use crate::{compile_items, try_match, MatchOutcome, Pattern};
use pretty_assertions::assert_eq;
use twig_tree::value;

/// Helper: match `items` at `start` of the root and hand the match to `f`.
fn with_match<R>(
    tree: &mut Tree,
    items: &[Pattern],
    start: usize,
    f: impl FnOnce(&mut Match<'_>) -> R,
) -> R {
    let pattern = compile_items(items).unwrap();
    let root = tree.root();
    let MatchOutcome::Matched(bindings) = try_match(tree, &pattern, root, start).unwrap() else {
        panic!("pattern did not match at {start}");
    };
    let mut m = Match::new(1, tree, &pattern, &bindings);
    f(&mut m)
}

fn three_captures() -> [Pattern; 3] {
    [Pattern::named("a"), Pattern::named("b"), Pattern::named("c")]
}

// Lookup

#[test]
fn test_lookup_by_name() {
    let mut tree = Tree::from_value(&value!([1, 2, 3]));
    with_match(&mut tree, &three_captures(), 0, |m| {
        assert_eq!(m.names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(m.get(WHOLE_MATCH), Some(m.whole()));
        assert_eq!(m.get("nope"), None);
        assert_eq!(m.span(m.get("b").unwrap()).unwrap().range(), 1..2);
        assert_eq!(m.span(m.whole()).unwrap().range(), 0..3);
        assert_eq!(m.id(), 1);
    });
}

#[test]
fn test_unbound_capture_is_absent() {
    let mut tree = Tree::from_value(&value!(["a"]));
    let items = [Pattern::or([Pattern::named_with("x", "a"), Pattern::named("y")])];
    with_match(&mut tree, &items, 0, |m| {
        assert!(m.get("x").is_some());
        assert_eq!(m.get("y"), None);
        assert_eq!(m.names().collect::<Vec<_>>(), vec!["x"]);
    });
}

#[test]
fn test_reading_content() {
    let mut tree = Tree::from_value(&value!([["name", "f"], 2]));
    let items = [Pattern::seq(["name".into(), Pattern::named("n")]), Pattern::named("k")];
    with_match(&mut tree, &items, 0, |m| {
        let n = m.get("n").unwrap();
        assert_eq!(m.first(n).unwrap().as_str(), Some("f"));
        assert_eq!(m.content(n).unwrap().len(), 1);
        assert_eq!(m.to_values(m.whole()).unwrap(), vec![value!(["name", "f"]), value!(2)]);
    });
}

// Replacement

#[test]
fn test_replace_shifts_later_handles() {
    let mut tree = Tree::from_value(&value!([1, 2, 3]));
    with_match(&mut tree, &three_captures(), 0, |m| {
        let (a, b, c) = (m.get("a").unwrap(), m.get("b").unwrap(), m.get("c").unwrap());
        m.replace_values(a, [10, 11]).unwrap();

        assert_eq!(m.to_values(a).unwrap(), vec![value!(10), value!(11)]);
        assert_eq!(m.to_values(b).unwrap(), vec![value!(2)]);
        assert_eq!(m.to_values(c).unwrap(), vec![value!(3)]);
        assert!(!m.is_valid(m.whole()));
    });
    assert_eq!(tree.to_value(), value!([10, 11, 2, 3]));
}

#[test]
fn test_replace_with_nothing_leaves_empty_capture() {
    let mut tree = Tree::from_value(&value!([1, 2, 3]));
    with_match(&mut tree, &three_captures(), 0, |m| {
        let b = m.get("b").unwrap();
        m.replace(b, Vec::new()).unwrap();
        assert_eq!(
            m.first(b).unwrap_err(),
            CaptureError::EmptyCapture { name: "b".into() }
        );
        assert_eq!(m.to_values(m.get("c").unwrap()).unwrap(), vec![value!(3)]);
    });
    assert_eq!(tree.to_value(), value!([1, 3]));
}

#[test]
fn test_replace_invalidates_inner_handles() {
    let mut tree = Tree::from_value(&value!([1, 2, 3]));
    let items = [Pattern::named_span("outer", [Pattern::named("inner"), Pattern::any()])];
    with_match(&mut tree, &items, 0, |m| {
        let (outer, inner) = (m.get("outer").unwrap(), m.get("inner").unwrap());
        m.replace_values(outer, ["x"]).unwrap();
        assert!(!m.is_valid(inner));
        assert_eq!(
            m.span(inner).unwrap_err(),
            CaptureError::HandleInvalidated { name: "inner".into() }
        );
        assert_eq!(
            m.replace_values(inner, ["y"]).unwrap_err(),
            CaptureError::HandleInvalidated { name: "inner".into() }
        );
        assert!(m.is_valid(outer));
    });
    assert_eq!(tree.to_value(), value!(["x", 3]));
}

#[test]
fn test_replace_invalidates_enclosing_handles() {
    let mut tree = Tree::from_value(&value!([1, 2, 3]));
    let items = [Pattern::named_span("outer", [Pattern::named("inner"), Pattern::any()])];
    with_match(&mut tree, &items, 0, |m| {
        let (outer, inner) = (m.get("outer").unwrap(), m.get("inner").unwrap());
        m.replace_values(inner, ["x", "y", "z"]).unwrap();
        assert_eq!(m.span(inner).unwrap().range(), 0..3);
        assert_eq!(
            m.span(outer).unwrap_err(),
            CaptureError::HandleInvalidated { name: "outer".into() }
        );
        assert_eq!(
            m.content(m.whole()).unwrap_err(),
            CaptureError::HandleInvalidated { name: WHOLE_MATCH.into() }
        );
    });
    assert_eq!(tree.to_value(), value!(["x", "y", "z", 2, 3]));
}

#[test]
fn test_replace_inside_match_invalidates_whole() {
    let mut tree = Tree::from_value(&value!(["a", "b", "c"]));
    let items = [Pattern::any(), Pattern::named("x"), Pattern::any()];
    with_match(&mut tree, &items, 0, |m| {
        let x = m.get("x").unwrap();
        m.replace_values(x, ["Z", "Z"]).unwrap();
        assert_eq!(m.to_values(x).unwrap(), vec![value!("Z"), value!("Z")]);
        assert!(matches!(
            m.content(m.whole()),
            Err(CaptureError::HandleInvalidated { .. })
        ));
    });
    assert_eq!(tree.to_value(), value!(["a", "Z", "Z", "c"]));
}

#[test]
fn test_replace_rejects_own_sequence() {
    let mut tree = Tree::from_value(&value!(["a", ["b"]]));
    let root = tree.root();
    let Some(Node::Seq(inner)) = tree.get(root, 1).cloned() else {
        panic!("expected a nested sequence");
    };
    let pattern = compile_items(&[Pattern::literal("b")]).unwrap();
    let MatchOutcome::Matched(bindings) = try_match(&tree, &pattern, inner, 0).unwrap() else {
        panic!("expected a match");
    };

    let mut m = Match::new(1, &mut tree, &pattern, &bindings);
    let whole = m.whole();
    // The root is an ancestor, the inner sequence is the capture's own.
    for target in [root, inner] {
        assert_eq!(
            m.replace(whole, vec![Node::Seq(target)]).unwrap_err(),
            CaptureError::CyclicReplace { name: WHOLE_MATCH.into() }
        );
    }
    assert!(m.is_valid(whole));
    assert_eq!(tree.to_value(), value!(["a", ["b"]]));
}

#[test]
fn test_unwrapping_keeps_moved_sequences_and_drops_detached_ones() {
    let mut tree = Tree::from_value(&value!([["wrap", ["x", 1]]]));
    let items = [Pattern::seq([
        "wrap".into(),
        Pattern::named_with("body", Pattern::seq(["x".into(), Pattern::named("num")])),
    ])];
    with_match(&mut tree, &items, 0, |m| {
        let (body, num) = (m.get("body").unwrap(), m.get("num").unwrap());
        let moved = m.content(body).unwrap().to_vec();
        m.replace(m.whole(), moved).unwrap();

        // `body` lived in the detached "wrap" sequence; `num` lives in the
        // sequence that was moved up.
        assert!(!m.is_valid(body));
        assert_eq!(m.to_values(num).unwrap(), vec![value!(1)]);
        assert_eq!(m.span(m.whole()).unwrap().range(), 0..1);
    });
    assert_eq!(tree.to_value(), value!([["x", 1]]));
}

#[test]
fn test_replace_with_copies_content() {
    let mut tree = Tree::from_value(&value!([[1], [2]]));
    with_match(&mut tree, &[Pattern::named("a"), Pattern::named("b")], 0, |m| {
        let (a, b) = (m.get("a").unwrap(), m.get("b").unwrap());
        m.replace_with(a, b).unwrap();
        let copy = m.first(a).unwrap().node().as_seq();
        let source = m.first(b).unwrap().node().as_seq();
        assert_ne!(copy, source);
    });
    assert_eq!(tree.to_value(), value!([[2], [2]]));
}

// Swapping

#[test]
fn test_swap_in_one_sequence_is_self_inverse() {
    let mut tree = Tree::from_value(&value!([1, 2, 3, 4]));
    let items = [
        Pattern::named_span("a", [Pattern::any(), Pattern::any()]),
        Pattern::named("mid"),
        Pattern::named("b"),
    ];
    with_match(&mut tree, &items, 0, |m| {
        let (a, b, mid) = (m.get("a").unwrap(), m.get("b").unwrap(), m.get("mid").unwrap());

        m.swap(a, b).unwrap();
        assert_eq!(m.to_values(m.whole()).unwrap(), vec![value!(4), value!(3), value!(1), value!(2)]);
        assert_eq!(m.span(a).unwrap().range(), 2..4);
        assert_eq!(m.span(b).unwrap().range(), 0..1);
        assert_eq!(m.to_values(mid).unwrap(), vec![value!(3)]);

        m.swap(b, a).unwrap();
        assert_eq!(m.span(a).unwrap().range(), 0..2);
        assert_eq!(m.span(b).unwrap().range(), 3..4);
    });
    assert_eq!(tree.to_value(), value!([1, 2, 3, 4]));
}

#[test]
fn test_swap_across_sequences() {
    let mut tree = Tree::from_value(&value!([[1], [2, 3]]));
    let items = [
        Pattern::seq([Pattern::named("l")]),
        Pattern::seq([Pattern::named("r"), Pattern::any()]),
    ];
    with_match(&mut tree, &items, 0, |m| {
        let (l, r) = (m.get("l").unwrap(), m.get("r").unwrap());
        m.swap(l, r).unwrap();
        assert_eq!(m.to_values(l).unwrap(), vec![value!(1)]);
        assert_eq!(m.to_values(r).unwrap(), vec![value!(2)]);
    });
    assert_eq!(tree.to_value(), value!([[2], [1, 3]]));
}

#[test]
fn test_swap_across_sequences_resizes_enclosing_handles() {
    let mut tree = Tree::from_value(&value!([5, 6, [7, 8]]));
    let items = [
        Pattern::named_span("pair", [Pattern::named("l"), Pattern::any()]),
        Pattern::seq([Pattern::named_span("r", [Pattern::any(), Pattern::any()])]),
    ];
    with_match(&mut tree, &items, 0, |m| {
        let (pair, l, r) = (m.get("pair").unwrap(), m.get("l").unwrap(), m.get("r").unwrap());
        m.swap(l, r).unwrap();
        assert_eq!(m.to_values(pair).unwrap(), vec![value!(7), value!(8), value!(6)]);
        assert_eq!(m.to_values(l).unwrap(), vec![value!(5)]);
        assert_eq!(m.span(r).unwrap().range(), 0..2);
    });
    assert_eq!(tree.to_value(), value!([7, 8, 6, [5]]));
}

#[test]
fn test_swap_rejects_overlap() {
    let mut tree = Tree::from_value(&value!([1, 2]));
    let items = [Pattern::named_span("outer", [Pattern::named("inner"), Pattern::any()])];
    with_match(&mut tree, &items, 0, |m| {
        let (outer, inner) = (m.get("outer").unwrap(), m.get("inner").unwrap());
        assert_eq!(
            m.swap(outer, inner).unwrap_err(),
            CaptureError::SwapOverlap { first: "outer".into(), second: "inner".into() }
        );
    });
    assert_eq!(tree.to_value(), value!([1, 2]));
}

#[test]
fn test_swap_rejects_nesting() {
    let mut tree = Tree::from_value(&value!([[1]]));
    let items = [Pattern::named_with("outer", Pattern::seq([Pattern::named("inner")]))];
    with_match(&mut tree, &items, 0, |m| {
        let (outer, inner) = (m.get("outer").unwrap(), m.get("inner").unwrap());
        assert!(matches!(m.swap(outer, inner), Err(CaptureError::SwapOverlap { .. })));
    });
    assert_eq!(tree.to_value(), value!([[1]]));
}

// Misuse

#[test]
fn test_foreign_handle() {
    let mut tree = Tree::from_value(&value!([1]));
    let pattern = compile_items(&[Pattern::named("a")]).unwrap();
    let root = tree.root();
    let MatchOutcome::Matched(bindings) = try_match(&tree, &pattern, root, 0).unwrap() else {
        panic!("expected a match");
    };

    let stale = Match::new(1, &mut tree, &pattern, &bindings).whole();
    let m = Match::new(2, &mut tree, &pattern, &bindings);
    assert_eq!(m.span(stale).unwrap_err(), CaptureError::ForeignHandle);
    assert!(!m.is_valid(stale));
}

#[test]
fn test_untracked_edits_are_detected_on_read() {
    let mut tree = Tree::from_value(&value!([1, 2, 3]));
    with_match(&mut tree, &three_captures(), 0, |m| {
        let c = m.get("c").unwrap();
        let root = m.tree().root();
        m.tree_mut().splice(root, 0..1, Vec::new());
        assert_eq!(
            m.content(c).unwrap_err(),
            CaptureError::HandleInvalidated { name: "c".into() }
        );
    });
}

#[test]
fn test_debug_lists_spans() {
    let mut tree = Tree::from_value(&value!([1, 2]));
    with_match(&mut tree, &[Pattern::named("a"), Pattern::any()], 0, |m| {
        assert_eq!(format!("{m:?}"), "{\"$match\": SeqId(0)[0..2], \"a\": SeqId(0)[0..1]}");
    });
}
