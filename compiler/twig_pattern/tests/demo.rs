//! End-to-end scenarios: search and rewrite whole trees.
//!
//! 1. A flat backreference pattern over a small nested list.
//! 2. A multi-rule rewrite over a JavaScript syntax tree in the nested-array
//!    form produced by UglifyJS: upcase names, flip comparisons (swapping
//!    the branches), and unwrap single-statement blocks.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use pretty_assertions::assert_eq;
use twig_pattern::{compile_items, search, CompiledPattern, Flow, Match, Pattern, SearchError};
use twig_tree::{value, Node, Scalar, Tree, Value};

// -- Scenario 1: backreferences --

#[test]
fn repeated_pair_is_found_in_nested_list() {
    let mut tree = Tree::from_value(&value!([
        1,
        2,
        [3, "mak", "bar", "bar", "bar", "bar", "mak", "bar"]
    ]));
    let pattern = compile_items(&[
        Pattern::named_span("F1", [Pattern::any(), Pattern::named("F2")]),
        Pattern::more(Pattern::backref("F2")),
        Pattern::backref("F1"),
        Pattern::end(),
    ])
    .unwrap();

    let mut found = Vec::new();
    let summary = search(&mut tree, &pattern, |m| {
        let whole = m.span(m.whole())?;
        let f1 = m.get("F1").ok_or_else(|| SearchError::callback("F1 unbound"))?;
        let f2 = m.get("F2").ok_or_else(|| SearchError::callback("F2 unbound"))?;
        found.push((whole.range(), m.to_values(f1)?, m.to_values(f2)?, whole.seq));
        Ok(Flow::Continue)
    })
    .unwrap();

    assert_eq!(summary.matches, 1);
    let (range, f1, f2, seq) = found.pop().unwrap();
    assert_ne!(seq, tree.root());
    assert_eq!(range, 1..8);
    assert_eq!(f1, vec![value!("mak"), value!("bar")]);
    assert_eq!(f2, vec![value!("bar")]);
}

// -- Scenario 2: rewriting a syntax tree --

/// `function f(x) { if (a <= b) { foo(); } else { bar(); } }` plus a
/// variable declaration.
fn program() -> Value {
    value!([
        "toplevel",
        [
            [
                "defun",
                "f",
                ["x"],
                [[
                    "if",
                    ["binary", "<=", ["name", "a"], ["name", "b"]],
                    ["block", [["stat", ["call", ["name", "foo"], []]]]],
                    ["block", [["stat", ["call", ["name", "bar"], []]]]]
                ]]
            ],
            ["var", [["count", ["num", 0]], ["total"]]]
        ]
    ])
}

fn rules() -> CompiledPattern {
    let not_null = Pattern::check("not_null", |n| !n.is_null());
    Pattern::or([
        Pattern::seq(["name".into(), Pattern::named("thing")]),
        Pattern::seq([
            Pattern::or(["function", "defun"]),
            Pattern::or([Pattern::named_with("thing", not_null), Pattern::any()]),
            Pattern::named("args"),
            Pattern::any(),
        ]),
        Pattern::seq(["dot".into(), Pattern::any(), Pattern::named("thing")]),
        Pattern::seq([Pattern::or(["var", "const", "object"]), Pattern::named("defs")]),
        Pattern::seq([
            "if".into(),
            Pattern::seq([
                "binary".into(),
                Pattern::named_with("operator", Pattern::or(["<=", ">="])),
                Pattern::any(),
                Pattern::any(),
            ]),
            Pattern::named("t"),
            Pattern::named("e"),
        ]),
        Pattern::named_with(
            "one_block",
            Pattern::seq(["block".into(), Pattern::seq([Pattern::named("one_stat"), Pattern::end()])]),
        ),
    ])
    .compile()
    .unwrap()
}

fn upper(node: Option<&str>) -> String {
    node.unwrap_or_default().to_uppercase()
}

fn rewrite(m: &mut Match<'_>) -> Result<Flow, SearchError> {
    if let Some(thing) = m.get("thing") {
        let name = upper(m.first(thing)?.as_str());
        m.replace_values(thing, [name])?;
    }
    if let Some(defs) = m.get("defs") {
        // Rename in place: the declaration list keeps its shape.
        let list = m.first(defs)?.node().as_seq();
        if let Some(list) = list {
            let decls: Vec<Node> = m.tree().children(list).to_vec();
            for decl in decls.iter().filter_map(Node::as_seq) {
                let name = upper(m.tree().get(decl, 0).and_then(Node::as_str));
                m.tree_mut().children_mut(decl)[0] = Node::from(Scalar::from(name));
            }
        }
    }
    if let Some(args) = m.get("args") {
        let names: Vec<Value> = m
            .first(args)?
            .children()
            .unwrap_or_default()
            .iter()
            .map(|n| Value::from(upper(n.as_str())))
            .collect();
        m.replace_values(args, [Value::Seq(names)])?;
    }
    if let (Some(op), Some(t), Some(e)) = (m.get("operator"), m.get("t"), m.get("e")) {
        let flipped = if m.first(op)?.as_str() == Some("<=") { ">" } else { "<" };
        m.replace_values(op, [flipped])?;
        m.swap(e, t)?;
    }
    if let (Some(block), Some(stat)) = (m.get("one_block"), m.get("one_stat")) {
        m.replace_with(block, stat)?;
    }
    Ok(Flow::Continue)
}

#[test]
fn syntax_tree_rewrite() {
    let mut tree = Tree::from_value(&program());
    let summary = search(&mut tree, &rules(), rewrite).unwrap();

    assert_eq!(
        tree.to_value(),
        value!([
            "toplevel",
            [
                [
                    "defun",
                    "F",
                    ["X"],
                    [[
                        "if",
                        ["binary", ">", ["name", "A"], ["name", "B"]],
                        ["stat", ["call", ["name", "BAR"], []]],
                        ["stat", ["call", ["name", "FOO"], []]]
                    ]]
                ],
                ["var", [["COUNT", ["num", 0]], ["TOTAL"]]]
            ]
        ])
    );
    // defun, var, if, two blocks, four names.
    assert_eq!(summary.matches, 9);
}

#[test]
fn anonymous_function_keeps_null_name() {
    let mut tree = Tree::from_value(&value!([["function", null, ["a", "b"], []]]));
    search(&mut tree, &rules(), rewrite).unwrap();
    assert_eq!(tree.to_value(), value!([["function", null, ["A", "B"], []]]));
}

#[test]
fn rewrite_is_stable_once_applied() {
    let mut tree = Tree::from_value(&program());
    search(&mut tree, &rules(), rewrite).unwrap();
    let once = tree.to_value();

    // The second pass only re-upcases names; comparisons are already
    // flipped and no single-statement blocks remain.
    let mut again = Tree::from_value(&once);
    let summary = search(&mut again, &rules(), rewrite).unwrap();
    assert_eq!(again.to_value(), once);
    assert_eq!(summary.matches, 6);
}
