//! Built-in rewrite passes over UglifyJS-style syntax trees.
//!
//! Every rewriting pass is one pattern plus the shared [`rewrite`] callback,
//! which acts on whichever captures the match bound:
//!
//! | Capture | Action |
//! |---|---|
//! | `thing` | replace the name with its uppercase form |
//! | `args` | uppercase every parameter name |
//! | `defs` | uppercase declared names in place |
//! | `operator`, `t`, `e` | turn `<=` into `>` (and `>=` into `<`) and swap the branches |
//! | `one_block`, `one_stat` | replace a one-statement block with that statement |
//!
//! `repeats` rewrites nothing; it reports runs of a repeated node.

use std::fmt;

use clap::ValueEnum;
use twig_pattern::{
    compile_items, search, CompileError, CompiledPattern, Flow, Match, Pattern, SearchError,
};
use twig_tree::{Node, Scalar, Tree, Value};

/// Which pass to run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Pass {
    /// Uppercase names, function parameters, and declarations.
    UpcaseNames,
    /// Invert `<=`/`>=` conditions and swap their branches.
    FlipCompare,
    /// Unwrap blocks holding a single statement.
    UnwrapBlocks,
    /// All rewrites in one search.
    All,
    /// Report `x y y.. x y` runs without rewriting.
    Repeats,
}

/// Outcome of a pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PassReport {
    /// Callbacks run.
    pub matches: usize,
    /// One line per match, for reporting passes.
    pub findings: Vec<String>,
}

#[derive(Debug)]
pub enum PassError {
    Compile(CompileError),
    Search(SearchError),
}

impl fmt::Display for PassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile(e) => write!(f, "invalid built-in pattern: {e}"),
            Self::Search(e) => write!(f, "search failed: {e}"),
        }
    }
}

impl std::error::Error for PassError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Compile(e) => Some(e),
            Self::Search(e) => Some(e),
        }
    }
}

impl From<CompileError> for PassError {
    fn from(e: CompileError) -> Self {
        PassError::Compile(e)
    }
}

impl From<SearchError> for PassError {
    fn from(e: SearchError) -> Self {
        PassError::Search(e)
    }
}

// -- Patterns --

fn name_rules() -> Vec<Pattern> {
    let not_null = Pattern::check("not_null", |n| !n.is_null());
    vec![
        // plain names
        Pattern::seq(["name".into(), Pattern::named("thing")]),
        // function name (absent for anonymous functions) and parameters
        Pattern::seq([
            Pattern::or(["function", "defun"]),
            Pattern::or([Pattern::named_with("thing", not_null), Pattern::any()]),
            Pattern::named("args"),
            Pattern::any(),
        ]),
        // the property in `object.property`
        Pattern::seq(["dot".into(), Pattern::any(), Pattern::named("thing")]),
        // declaration lists
        Pattern::seq([Pattern::or(["var", "const", "object"]), Pattern::named("defs")]),
    ]
}

fn compare_rule() -> Pattern {
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
    ])
}

fn block_rule() -> Pattern {
    Pattern::named_with(
        "one_block",
        Pattern::seq(["block".into(), Pattern::seq([Pattern::named("one_stat"), Pattern::end()])]),
    )
}

fn repeats_pattern() -> Vec<Pattern> {
    vec![
        Pattern::named_span("F1", [Pattern::any(), Pattern::named("F2")]),
        Pattern::more(Pattern::backref("F2")),
        Pattern::backref("F1"),
        Pattern::end(),
    ]
}

/// The pattern a pass searches for.
pub fn pattern(pass: Pass) -> Result<CompiledPattern, CompileError> {
    match pass {
        Pass::UpcaseNames => Pattern::or(name_rules()).compile(),
        Pass::FlipCompare => compare_rule().compile(),
        Pass::UnwrapBlocks => block_rule().compile(),
        Pass::All => {
            let mut rules = name_rules();
            rules.push(compare_rule());
            rules.push(block_rule());
            Pattern::or(rules).compile()
        }
        Pass::Repeats => compile_items(&repeats_pattern()),
    }
}

// -- Callbacks --

fn upper(name: Option<&str>) -> String {
    name.unwrap_or_default().to_uppercase()
}

/// Apply every rewrite whose captures this match bound.
pub fn rewrite(m: &mut Match<'_>) -> Result<Flow, SearchError> {
    if let Some(thing) = m.get("thing") {
        let name = upper(m.first(thing)?.as_str());
        m.replace_values(thing, [name])?;
    }

    if let Some(defs) = m.get("defs") {
        // Declarations are `[name, init?]`; rename in place so the list
        // keeps its shape.
        let list = m.first(defs)?.node().as_seq();
        if let Some(list) = list {
            let decls: Vec<Node> = m.tree().children(list).to_vec();
            for decl in decls.iter().filter_map(Node::as_seq) {
                let Some(name) = m.tree().get(decl, 0).and_then(Node::as_str) else {
                    continue;
                };
                let name = Scalar::from(name.to_uppercase());
                m.tree_mut().children_mut(decl)[0] = Node::Scalar(name);
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

/// Describe one `repeats` match as `F1 / F2`.
fn describe_repeat(m: &Match<'_>) -> Result<String, SearchError> {
    let field = |name: &str| -> Result<String, SearchError> {
        let handle = m
            .get(name)
            .ok_or_else(|| SearchError::callback(format!("capture `{name}` unbound")))?;
        Ok(Value::Seq(m.to_values(handle)?).to_string())
    };
    Ok(format!("F1 = {}, F2 = {}", field("F1")?, field("F2")?))
}

/// Run a pass over `tree`, editing it in place.
pub fn run_pass(pass: Pass, tree: &mut Tree) -> Result<PassReport, PassError> {
    let pattern = pattern(pass)?;
    let mut report = PassReport::default();

    let summary = if pass == Pass::Repeats {
        search(tree, &pattern, |m| {
            report.findings.push(describe_repeat(m)?);
            Ok(Flow::Continue)
        })?
    } else {
        search(tree, &pattern, rewrite)?
    };
    report.matches = summary.matches;

    tracing::debug!(?pass, matches = report.matches, steps = summary.steps, "pass finished");
    Ok(report)
}
