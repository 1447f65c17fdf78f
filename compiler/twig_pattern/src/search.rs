//! Search driver.
//!
//! Walks a tree depth-first, tries the pattern at every offset of every
//! sequence, and hands each match to a callback. A sequence is scanned
//! before its children, so matches at one level are reported left to right
//! before anything nested inside them.
//!
//! The callback may rewrite the tree. Scanning resumes right after the
//! (possibly resized) whole-match span, so replacement content is never
//! rescanned at the same level; nested sequences are visited afterwards
//! against the live tree. Each sequence is visited at most once per search,
//! which also keeps aliasing edits from looping.

use rustc_hash::FxHashSet;
use twig_tree::{ensure_sufficient_stack, Node, SeqId, Tree};

use crate::capture::Match;
use crate::compile::CompiledPattern;
use crate::errors::SearchError;
use crate::matcher::Machine;

/// What the callback wants the search to do next.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// End the search; edits already made stay applied.
    Stop,
}

/// Search options.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SearchConfig {
    /// Only try the pattern at offset 0 of each sequence.
    pub anchored: bool,
    /// Visit nested sequences; when false only the root is scanned.
    pub descend: bool,
    /// Stop after this many matches.
    pub max_matches: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig { anchored: false, descend: true, max_matches: None }
    }
}

impl SearchConfig {
    #[must_use]
    pub fn anchored(mut self, anchored: bool) -> Self {
        self.anchored = anchored;
        self
    }

    #[must_use]
    pub fn descend(mut self, descend: bool) -> Self {
        self.descend = descend;
        self
    }

    #[must_use]
    pub fn max_matches(mut self, max: usize) -> Self {
        self.max_matches = Some(max);
        self
    }
}

/// Counters reported by a finished search.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchSummary {
    /// Callbacks invoked.
    pub matches: usize,
    /// Sequences scanned.
    pub sequences: usize,
    /// Match attempts, one per tried offset.
    pub attempts: usize,
    /// Matcher instructions executed.
    pub steps: u64,
    /// Whether the search ended early through `Flow::Stop` or the match
    /// limit.
    pub stopped: bool,
}

/// A configured search over one compiled pattern.
#[derive(Copy, Clone, Debug)]
pub struct Searcher<'p> {
    pattern: &'p CompiledPattern,
    config: SearchConfig,
}

impl<'p> Searcher<'p> {
    pub fn new(pattern: &'p CompiledPattern) -> Self {
        Searcher { pattern, config: SearchConfig::default() }
    }

    #[must_use]
    pub fn config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Search `tree`, calling `on_match` for every match.
    ///
    /// Any error ends the search immediately; edits made by earlier
    /// callbacks stay applied.
    pub fn run<F>(&self, tree: &mut Tree, on_match: F) -> Result<SearchSummary, SearchError>
    where
        F: FnMut(&mut Match<'_>) -> Result<Flow, SearchError>,
    {
        let mut walk = Walk {
            pattern: self.pattern,
            config: self.config,
            on_match,
            machine: Machine::default(),
            visited: FxHashSet::default(),
            summary: SearchSummary::default(),
            next_id: 0,
        };

        if self.config.max_matches == Some(0) {
            walk.summary.stopped = true;
        } else {
            let root = tree.root();
            walk.visit(tree, root)?;
        }
        walk.summary.steps = walk.machine.steps();

        tracing::debug!(
            matches = walk.summary.matches,
            sequences = walk.summary.sequences,
            attempts = walk.summary.attempts,
            steps = walk.summary.steps,
            stopped = walk.summary.stopped,
            "search finished"
        );
        Ok(walk.summary)
    }
}

/// Search `tree` with the default configuration.
pub fn search<F>(
    tree: &mut Tree,
    pattern: &CompiledPattern,
    on_match: F,
) -> Result<SearchSummary, SearchError>
where
    F: FnMut(&mut Match<'_>) -> Result<Flow, SearchError>,
{
    Searcher::new(pattern).run(tree, on_match)
}

struct Walk<'p, F> {
    pattern: &'p CompiledPattern,
    config: SearchConfig,
    on_match: F,
    machine: Machine,
    visited: FxHashSet<SeqId>,
    summary: SearchSummary,
    next_id: u32,
}

impl<F> Walk<'_, F>
where
    F: FnMut(&mut Match<'_>) -> Result<Flow, SearchError>,
{
    fn visit(&mut self, tree: &mut Tree, seq: SeqId) -> Result<Flow, SearchError> {
        if !self.visited.insert(seq) {
            return Ok(Flow::Continue);
        }
        self.summary.sequences += 1;

        let flow = self.scan(tree, seq)?;
        if flow == Flow::Stop || !self.config.descend {
            return Ok(flow);
        }

        // The length is re-read every step: a child's callbacks may have
        // edited this sequence through `tree_mut`.
        let mut index = 0;
        while index < tree.len(seq) {
            if let Some(&Node::Seq(child)) = tree.get(seq, index) {
                if ensure_sufficient_stack(|| self.visit(tree, child))? == Flow::Stop {
                    return Ok(Flow::Stop);
                }
            }
            index += 1;
        }
        Ok(Flow::Continue)
    }

    fn scan(&mut self, tree: &mut Tree, seq: SeqId) -> Result<Flow, SearchError> {
        let mut pos = 0;
        while pos < tree.len(seq) {
            if self.config.anchored && pos > 0 {
                break;
            }
            self.summary.attempts += 1;
            let Some(bindings) = self.machine.run(tree, self.pattern, seq, pos)? else {
                tracing::trace!(?seq, pos, "no match");
                pos += 1;
                continue;
            };

            let whole = bindings.whole();
            let before = tree.len(seq);
            let id = self.next_id;
            self.next_id += 1;
            self.summary.matches += 1;
            tracing::debug!(match_id = id, ?seq, start = whole.start, len = whole.len, "match");

            let mut m = Match::new(id, &mut *tree, self.pattern, &bindings);
            let flow = (self.on_match)(&mut m)?;
            let tracked = m.span(m.whole()).ok();

            let limit_hit = self.config.max_matches.is_some_and(|max| self.summary.matches >= max);
            if flow == Flow::Stop || limit_hit {
                self.summary.stopped = true;
                return Ok(Flow::Stop);
            }

            let after = tree.len(seq);
            let resume = match tracked {
                Some(span) if span.seq == seq => span.end() as usize,
                _ => (whole.end() as usize + after).saturating_sub(before),
            };
            // A callback that neither shrank the sequence nor moved past the
            // match start must not make us retry the same offset forever.
            pos = if resume > pos || after < before { resume.max(pos) } else { pos + 1 };
        }
        Ok(Flow::Continue)
    }
}
