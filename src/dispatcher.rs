//! Tree traversal and routing of nodes to rules

use crate::diagnostic::{Diagnostic, Location};
use crate::node::SyntaxNode;
use crate::registry::RuleRegistry;
use crate::rule::{Rule, RuleError};
use crate::scope::Scope;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// One rule invocation, reported to observers of a run
#[derive(Debug, Clone, Copy)]
pub struct RuleEvaluation<'a> {
    pub rule_id: &'a str,
    pub elapsed: Duration,
    /// Number of errors the rule returned
    pub matches: usize,
}

/// Walks a tree and runs every matching rule on every node
pub struct Dispatcher<'r> {
    registry: &'r RuleRegistry,
    file: PathBuf,
}

impl<'r> Dispatcher<'r> {
    pub fn new(registry: &'r RuleRegistry) -> Self {
        Self {
            registry,
            file: PathBuf::new(),
        }
    }

    /// Path recorded in diagnostic locations
    pub fn with_file(mut self, file: &Path) -> Self {
        self.file = file.to_path_buf();
        self
    }

    /// Run all rules over `tree`.
    ///
    /// Nodes are visited once each in pre-order; at each node the rules
    /// declared for its kind run in registration order. Diagnostics come
    /// back in visit order. A panicking rule aborts the run.
    pub fn run(&self, tree: &SyntaxNode, scope: &dyn Scope) -> Vec<Diagnostic> {
        self.run_with_observer(tree, scope, |_| {})
    }

    /// Like [`run`](Self::run), reporting every rule invocation to `observer`
    pub fn run_with_observer<F>(
        &self,
        tree: &SyntaxNode,
        scope: &dyn Scope,
        mut observer: F,
    ) -> Vec<Diagnostic>
    where
        F: FnMut(RuleEvaluation<'_>),
    {
        let mut diagnostics = Vec::new();
        let mut visited = 0usize;

        for node in tree.iter() {
            visited += 1;
            for rule in self.registry.rules_for(node.kind()) {
                assert_eq!(
                    rule.node_kind(),
                    node.kind(),
                    "dispatcher routed {} to rule '{}'",
                    node.kind(),
                    rule.id()
                );

                let start = Instant::now();
                let errors = rule.evaluate(node, scope);
                observer(RuleEvaluation {
                    rule_id: rule.id(),
                    elapsed: start.elapsed(),
                    matches: errors.len(),
                });

                diagnostics.extend(
                    errors
                        .into_iter()
                        .map(|error| self.to_diagnostic(rule.as_ref(), node, error)),
                );
            }
        }

        log::debug!(
            "{}: visited {} nodes, {} diagnostics",
            self.file.display(),
            visited,
            diagnostics.len()
        );
        diagnostics
    }

    fn to_diagnostic(&self, rule: &dyn Rule, node: &SyntaxNode, error: RuleError) -> Diagnostic {
        let span = node.span();
        let location = match error.line {
            Some(line) => Location::new(self.file.clone(), line, 0),
            None => Location::new(self.file.clone(), span.line, span.column),
        };

        let meta = rule.metadata();
        let diag = Diagnostic::new(&meta.id, meta.severity, &error.message, location);
        match &meta.description {
            Some(desc) => diag.with_help(desc),
            None => diag,
        }
    }
}

/// Run every rule in `registry` over `tree`
pub fn run(tree: &SyntaxNode, scope: &dyn Scope, registry: &RuleRegistry) -> Vec<Diagnostic> {
    Dispatcher::new(registry).run(tree, scope)
}
