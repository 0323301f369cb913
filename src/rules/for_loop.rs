//! Loop initializers that clobber variables bound before the loop

use crate::node::{NodeKind, SyntaxNode, VariableName};
use crate::rule::{expect_kind, Rule, RuleCategory, RuleError, RuleMetadata};
use crate::scope::Scope;

pub const ID: &str = "for-loop-init-overwrites-variable";

/// Flags `for ($i = 0; ...)` when `$i` is definitely bound already.
///
/// Destructuring targets (`[$a, $b] = ...`, `list($a, $b) = ...`) are
/// inspected item by item and every clobbered variable is reported.
pub struct OverwriteVariablesWithForLoopInit {
    meta: RuleMetadata,
}

impl Default for OverwriteVariablesWithForLoopInit {
    fn default() -> Self {
        Self::new()
    }
}

impl OverwriteVariablesWithForLoopInit {
    pub fn new() -> Self {
        Self {
            meta: RuleMetadata::new(ID)
                .with_category(RuleCategory::Suspicious)
                .with_description("For loop initializer reassigns an already-bound variable")
                .with_rationale(
                    "A loop counter that reuses a live variable silently discards its value",
                )
                .with_example_bad("$i = count($items);\nfor ($i = 0; $i < 10; $i++) {}")
                .with_example_good("$n = count($items);\nfor ($i = 0; $i < $n; $i++) {}"),
        }
    }

    fn check_target(&self, scope: &dyn Scope, target: &SyntaxNode, errors: &mut Vec<RuleError>) {
        match target {
            SyntaxNode::Variable {
                name: VariableName::Named(name),
                span,
            } => {
                if scope.has_variable_type(name).yes() {
                    let mut error = RuleError::new(format!(
                        "For loop initial assignment overwrites variable ${}.",
                        name
                    ));
                    if span.line > 0 {
                        error = error.at_line(span.line);
                    }
                    errors.push(error);
                }
            }
            SyntaxNode::ListPattern { items, .. } | SyntaxNode::ArrayLiteral { items, .. } => {
                for item in items.iter().flatten() {
                    self.check_target(scope, &item.value, errors);
                }
            }
            _ => {}
        }
    }
}

impl Rule for OverwriteVariablesWithForLoopInit {
    fn metadata(&self) -> &RuleMetadata {
        &self.meta
    }

    fn node_kind(&self) -> NodeKind {
        NodeKind::ForLoop
    }

    fn evaluate(&self, node: &SyntaxNode, scope: &dyn Scope) -> Vec<RuleError> {
        expect_kind(self, node);
        let SyntaxNode::ForLoop { init, .. } = node else {
            return Vec::new();
        };

        let mut errors = Vec::new();
        for expr in init {
            if let SyntaxNode::Assignment { target, .. } = expr {
                self.check_target(scope, target, &mut errors);
            }
        }
        errors
    }
}
