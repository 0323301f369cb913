//! Rule definition and metadata

use crate::diagnostic::Severity;
use crate::node::{NodeKind, SyntaxNode};
use crate::scope::Scope;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rule category for grouping related rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    /// Code that is definitely wrong or useless
    Correctness,
    /// Code that is likely wrong or suspicious
    #[default]
    Suspicious,
    /// Idiomatic and consistent style rules
    Style,
    /// Extra strict rules that may have false positives
    Pedantic,
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleCategory::Correctness => write!(f, "correctness"),
            RuleCategory::Suspicious => write!(f, "suspicious"),
            RuleCategory::Style => write!(f, "style"),
            RuleCategory::Pedantic => write!(f, "pedantic"),
        }
    }
}

impl std::str::FromStr for RuleCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "correctness" => Ok(RuleCategory::Correctness),
            "suspicious" => Ok(RuleCategory::Suspicious),
            "style" => Ok(RuleCategory::Style),
            "pedantic" => Ok(RuleCategory::Pedantic),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

/// Descriptive data about a rule, used for reporting and `--list-rules`
#[derive(Debug, Clone, Serialize)]
pub struct RuleMetadata {
    /// Unique rule identifier (e.g., "for-loop-init-overwrites-variable")
    pub id: String,

    /// One-line description, shown as diagnostic help
    pub description: Option<String>,

    /// Default severity level
    pub severity: Severity,

    pub category: RuleCategory,

    /// Rationale explaining why this rule exists
    pub rationale: Option<String>,

    /// Example of code that violates this rule
    pub example_bad: Option<String>,

    /// Example of correct code
    pub example_good: Option<String>,
}

impl RuleMetadata {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            description: None,
            severity: Severity::Error,
            category: RuleCategory::default(),
            rationale: None,
            example_bad: None,
            example_good: None,
        }
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_category(mut self, category: RuleCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_rationale(mut self, rationale: &str) -> Self {
        self.rationale = Some(rationale.to_string());
        self
    }

    pub fn with_example_bad(mut self, example: &str) -> Self {
        self.example_bad = Some(example.to_string());
        self
    }

    pub fn with_example_good(mut self, example: &str) -> Self {
        self.example_good = Some(example.to_string());
        self
    }
}

/// A raw violation produced by a rule, before the dispatcher attaches
/// rule id, severity and file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleError {
    pub message: String,
    /// Overrides the line of the inspected node
    pub line: Option<usize>,
}

impl RuleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl From<String> for RuleError {
    fn from(message: String) -> Self {
        RuleError::new(message)
    }
}

/// A check run against every node of one kind
pub trait Rule: Send + Sync {
    fn metadata(&self) -> &RuleMetadata;

    /// The only node kind this rule may be handed
    fn node_kind(&self) -> NodeKind;

    /// Inspect `node` and return one error per independent violation.
    ///
    /// Must not be called with a node of another kind; implementations
    /// panic via [`expect_kind`] when that happens.
    fn evaluate(&self, node: &SyntaxNode, scope: &dyn Scope) -> Vec<RuleError>;

    fn id(&self) -> &str {
        &self.metadata().id
    }
}

/// Fail fast when a rule receives a node of the wrong kind
pub fn expect_kind(rule: &dyn Rule, node: &SyntaxNode) {
    assert_eq!(
        node.kind(),
        rule.node_kind(),
        "rule '{}' declares {} but was given {}",
        rule.id(),
        rule.node_kind(),
        node.kind()
    );
}
