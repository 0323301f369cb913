//! Syntax tree model handed to the rules
//!
//! Trees are produced by an external parser and arrive here already built,
//! usually deserialized from an analysis unit. They are read-only for the
//! whole analysis pass.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source position of a node (1-based, 0 when unknown)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    #[serde(default)]
    pub line: usize,
    #[serde(default)]
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Discriminant of a [`SyntaxNode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Block,
    Expression,
    Assignment,
    ForLoop,
    Variable,
    ArrayLiteral,
    ListPattern,
    MethodCallReference,
    MethodCall,
    New,
    Literal,
    Identifier,
}

impl NodeKind {
    /// Every kind, in declaration order
    pub const ALL: [NodeKind; 12] = [
        NodeKind::Block,
        NodeKind::Expression,
        NodeKind::Assignment,
        NodeKind::ForLoop,
        NodeKind::Variable,
        NodeKind::ArrayLiteral,
        NodeKind::ListPattern,
        NodeKind::MethodCallReference,
        NodeKind::MethodCall,
        NodeKind::New,
        NodeKind::Literal,
        NodeKind::Identifier,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Block => "block",
            NodeKind::Expression => "expression",
            NodeKind::Assignment => "assignment",
            NodeKind::ForLoop => "for_loop",
            NodeKind::Variable => "variable",
            NodeKind::ArrayLiteral => "array_literal",
            NodeKind::ListPattern => "list_pattern",
            NodeKind::MethodCallReference => "method_call_reference",
            NodeKind::MethodCall => "method_call",
            NodeKind::New => "new",
            NodeKind::Literal => "literal",
            NodeKind::Identifier => "identifier",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name of a variable: either a plain identifier or an expression (`$$x`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableName {
    Named(String),
    Dynamic(Box<SyntaxNode>),
}

impl VariableName {
    /// The statically known name, if any
    pub fn as_str(&self) -> Option<&str> {
        match self {
            VariableName::Named(name) => Some(name.as_str()),
            VariableName::Dynamic(_) => None,
        }
    }
}

/// Constant value of a literal node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Null,
}

/// One slot of an array literal or list pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayItem {
    #[serde(default)]
    pub key: Option<Box<SyntaxNode>>,
    pub value: Box<SyntaxNode>,
    #[serde(default)]
    pub by_ref: bool,
    #[serde(default)]
    pub unpack: bool,
}

impl ArrayItem {
    pub fn new(value: SyntaxNode) -> Self {
        Self {
            key: None,
            value: Box::new(value),
            by_ref: false,
            unpack: false,
        }
    }

    pub fn keyed(key: SyntaxNode, value: SyntaxNode) -> Self {
        Self {
            key: Some(Box::new(key)),
            ..Self::new(value)
        }
    }
}

/// A node of the analyzed syntax tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyntaxNode {
    /// Sequence of statements
    Block {
        statements: Vec<SyntaxNode>,
        #[serde(default)]
        span: Span,
    },

    /// Expression used as a statement
    Expression {
        expr: Box<SyntaxNode>,
        #[serde(default)]
        span: Span,
    },

    Assignment {
        target: Box<SyntaxNode>,
        value: Box<SyntaxNode>,
        #[serde(default)]
        span: Span,
    },

    /// `for (init; cond; step) { body }`
    ForLoop {
        #[serde(default)]
        init: Vec<SyntaxNode>,
        #[serde(default)]
        cond: Vec<SyntaxNode>,
        #[serde(default)]
        step: Vec<SyntaxNode>,
        #[serde(default)]
        body: Vec<SyntaxNode>,
        #[serde(default)]
        span: Span,
    },

    Variable {
        name: VariableName,
        #[serde(default)]
        span: Span,
    },

    /// `[a, b]` / `array(a, b)`; `None` items are skipped slots
    ArrayLiteral {
        items: Vec<Option<ArrayItem>>,
        #[serde(default)]
        span: Span,
    },

    /// `list(a, b)`
    ListPattern {
        items: Vec<Option<ArrayItem>>,
        #[serde(default)]
        span: Span,
    },

    /// `$receiver->name(...)`: a method taken as a first-class callable
    MethodCallReference {
        receiver: Box<SyntaxNode>,
        name: Box<SyntaxNode>,
        #[serde(default)]
        span: Span,
    },

    /// `$receiver->name(args)`
    MethodCall {
        receiver: Box<SyntaxNode>,
        name: Box<SyntaxNode>,
        #[serde(default)]
        args: Vec<SyntaxNode>,
        #[serde(default)]
        span: Span,
    },

    /// `new Class(args)`
    New {
        class: Box<SyntaxNode>,
        #[serde(default)]
        args: Vec<SyntaxNode>,
        #[serde(default)]
        span: Span,
    },

    Literal {
        value: LiteralValue,
        #[serde(default)]
        span: Span,
    },

    Identifier {
        name: String,
        #[serde(default)]
        span: Span,
    },
}

impl SyntaxNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            SyntaxNode::Block { .. } => NodeKind::Block,
            SyntaxNode::Expression { .. } => NodeKind::Expression,
            SyntaxNode::Assignment { .. } => NodeKind::Assignment,
            SyntaxNode::ForLoop { .. } => NodeKind::ForLoop,
            SyntaxNode::Variable { .. } => NodeKind::Variable,
            SyntaxNode::ArrayLiteral { .. } => NodeKind::ArrayLiteral,
            SyntaxNode::ListPattern { .. } => NodeKind::ListPattern,
            SyntaxNode::MethodCallReference { .. } => NodeKind::MethodCallReference,
            SyntaxNode::MethodCall { .. } => NodeKind::MethodCall,
            SyntaxNode::New { .. } => NodeKind::New,
            SyntaxNode::Literal { .. } => NodeKind::Literal,
            SyntaxNode::Identifier { .. } => NodeKind::Identifier,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            SyntaxNode::Block { span, .. }
            | SyntaxNode::Expression { span, .. }
            | SyntaxNode::Assignment { span, .. }
            | SyntaxNode::ForLoop { span, .. }
            | SyntaxNode::Variable { span, .. }
            | SyntaxNode::ArrayLiteral { span, .. }
            | SyntaxNode::ListPattern { span, .. }
            | SyntaxNode::MethodCallReference { span, .. }
            | SyntaxNode::MethodCall { span, .. }
            | SyntaxNode::New { span, .. }
            | SyntaxNode::Literal { span, .. }
            | SyntaxNode::Identifier { span, .. } => *span,
        }
    }

    /// Replace the span, keeping everything else
    pub fn with_span(mut self, line: usize, column: usize) -> Self {
        let new_span = Span::new(line, column);
        match &mut self {
            SyntaxNode::Block { span, .. }
            | SyntaxNode::Expression { span, .. }
            | SyntaxNode::Assignment { span, .. }
            | SyntaxNode::ForLoop { span, .. }
            | SyntaxNode::Variable { span, .. }
            | SyntaxNode::ArrayLiteral { span, .. }
            | SyntaxNode::ListPattern { span, .. }
            | SyntaxNode::MethodCallReference { span, .. }
            | SyntaxNode::MethodCall { span, .. }
            | SyntaxNode::New { span, .. }
            | SyntaxNode::Literal { span, .. }
            | SyntaxNode::Identifier { span, .. } => *span = new_span,
        }
        self
    }

    /// Direct children in source order
    pub fn children(&self) -> Vec<&SyntaxNode> {
        match self {
            SyntaxNode::Block { statements, .. } => statements.iter().collect(),
            SyntaxNode::Expression { expr, .. } => vec![expr.as_ref()],
            SyntaxNode::Assignment { target, value, .. } => vec![target.as_ref(), value.as_ref()],
            SyntaxNode::ForLoop {
                init,
                cond,
                step,
                body,
                ..
            } => init.iter().chain(cond).chain(step).chain(body).collect(),
            SyntaxNode::Variable { name, .. } => match name {
                VariableName::Named(_) => Vec::new(),
                VariableName::Dynamic(expr) => vec![expr.as_ref()],
            },
            SyntaxNode::ArrayLiteral { items, .. } | SyntaxNode::ListPattern { items, .. } => {
                items
                    .iter()
                    .flatten()
                    .flat_map(|item| item.key.as_deref().into_iter().chain([item.value.as_ref()]))
                    .collect()
            }
            SyntaxNode::MethodCallReference { receiver, name, .. } => {
                vec![receiver.as_ref(), name.as_ref()]
            }
            SyntaxNode::MethodCall {
                receiver,
                name,
                args,
                ..
            } => [receiver.as_ref(), name.as_ref()]
                .into_iter()
                .chain(args)
                .collect(),
            SyntaxNode::New { class, args, .. } => {
                [class.as_ref()].into_iter().chain(args).collect()
            }
            SyntaxNode::Literal { .. } | SyntaxNode::Identifier { .. } => Vec::new(),
        }
    }

    /// Pre-order, depth-first walk over this node and all descendants
    pub fn iter(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }

    /// Identifier text, if this node is an identifier
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            SyntaxNode::Identifier { name, .. } => Some(name),
            _ => None,
        }
    }

    // Constructors, mostly for building trees in code and tests

    pub fn block(statements: Vec<SyntaxNode>) -> Self {
        SyntaxNode::Block {
            statements,
            span: Span::default(),
        }
    }

    pub fn expression(expr: SyntaxNode) -> Self {
        SyntaxNode::Expression {
            expr: Box::new(expr),
            span: Span::default(),
        }
    }

    pub fn assign(target: SyntaxNode, value: SyntaxNode) -> Self {
        SyntaxNode::Assignment {
            target: Box::new(target),
            value: Box::new(value),
            span: Span::default(),
        }
    }

    pub fn for_loop(init: Vec<SyntaxNode>, body: Vec<SyntaxNode>) -> Self {
        SyntaxNode::ForLoop {
            init,
            cond: Vec::new(),
            step: Vec::new(),
            body,
            span: Span::default(),
        }
    }

    pub fn variable(name: &str) -> Self {
        SyntaxNode::Variable {
            name: VariableName::Named(name.trim_start_matches('$').to_string()),
            span: Span::default(),
        }
    }

    pub fn dynamic_variable(name_expr: SyntaxNode) -> Self {
        SyntaxNode::Variable {
            name: VariableName::Dynamic(Box::new(name_expr)),
            span: Span::default(),
        }
    }

    pub fn array(items: Vec<Option<SyntaxNode>>) -> Self {
        SyntaxNode::ArrayLiteral {
            items: items.into_iter().map(|i| i.map(ArrayItem::new)).collect(),
            span: Span::default(),
        }
    }

    pub fn list(items: Vec<Option<SyntaxNode>>) -> Self {
        SyntaxNode::ListPattern {
            items: items.into_iter().map(|i| i.map(ArrayItem::new)).collect(),
            span: Span::default(),
        }
    }

    pub fn identifier(name: &str) -> Self {
        SyntaxNode::Identifier {
            name: name.to_string(),
            span: Span::default(),
        }
    }

    pub fn method_ref(receiver: SyntaxNode, name: SyntaxNode) -> Self {
        SyntaxNode::MethodCallReference {
            receiver: Box::new(receiver),
            name: Box::new(name),
            span: Span::default(),
        }
    }

    pub fn method_call(receiver: SyntaxNode, name: SyntaxNode, args: Vec<SyntaxNode>) -> Self {
        SyntaxNode::MethodCall {
            receiver: Box::new(receiver),
            name: Box::new(name),
            args,
            span: Span::default(),
        }
    }

    pub fn new_object(class: &str) -> Self {
        SyntaxNode::New {
            class: Box::new(SyntaxNode::identifier(class)),
            args: Vec::new(),
            span: Span::default(),
        }
    }

    pub fn literal(value: LiteralValue) -> Self {
        SyntaxNode::Literal {
            value,
            span: Span::default(),
        }
    }

    pub fn int(value: i64) -> Self {
        SyntaxNode::literal(LiteralValue::Int(value))
    }
}

/// Iterator returned by [`SyntaxNode::iter`]
pub struct Walk<'a> {
    stack: Vec<&'a SyntaxNode>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a SyntaxNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Reverse so the leftmost child is popped first
        self.stack.extend(node.children().into_iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> SyntaxNode {
        SyntaxNode::block(vec![
            SyntaxNode::expression(SyntaxNode::assign(
                SyntaxNode::variable("i"),
                SyntaxNode::int(10),
            )),
            SyntaxNode::for_loop(
                vec![SyntaxNode::assign(SyntaxNode::variable("i"), SyntaxNode::int(0))],
                vec![],
            ),
        ])
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(NodeKind::ForLoop.to_string(), "for_loop");
        assert_eq!(
            NodeKind::MethodCallReference.to_string(),
            "method_call_reference"
        );
    }

    #[test]
    fn test_preorder_walk() {
        let tree = sample_tree();
        let kinds: Vec<NodeKind> = tree.iter().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Block,
                NodeKind::Expression,
                NodeKind::Assignment,
                NodeKind::Variable,
                NodeKind::Literal,
                NodeKind::ForLoop,
                NodeKind::Assignment,
                NodeKind::Variable,
                NodeKind::Literal,
            ]
        );
    }

    #[test]
    fn test_array_children_skip_empty_slots() {
        let node = SyntaxNode::ArrayLiteral {
            items: vec![
                None,
                Some(ArrayItem::keyed(
                    SyntaxNode::literal(LiteralValue::String("k".into())),
                    SyntaxNode::variable("b"),
                )),
            ],
            span: Span::default(),
        };
        let kinds: Vec<NodeKind> = node.children().iter().map(|n| n.kind()).collect();
        assert_eq!(kinds, vec![NodeKind::Literal, NodeKind::Variable]);
    }

    #[test]
    fn test_variable_constructor_strips_sigil() {
        match SyntaxNode::variable("$count") {
            SyntaxNode::Variable { name, .. } => assert_eq!(name.as_str(), Some("count")),
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_with_span() {
        let node = SyntaxNode::identifier("run").with_span(4, 7);
        assert_eq!(node.span(), Span::new(4, 7));
    }

    #[test]
    fn test_deserialize_tagged_tree() {
        let json = r#"{
            "kind": "for_loop",
            "span": {"line": 3, "column": 1},
            "init": [
                {"kind": "assignment",
                 "target": {"kind": "list_pattern", "items": [
                     {"value": {"kind": "variable", "name": "a"}},
                     null
                 ]},
                 "value": {"kind": "literal", "value": null}}
            ]
        }"#;
        let node: SyntaxNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.kind(), NodeKind::ForLoop);
        assert_eq!(node.span().line, 3);
        assert_eq!(node.iter().count(), 5);
    }

    #[test]
    fn test_deserialize_dynamic_variable_name() {
        let json = r#"{"kind": "variable", "name": {"kind": "variable", "name": "x"}}"#;
        let node: SyntaxNode = serde_json::from_str(json).unwrap();
        match node {
            SyntaxNode::Variable { name, .. } => assert!(name.as_str().is_none()),
            other => panic!("unexpected node {:?}", other),
        }
    }
}
