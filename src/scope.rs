//! Scope oracle: what is known about variables and expression types at a
//! point in the tree

use crate::node::{LiteralValue, SyntaxNode, VariableName};
use crate::trinary::TriState;
use crate::types::{ClassRegistry, Type};
use std::collections::HashMap;

/// Read-only semantic queries at a tree position
pub trait Scope {
    /// Whether `name` (without the `$` sigil) is bound in this scope
    fn has_variable_type(&self, name: &str) -> TriState;

    /// Inferred type of an expression; `Type::Mixed` when nothing is known
    fn get_type(&self, expr: &SyntaxNode) -> Type;

    /// Class declarations visible to this scope
    fn classes(&self) -> &ClassRegistry;
}

/// A variable binding with the certainty that it exists
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub ty: Type,
    pub certainty: TriState,
}

/// In-memory scope built from precomputed facts
#[derive(Debug, Clone, Default)]
pub struct StaticScope {
    variables: HashMap<String, Binding>,
    classes: ClassRegistry,
}

impl StaticScope {
    pub fn new(classes: ClassRegistry) -> Self {
        Self {
            variables: HashMap::new(),
            classes,
        }
    }

    /// Bind a variable with explicit certainty
    pub fn define(&mut self, name: &str, ty: Type, certainty: TriState) {
        self.variables.insert(
            name.trim_start_matches('$').to_string(),
            Binding { ty, certainty },
        );
    }

    /// Builder form of [`define`](Self::define) for a definitely bound variable
    pub fn with_variable(mut self, name: &str, ty: Type) -> Self {
        self.define(name, ty, TriState::Yes);
        self
    }

    /// Builder form for a variable that is only bound on some paths
    pub fn with_maybe_variable(mut self, name: &str, ty: Type) -> Self {
        self.define(name, ty, TriState::Maybe);
        self
    }

    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.variables.get(name.trim_start_matches('$'))
    }
}

impl Scope for StaticScope {
    fn has_variable_type(&self, name: &str) -> TriState {
        self.binding(name)
            .map(|b| b.certainty)
            .unwrap_or(TriState::No)
    }

    fn get_type(&self, expr: &SyntaxNode) -> Type {
        match expr {
            SyntaxNode::Variable {
                name: VariableName::Named(name),
                ..
            } => match self.binding(name) {
                Some(b) if !b.certainty.no() => b.ty.clone(),
                _ => Type::Mixed,
            },
            SyntaxNode::New { class, .. } => match class.as_identifier() {
                Some(name) => Type::object(name),
                None => Type::ObjectWithoutClass,
            },
            SyntaxNode::Literal { value, .. } => match value {
                LiteralValue::Bool(_) => Type::Bool,
                LiteralValue::Int(_) => Type::Int,
                LiteralValue::Float(_) => Type::Float,
                LiteralValue::String(_) => Type::String,
                LiteralValue::Null => Type::Null,
            },
            SyntaxNode::ArrayLiteral { .. } => Type::Array,
            SyntaxNode::Assignment { value, .. } => self.get_type(value),
            SyntaxNode::Expression { expr, .. } => self.get_type(expr),
            _ => Type::Mixed,
        }
    }

    fn classes(&self) -> &ClassRegistry {
        &self.classes
    }
}
