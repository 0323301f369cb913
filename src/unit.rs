//! Serialized analysis units: one tree plus the facts needed to analyse it

use crate::node::SyntaxNode;
use crate::scope::StaticScope;
use crate::trinary::TriState;
use crate::types::{ClassDef, ClassRegistry, Type};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error loading an analysis unit
#[derive(Debug, Error)]
pub enum UnitError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown unit file format: {0}")]
    UnknownFormat(String),
}

/// What is known about one variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableFact {
    #[serde(rename = "type")]
    pub ty: Type,

    #[serde(default = "definitely")]
    pub certainty: TriState,
}

fn definitely() -> TriState {
    TriState::Yes
}

/// A syntax tree with its scope facts and class declarations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisUnit {
    /// Source path reported in diagnostics
    #[serde(default)]
    pub path: PathBuf,

    #[serde(default)]
    pub variables: BTreeMap<String, VariableFact>,

    #[serde(default)]
    pub classes: Vec<ClassDef>,

    pub tree: SyntaxNode,
}

impl AnalysisUnit {
    pub fn new(path: impl Into<PathBuf>, tree: SyntaxNode) -> Self {
        Self {
            path: path.into(),
            variables: BTreeMap::new(),
            classes: Vec::new(),
            tree,
        }
    }

    pub fn with_variable(mut self, name: &str, ty: Type, certainty: TriState) -> Self {
        self.variables
            .insert(name.to_string(), VariableFact { ty, certainty });
        self
    }

    pub fn with_class(mut self, class: ClassDef) -> Self {
        self.classes.push(class);
        self
    }

    /// Load a unit, choosing the format by extension.
    ///
    /// A unit without a `path` reports diagnostics against the file it was
    /// loaded from.
    pub fn load(path: &Path) -> Result<Self, UnitError> {
        let content = std::fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let mut unit = match ext {
            "yaml" | "yml" => Self::from_yaml_str(&content)?,
            "json" => Self::from_json_str(&content)?,
            _ => return Err(UnitError::UnknownFormat(path.display().to_string())),
        };

        if unit.path.as_os_str().is_empty() {
            unit.path = path.to_path_buf();
        }
        log::trace!("loaded unit {} from {}", unit.path.display(), path.display());
        Ok(unit)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, UnitError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self, UnitError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Scope holding this unit's variables and classes
    pub fn scope(&self) -> StaticScope {
        let mut scope = StaticScope::new(ClassRegistry::from_defs(self.classes.iter().cloned()));
        for (name, fact) in &self.variables {
            scope.define(name, fact.ty.clone(), fact.certainty);
        }
        scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use crate::scope::Scope;
    use tempfile::TempDir;

    const YAML_UNIT: &str = r#"
path: src/Loop.php
variables:
  $i: { type: int }
  maybe: { type: "Factory|null", certainty: maybe }
classes:
  - name: Factory
    methods:
      - { name: create, static: true }
      - { name: build }
tree:
  kind: block
  statements:
    - kind: for_loop
      span: { line: 3, column: 1 }
      init:
        - kind: assignment
          target: { kind: variable, name: i }
          value: { kind: literal, value: 0 }
      body: []
"#;

    #[test]
    fn test_from_yaml() {
        let unit = AnalysisUnit::from_yaml_str(YAML_UNIT).unwrap();
        assert_eq!(unit.path, PathBuf::from("src/Loop.php"));
        assert_eq!(unit.variables.len(), 2);
        assert_eq!(unit.variables["$i"].certainty, TriState::Yes);
        assert_eq!(unit.variables["maybe"].certainty, TriState::Maybe);
        assert_eq!(unit.classes.len(), 1);
        assert_eq!(unit.tree.kind(), NodeKind::Block);
    }

    #[test]
    fn test_scope_from_unit() {
        let scope = AnalysisUnit::from_yaml_str(YAML_UNIT).unwrap().scope();
        assert_eq!(scope.has_variable_type("i"), TriState::Yes);
        assert_eq!(scope.has_variable_type("maybe"), TriState::Maybe);
        assert_eq!(scope.has_variable_type("other"), TriState::No);
        assert!(scope.classes().has_class("factory"));
        assert_eq!(
            scope.get_type(&SyntaxNode::variable("i")),
            Type::Int
        );
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "variables": {"f": {"type": "Factory"}},
            "tree": {"kind": "variable", "name": "f"}
        }"#;
        let unit = AnalysisUnit::from_json_str(json).unwrap();
        assert!(unit.path.as_os_str().is_empty());
        assert_eq!(unit.variables["f"].ty, Type::object("Factory"));
        assert!(unit.classes.is_empty());
    }

    #[test]
    fn test_invalid_type_string_is_rejected() {
        let json = r#"{
            "variables": {"f": {"type": "not a type"}},
            "tree": {"kind": "block", "statements": []}
        }"#;
        assert!(matches!(
            AnalysisUnit::from_json_str(json),
            Err(UnitError::Json(_))
        ));
    }

    #[test]
    fn test_load_fills_missing_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("unit.json");
        std::fs::write(&path, r#"{"tree": {"kind": "block", "statements": []}}"#).unwrap();

        let unit = AnalysisUnit::load(&path).unwrap();
        assert_eq!(unit.path, path);
    }

    #[test]
    fn test_load_errors() {
        let dir = TempDir::new().unwrap();

        let missing = dir.path().join("missing.yaml");
        assert!(matches!(AnalysisUnit::load(&missing), Err(UnitError::Io(_))));

        let text = dir.path().join("unit.txt");
        std::fs::write(&text, "").unwrap();
        assert!(matches!(
            AnalysisUnit::load(&text),
            Err(UnitError::UnknownFormat(_))
        ));

        let broken = dir.path().join("broken.yaml");
        std::fs::write(&broken, "tree: [unclosed").unwrap();
        assert!(matches!(AnalysisUnit::load(&broken), Err(UnitError::Yaml(_))));
    }

    #[test]
    fn test_builder() {
        let unit = AnalysisUnit::new("a.php", SyntaxNode::block(vec![]))
            .with_variable("x", Type::Int, TriState::Maybe)
            .with_class(ClassDef::new("Foo"));
        let scope = unit.scope();
        assert_eq!(scope.has_variable_type("x"), TriState::Maybe);
        assert!(scope.classes().has_class("Foo"));
    }
}
