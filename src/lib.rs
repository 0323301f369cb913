//! Strictcheck - strict static-analysis rules over a typed syntax tree
//!
//! Rules are small units of analysis bound to one node kind. A dispatcher
//! walks a syntax tree once, hands every node to the rules registered for
//! its kind, and turns their errors into diagnostics. Semantic questions
//! (is this variable bound? what type does this expression have?) go
//! through a [`Scope`] oracle and are answered in three-valued logic.
//!
//! # Architecture
//!
//! ```text
//! CLI/API -> Engine -> AnalysisUnit -> Dispatcher -> RuleRegistry -> Rule
//!                                          |                          |
//!                                          +------- Scope <-----------+
//! ```
//!
//! # Analysis units
//!
//! Trees are read from YAML or JSON files:
//!
//! ```yaml
//! path: src/Loop.php
//! variables:
//!   $i: { type: int }
//! classes:
//!   - name: Factory
//!     methods: [ { name: create, static: true } ]
//! tree:
//!   kind: for_loop
//!   init:
//!     - kind: assignment
//!       target: { kind: variable, name: i }
//!       value: { kind: literal, value: 0 }
//! ```

pub mod config;
pub mod diagnostic;
pub mod dispatcher;
pub mod engine;
pub mod node;
pub mod output;
pub mod registry;
pub mod resolver;
pub mod rule;
pub mod rules;
pub mod scope;
pub mod trinary;
pub mod types;
pub mod unit;

// Re-export main types
pub use config::Config;
pub use diagnostic::{Diagnostic, Location, Severity};
pub use dispatcher::Dispatcher;
pub use engine::{AnalysisResult, Engine, RuleTiming};
pub use node::{NodeKind, SyntaxNode};
pub use output::{JsonFormatter, OutputFormatter, TextFormatter};
pub use registry::{RegistryError, RuleRegistry};
pub use resolver::{FoundType, ResolverOptions, TypeResolver};
pub use rule::{Rule, RuleCategory, RuleError, RuleMetadata};
pub use scope::{Scope, StaticScope};
pub use trinary::TriState;
pub use types::{ClassDef, ClassRegistry, MethodContainer, MethodDef, Type};
pub use unit::{AnalysisUnit, UnitError};
