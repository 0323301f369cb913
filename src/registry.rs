//! Ordered rule registration, indexed by node kind

use crate::node::NodeKind;
use crate::resolver::TypeResolver;
use crate::rule::Rule;
use crate::rules::builtin_rules;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Error registering a rule
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("rule '{0}' is already registered")]
    DuplicateRule(String),
}

/// Rules in registration order, with a per-kind index for dispatch
#[derive(Clone, Default)]
pub struct RuleRegistry {
    rules: Vec<Arc<dyn Rule>>,
    by_kind: HashMap<NodeKind, Vec<usize>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in rule
    pub fn builtin(resolver: TypeResolver) -> Self {
        let mut registry = Self::new();
        for rule in builtin_rules(resolver) {
            // Built-in ids are unique
            if let Err(e) = registry.register(rule) {
                log::warn!("{}", e);
            }
        }
        registry
    }

    /// Append a rule. Ids must be unique.
    pub fn register(&mut self, rule: Arc<dyn Rule>) -> Result<(), RegistryError> {
        if self.get(rule.id()).is_some() {
            return Err(RegistryError::DuplicateRule(rule.id().to_string()));
        }

        log::debug!("registering rule '{}' for {}", rule.id(), rule.node_kind());
        let index = self.rules.len();
        self.by_kind.entry(rule.node_kind()).or_default().push(index);
        self.rules.push(rule);
        Ok(())
    }

    /// Rules declared for `kind`, in registration order
    pub fn rules_for(&self, kind: NodeKind) -> impl Iterator<Item = &Arc<dyn Rule>> + '_ {
        self.by_kind
            .get(&kind)
            .into_iter()
            .flatten()
            .map(move |&i| &self.rules[i])
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Rule>> {
        self.rules.iter().find(|r| r.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Rule>> + '_ {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Copy of this registry keeping only rules accepted by `keep`
    pub fn filtered<F>(&self, keep: F) -> Self
    where
        F: Fn(&dyn Rule) -> bool,
    {
        let mut registry = Self::new();
        for rule in &self.rules {
            if keep(rule.as_ref()) {
                if let Err(e) = registry.register(Arc::clone(rule)) {
                    log::warn!("{}", e);
                }
            } else {
                log::debug!("rule '{}' disabled", rule.id());
            }
        }
        registry
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.rules.iter().map(|r| r.id())).finish()
    }
}
