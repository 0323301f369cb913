//! Built-in rules

pub mod for_loop;
pub mod strict_calls;

pub use for_loop::OverwriteVariablesWithForLoopInit;
pub use strict_calls::{DynamicCallOnStaticMethods, DynamicCallOnStaticMethodsCallable};

use crate::resolver::TypeResolver;
use crate::rule::Rule;
use std::sync::Arc;

/// All built-in rules, in registration order
pub fn builtin_rules(resolver: TypeResolver) -> Vec<Arc<dyn Rule>> {
    vec![
        Arc::new(OverwriteVariablesWithForLoopInit::new()),
        Arc::new(DynamicCallOnStaticMethodsCallable::new(resolver)),
        Arc::new(DynamicCallOnStaticMethods::new(resolver)),
    ]
}
