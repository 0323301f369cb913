//! Static methods reached through an instance receiver

use crate::node::{NodeKind, SyntaxNode};
use crate::resolver::TypeResolver;
use crate::rule::{expect_kind, Rule, RuleCategory, RuleError, RuleMetadata};
use crate::scope::Scope;
use crate::types::{MethodContainer, MethodDescriptor, Type};

pub const CALLABLE_ID: &str = "dynamic-call-on-static-method-callable";
pub const CALL_ID: &str = "dynamic-call-on-static-method";

/// Resolve `receiver->name` and return the method if it is provably static
fn provably_static_method(
    resolver: &TypeResolver,
    scope: &dyn Scope,
    receiver: &SyntaxNode,
    name: &SyntaxNode,
) -> Option<MethodDescriptor> {
    let name = name.as_identifier()?;
    let classes = scope.classes();

    let callable = |ty: &Type| ty.can_call_methods().and(ty.has_method(name, classes));

    let found = resolver.find_type_to_check(scope, receiver, |ty| callable(ty).yes());
    let ty = found.ty;

    if ty.is_error() || !callable(&ty).yes() {
        return None;
    }

    ty.get_method(name, classes).filter(|m| m.is_static)
}

fn static_call_error(method: &MethodDescriptor) -> RuleError {
    RuleError::new(format!(
        "Dynamic call to static method {}::{}().",
        method.declaring_class, method.name
    ))
}

/// Flags `$obj->method(...)` first-class callables whose target is static
pub struct DynamicCallOnStaticMethodsCallable {
    meta: RuleMetadata,
    resolver: TypeResolver,
}

impl DynamicCallOnStaticMethodsCallable {
    pub fn new(resolver: TypeResolver) -> Self {
        Self {
            meta: RuleMetadata::new(CALLABLE_ID)
                .with_category(RuleCategory::Suspicious)
                .with_description("Callable taken through an instance refers to a static method")
                .with_rationale("The bound instance is ignored by a static method")
                .with_example_bad("$make = $factory->create(...);")
                .with_example_good("$make = Factory::create(...);"),
            resolver,
        }
    }
}

impl Rule for DynamicCallOnStaticMethodsCallable {
    fn metadata(&self) -> &RuleMetadata {
        &self.meta
    }

    fn node_kind(&self) -> NodeKind {
        NodeKind::MethodCallReference
    }

    fn evaluate(&self, node: &SyntaxNode, scope: &dyn Scope) -> Vec<RuleError> {
        expect_kind(self, node);
        let SyntaxNode::MethodCallReference { receiver, name, .. } = node else {
            return Vec::new();
        };

        provably_static_method(&self.resolver, scope, receiver, name)
            .map(|method| vec![static_call_error(&method)])
            .unwrap_or_default()
    }
}

/// Flags `$obj->method()` calls whose target is static
pub struct DynamicCallOnStaticMethods {
    meta: RuleMetadata,
    resolver: TypeResolver,
}

impl DynamicCallOnStaticMethods {
    pub fn new(resolver: TypeResolver) -> Self {
        Self {
            meta: RuleMetadata::new(CALL_ID)
                .with_category(RuleCategory::Suspicious)
                .with_description("Static method is called through an instance")
                .with_rationale("The receiver instance is ignored by a static method")
                .with_example_bad("$factory->create();")
                .with_example_good("Factory::create();"),
            resolver,
        }
    }
}

impl Rule for DynamicCallOnStaticMethods {
    fn metadata(&self) -> &RuleMetadata {
        &self.meta
    }

    fn node_kind(&self) -> NodeKind {
        NodeKind::MethodCall
    }

    fn evaluate(&self, node: &SyntaxNode, scope: &dyn Scope) -> Vec<RuleError> {
        expect_kind(self, node);
        let SyntaxNode::MethodCall { receiver, name, .. } = node else {
            return Vec::new();
        };

        provably_static_method(&self.resolver, scope, receiver, name)
            .map(|method| vec![static_call_error(&method)])
            .unwrap_or_default()
    }
}
