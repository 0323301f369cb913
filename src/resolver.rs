//! Narrowing an expression's type to the part a rule can reason about

use crate::node::SyntaxNode;
use crate::scope::Scope;
use crate::types::Type;
use serde::{Deserialize, Serialize};

/// How strictly types are resolved before rules inspect them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverOptions {
    /// Keep unions whole instead of narrowing them to satisfying members
    pub check_union_types: bool,

    /// Keep `null` in types instead of stripping it
    pub check_nullables: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            check_union_types: false,
            check_nullables: true,
        }
    }
}

/// Outcome of [`TypeResolver::find_type_to_check`]
#[derive(Debug, Clone, PartialEq)]
pub struct FoundType {
    pub ty: Type,
    /// Classes referenced by the expression's type that are not declared
    pub unknown_classes: Vec<String>,
}

impl FoundType {
    fn found(ty: Type) -> Self {
        Self {
            ty,
            unknown_classes: Vec::new(),
        }
    }

    fn error() -> Self {
        Self::found(Type::Error)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TypeResolver {
    options: ResolverOptions,
}

impl TypeResolver {
    pub fn new(options: ResolverOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> ResolverOptions {
        self.options
    }

    /// Resolve the type of `expr`, narrowed with `criteria` when unions are
    /// not checked strictly.
    ///
    /// Returns `Type::Error` whenever nothing certain can be said: unknown
    /// or mixed types, undeclared classes, or no union member satisfying
    /// `criteria`.
    pub fn find_type_to_check<F>(
        &self,
        scope: &dyn Scope,
        expr: &SyntaxNode,
        criteria: F,
    ) -> FoundType
    where
        F: Fn(&Type) -> bool,
    {
        let mut ty = scope.get_type(expr);
        if matches!(ty, Type::Mixed | Type::Never | Type::Error) {
            return FoundType::error();
        }

        if !self.options.check_nullables {
            ty = ty.without_null();
            if ty == Type::Never {
                return FoundType::error();
            }
        }

        let unknown_classes: Vec<String> = ty
            .referenced_classes()
            .into_iter()
            .filter(|class| !scope.classes().has_class(class))
            .map(String::from)
            .collect();
        if !unknown_classes.is_empty() {
            log::trace!("unknown classes in {}: {:?}", ty, unknown_classes);
            return FoundType {
                ty: Type::Error,
                unknown_classes,
            };
        }

        if !self.options.check_union_types {
            if ty == Type::ObjectWithoutClass {
                return FoundType::error();
            }
            if let Type::Union(members) = &ty {
                let narrowed: Vec<Type> =
                    members.iter().filter(|m| criteria(*m)).cloned().collect();
                if !narrowed.is_empty() {
                    return FoundType::found(Type::union(narrowed));
                }
            }
        }

        FoundType::found(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::StaticScope;
    use crate::types::{ClassDef, ClassRegistry, MethodContainer, MethodDef};

    fn scope() -> StaticScope {
        StaticScope::new(ClassRegistry::from_defs([
            ClassDef::new("Foo").with_method(MethodDef::static_method("make")),
            ClassDef::new("Bar"),
        ]))
        .with_variable("foo", Type::object("Foo"))
        .with_variable("nullable", Type::parse("Foo|null").unwrap())
        .with_variable("either", Type::parse("Foo|Bar").unwrap())
        .with_variable("ghost", Type::object("Ghost"))
        .with_variable("obj", Type::ObjectWithoutClass)
    }

    fn has_make(scope: &StaticScope) -> impl Fn(&Type) -> bool + '_ {
        move |t: &Type| {
            t.can_call_methods().yes() && t.has_method("make", scope.classes()).yes()
        }
    }

    #[test]
    fn test_plain_object() {
        let scope = scope();
        let found = TypeResolver::default().find_type_to_check(
            &scope,
            &SyntaxNode::variable("foo"),
            has_make(&scope),
        );
        assert_eq!(found.ty, Type::object("Foo"));
    }

    #[test]
    fn test_mixed_is_error() {
        let scope = scope();
        let found = TypeResolver::default().find_type_to_check(
            &scope,
            &SyntaxNode::variable("undefined"),
            has_make(&scope),
        );
        assert!(found.ty.is_error());
    }

    #[test]
    fn test_unknown_class_is_error() {
        let scope = scope();
        let found = TypeResolver::default().find_type_to_check(
            &scope,
            &SyntaxNode::variable("ghost"),
            has_make(&scope),
        );
        assert!(found.ty.is_error());
        assert_eq!(found.unknown_classes, vec!["Ghost".to_string()]);
    }

    #[test]
    fn test_strict_unions_are_kept() {
        let scope = scope();
        let resolver = TypeResolver::new(ResolverOptions {
            check_union_types: true,
            check_nullables: true,
        });
        let found =
            resolver.find_type_to_check(&scope, &SyntaxNode::variable("either"), has_make(&scope));
        assert_eq!(found.ty, Type::parse("Foo|Bar").unwrap());
    }

    #[test]
    fn test_default_narrows_unions() {
        let resolver = TypeResolver::default();
        assert!(!resolver.options().check_union_types);
        assert!(resolver.options().check_nullables);

        let scope = scope();
        let found =
            resolver.find_type_to_check(&scope, &SyntaxNode::variable("either"), has_make(&scope));
        assert_eq!(found.ty, Type::object("Foo"));

        let found = resolver.find_type_to_check(
            &scope,
            &SyntaxNode::variable("nullable"),
            has_make(&scope),
        );
        assert_eq!(found.ty, Type::object("Foo"));
    }

    #[test]
    fn test_lenient_unions_are_narrowed() {
        let scope = scope();
        let resolver = TypeResolver::new(ResolverOptions {
            check_union_types: false,
            check_nullables: false,
        });
        let found =
            resolver.find_type_to_check(&scope, &SyntaxNode::variable("either"), has_make(&scope));
        assert_eq!(found.ty, Type::object("Foo"));

        let found =
            resolver.find_type_to_check(&scope, &SyntaxNode::variable("obj"), has_make(&scope));
        assert!(found.ty.is_error());
    }

    #[test]
    fn test_nullables_stripped_when_not_checked() {
        let scope = scope();
        let resolver = TypeResolver::new(ResolverOptions {
            check_union_types: true,
            check_nullables: false,
        });
        let found = resolver.find_type_to_check(
            &scope,
            &SyntaxNode::variable("nullable"),
            has_make(&scope),
        );
        assert_eq!(found.ty, Type::object("Foo"));

        let found = resolver.find_type_to_check(
            &scope,
            &SyntaxNode::literal(crate::node::LiteralValue::Null),
            has_make(&scope),
        );
        assert!(found.ty.is_error());
    }
}
