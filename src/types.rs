//! Inferred types and the method-capability queries rules ask of them

use crate::trinary::TriState;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

/// Error parsing a type string
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("empty type string")]
    Empty,

    #[error("invalid type '{0}'")]
    Invalid(String),
}

/// A statically inferred type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Inference failed; never used to prove anything
    Error,
    /// Anything at all
    Mixed,
    /// No value (unreachable)
    Never,
    Null,
    Int,
    Float,
    String,
    Bool,
    Array,
    /// Instance of a named class
    Object(ObjectType),
    /// Some object of unknown class
    ObjectWithoutClass,
    /// One of several types; always flattened with at least two members
    Union(Vec<Type>),
}

impl Type {
    pub fn object(class: &str) -> Self {
        Type::Object(ObjectType::new(class))
    }

    /// Build a normalized union: nested unions are flattened, duplicates
    /// dropped, `mixed` absorbs everything and a single member collapses.
    pub fn union(types: impl IntoIterator<Item = Type>) -> Self {
        let mut members: Vec<Type> = Vec::new();
        for ty in types {
            let flattened = match ty {
                Type::Union(inner) => inner,
                other => vec![other],
            };
            for member in flattened {
                if member == Type::Mixed {
                    return Type::Mixed;
                }
                if member == Type::Never {
                    continue;
                }
                if !members.contains(&member) {
                    members.push(member);
                }
            }
        }

        match members.len() {
            0 => Type::Never,
            1 => members.remove(0),
            _ => Type::Union(members),
        }
    }

    /// Parse a type string such as `Foo`, `?Foo`, `int|null` or `A|B`
    pub fn parse(input: &str) -> Result<Self, TypeError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(TypeError::Empty);
        }

        let mut members = Vec::new();
        for part in input.split('|') {
            let part = part.trim();
            if let Some(inner) = part.strip_prefix('?') {
                members.push(parse_atom(inner)?);
                members.push(Type::Null);
            } else {
                members.push(parse_atom(part)?);
            }
        }

        Ok(Type::union(members))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }

    /// Members of a union, or the type itself
    pub fn members(&self) -> &[Type] {
        match self {
            Type::Union(members) => members,
            other => std::slice::from_ref(other),
        }
    }

    /// This type with `null` taken out
    pub fn without_null(&self) -> Type {
        match self {
            Type::Null => Type::Never,
            Type::Union(members) => {
                Type::union(members.iter().filter(|m| **m != Type::Null).cloned())
            }
            other => other.clone(),
        }
    }

    /// Class names this type refers to
    pub fn referenced_classes(&self) -> Vec<&str> {
        self.members()
            .iter()
            .filter_map(|m| match m {
                Type::Object(o) => Some(o.class.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Class name, optionally namespaced and fully qualified
static CLASS_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\\?[A-Za-z_][A-Za-z0-9_]*(\\[A-Za-z_][A-Za-z0-9_]*)*$").unwrap()
});

fn parse_atom(atom: &str) -> Result<Type, TypeError> {
    let ty = match atom.to_lowercase().as_str() {
        "" => return Err(TypeError::Empty),
        "mixed" => Type::Mixed,
        "never" => Type::Never,
        "null" | "void" => Type::Null,
        "int" | "integer" => Type::Int,
        "float" | "double" => Type::Float,
        "string" => Type::String,
        "bool" | "boolean" | "true" | "false" => Type::Bool,
        "array" | "iterable" => Type::Array,
        "object" => Type::ObjectWithoutClass,
        _ => {
            if !CLASS_NAME_REGEX.is_match(atom) {
                return Err(TypeError::Invalid(atom.to_string()));
            }
            Type::object(atom.trim_start_matches('\\'))
        }
    };
    Ok(ty)
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Error => write!(f, "*ERROR*"),
            Type::Mixed => write!(f, "mixed"),
            Type::Never => write!(f, "never"),
            Type::Null => write!(f, "null"),
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::String => write!(f, "string"),
            Type::Bool => write!(f, "bool"),
            Type::Array => write!(f, "array"),
            Type::Object(o) => write!(f, "{}", o.class),
            Type::ObjectWithoutClass => write!(f, "object"),
            Type::Union(members) => {
                let parts: Vec<String> = members.iter().map(|m| m.to_string()).collect();
                write!(f, "{}", parts.join("|"))
            }
        }
    }
}

impl Serialize for Type {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Type {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Type::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Metadata of a method, produced once its existence is certain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDescriptor {
    pub name: String,
    pub is_static: bool,
    /// Class in the hierarchy that declares the method
    pub declaring_class: String,
}

/// Method declaration as it appears in an analysis unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,

    #[serde(default, rename = "static")]
    pub is_static: bool,
}

impl MethodDef {
    pub fn instance(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_static: false,
        }
    }

    pub fn static_method(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_static: true,
        }
    }
}

/// Class declaration as it appears in an analysis unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,

    #[serde(default)]
    pub parent: Option<String>,

    #[serde(default)]
    pub methods: Vec<MethodDef>,
}

impl ClassDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            methods: Vec::new(),
        }
    }

    pub fn extends(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn with_method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }
}

/// Known class declarations. Class and method names are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: HashMap<String, ClassDef>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_defs(defs: impl IntoIterator<Item = ClassDef>) -> Self {
        let mut registry = Self::new();
        for def in defs {
            registry.insert(def);
        }
        registry
    }

    /// Add a class, replacing any earlier declaration with the same name
    pub fn insert(&mut self, def: ClassDef) {
        self.classes.insert(normalize(&def.name), def);
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes.contains_key(&normalize(name))
    }

    pub fn get(&self, name: &str) -> Option<&ClassDef> {
        self.classes.get(&normalize(name))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Find a method on a class or its ancestors.
    ///
    /// Returns the declaring class together with the method. Inheritance
    /// cycles end the search.
    pub fn find_method(&self, class: &str, method: &str) -> Option<(&ClassDef, &MethodDef)> {
        let mut visited = HashSet::new();
        let mut current = self.get(class);

        while let Some(def) = current {
            if !visited.insert(normalize(&def.name)) {
                break;
            }
            if let Some(m) = def
                .methods
                .iter()
                .find(|m| m.name.eq_ignore_ascii_case(method))
            {
                return Some((def, m));
            }
            current = def.parent.as_deref().and_then(|p| self.get(p));
        }

        None
    }

    /// Whether every ancestor of `class` is declared
    fn hierarchy_known(&self, class: &str) -> bool {
        let mut visited = HashSet::new();
        let mut current = class.to_string();
        loop {
            if !visited.insert(normalize(&current)) {
                return true;
            }
            match self.get(&current) {
                None => return false,
                Some(def) => match &def.parent {
                    None => return true,
                    Some(parent) => current = parent.clone(),
                },
            }
        }
    }
}

fn normalize(name: &str) -> String {
    name.trim_start_matches('\\').to_lowercase()
}

/// Capability to answer method queries.
///
/// Rules only act on definite `Yes` answers; anything uncertain must come
/// back as `Maybe`.
pub trait MethodContainer {
    fn can_call_methods(&self) -> TriState;

    fn has_method(&self, name: &str, classes: &ClassRegistry) -> TriState;

    /// Method metadata; `None` unless `has_method` is `Yes`
    fn get_method(&self, name: &str, classes: &ClassRegistry) -> Option<MethodDescriptor>;
}

/// Instance of a named class
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectType {
    pub class: String,
}

impl ObjectType {
    pub fn new(class: &str) -> Self {
        Self {
            class: class.to_string(),
        }
    }
}

impl MethodContainer for ObjectType {
    fn can_call_methods(&self) -> TriState {
        TriState::Yes
    }

    fn has_method(&self, name: &str, classes: &ClassRegistry) -> TriState {
        if !classes.has_class(&self.class) {
            return TriState::Maybe;
        }
        if classes.find_method(&self.class, name).is_some() {
            return TriState::Yes;
        }
        // An undeclared ancestor might still provide it
        if classes.hierarchy_known(&self.class) {
            TriState::No
        } else {
            TriState::Maybe
        }
    }

    fn get_method(&self, name: &str, classes: &ClassRegistry) -> Option<MethodDescriptor> {
        let (declaring, method) = classes.find_method(&self.class, name)?;
        Some(MethodDescriptor {
            name: method.name.clone(),
            is_static: method.is_static,
            declaring_class: declaring.name.clone(),
        })
    }
}

impl MethodContainer for Type {
    fn can_call_methods(&self) -> TriState {
        match self {
            Type::Object(o) => o.can_call_methods(),
            Type::ObjectWithoutClass => TriState::Yes,
            Type::Error | Type::Mixed | Type::Never => TriState::Maybe,
            Type::Null | Type::Int | Type::Float | Type::String | Type::Bool | Type::Array => {
                TriState::No
            }
            Type::Union(members) => {
                TriState::extreme_identity(members.iter().map(|m| m.can_call_methods()))
            }
        }
    }

    fn has_method(&self, name: &str, classes: &ClassRegistry) -> TriState {
        match self {
            Type::Object(o) => o.has_method(name, classes),
            Type::ObjectWithoutClass | Type::Error | Type::Mixed | Type::Never => TriState::Maybe,
            Type::Null | Type::Int | Type::Float | Type::String | Type::Bool | Type::Array => {
                TriState::No
            }
            Type::Union(members) => {
                TriState::extreme_identity(members.iter().map(|m| m.has_method(name, classes)))
            }
        }
    }

    fn get_method(&self, name: &str, classes: &ClassRegistry) -> Option<MethodDescriptor> {
        if !self.has_method(name, classes).yes() {
            return None;
        }
        match self {
            Type::Object(o) => o.get_method(name, classes),
            Type::Union(members) => {
                // Static only if static on every member
                let descriptors: Vec<MethodDescriptor> = members
                    .iter()
                    .map(|m| m.get_method(name, classes))
                    .collect::<Option<Vec<_>>>()?;
                let is_static = descriptors.iter().all(|d| d.is_static);
                descriptors.into_iter().next().map(|d| MethodDescriptor { is_static, ..d })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes() -> ClassRegistry {
        ClassRegistry::from_defs([
            ClassDef::new("Base").with_method(MethodDef::static_method("create")),
            ClassDef::new("Child")
                .extends("Base")
                .with_method(MethodDef::instance("run")),
            ClassDef::new("Orphan").extends("Missing"),
            ClassDef::new("LoopA").extends("LoopB"),
            ClassDef::new("LoopB").extends("LoopA"),
        ])
    }

    #[test]
    fn test_parse_simple_types() {
        assert_eq!(Type::parse("int").unwrap(), Type::Int);
        assert_eq!(Type::parse("Foo").unwrap(), Type::object("Foo"));
        assert_eq!(Type::parse("\\App\\Foo").unwrap(), Type::object("App\\Foo"));
        assert_eq!(Type::parse("object").unwrap(), Type::ObjectWithoutClass);
    }

    #[test]
    fn test_parse_unions() {
        assert_eq!(
            Type::parse("?Foo").unwrap(),
            Type::Union(vec![Type::object("Foo"), Type::Null])
        );
        assert_eq!(Type::parse("int|int").unwrap(), Type::Int);
        assert_eq!(Type::parse("Foo|mixed").unwrap(), Type::Mixed);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Type::parse("  "), Err(TypeError::Empty));
        assert_eq!(Type::parse("int|"), Err(TypeError::Empty));
        assert!(matches!(Type::parse("Foo-Bar"), Err(TypeError::Invalid(_))));
    }

    #[test]
    fn test_class_names_are_validated() {
        assert_eq!(
            Type::parse("App\\Model\\_User2").unwrap(),
            Type::object("App\\Model\\_User2")
        );
        for bad in ["2Fast", "App\\", "App\\\\Foo", "Foo Bar", "Foo::bar"] {
            assert_eq!(Type::parse(bad), Err(TypeError::Invalid(bad.to_string())), "{}", bad);
        }
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        let ty = Type::parse("Foo|null|int").unwrap();
        assert_eq!(ty.to_string(), "Foo|null|int");
    }

    #[test]
    fn test_without_null() {
        let ty = Type::parse("Foo|null").unwrap();
        assert_eq!(ty.without_null(), Type::object("Foo"));
        assert_eq!(Type::Null.without_null(), Type::Never);
    }

    #[test]
    fn test_find_method_walks_parents() {
        let classes = classes();
        let (declaring, method) = classes.find_method("child", "CREATE").unwrap();
        assert_eq!(declaring.name, "Base");
        assert!(method.is_static);
    }

    #[test]
    fn test_find_method_survives_cycle() {
        assert!(classes().find_method("LoopA", "anything").is_none());
    }

    #[test]
    fn test_object_has_method() {
        let classes = classes();
        let child = Type::object("Child");
        assert_eq!(child.can_call_methods(), TriState::Yes);
        assert_eq!(child.has_method("run", &classes), TriState::Yes);
        assert_eq!(child.has_method("create", &classes), TriState::Yes);
        assert_eq!(child.has_method("nope", &classes), TriState::No);
    }

    #[test]
    fn test_unknown_hierarchy_is_maybe() {
        let classes = classes();
        assert_eq!(
            Type::object("Unknown").has_method("run", &classes),
            TriState::Maybe
        );
        assert_eq!(
            Type::object("Orphan").has_method("run", &classes),
            TriState::Maybe
        );
    }

    #[test]
    fn test_scalars_cannot_call_methods() {
        let classes = classes();
        assert_eq!(Type::Int.can_call_methods(), TriState::No);
        assert_eq!(Type::Int.has_method("run", &classes), TriState::No);
        assert!(Type::Int.get_method("run", &classes).is_none());
    }

    #[test]
    fn test_union_needs_agreement() {
        let classes = classes();
        let union = Type::parse("Child|null").unwrap();
        assert_eq!(union.can_call_methods(), TriState::Maybe);

        let both = Type::parse("Child|Base").unwrap();
        assert_eq!(both.has_method("create", &classes), TriState::Yes);
        assert_eq!(both.has_method("run", &classes), TriState::Maybe);
    }

    #[test]
    fn test_get_method_descriptor() {
        let classes = classes();
        let descriptor = Type::object("Child").get_method("create", &classes).unwrap();
        assert_eq!(
            descriptor,
            MethodDescriptor {
                name: "create".to_string(),
                is_static: true,
                declaring_class: "Base".to_string(),
            }
        );
        assert!(Type::Mixed.get_method("create", &classes).is_none());
    }

    #[test]
    fn test_type_deserialize_from_string() {
        let ty: Type = serde_yaml::from_str("\"Foo|null\"").unwrap();
        assert_eq!(ty.referenced_classes(), vec!["Foo"]);
        assert!(serde_yaml::from_str::<Type>("\"1nvalid\"").is_err());
    }
}
