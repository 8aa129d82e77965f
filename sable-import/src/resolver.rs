#![forbid(unsafe_code)]

use sable_compile::{Resolver, SymbolicValue};
use sable_ir::{Constant, QualifiedName, Type, TypeRegistry};

/// The sandboxed symbol environment used while re-importing serialized
/// definitions.
///
/// Deliberately closed: the only names a serialized body can reach are the
/// builtin op namespaces, the constant table, the two special forms, the
/// float literals, and the reserved class-namespace root. Nothing here ever
/// mutates the registry or the constant table.
pub struct SourceResolver<'a> {
    version: u64,
    constants: &'a [Constant],
    registry: &'a TypeRegistry,
}

impl<'a> SourceResolver<'a> {
    pub fn new(version: u64, constants: &'a [Constant], registry: &'a TypeRegistry) -> Self {
        Self {
            version,
            constants,
            registry,
        }
    }
}

impl Resolver for SourceResolver<'_> {
    fn resolve(&self, name: &str) -> Option<SymbolicValue<'_>> {
        match name {
            // Root of the builtin op library; op resolution depends on the
            // unit's format version.
            "sable" => Some(SymbolicValue::BuiltinModule {
                module: "core".to_string(),
                version: self.version,
            }),
            "ops" => Some(SymbolicValue::Ops {
                version: self.version,
            }),
            // Constants present in the serialized artifact; resolves
            // `CONSTANTS.c<n>` to the actual payload.
            "CONSTANTS" => Some(SymbolicValue::ConstantTable {
                constants: self.constants,
            }),
            "fork" => Some(SymbolicValue::Fork),
            "annotate" => Some(SymbolicValue::Annotate),
            "inf" => Some(SymbolicValue::Literal(Constant::Float(f64::INFINITY))),
            "nan" => Some(SymbolicValue::Literal(Constant::Float(f64::NAN))),
            "__sable__" => Some(SymbolicValue::ClassNamespace {
                name: QualifiedName::new("__sable__"),
                registry: self.registry,
            }),
            _ => None,
        }
    }

    fn resolve_type(&self, dotted: &str) -> Option<Type> {
        let name = QualifiedName::from_dotted(dotted)?;
        self.registry.get(&name).map(Type::Class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_literals_ignore_version() {
        let constants: Vec<Constant> = Vec::new();
        let registry = TypeRegistry::new();
        for version in [0, 1, 99] {
            let r = SourceResolver::new(version, &constants, &registry);
            let Some(SymbolicValue::Literal(Constant::Float(inf))) = r.resolve("inf") else {
                panic!("inf must resolve to a float literal");
            };
            assert_eq!(inf, f64::INFINITY);
            let Some(SymbolicValue::Literal(Constant::Float(nan))) = r.resolve("nan") else {
                panic!("nan must resolve to a float literal");
            };
            assert!(nan.is_nan());
        }
    }

    #[test]
    fn unknown_names_are_not_found() {
        let constants: Vec<Constant> = Vec::new();
        let registry = TypeRegistry::new();
        let r = SourceResolver::new(0, &constants, &registry);
        assert!(r.resolve("globals").is_none());
        assert!(r.resolve("self").is_none());
    }

    #[test]
    fn root_namespace_token_opens_a_namespace() {
        let constants: Vec<Constant> = Vec::new();
        let registry = TypeRegistry::new();
        let r = SourceResolver::new(0, &constants, &registry);
        let Some(SymbolicValue::ClassNamespace { name, .. }) = r.resolve("__sable__") else {
            panic!("__sable__ must open a class namespace");
        };
        assert_eq!(name.to_string(), "__sable__");
    }

    #[test]
    fn resolve_type_hits_the_registry_directly() {
        let constants: Vec<Constant> = Vec::new();
        let mut registry = TypeRegistry::new();
        let q = QualifiedName::from_dotted("__sable__.A.B").unwrap();
        let id = registry.create(q).unwrap();

        let r = SourceResolver::new(0, &constants, &registry);
        assert_eq!(r.resolve_type("__sable__.A.B"), Some(Type::Class(id)));
        assert_eq!(r.resolve_type("__sable__.A.C"), None);
    }
}
