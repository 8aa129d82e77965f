#![forbid(unsafe_code)]

use sable_ir::{ClassId, Constant, QualifiedName, Type, TypeRegistry, ValueId};

/// The resolved meaning of an identifier or attribute chain, prior to type
/// checking.
///
/// A closed variant set: every consumer matches exhaustively, so adding a
/// kind forces every resolution site to say what it does with it.
#[derive(Clone, Debug)]
pub enum SymbolicValue<'a> {
    /// Root of the secondary op namespace: `ops.<module>.<op>`.
    Ops { version: u64 },
    /// One builtin op module; attribute access yields a concrete op symbol,
    /// resolved against the unit's format version.
    BuiltinModule { module: String, version: u64 },
    /// A fully resolved builtin op, ready to be called.
    BuiltinFunction(String),
    /// Indexed access into the caller's constant table via `c<N>` attributes.
    ConstantTable { constants: &'a [Constant] },
    /// A (possibly partial) dotted path under the reserved root namespace.
    ClassNamespace {
        name: QualifiedName,
        registry: &'a TypeRegistry,
    },
    /// A registered class type.
    Class(ClassId),
    /// A fixed scalar, materialized into the graph at first use.
    Literal(Constant),
    /// An already-materialized IR value.
    Simple(ValueId),
    /// A method bound to a receiver value, ready to be called.
    Method { object: ValueId, name: String },
    /// Special form: parallel invocation.
    Fork,
    /// Special form: explicit type annotation.
    Annotate,
}

/// Maps bare identifiers to symbolic values while a definition compiles.
///
/// Resolution is read-only: implementations never mutate the registry or
/// the constant table.
pub trait Resolver {
    fn resolve(&self, name: &str) -> Option<SymbolicValue<'_>>;

    /// Direct lookup of a fully dotted type name, for explicit annotations.
    fn resolve_type(&self, dotted: &str) -> Option<Type>;
}
