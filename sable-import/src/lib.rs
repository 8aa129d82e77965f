#![forbid(unsafe_code)]

//! Re-imports serialized method and class definitions into executable IR.
//!
//! Compiled artifacts persist their code as readable text; loading that text
//! back must reproduce exactly the IR the original compiler emitted. Every
//! source unit opens with a format-version assignment and an import
//! preamble, followed by the definitions themselves. Identifiers resolve
//! against a closed, sandboxed environment ([`SourceResolver`]) instead of a
//! general namespace, and `CONSTANTS.c<n>` references index into a constant
//! table supplied out of band by the caller.

mod error;
mod resolver;

use std::collections::BTreeSet;

use sable_ast::span_between;
use sable_compile::{compile_definitions, Resolver, SymbolicValue};
use sable_ir::{Constant, Graph, Module, QualifiedName, Type, TypeRegistry, ValueId};
use sable_lex::TokenKind;
use sable_parse::Parser;

pub use error::ImportError;
pub use resolver::SourceResolver;

/// Reads the mandatory `op_version_set = <integer>` first statement.
///
/// The version gates builtin op resolution for the rest of the unit. No
/// upper bound is enforced; text written by a newer serializer simply
/// resolves to op variants this build may not know, which is the op
/// registry's problem, not the importer's.
pub fn parse_version_number(p: &mut Parser<'_>) -> Result<u64, ImportError> {
    let header_span = p.peek_span().unwrap_or_else(|| span_between(0, 0));
    let malformed = |message: String, span| ImportError::MalformedHeader { message, span };

    let name = p.expect_ident().map_err(|_| {
        malformed(
            "expected an assignment to op_version_set".to_string(),
            header_span,
        )
    })?;
    if name.node != "op_version_set" {
        return Err(malformed(
            format!("expected an assignment to op_version_set, found '{}'", name.node),
            name.span,
        ));
    }
    p.expect(TokenKind::Eq)
        .map_err(|e| malformed("expected '=' after op_version_set".to_string(), e.span))?;

    let tok = p
        .expect_any()
        .map_err(|e| malformed("expected an integral version".to_string(), e.span))?;
    let version = match tok.kind {
        TokenKind::Int(n) if n >= 0 => n as u64,
        _ => {
            return Err(malformed(
                format!("expected an integral version, found '{}'", p.token_text(&tok)),
                tok.span,
            ));
        }
    };

    p.expect(TokenKind::Newline)
        .map_err(|e| malformed("expected a newline after the version".to_string(), e.span))?;

    Ok(version)
}

/// Consumes the import preamble: every `import ...` line up to the first
/// definition.
///
/// The dependency name is the concatenated source spelling of everything
/// between the keyword and the line terminator. Names deduplicate with set
/// semantics; order is not significant. The importer reports dependencies,
/// it never loads them.
pub fn parse_imports(p: &mut Parser<'_>) -> Result<BTreeSet<String>, ImportError> {
    let mut imports = BTreeSet::new();

    while p.next_if(TokenKind::KwImport).is_some() {
        let mut name = String::new();
        while !p.at(TokenKind::Newline) {
            let tok = p.expect_any()?;
            name.push_str(p.token_text(&tok));
        }
        p.expect(TokenKind::Newline)?;
        // An empty name means the lexer handed us an import keyword with
        // nothing behind it; that is an upstream contract violation.
        assert!(!name.is_empty(), "import statement with no dependency name");
        imports.insert(name);
    }

    Ok(imports)
}

/// Re-imports serialized methods onto an existing object instance.
///
/// Parses the version and preamble, invokes `import_callback` once per
/// unique dependency, then parses method definitions until end of input.
/// All definitions share one resolver; the receiver slot is typed as the
/// instance's own class. The batch commits only if every definition
/// compiles; committed methods overwrite same-named ones, so importing the
/// same text twice lands on the same state.
pub fn import_methods(
    module: Module,
    src: &str,
    constants: &[Constant],
    registry: &mut TypeRegistry,
    mut import_callback: impl FnMut(&str),
) -> Result<(), ImportError> {
    let mut p = Parser::from_source(src)?;
    let version = parse_version_number(&mut p)?;
    for name in parse_imports(&mut p)? {
        import_callback(&name);
    }

    let mut definitions = Vec::new();
    while !p.is_eof() {
        definitions.push(p.parse_function(true)?);
    }

    let resolver = SourceResolver::new(version, constants, &*registry);
    let resolvers: Vec<&dyn Resolver> = definitions.iter().map(|_| &resolver as &dyn Resolver).collect();
    let class = module.ty;
    let bind = move |g: &mut Graph, v: ValueId| {
        g.set_type(v, Type::Class(class));
        SymbolicValue::Simple(v)
    };
    let functions = compile_definitions(&definitions, &resolvers, version, Some(&bind))?;

    registry.class_mut(class).unit.install(functions);
    Ok(())
}

/// Re-imports serialized classes, creating a fresh type per class body.
///
/// The version is parsed once; then each class brings its own import
/// preamble, its own resolver, and its own compilation unit. The class is
/// registered under `qualifier.<ClassName>` before its methods compile, so
/// later classes in the same unit can reference it. Classes are independent:
/// a failure partway through leaves previously completed classes registered.
pub fn import_libs(
    qualifier: &QualifiedName,
    src: &str,
    constants: &[Constant],
    registry: &mut TypeRegistry,
    mut import_callback: impl FnMut(&str),
) -> Result<(), ImportError> {
    let mut p = Parser::from_source(src)?;
    let version = parse_version_number(&mut p)?;

    while !p.is_eof() {
        for name in parse_imports(&mut p)? {
            import_callback(&name);
        }

        let class_def = p.parse_class()?;
        let qualified = qualifier.child(class_def.name.node.clone());
        let class = registry.create(qualified)?;

        let resolver = SourceResolver::new(version, constants, &*registry);
        let resolvers: Vec<&dyn Resolver> =
            class_def.methods.iter().map(|_| &resolver as &dyn Resolver).collect();
        let bind = move |g: &mut Graph, v: ValueId| {
            g.set_type(v, Type::Class(class));
            SymbolicValue::Simple(v)
        };
        let functions =
            compile_definitions(&class_def.methods, &resolvers, version, Some(&bind))?;

        registry.class_mut(class).unit.install(functions);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_gate_returns_the_parsed_version() {
        for v in [0u64, 1, 2, 9999] {
            let src = format!("op_version_set = {v}\n");
            let mut p = Parser::from_source(&src).unwrap();
            assert_eq!(parse_version_number(&mut p).unwrap(), v);
        }
    }

    #[test]
    fn version_gate_rejects_wrong_name() {
        let mut p = Parser::from_source("version = 1\n").unwrap();
        let err = parse_version_number(&mut p).unwrap_err();
        assert!(matches!(err, ImportError::MalformedHeader { ref message, .. }
            if message.contains("op_version_set")));
    }

    #[test]
    fn version_gate_rejects_non_integral_version() {
        let mut p = Parser::from_source("op_version_set = 1.5\n").unwrap();
        let err = parse_version_number(&mut p).unwrap_err();
        assert!(matches!(err, ImportError::MalformedHeader { ref message, .. }
            if message.contains("integral")));
    }

    #[test]
    fn version_gate_rejects_missing_statement() {
        let mut p = Parser::from_source("def f(self):\n  pass\n").unwrap();
        assert!(matches!(
            parse_version_number(&mut p),
            Err(ImportError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn imports_concatenate_and_deduplicate() {
        let src = "import a.b.c\nimport a.b.c\nimport other\n";
        let mut p = Parser::from_source(src).unwrap();
        let imports = parse_imports(&mut p).unwrap();
        assert_eq!(
            imports.into_iter().collect::<Vec<_>>(),
            vec!["a.b.c".to_string(), "other".to_string()]
        );
        assert!(p.is_eof());
    }

    #[test]
    fn imports_stop_at_first_definition() {
        let src = "import dep\ndef f(self):\n  pass\n";
        let mut p = Parser::from_source(src).unwrap();
        let imports = parse_imports(&mut p).unwrap();
        assert_eq!(imports.len(), 1);
        assert!(p.parse_function(true).is_ok());
    }
}
