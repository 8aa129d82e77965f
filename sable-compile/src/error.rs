#![forbid(unsafe_code)]

use miette::Diagnostic;
use sable_ast::Span;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CompileError {
    #[error("unresolved identifier '{name}'")]
    #[diagnostic(code(sable::compile::unresolved_identifier))]
    UnresolvedIdentifier {
        name: String,
        #[label]
        span: Span,
    },

    #[error("unresolved type '{name}'")]
    #[diagnostic(code(sable::compile::unresolved_type))]
    UnresolvedType {
        name: String,
        #[label]
        span: Span,
    },

    #[error("invalid constant specifier: {field}")]
    #[diagnostic(code(sable::compile::invalid_constant_specifier))]
    InvalidConstantSpecifier {
        field: String,
        #[label]
        span: Span,
    },

    #[error("constant index {index} is out of bounds (constant table has {len} entries)")]
    #[diagnostic(code(sable::compile::constant_index_out_of_range))]
    ConstantIndexOutOfRange {
        index: i64,
        len: usize,
        #[label]
        span: Span,
    },

    #[error("semantic error: {message}")]
    #[diagnostic(code(sable::compile::semantic))]
    Semantic {
        message: String,
        #[label]
        span: Span,
    },
}
