#![forbid(unsafe_code)]

use miette::Diagnostic;
use sable_ast::Span;
use sable_compile::CompileError;
use sable_ir::RegistryError;
use sable_parse::ParseError;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ImportError {
    /// The mandatory `op_version_set = <integer>` first statement is missing
    /// or malformed.
    #[error("malformed header: {message}")]
    #[diagnostic(code(sable::import::malformed_header))]
    MalformedHeader {
        message: String,
        #[label]
        span: Span,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    #[diagnostic(code(sable::import::registry))]
    Registry(#[from] RegistryError),
}
