#![forbid(unsafe_code)]

use miette::Diagnostic;
use sable_ast::Span;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
#[error("parse error: {message}")]
#[diagnostic(code(sable::parse))]
pub struct ParseError {
    pub message: String,
    #[label]
    pub span: Span,
}
