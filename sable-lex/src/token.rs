#![forbid(unsafe_code)]

use sable_ast::Span;

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Keywords
    KwImport,
    KwDef,
    KwClass,
    KwReturn,
    KwPass,

    // Operators / punctuation
    Eq,
    Dot,
    Comma,
    Colon,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,

    Newline,
    Indent,
    Dedent,
    Eof,

    // Literals / identifiers
    Int(i64),
    Float(f64),
    String(String),
    Ident(String),
}
