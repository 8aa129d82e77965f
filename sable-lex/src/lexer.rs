#![forbid(unsafe_code)]

use logos::Logos;
use miette::Diagnostic;
use sable_ast::{span_between, Span};
use thiserror::Error;

use crate::token::{Token, TokenKind};

#[derive(Debug, Error, Diagnostic)]
#[error("lex error: {message}")]
#[diagnostic(code(sable::lex))]
pub struct LexError {
    pub message: String,
    #[label]
    pub span: Span,
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \f\r]+")]
enum RawToken {
    #[token("import")]
    KwImport,
    #[token("def")]
    KwDef,
    #[token("class")]
    KwClass,
    #[token("return")]
    KwReturn,
    #[token("pass")]
    KwPass,

    #[token("=")]
    Eq,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,

    // Floats before ints so `1.5` never splits into `1` `.` `5`.
    #[regex(r"[0-9][0-9_]*\.[0-9]+([eE][+-]?[0-9]+)?", |lex| parse_float(lex.slice()))]
    Float(Option<f64>),

    #[regex(r"[0-9][0-9_]*", |lex| parse_int_decimal(lex.slice()))]
    Int(Option<i64>),

    // String literals: "..." with a limited, strict set of escapes.
    // Supported: \n, \t, \r, \", \\
    #[regex(r#""([^"\\]|\\.)*""#, parse_string)]
    String(Option<String>),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
}

fn parse_int_decimal(s: &str) -> Option<i64> {
    let digits = strip_underscores(s)?;
    digits.parse::<i64>().ok()
}

fn parse_float(s: &str) -> Option<f64> {
    let digits = strip_underscores(s)?;
    digits.parse::<f64>().ok()
}

fn strip_underscores(s: &str) -> Option<String> {
    if s.is_empty() {
        return None;
    }
    if s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return None;
    }
    Some(s.replace('_', ""))
}

fn parse_string(lex: &mut logos::Lexer<RawToken>) -> Option<String> {
    let s = lex.slice();
    let inner = &s[1..s.len().saturating_sub(1)];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            _ => return None,
        }
    }

    Some(out)
}

pub struct Lexer<'a> {
    src: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src }
    }

    pub fn lex(&self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        let mut indent_stack: Vec<usize> = vec![0];

        // Track absolute byte offsets.
        let mut line_start = 0usize;

        for line in self.src.split_inclusive('\n') {
            let line_len = line.len();
            let line_end = line_start + line_len;

            // Strip trailing newline for indentation + raw lexing.
            let mut content = line;
            if content.ends_with('\n') {
                content = &content[..content.len() - 1];
            }

            // Skip completely empty/whitespace-only lines (but still advance line_start).
            if content.trim().is_empty() {
                line_start = line_end;
                continue;
            }

            // Reject tabs anywhere (simpler/safer indentation rules).
            if content.as_bytes().iter().any(|b| *b == b'\t') {
                return Err(LexError {
                    message: "tabs are not allowed; use spaces".to_string(),
                    span: span_between(line_start, line_end),
                });
            }

            let leading_spaces = content
                .as_bytes()
                .iter()
                .take_while(|b| **b == b' ')
                .count();

            // Comment stripping at the earliest '#' outside string handling
            // (the serialized format never writes '#' inside a string on its
            // own line, so line-level stripping is sufficient).
            let mut code = &content[leading_spaces..];
            if let Some(idx) = code.find('#') {
                code = &code[..idx];
            }
            if code.trim().is_empty() {
                // Line was only comment.
                line_start = line_end;
                continue;
            }

            let current_indent = *indent_stack.last().unwrap_or(&0);
            if leading_spaces > current_indent {
                indent_stack.push(leading_spaces);
                tokens.push(Token {
                    kind: TokenKind::Indent,
                    span: span_between(line_start, line_start + leading_spaces),
                });
            } else if leading_spaces < current_indent {
                while let Some(&top) = indent_stack.last() {
                    if leading_spaces == top {
                        break;
                    }
                    indent_stack.pop();
                    tokens.push(Token {
                        kind: TokenKind::Dedent,
                        span: span_between(line_start, line_start + leading_spaces),
                    });
                }
                if *indent_stack.last().unwrap_or(&usize::MAX) != leading_spaces {
                    return Err(LexError {
                        message: "inconsistent indentation".to_string(),
                        span: span_between(line_start, line_end),
                    });
                }
            }

            let mut lex = RawToken::lexer(code);
            while let Some(raw) = lex.next() {
                let span_in_line = lex.span();
                let abs_start = line_start + leading_spaces + span_in_line.start;
                let abs_end = line_start + leading_spaces + span_in_line.end;
                let span = span_between(abs_start, abs_end);

                let kind = match raw {
                    Ok(RawToken::KwImport) => TokenKind::KwImport,
                    Ok(RawToken::KwDef) => TokenKind::KwDef,
                    Ok(RawToken::KwClass) => TokenKind::KwClass,
                    Ok(RawToken::KwReturn) => TokenKind::KwReturn,
                    Ok(RawToken::KwPass) => TokenKind::KwPass,
                    Ok(RawToken::Eq) => TokenKind::Eq,
                    Ok(RawToken::Dot) => TokenKind::Dot,
                    Ok(RawToken::Comma) => TokenKind::Comma,
                    Ok(RawToken::Colon) => TokenKind::Colon,
                    Ok(RawToken::Plus) => TokenKind::Plus,
                    Ok(RawToken::Minus) => TokenKind::Minus,
                    Ok(RawToken::Star) => TokenKind::Star,
                    Ok(RawToken::Slash) => TokenKind::Slash,
                    Ok(RawToken::LParen) => TokenKind::LParen,
                    Ok(RawToken::RParen) => TokenKind::RParen,
                    Ok(RawToken::Int(Some(n))) => TokenKind::Int(n),
                    Ok(RawToken::Int(None)) => {
                        return Err(LexError {
                            message: "invalid integer literal".to_string(),
                            span,
                        });
                    }
                    Ok(RawToken::Float(Some(f))) => TokenKind::Float(f),
                    Ok(RawToken::Float(None)) => {
                        return Err(LexError {
                            message: "invalid float literal".to_string(),
                            span,
                        });
                    }
                    Ok(RawToken::String(Some(s))) => TokenKind::String(s),
                    Ok(RawToken::String(None)) => {
                        return Err(LexError {
                            message: "invalid string literal".to_string(),
                            span,
                        });
                    }
                    Ok(RawToken::Ident(name)) => TokenKind::Ident(name),
                    Err(()) => {
                        return Err(LexError {
                            message: "unexpected character".to_string(),
                            span,
                        });
                    }
                };

                tokens.push(Token { kind, span });
            }

            tokens.push(Token {
                kind: TokenKind::Newline,
                span: span_between(line_end.saturating_sub(1), line_end),
            });

            line_start = line_end;
        }

        // Close any open blocks at end of input.
        let eof = self.src.len();
        while indent_stack.len() > 1 {
            indent_stack.pop();
            tokens.push(Token {
                kind: TokenKind::Dedent,
                span: span_between(eof, eof),
            });
        }
        tokens.push(Token {
            kind: TokenKind::Eof,
            span: span_between(eof, eof),
        });

        Ok(tokens)
    }
}
