#![forbid(unsafe_code)]

use std::mem;

use sable_ast::{
    join, span_between, AssignStmt, BinOp, ClassDef, Def, Expr, ExprKind, Ident, Param,
    ReturnStmt, Span, Stmt, UnaryOp,
};
use sable_lex::{Lexer, Token, TokenKind};

use crate::error::ParseError;

/// Cursor over the token stream of one serialized source unit.
///
/// The parser keeps the source text so callers can recover the exact
/// spelling of a token (import names are the concatenated spellings of
/// everything up to the line terminator).
pub struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    idx: usize,
}

impl<'a> Parser<'a> {
    pub fn from_source(src: &'a str) -> Result<Self, ParseError> {
        let tokens = Lexer::new(src).lex().map_err(|e| ParseError {
            message: e.message,
            span: e.span,
        })?;
        Ok(Self { src, tokens, idx: 0 })
    }

    /// One `def` with its indented body. `is_method` marks the first
    /// parameter as the receiver slot.
    pub fn parse_function(&mut self, is_method: bool) -> Result<Def, ParseError> {
        let start = self.expect(TokenKind::KwDef)?.span;
        let name = self.expect_ident()?;

        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                let p = self.expect_ident()?;
                params.push(Param {
                    span: p.span,
                    name: p,
                });
                if self.next_if(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Colon)?;
        self.expect(TokenKind::Newline)?;

        let (body, end) = self.parse_block()?;

        Ok(Def {
            span: join(start, end),
            name,
            params,
            body,
            is_method,
        })
    }

    /// One `class` with its method definitions.
    pub fn parse_class(&mut self) -> Result<ClassDef, ParseError> {
        let start = self.expect(TokenKind::KwClass)?.span;
        let name = self.expect_ident()?;
        self.expect(TokenKind::Colon)?;
        self.expect(TokenKind::Newline)?;
        self.expect(TokenKind::Indent)?;

        let mut methods = Vec::new();
        let end = loop {
            if let Some(tok) = self.next_if(TokenKind::Dedent) {
                break tok.span;
            }
            if self.next_if(TokenKind::KwPass).is_some() {
                self.expect(TokenKind::Newline)?;
                continue;
            }
            methods.push(self.parse_function(true)?);
        };

        Ok(ClassDef {
            span: join(start, end),
            name,
            methods,
        })
    }

    fn parse_block(&mut self) -> Result<(Vec<Stmt>, Span), ParseError> {
        self.expect(TokenKind::Indent)?;
        let mut stmts = Vec::new();
        let end = loop {
            if let Some(tok) = self.next_if(TokenKind::Dedent) {
                break tok.span;
            }
            stmts.push(self.parse_stmt()?);
        };
        Ok((stmts, end))
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        if let Some(tok) = self.next_if(TokenKind::KwReturn) {
            let value = self.parse_expr()?;
            let span = join(tok.span, value.span);
            self.expect(TokenKind::Newline)?;
            return Ok(Stmt::Return(ReturnStmt { span, value }));
        }

        if let Some(tok) = self.next_if(TokenKind::KwPass) {
            self.expect(TokenKind::Newline)?;
            return Ok(Stmt::Pass(tok.span));
        }

        // `name = expr` needs one token of lookahead past the identifier.
        if matches!(self.peek_kind(), Some(TokenKind::Ident(_)))
            && matches!(self.peek_kind_n(1), Some(TokenKind::Eq))
        {
            let target = self.expect_ident()?;
            self.expect(TokenKind::Eq)?;
            let value = self.parse_expr()?;
            let span = join(target.span, value.span);
            self.expect(TokenKind::Newline)?;
            return Ok(Stmt::Assign(AssignStmt { span, target, value }));
        }

        let expr = self.parse_expr()?;
        self.expect(TokenKind::Newline)?;
        Ok(Stmt::Expr(expr))
    }

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinOp::Add,
                Some(TokenKind::Minus) => BinOp::Sub,
                _ => break,
            };
            self.next();
            let rhs = self.parse_term()?;
            let span = join(lhs.span, rhs.span);
            lhs = Expr {
                span,
                kind: ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            };
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinOp::Mul,
                Some(TokenKind::Slash) => BinOp::Div,
                _ => break,
            };
            self.next();
            let rhs = self.parse_unary()?;
            let span = join(lhs.span, rhs.span);
            lhs = Expr {
                span,
                kind: ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if let Some(tok) = self.next_if(TokenKind::Minus) {
            let operand = self.parse_unary()?;
            let span = join(tok.span, operand.span);
            return Ok(Expr {
                span,
                kind: ExprKind::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                },
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.next_if(TokenKind::Dot).is_some() {
                let field = self.expect_ident()?;
                let span = join(expr.span, field.span);
                expr = Expr {
                    span,
                    kind: ExprKind::Attribute {
                        base: Box::new(expr),
                        field,
                    },
                };
                continue;
            }
            if self.next_if(TokenKind::LParen).is_some() {
                let mut args = Vec::new();
                if !self.at(TokenKind::RParen) {
                    loop {
                        args.push(self.parse_expr()?);
                        if self.next_if(TokenKind::Comma).is_none() {
                            break;
                        }
                    }
                }
                let close = self.expect(TokenKind::RParen)?;
                let span = join(expr.span, close.span);
                expr = Expr {
                    span,
                    kind: ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                };
                continue;
            }
            break;
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let tok = self.expect_any()?;
        let kind = match tok.kind {
            TokenKind::Ident(name) => ExprKind::Ident(name),
            TokenKind::Int(n) => ExprKind::Int(n),
            TokenKind::Float(f) => ExprKind::Float(f),
            TokenKind::String(s) => ExprKind::Str(s),
            TokenKind::LParen => {
                let inner = self.parse_expr()?;
                let close = self.expect(TokenKind::RParen)?;
                return Ok(Expr {
                    span: join(tok.span, close.span),
                    kind: inner.kind,
                });
            }
            _ => {
                return Err(ParseError {
                    message: "expected an expression".to_string(),
                    span: tok.span,
                });
            }
        };
        Ok(Expr {
            span: tok.span,
            kind,
        })
    }

    // -- cursor surface (also driven by the importer) --

    pub fn expect_ident(&mut self) -> Result<Ident, ParseError> {
        let tok = self.expect_any()?;
        match tok.kind {
            TokenKind::Ident(name) => Ok(Ident {
                span: tok.span,
                node: name,
            }),
            _ => Err(ParseError {
                message: "expected identifier".to_string(),
                span: tok.span,
            }),
        }
    }

    pub fn expect(&mut self, expected: TokenKind) -> Result<Token, ParseError> {
        let tok = self.expect_any()?;
        if mem::discriminant(&tok.kind) == mem::discriminant(&expected) {
            Ok(tok)
        } else {
            Err(ParseError {
                message: format!("expected {expected:?}"),
                span: tok.span,
            })
        }
    }

    pub fn expect_any(&mut self) -> Result<Token, ParseError> {
        let tok = self.next().ok_or_else(|| ParseError {
            message: "unexpected end of input".to_string(),
            span: span_between(self.src.len(), self.src.len()),
        })?;
        if tok.kind == TokenKind::Eof {
            return Err(ParseError {
                message: "unexpected end of input".to_string(),
                span: tok.span,
            });
        }
        Ok(tok)
    }

    pub fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind()
            .is_some_and(|k| mem::discriminant(k) == mem::discriminant(&kind))
    }

    pub fn next_if(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            self.next()
        } else {
            None
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.peek_kind(), None | Some(TokenKind::Eof))
    }

    /// The exact source spelling of a token.
    pub fn token_text(&self, tok: &Token) -> &'a str {
        let start: usize = tok.span.offset().into();
        let end = start + tok.span.len();
        &self.src[start..end]
    }

    pub fn peek_span(&self) -> Option<Span> {
        self.tokens.get(self.idx).map(|t| t.span)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.idx)?.clone();
        self.idx += 1;
        Some(tok)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.idx).map(|t| &t.kind)
    }

    fn peek_kind_n(&self, n: usize) -> Option<&TokenKind> {
        self.tokens.get(self.idx + n).map(|t| &t.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_method_with_params_and_return() {
        let mut p = Parser::from_source("def f(self, x):\n  return x\n").unwrap();
        let def = p.parse_function(true).unwrap();
        assert_eq!(def.name.node, "f");
        assert_eq!(def.params.len(), 2);
        assert_eq!(def.params[0].name.node, "self");
        assert!(matches!(def.body.as_slice(), [Stmt::Return(_)]));
        assert!(p.is_eof());
    }

    #[test]
    fn parse_dotted_call_chain() {
        let mut p = Parser::from_source("def f(self):\n  return sable.add(x, CONSTANTS.c0)\n")
            .unwrap();
        let def = p.parse_function(true).unwrap();
        let Stmt::Return(ret) = &def.body[0] else {
            panic!("expected return");
        };
        let ExprKind::Call { callee, args } = &ret.value.kind else {
            panic!("expected call");
        };
        assert_eq!(callee.as_dotted_name().as_deref(), Some("sable.add"));
        assert_eq!(args.len(), 2);
        assert_eq!(args[1].as_dotted_name().as_deref(), Some("CONSTANTS.c0"));
    }

    #[test]
    fn parse_class_with_two_methods() {
        let src = "class Pair:\n  def first(self):\n    return 1\n  def second(self):\n    return 2\n";
        let mut p = Parser::from_source(src).unwrap();
        let class = p.parse_class().unwrap();
        assert_eq!(class.name.node, "Pair");
        assert_eq!(class.methods.len(), 2);
        assert!(class.methods.iter().all(|m| m.is_method));
        assert!(p.is_eof());
    }

    #[test]
    fn parse_precedence_mul_binds_tighter() {
        let mut p = Parser::from_source("def f(self):\n  return 1 + 2 * 3\n").unwrap();
        let def = p.parse_function(true).unwrap();
        let Stmt::Return(ret) = &def.body[0] else {
            panic!("expected return");
        };
        let ExprKind::Binary { op, rhs, .. } = &ret.value.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinOp::Add);
        assert!(matches!(
            rhs.kind,
            ExprKind::Binary { op: BinOp::Mul, .. }
        ));
    }

    #[test]
    fn parse_rejects_stray_token_in_body() {
        let mut p = Parser::from_source("def f(self):\n  return ,\n").unwrap();
        let err = p.parse_function(true).unwrap_err();
        assert!(err.message.contains("expected an expression"));
    }
}
