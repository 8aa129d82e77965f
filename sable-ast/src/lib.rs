#![forbid(unsafe_code)]

use miette::SourceSpan;

pub type Span = SourceSpan;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub span: Span,
    pub node: T,
}

impl<T> Spanned<T> {
    pub fn new(span: Span, node: T) -> Self {
        Self { span, node }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
        Spanned {
            span: self.span,
            node: f(self.node),
        }
    }
}

pub fn span(start: usize, len: usize) -> Span {
    SourceSpan::new(start.into(), len)
}

pub fn span_between(start: usize, end: usize) -> Span {
    debug_assert!(end >= start);
    span(start, end - start)
}

pub fn join(a: Span, b: Span) -> Span {
    let a0: usize = a.offset().into();
    let b0: usize = b.offset().into();
    let b1 = b0 + b.len();
    if b0 >= a0 {
        span_between(a0, b1)
    } else {
        let a1 = a0 + a.len();
        span_between(b0, a1)
    }
}

pub type Ident = Spanned<String>;

/// One serialized function or method body, as re-parsed from text.
#[derive(Clone, Debug, PartialEq)]
pub struct Def {
    pub span: Span,
    pub name: Ident,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    /// True when parsed inside a class body (or with `parse_function(true)`);
    /// the first parameter is then the receiver slot.
    pub is_method: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassDef {
    pub span: Span,
    pub name: Ident,
    pub methods: Vec<Def>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub span: Span,
    pub name: Ident,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Assign(AssignStmt),
    Return(ReturnStmt),
    Pass(Span),
    Expr(Expr),
}

#[derive(Clone, Debug, PartialEq)]
pub struct AssignStmt {
    pub span: Span,
    pub target: Ident,
    pub value: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReturnStmt {
    pub span: Span,
    pub value: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub span: Span,
    pub kind: ExprKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    /// Dotted attribute access: `base.field`.
    Attribute {
        base: Box<Expr>,
        field: Ident,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl Expr {
    /// Renders a pure `ident(.ident)*` chain back to its dotted form.
    ///
    /// Used for expressions that denote type names (`annotate`'s first
    /// argument) rather than runtime values.
    pub fn as_dotted_name(&self) -> Option<String> {
        match &self.kind {
            ExprKind::Ident(name) => Some(name.clone()),
            ExprKind::Attribute { base, field } => {
                let mut prefix = base.as_dotted_name()?;
                prefix.push('.');
                prefix.push_str(&field.node);
                Some(prefix)
            }
            _ => None,
        }
    }
}
