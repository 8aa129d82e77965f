#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt;

use sable_ast::Span;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValueId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Type {
    Tensor,
    Int,
    Float,
    Bool,
    Str,
    Class(ClassId),
    Unknown,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Tensor => write!(f, "Tensor"),
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Bool => write!(f, "bool"),
            Type::Str => write!(f, "str"),
            Type::Class(id) => write!(f, "class@{}", id.0),
            Type::Unknown => write!(f, "?"),
        }
    }
}

/// An opaque constant payload. The importer never owns a table of these;
/// it borrows the caller's slice and indexes into it.
#[derive(Clone, Debug, PartialEq)]
pub enum Constant {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Tensor { shape: Vec<usize>, data: Vec<f64> },
}

impl Constant {
    pub fn ty(&self) -> Type {
        match self {
            Constant::Int(_) => Type::Int,
            Constant::Float(_) => Type::Float,
            Constant::Bool(_) => Type::Bool,
            Constant::Str(_) => Type::Str,
            Constant::Tensor { .. } => Type::Tensor,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(n) => write!(f, "{n}"),
            Constant::Float(x) => write!(f, "{x}"),
            Constant::Bool(b) => write!(f, "{b}"),
            Constant::Str(s) => write!(f, "{s:?}"),
            Constant::Tensor { shape, .. } => write!(f, "tensor{shape:?}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Value {
    pub ty: Type,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Callee {
    /// Fully resolved builtin symbol, e.g. `core::add`.
    Builtin(String),
    /// Method call on the first input value.
    Method(String),
}

impl fmt::Display for Callee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callee::Builtin(sym) => write!(f, "{sym}"),
            Callee::Method(name) => write!(f, ".{name}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Constant(Constant),
    GetAttr(String),
    Call(Callee),
    /// Parallel-invocation marker; same shape as `Call` but executed
    /// asynchronously by a downstream runtime.
    Fork(Callee),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub inputs: Vec<ValueId>,
    pub output: ValueId,
    pub span: Span,
}

/// One function body as a flat graph of nodes over typed values.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Graph {
    values: Vec<Value>,
    pub nodes: Vec<Node>,
    pub inputs: Vec<ValueId>,
    pub outputs: Vec<ValueId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_input(&mut self, ty: Type, span: Span) -> ValueId {
        let v = self.fresh_value(ty, span);
        self.inputs.push(v);
        v
    }

    pub fn fresh_value(&mut self, ty: Type, span: Span) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(Value { ty, span });
        id
    }

    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id.0 as usize]
    }

    pub fn set_type(&mut self, id: ValueId, ty: Type) {
        self.values[id.0 as usize].ty = ty;
    }

    pub fn insert_node(
        &mut self,
        kind: NodeKind,
        inputs: Vec<ValueId>,
        out_ty: Type,
        span: Span,
    ) -> ValueId {
        let output = self.fresh_value(out_ty, span);
        self.nodes.push(Node {
            kind,
            inputs,
            output,
            span,
        });
        output
    }

    pub fn insert_constant(&mut self, constant: Constant, span: Span) -> ValueId {
        let ty = constant.ty();
        self.insert_node(NodeKind::Constant(constant), Vec::new(), ty, span)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub name: String,
    pub graph: Graph,
}

/// An object instance. Methods live on its class's compilation unit;
/// attribute payloads are owned elsewhere.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Module {
    pub ty: ClassId,
}

/// Owns the compiled functions of one class (or one free-standing batch).
#[derive(Clone, Debug, PartialEq, Default)]
pub struct CompilationUnit {
    functions: BTreeMap<String, Function>,
}

impl CompilationUnit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commits a compiled batch. Name collisions overwrite: re-importing
    /// serialized text must land on the same final state every time.
    pub fn install(&mut self, functions: Vec<Function>) {
        for f in functions {
            self.functions.insert(f.name.clone(), f);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Function> {
        self.functions.values()
    }
}
