#![forbid(unsafe_code)]

use std::collections::HashMap;

use sable_ast::{Def, Expr, ExprKind, Ident, Span, Stmt, UnaryOp};
use sable_ir::{Callee, Constant, Function, Graph, NodeKind, Type, ValueId};

use crate::builtins::{binop_symbol, builtin_symbol, unary_symbol};
use crate::error::CompileError;
use crate::symbol::{Resolver, SymbolicValue};

/// Types the receiver slot of a method under compilation.
///
/// Created once per reconstruction call: the bind-to-instance driver types
/// the slot as the existing object's class, the fresh-type driver as the
/// newly created class.
pub type SelfBinder<'a> = dyn Fn(&mut Graph, ValueId) -> SymbolicValue<'a> + 'a;

/// Compiles a batch of definitions into functions.
///
/// Definitions and resolvers must stay index-aligned; a mismatch is an
/// upstream contract violation, not a user error. Nothing here writes to a
/// compilation unit — committing the returned functions is the caller's
/// step, so the whole batch lands or none of it does.
pub fn compile_definitions<'a>(
    defs: &[Def],
    resolvers: &[&'a dyn Resolver],
    version: u64,
    self_binder: Option<&SelfBinder<'a>>,
) -> Result<Vec<Function>, CompileError> {
    assert_eq!(
        defs.len(),
        resolvers.len(),
        "every definition must be paired with exactly one resolver"
    );
    defs.iter()
        .zip(resolvers)
        .map(|(def, resolver)| compile_def(def, *resolver, version, self_binder))
        .collect()
}

fn compile_def<'a>(
    def: &Def,
    resolver: &'a dyn Resolver,
    version: u64,
    self_binder: Option<&SelfBinder<'a>>,
) -> Result<Function, CompileError> {
    let mut fc = FunctionCompiler {
        resolver,
        version,
        graph: Graph::new(),
        locals: HashMap::new(),
    };

    for (i, param) in def.params.iter().enumerate() {
        let receiver = def.is_method && i == 0;
        // Unannotated parameters default to Tensor; the receiver slot is
        // typed by the self-binder.
        let ty = if receiver { Type::Unknown } else { Type::Tensor };
        let v = fc.graph.add_input(ty, param.span);
        let sym = match (receiver, self_binder) {
            (true, Some(bind)) => bind(&mut fc.graph, v),
            _ => SymbolicValue::Simple(v),
        };
        fc.locals.insert(param.name.node.clone(), sym);
    }

    for stmt in &def.body {
        fc.compile_stmt(stmt)?;
    }

    Ok(Function {
        name: def.name.node.clone(),
        graph: fc.graph,
    })
}

struct FunctionCompiler<'a> {
    resolver: &'a dyn Resolver,
    // Format version of the unit; operators desugar through the same
    // version-gated builtin table as explicit op references.
    version: u64,
    graph: Graph,
    locals: HashMap<String, SymbolicValue<'a>>,
}

impl<'a> FunctionCompiler<'a> {
    fn compile_stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        match stmt {
            Stmt::Assign(assign) => {
                let v = self.compile_expr_value(&assign.value)?;
                self.locals
                    .insert(assign.target.node.clone(), SymbolicValue::Simple(v));
                Ok(())
            }
            Stmt::Return(ret) => {
                if !self.graph.outputs.is_empty() {
                    return Err(CompileError::Semantic {
                        message: "multiple return statements are not supported".to_string(),
                        span: ret.span,
                    });
                }
                let v = self.compile_expr_value(&ret.value)?;
                self.graph.outputs.push(v);
                Ok(())
            }
            Stmt::Pass(_) => Ok(()),
            Stmt::Expr(expr) => {
                self.compile_expr(expr)?;
                Ok(())
            }
        }
    }

    fn compile_expr(&mut self, expr: &Expr) -> Result<SymbolicValue<'a>, CompileError> {
        match &expr.kind {
            ExprKind::Ident(name) => self.lookup_ident(name, expr.span),
            ExprKind::Int(n) => Ok(SymbolicValue::Literal(Constant::Int(*n))),
            ExprKind::Float(x) => Ok(SymbolicValue::Literal(Constant::Float(*x))),
            ExprKind::Str(s) => Ok(SymbolicValue::Literal(Constant::Str(s.clone()))),
            ExprKind::Attribute { base, field } => {
                let base_sym = self.compile_expr(base)?;
                self.attr(base_sym, field)
            }
            ExprKind::Call { callee, args } => self.compile_call(expr.span, callee, args),
            ExprKind::Unary { op, operand } => {
                let sym = self.compile_expr(operand)?;
                // Fold negation of literals so `-1` stays one constant.
                match (op, &sym) {
                    (UnaryOp::Neg, SymbolicValue::Literal(Constant::Int(n))) => {
                        return Ok(SymbolicValue::Literal(Constant::Int(-n)));
                    }
                    (UnaryOp::Neg, SymbolicValue::Literal(Constant::Float(x))) => {
                        return Ok(SymbolicValue::Literal(Constant::Float(-x)));
                    }
                    _ => {}
                }
                let v = self.materialize(sym, expr.span)?;
                let out = self.graph.insert_node(
                    NodeKind::Call(Callee::Builtin(unary_symbol(*op).to_string())),
                    vec![v],
                    Type::Unknown,
                    expr.span,
                );
                Ok(SymbolicValue::Simple(out))
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let l = self.compile_expr_value(lhs)?;
                let r = self.compile_expr_value(rhs)?;
                let out = self.graph.insert_node(
                    NodeKind::Call(Callee::Builtin(binop_symbol(*op, self.version))),
                    vec![l, r],
                    Type::Unknown,
                    expr.span,
                );
                Ok(SymbolicValue::Simple(out))
            }
        }
    }

    fn compile_expr_value(&mut self, expr: &Expr) -> Result<ValueId, CompileError> {
        let sym = self.compile_expr(expr)?;
        self.materialize(sym, expr.span)
    }

    fn materialize(
        &mut self,
        sym: SymbolicValue<'a>,
        span: Span,
    ) -> Result<ValueId, CompileError> {
        match sym {
            SymbolicValue::Simple(v) => Ok(v),
            SymbolicValue::Literal(c) => Ok(self.graph.insert_constant(c, span)),
            other => Err(CompileError::Semantic {
                message: format!("{} cannot be used as a value", describe(&other)),
                span,
            }),
        }
    }

    fn lookup_ident(&self, name: &str, span: Span) -> Result<SymbolicValue<'a>, CompileError> {
        if let Some(sym) = self.locals.get(name) {
            return Ok(sym.clone());
        }
        self.resolver
            .resolve(name)
            .ok_or_else(|| CompileError::UnresolvedIdentifier {
                name: name.to_string(),
                span,
            })
    }

    /// Attribute access on a symbolic value; every kind is handled here.
    fn attr(
        &mut self,
        base: SymbolicValue<'a>,
        field: &Ident,
    ) -> Result<SymbolicValue<'a>, CompileError> {
        let span = field.span;
        match base {
            SymbolicValue::Ops { version } => Ok(SymbolicValue::BuiltinModule {
                module: field.node.clone(),
                version,
            }),
            SymbolicValue::BuiltinModule { module, version } => Ok(
                SymbolicValue::BuiltinFunction(builtin_symbol(&module, &field.node, version)),
            ),
            SymbolicValue::ConstantTable { constants } => {
                let name = field.node.as_str();
                let malformed = || CompileError::InvalidConstantSpecifier {
                    field: name.to_string(),
                    span,
                };
                let digits = name
                    .strip_prefix('c')
                    .filter(|digits| !digits.is_empty())
                    .ok_or_else(|| malformed())?;
                let index = match digits.parse::<i64>() {
                    Ok(n) => n,
                    // All-digit specifiers too large for i64 saturate and
                    // report out of range, not malformed.
                    Err(_) if digits.bytes().all(|b| b.is_ascii_digit()) => i64::MAX,
                    Err(_) => return Err(malformed()),
                };
                if index < 0 || index as usize >= constants.len() {
                    return Err(CompileError::ConstantIndexOutOfRange {
                        index,
                        len: constants.len(),
                        span,
                    });
                }
                let v = self
                    .graph
                    .insert_constant(constants[index as usize].clone(), span);
                Ok(SymbolicValue::Simple(v))
            }
            SymbolicValue::ClassNamespace { name, registry } => {
                let full = name.child(field.node.clone());
                match registry.get(&full) {
                    Some(id) => Ok(SymbolicValue::Class(id)),
                    // Unregistered names stay namespaces so deeper segments
                    // can still resolve.
                    None => Ok(SymbolicValue::ClassNamespace {
                        name: full,
                        registry,
                    }),
                }
            }
            SymbolicValue::Class(_) => Err(CompileError::Semantic {
                message: format!(
                    "cannot access attribute '{}' on a class type in a serialized body",
                    field.node
                ),
                span,
            }),
            SymbolicValue::Simple(v) => {
                if matches!(self.graph.value(v).ty, Type::Class(_)) {
                    let out = self.graph.insert_node(
                        NodeKind::GetAttr(field.node.clone()),
                        vec![v],
                        Type::Unknown,
                        span,
                    );
                    return Ok(SymbolicValue::Simple(out));
                }
                Err(CompileError::Semantic {
                    message: format!(
                        "value of type {} has no attribute '{}'",
                        self.graph.value(v).ty,
                        field.node
                    ),
                    span,
                })
            }
            other @ (SymbolicValue::BuiltinFunction(_)
            | SymbolicValue::Literal(_)
            | SymbolicValue::Method { .. }
            | SymbolicValue::Fork
            | SymbolicValue::Annotate) => Err(CompileError::Semantic {
                message: format!("{} has no attributes", describe(&other)),
                span,
            }),
        }
    }

    fn compile_call(
        &mut self,
        span: Span,
        callee: &Expr,
        args: &[Expr],
    ) -> Result<SymbolicValue<'a>, CompileError> {
        // Special forms are spelled as bare identifiers.
        if let ExprKind::Ident(name) = &callee.kind {
            let sym = self.lookup_ident(name, callee.span)?;
            return match sym {
                SymbolicValue::Fork => self.compile_fork(span, args),
                SymbolicValue::Annotate => self.compile_annotate(span, args),
                other => {
                    let (c, inputs) = self.callee_from_symbol(other, callee.span)?;
                    self.emit_call(NodeKind::Call(c), inputs, args, span)
                }
            };
        }

        let (c, inputs) = self.compile_callee(callee)?;
        self.emit_call(NodeKind::Call(c), inputs, args, span)
    }

    fn emit_call(
        &mut self,
        kind: NodeKind,
        mut inputs: Vec<ValueId>,
        args: &[Expr],
        span: Span,
    ) -> Result<SymbolicValue<'a>, CompileError> {
        for arg in args {
            inputs.push(self.compile_expr_value(arg)?);
        }
        let out = self.graph.insert_node(kind, inputs, Type::Unknown, span);
        Ok(SymbolicValue::Simple(out))
    }

    /// `fork(target, args...)`: same shape as a call, marked for parallel
    /// execution by the runtime.
    fn compile_fork(
        &mut self,
        span: Span,
        args: &[Expr],
    ) -> Result<SymbolicValue<'a>, CompileError> {
        let Some((target, rest)) = args.split_first() else {
            return Err(CompileError::Semantic {
                message: "fork expects a callable target".to_string(),
                span,
            });
        };
        let (c, inputs) = self.compile_callee(target)?;
        self.emit_call(NodeKind::Fork(c), inputs, rest, span)
    }

    /// `annotate(T, e)`: retypes `e`'s value; nothing is emitted.
    fn compile_annotate(
        &mut self,
        span: Span,
        args: &[Expr],
    ) -> Result<SymbolicValue<'a>, CompileError> {
        let [ty_expr, value_expr] = args else {
            return Err(CompileError::Semantic {
                message: "annotate expects a type and a value".to_string(),
                span,
            });
        };
        let Some(dotted) = ty_expr.as_dotted_name() else {
            return Err(CompileError::Semantic {
                message: "annotate expects a type name as its first argument".to_string(),
                span: ty_expr.span,
            });
        };
        let ty = match dotted.as_str() {
            "Tensor" => Type::Tensor,
            "int" => Type::Int,
            "float" => Type::Float,
            "bool" => Type::Bool,
            "str" => Type::Str,
            other => {
                self.resolver
                    .resolve_type(other)
                    .ok_or_else(|| CompileError::UnresolvedType {
                        name: other.to_string(),
                        span: ty_expr.span,
                    })?
            }
        };
        let v = self.compile_expr_value(value_expr)?;
        self.graph.set_type(v, ty);
        Ok(SymbolicValue::Simple(v))
    }

    /// Resolves a call target to a callee plus any leading inputs (the
    /// receiver, for method calls).
    fn compile_callee(&mut self, expr: &Expr) -> Result<(Callee, Vec<ValueId>), CompileError> {
        if let ExprKind::Attribute { base, field } = &expr.kind {
            let base_sym = self.compile_expr(base)?;
            if let SymbolicValue::Simple(v) = &base_sym {
                if matches!(self.graph.value(*v).ty, Type::Class(_)) {
                    let method = SymbolicValue::Method {
                        object: *v,
                        name: field.node.clone(),
                    };
                    return self.callee_from_symbol(method, expr.span);
                }
            }
            let sym = self.attr(base_sym, field)?;
            return self.callee_from_symbol(sym, expr.span);
        }
        let sym = self.compile_expr(expr)?;
        self.callee_from_symbol(sym, expr.span)
    }

    fn callee_from_symbol(
        &self,
        sym: SymbolicValue<'a>,
        span: Span,
    ) -> Result<(Callee, Vec<ValueId>), CompileError> {
        match sym {
            SymbolicValue::BuiltinFunction(symbol) => Ok((Callee::Builtin(symbol), Vec::new())),
            SymbolicValue::Method { object, name } => Ok((Callee::Method(name), vec![object])),
            other => Err(CompileError::Semantic {
                message: format!("{} is not callable", describe(&other)),
                span,
            }),
        }
    }
}

fn describe(sym: &SymbolicValue<'_>) -> &'static str {
    match sym {
        SymbolicValue::Ops { .. } => "an op namespace",
        SymbolicValue::BuiltinModule { .. } => "a builtin op module",
        SymbolicValue::BuiltinFunction(_) => "a builtin op",
        SymbolicValue::ConstantTable { .. } => "the constant table",
        SymbolicValue::ClassNamespace { .. } => "a class namespace",
        SymbolicValue::Class(_) => "a class type",
        SymbolicValue::Literal(_) => "a literal",
        SymbolicValue::Simple(_) => "a value",
        SymbolicValue::Method { .. } => "a method",
        SymbolicValue::Fork => "fork",
        SymbolicValue::Annotate => "annotate",
    }
}
