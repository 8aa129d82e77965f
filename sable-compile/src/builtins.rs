#![forbid(unsafe_code)]

use sable_ast::{BinOp, UnaryOp};

/// Resolves a builtin op reference against the unit's format version.
///
/// Serialized modules written before `op_version_set = 1` used truncating
/// division; their `div` must keep resolving to the legacy variant so that
/// re-importing old text reproduces the IR the original compiler emitted.
/// Unknown ops and forward versions pass through untouched.
pub fn builtin_symbol(module: &str, name: &str, version: u64) -> String {
    if module == "core" && name == "div" && version < 1 {
        return "core::div_trunc".to_string();
    }
    format!("{module}::{name}")
}

/// Binary operators desugar to `core` ops and go through the same version
/// table, so `x / y` in an old unit lowers exactly like `sable.div(x, y)`.
pub fn binop_symbol(op: BinOp, version: u64) -> String {
    let name = match op {
        BinOp::Add => "add",
        BinOp::Sub => "sub",
        BinOp::Mul => "mul",
        BinOp::Div => "div",
    };
    builtin_symbol("core", name, version)
}

pub fn unary_symbol(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Neg => "core::neg",
    }
}
