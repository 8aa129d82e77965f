#![forbid(unsafe_code)]

mod builtins;
mod compiler;
mod error;
mod symbol;

pub use builtins::{binop_symbol, builtin_symbol, unary_symbol};
pub use compiler::{compile_definitions, SelfBinder};
pub use error::CompileError;
pub use symbol::{Resolver, SymbolicValue};
