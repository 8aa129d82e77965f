#![forbid(unsafe_code)]

pub mod debug;
pub mod ir;
pub mod name;
pub mod registry;

pub use debug::*;
pub use ir::*;
pub use name::*;
pub use registry::*;
