#![forbid(unsafe_code)]

mod error;
mod parser;

pub use error::ParseError;
pub use parser::Parser;
