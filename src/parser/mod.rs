// Parser module for extracting structural facts from source files

pub mod ast;
mod typescript;

pub use ast::*;
pub use typescript::{JsVariant, StructuralExtractor};
