//! Template Compiler
//!
//! Turns an HTML-like template into a render function:
//!
//! 1. [`parse`] reads the template string into an [`AstNode`] tree.
//! 2. [`generate`] turns the tree into a [`Render`] closure that composes
//!    element and text constructor calls.
//!
//! Trees produced elsewhere can enter through [`AstNode::from_json`], which
//! validates the wire shape before code generation.

mod ast;
mod codegen;
mod parser;

pub use ast::{Attr, AstNode, RawNode, ELEMENT_NODE, TEXT_NODE};
pub use codegen::{compile, generate, source, Compiled, Render};
pub use parser::parse;
