//! A recursive-descent parser for the declaration-level subset of Java
//! needed to build a header-compilation AST: compilation units, type
//! declarations (classes, interfaces, enums, annotation types), their
//! fields, methods, constructors, and nested types, plus enough of the type
//! and annotation grammars to resolve signatures. Method bodies and
//! non-constant initializers are never parsed — only lexically skipped
//! (§4.13) — and the parser never recovers from a syntax error: the first
//! one aborts the parse.
//!
//! ```
//! let unit = nova_syntax::parse_str("package demo; class Greeter {}").unwrap();
//! assert_eq!(unit.types[0].name, "Greeter");
//! ```

pub mod ast;
pub mod constant_expr;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod splitter;

use std::sync::Arc;

pub use crate::ast::*;
pub use crate::constant_expr::{BinaryOp, ExprKind, Expression, LiteralKind, UnaryOp};
pub use crate::error::ParseError;
pub use crate::parser::Parser;
pub use nova_core::FileId;

#[cfg(feature = "test-parse-counter")]
pub use crate::parser::parse_counter;

/// A named chunk of Java source, tagged with the [`FileId`] handle that
/// every [`ParseError`] produced while parsing it carries alongside the
/// byte offset (§7). Kept separate from the raw `&str` handed to the parser
/// so a [`CompUnit`] can outlive the caller's borrow of the text it came
/// from — every AST node's `pos` is an offset into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub file: FileId,
    pub name: String,
    pub text: String,
}

impl SourceFile {
    pub fn new(file: FileId, name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            file,
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Parse one compilation unit.
pub fn parse(source: SourceFile) -> Result<CompUnit, ParseError> {
    let source = Arc::new(source);
    let mut parser = Parser::new(&source.text, source.file);
    parser.parse_compilation_unit(Arc::clone(&source))
}

/// Convenience wrapper over [`parse`] for callers with no real file name or
/// multi-file `FileId` to track, using [`FileId::new`]`(0)`.
pub fn parse_str(text: &str) -> Result<CompUnit, ParseError> {
    parse(SourceFile::new(FileId::new(0), "<input>", text))
}
