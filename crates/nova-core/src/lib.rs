//! Core shared types for Nova's syntax tooling.
//!
//! This crate is intentionally small: the subset of the real `nova-core`
//! that a parser with no LSP/workspace surface actually needs.

mod diagnostic;
mod file_id;
mod text;

pub use crate::diagnostic::{Diagnostic, Severity};
pub use crate::file_id::FileId;
pub use crate::text::{LineCol, LineIndex};
pub use text_size::{TextRange, TextSize};
