//! The error taxonomy from §7.
//!
//! Every variant is fatal: the parser never recovers, so a `ParseError` is
//! always the last thing a `parse` call produces. Per §7 ("errors carry the
//! source handle and the position"), every variant carries the `FileId` of
//! the compilation unit being parsed alongside the byte offset, so a caller
//! holding errors from more than one file doesn't need to track which file
//! each one came from separately.

use nova_core::FileId;
use text_size::TextSize;

use crate::lexer::TokenKind;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("expected {expected:?}, found {found:?}")]
    ExpectedToken {
        expected: TokenKind,
        found: TokenKind,
        file: FileId,
        pos: TextSize,
    },

    #[error("unexpected token: {description}")]
    UnexpectedToken {
        description: String,
        file: FileId,
        pos: TextSize,
    },

    #[error("a field declaration cannot carry type parameters")]
    GenericField { file: FileId, pos: TextSize },

    #[error("malformed declarator: expected an identifier, found {description}")]
    MalformedDeclarator {
        description: String,
        file: FileId,
        pos: TextSize,
    },
}

impl ParseError {
    pub fn pos(&self) -> TextSize {
        match self {
            ParseError::ExpectedToken { pos, .. } => *pos,
            ParseError::UnexpectedToken { pos, .. } => *pos,
            ParseError::GenericField { pos, .. } => *pos,
            ParseError::MalformedDeclarator { pos, .. } => *pos,
        }
    }

    pub fn file(&self) -> FileId {
        match self {
            ParseError::ExpectedToken { file, .. } => *file,
            ParseError::UnexpectedToken { file, .. } => *file,
            ParseError::GenericField { file, .. } => *file,
            ParseError::MalformedDeclarator { file, .. } => *file,
        }
    }

    /// Convert to a [`nova_core::Diagnostic`] with the given severity. The
    /// range is zero-width at `pos`: this parser never recovers far enough
    /// past an error to know a meaningful end offset.
    pub fn to_diagnostic(&self, severity: nova_core::Severity) -> nova_core::Diagnostic {
        let pos = self.pos();
        nova_core::Diagnostic::new(
            self.file(),
            nova_core::TextRange::new(pos, pos),
            severity,
            self.to_string(),
        )
    }
}

/// Render a token for inclusion in a diagnostic: identifiers get quoted with
/// their spelling, everything else is named by its kind.
pub fn describe_token(kind: TokenKind, value: &str) -> String {
    if kind == TokenKind::Ident {
        format!("identifier `{value}`")
    } else {
        format!("{kind:?}")
    }
}
