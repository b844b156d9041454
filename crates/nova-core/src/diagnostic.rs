//! Diagnostics primitives shared across Nova's front-end crates.

use crate::FileId;
use text_size::TextRange;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Diagnostic {
    pub file: FileId,
    pub range: TextRange,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        file: FileId,
        range: TextRange,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file,
            range,
            severity,
            message: message.into(),
        }
    }

    pub fn error(file: FileId, range: TextRange, message: impl Into<String>) -> Self {
        Self::new(file, range, Severity::Error, message)
    }
}
