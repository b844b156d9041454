/// An opaque handle identifying a source file.
///
/// Kept as a bare interned index rather than an owned path so that AST nodes
/// and diagnostics can carry it by value without lifetimes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FileId(pub u32);

impl FileId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }
}
