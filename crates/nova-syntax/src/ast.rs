//! The header-compilation AST (§3).
//!
//! Every node carries a `pos: TextSize` — the byte offset into the
//! *original* source at which the node begins — used only for diagnostics.
//! Nodes are plain owned sum types; there is no separate lossless syntax
//! tree layer (see `DESIGN.md` for why this departs from `rowan`).

use std::sync::Arc;
use text_size::TextSize;

use crate::constant_expr::Expression;
use crate::SourceFile;

/// A fixed-size bitset over the modifier keywords plus the two synthetic
/// enum-constant markers (§9 "Modifier sets").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Modifiers(u32);

pub mod modifier {
    pub const PUBLIC: u32 = 1 << 0;
    pub const PROTECTED: u32 = 1 << 1;
    pub const PRIVATE: u32 = 1 << 2;
    pub const STATIC: u32 = 1 << 3;
    pub const ABSTRACT: u32 = 1 << 4;
    pub const FINAL: u32 = 1 << 5;
    pub const NATIVE: u32 = 1 << 6;
    pub const SYNCHRONIZED: u32 = 1 << 7;
    pub const TRANSIENT: u32 = 1 << 8;
    pub const VOLATILE: u32 = 1 << 9;
    pub const STRICTFP: u32 = 1 << 10;
    pub const DEFAULT: u32 = 1 << 11;
    pub const VARARGS: u32 = 1 << 12;
    pub const ACC_ENUM: u32 = 1 << 13;
    pub const ENUM_IMPL: u32 = 1 << 14;
}

impl Modifiers {
    pub const EMPTY: Modifiers = Modifiers(0);

    pub fn contains(self, bit: u32) -> bool {
        self.0 & bit != 0
    }

    pub fn insert(&mut self, bit: u32) {
        self.0 |= bit;
    }

    pub fn with(mut self, bit: u32) -> Self {
        self.insert(bit);
        self
    }

    pub fn union(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 | other.0)
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Char,
    Float,
    Double,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Anno {
    pub pos: TextSize,
    pub name: Vec<String>,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimTy {
    pub pos: TextSize,
    pub annotations: Vec<Anno>,
    pub kind: PrimitiveKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrTy {
    pub pos: TextSize,
    pub annotations: Vec<Anno>,
    pub element: Box<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WildTy {
    pub pos: TextSize,
    pub annotations: Vec<Anno>,
    pub upper: Option<Box<Type>>,
    pub lower: Option<Box<Type>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoidTy {
    pub pos: TextSize,
    pub annotations: Vec<Anno>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassTy {
    pub pos: TextSize,
    pub enclosing: Option<Box<ClassTy>>,
    pub name: String,
    pub type_arguments: Vec<Type>,
    pub annotations: Vec<Anno>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Primitive(PrimTy),
    Array(ArrTy),
    Class(ClassTy),
    Wildcard(WildTy),
    Void(VoidTy),
}

impl Type {
    pub fn pos(&self) -> TextSize {
        match self {
            Type::Primitive(t) => t.pos,
            Type::Array(t) => t.pos,
            Type::Class(t) => t.pos,
            Type::Wildcard(t) => t.pos,
            Type::Void(t) => t.pos,
        }
    }

    /// Wrap `self` in `dims` additional array dimensions, all anchored at
    /// `self`'s own position (C-style dimensions carry no syntax of their
    /// own worth a distinct position).
    pub fn with_extra_dims(self, dims: u32) -> Type {
        let pos = self.pos();
        let mut ty = self;
        for _ in 0..dims {
            ty = Type::Array(ArrTy {
                pos,
                annotations: Vec::new(),
                element: Box::new(ty),
            });
        }
        ty
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TyParam {
    pub pos: TextSize,
    pub name: String,
    pub bounds: Vec<Type>,
    pub annotations: Vec<Anno>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub pos: TextSize,
    pub modifiers: Modifiers,
    pub annotations: Vec<Anno>,
    pub ty: Type,
    pub name: String,
    pub initializer: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Expr(Expression),
    Annotation(Anno),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethDecl {
    pub pos: TextSize,
    pub modifiers: Modifiers,
    pub annotations: Vec<Anno>,
    pub type_params: Vec<TyParam>,
    /// Absent means this is a constructor; see invariant in §3.
    pub return_type: Option<Type>,
    pub name: String,
    pub formals: Vec<VarDecl>,
    pub throws: Vec<ClassTy>,
    pub default_value: Option<DefaultValue>,
}

impl MethDecl {
    pub const CONSTRUCTOR_NAME: &'static str = "<init>";

    pub fn is_constructor(&self) -> bool {
        self.return_type.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Field(VarDecl),
    Method(MethDecl),
    Type(TyDecl),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TyDeclKind {
    Class,
    Interface,
    Enum,
    Annotation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TyDecl {
    pub pos: TextSize,
    pub modifiers: Modifiers,
    pub annotations: Vec<Anno>,
    pub name: String,
    pub type_params: Vec<TyParam>,
    pub superclass: Option<ClassTy>,
    pub interfaces: Vec<ClassTy>,
    pub members: Vec<Member>,
    pub kind: TyDeclKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PkgDecl {
    pub pos: TextSize,
    pub name: Vec<String>,
    pub annotations: Vec<Anno>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub pos: TextSize,
    pub name: Vec<String>,
    pub is_static: bool,
    pub is_wildcard: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompUnit {
    pub pos: TextSize,
    pub package: Option<PkgDecl>,
    pub imports: Vec<ImportDecl>,
    pub types: Vec<TyDecl>,
    pub source: Arc<SourceFile>,
}
