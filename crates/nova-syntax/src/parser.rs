//! The recursive-descent parser (§4).
//!
//! One token of lookahead, no backtracking, no error recovery: the first
//! [`ParseError`](crate::error::ParseError) aborts the parse (§1 Non-goals).
//! Method bodies, instance/static initializer blocks, and non-constant
//! initializers are lexically skipped rather than parsed (§4.13); constant
//! expressions and annotation values are handed off to
//! [`crate::constant_expr`], and multi-declarator fields are handed off to
//! [`crate::splitter`].

use std::sync::Arc;

use nova_core::FileId;
use text_size::TextSize;

use crate::ast::*;
use crate::constant_expr::{ConstExprParser, ExprKind, Expression};
use crate::error::{describe_token, ParseError};
use crate::lexer::{Lexer, SavedToken, SavedTokenStream, TokenKind, TokenSource};
use crate::splitter::split_declarators;
use crate::SourceFile;

#[cfg(feature = "test-parse-counter")]
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(feature = "test-parse-counter")]
static PARSE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Number of tokens consumed by `bump()` across every `Parser` in this
/// process, gated behind the `test-parse-counter` feature (SPEC_FULL.md
/// §10.4). Used by this crate's own tests to confirm no sub-parser
/// double-consumes a token during a handoff.
#[cfg(feature = "test-parse-counter")]
pub fn parse_counter() -> usize {
    PARSE_COUNTER.load(Ordering::Relaxed)
}

/// §4.1 Parser state & primitives.
pub struct Parser {
    lexer: Lexer,
    token: TokenKind,
    pos: TextSize,
    value: String,
    file: FileId,
    /// Annotations read at the compilation-unit level that turned out not to
    /// precede a `package` declaration; they belong to the first type
    /// declaration instead (§4.2).
    pending_annotations: Option<Vec<Anno>>,
}

impl Parser {
    pub fn new(text: &str, file: FileId) -> Self {
        let mut lexer = Lexer::new(text);
        let token = lexer.next();
        let pos = lexer.position();
        let value = lexer.string_value().to_string();
        Self {
            lexer,
            token,
            pos,
            value,
            file,
            pending_annotations: None,
        }
    }

    fn bump(&mut self) -> TokenKind {
        #[cfg(feature = "test-parse-counter")]
        PARSE_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.token = self.lexer.next();
        self.pos = self.lexer.position();
        self.value = self.lexer.string_value().to_string();
        self.token
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.token == kind
    }

    fn maybe(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn eat(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        if self.at(kind) {
            self.bump();
            Ok(())
        } else {
            Err(ParseError::ExpectedToken {
                expected: kind,
                found: self.token,
                file: self.file,
                pos: self.pos,
            })
        }
    }

    fn eat_ident(&mut self) -> Result<String, ParseError> {
        if self.at(TokenKind::Ident) {
            let name = self.value.clone();
            self.bump();
            Ok(name)
        } else {
            Err(self.unexpected())
        }
    }

    fn unexpected(&self) -> ParseError {
        ParseError::UnexpectedToken {
            description: describe_token(self.token, &self.value),
            file: self.file,
            pos: self.pos,
        }
    }

    fn modifier_bit(token: TokenKind) -> u32 {
        match token {
            TokenKind::Public => modifier::PUBLIC,
            TokenKind::Protected => modifier::PROTECTED,
            TokenKind::Private => modifier::PRIVATE,
            TokenKind::Static => modifier::STATIC,
            TokenKind::Abstract => modifier::ABSTRACT,
            TokenKind::Final => modifier::FINAL,
            TokenKind::Strictfp => modifier::STRICTFP,
            TokenKind::Default => modifier::DEFAULT,
            TokenKind::Native => modifier::NATIVE,
            TokenKind::Synchronized => modifier::SYNCHRONIZED,
            TokenKind::Transient => modifier::TRANSIENT,
            TokenKind::Volatile => modifier::VOLATILE,
            other => unreachable!("not a modifier token: {other:?}"),
        }
    }

    /// Shared by §4.2 (compilation-unit-level type declarations) and §4.5
    /// (class members): consumes every leading annotation and modifier
    /// keyword. Stops — without consuming the `@` — the instant it sees
    /// `@interface`, since that `@` belongs to an annotation-type
    /// declaration rather than to one more annotation.
    fn parse_modifiers_and_annotations(&mut self) -> Result<(Vec<Anno>, Modifiers, bool), ParseError> {
        let mut annotations = Vec::new();
        let mut modifiers = Modifiers::EMPTY;
        loop {
            if self.at(TokenKind::At) {
                let pos = self.pos;
                self.bump();
                if self.at(TokenKind::Interface) {
                    return Ok((annotations, modifiers, true));
                }
                annotations.push(self.parse_annotation_rest(pos)?);
                continue;
            }
            if self.token.is_modifier() {
                modifiers.insert(Self::modifier_bit(self.token));
                self.bump();
                continue;
            }
            break;
        }
        Ok((annotations, modifiers, false))
    }

    // ---------------------------------------------------------------- §4.2

    /// §4.2: one dispatch loop inspecting the current token every iteration.
    /// `package`/`import`/type declarations are accepted in any order and
    /// any number of times — this crate does not enforce declaration
    /// ordering or a single `package` decl (see DESIGN.md's Open Question
    /// discussion); a reference compiler's own diagnostics, not this parser,
    /// are the place for that check.
    pub fn parse_compilation_unit(&mut self, source: Arc<SourceFile>) -> Result<CompUnit, ParseError> {
        let _span = tracing::debug_span!("parse_compilation_unit").entered();
        let pos = self.pos;

        let mut package = None;
        let mut imports = Vec::new();
        let mut types = Vec::new();

        loop {
            if self.at(TokenKind::Eof) {
                break;
            }
            if self.maybe(TokenKind::Semi) {
                continue;
            }
            if self.at(TokenKind::Import) {
                imports.push(self.parse_import_decl()?);
                continue;
            }

            // Leading annotations belong either to a `package` declaration
            // or to the type declaration that follows (§4.2).
            let leading_annotations = self.parse_annotations()?;
            if self.at(TokenKind::Package) {
                package = Some(self.parse_package_decl(leading_annotations)?);
                continue;
            }
            if !leading_annotations.is_empty() {
                self.pending_annotations = Some(leading_annotations);
            }
            types.push(self.parse_type_decl()?);
        }

        Ok(CompUnit {
            pos,
            package,
            imports,
            types,
            source,
        })
    }

    fn parse_package_decl(&mut self, annotations: Vec<Anno>) -> Result<PkgDecl, ParseError> {
        let pos = self.pos;
        self.eat(TokenKind::Package)?;
        let name = self.parse_qualified_name()?;
        self.eat(TokenKind::Semi)?;
        Ok(PkgDecl { pos, name, annotations })
    }

    fn parse_qualified_name(&mut self) -> Result<Vec<String>, ParseError> {
        let mut segments = vec![self.eat_ident()?];
        while self.maybe(TokenKind::Dot) {
            segments.push(self.eat_ident()?);
        }
        Ok(segments)
    }

    fn parse_import_decl(&mut self) -> Result<ImportDecl, ParseError> {
        let pos = self.pos;
        self.eat(TokenKind::Import)?;
        let is_static = self.maybe(TokenKind::Static);
        let mut segments = vec![self.eat_ident()?];
        let mut is_wildcard = false;
        while self.maybe(TokenKind::Dot) {
            if self.maybe(TokenKind::Star) {
                is_wildcard = true;
                break;
            }
            segments.push(self.eat_ident()?);
        }
        self.eat(TokenKind::Semi)?;
        Ok(ImportDecl {
            pos,
            name: segments,
            is_static,
            is_wildcard,
        })
    }

    // ------------------------------------------------------------ §4.3/4.5

    fn parse_type_decl(&mut self) -> Result<TyDecl, ParseError> {
        let mut annotations = self.pending_annotations.take().unwrap_or_default();
        let pos = annotations.first().map(|a| a.pos).unwrap_or(self.pos);
        let (more, modifiers, is_annotation_type) = self.parse_modifiers_and_annotations()?;
        annotations.extend(more);

        if is_annotation_type {
            return self.parse_annotation_type_decl(pos, modifiers, annotations);
        }
        match self.token {
            TokenKind::Class => self.parse_class_or_interface(pos, modifiers, annotations, TyDeclKind::Class),
            TokenKind::Interface => {
                self.parse_class_or_interface(pos, modifiers, annotations, TyDeclKind::Interface)
            }
            TokenKind::Enum => self.parse_enum_decl(pos, modifiers, annotations),
            _ => Err(self.unexpected()),
        }
    }

    fn parse_class_or_interface(
        &mut self,
        pos: TextSize,
        modifiers: Modifiers,
        annotations: Vec<Anno>,
        kind: TyDeclKind,
    ) -> Result<TyDecl, ParseError> {
        self.bump(); // `class` or `interface`
        let name = self.eat_ident()?;
        let type_params = self.parse_type_parameters()?;

        let mut superclass = None;
        let mut interfaces = Vec::new();
        if self.maybe(TokenKind::Extends) {
            if kind == TyDeclKind::Interface {
                interfaces.push(self.parse_class_type_only()?);
                while self.maybe(TokenKind::Comma) {
                    interfaces.push(self.parse_class_type_only()?);
                }
            } else {
                superclass = Some(self.parse_class_type_only()?);
            }
        }
        if self.maybe(TokenKind::Implements) {
            interfaces.push(self.parse_class_type_only()?);
            while self.maybe(TokenKind::Comma) {
                interfaces.push(self.parse_class_type_only()?);
            }
        }

        let members = self.parse_class_body(&name)?;
        Ok(TyDecl {
            pos,
            modifiers,
            annotations,
            name,
            type_params,
            superclass,
            interfaces,
            members,
            kind,
        })
    }

    fn parse_annotation_type_decl(
        &mut self,
        pos: TextSize,
        modifiers: Modifiers,
        annotations: Vec<Anno>,
    ) -> Result<TyDecl, ParseError> {
        self.eat(TokenKind::Interface)?;
        let name = self.eat_ident()?;
        let members = self.parse_class_body(&name)?;
        Ok(TyDecl {
            pos,
            modifiers,
            annotations,
            name,
            type_params: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            members,
            kind: TyDeclKind::Annotation,
        })
    }

    fn parse_class_body(&mut self, enclosing_name: &str) -> Result<Vec<Member>, ParseError> {
        self.eat(TokenKind::LBrace)?;
        let mut members = Vec::new();
        while !self.at(TokenKind::RBrace) {
            if self.maybe(TokenKind::Semi) {
                continue;
            }
            members.extend(self.parse_member(enclosing_name)?);
        }
        self.eat(TokenKind::RBrace)?;
        Ok(members)
    }

    // ---------------------------------------------------------------- §4.4

    fn parse_enum_decl(
        &mut self,
        pos: TextSize,
        modifiers: Modifiers,
        annotations: Vec<Anno>,
    ) -> Result<TyDecl, ParseError> {
        self.eat(TokenKind::Enum)?;
        let name = self.eat_ident()?;

        let mut interfaces = Vec::new();
        if self.maybe(TokenKind::Implements) {
            interfaces.push(self.parse_class_type_only()?);
            while self.maybe(TokenKind::Comma) {
                interfaces.push(self.parse_class_type_only()?);
            }
        }

        self.eat(TokenKind::LBrace)?;
        let mut members = Vec::new();

        if !self.at(TokenKind::Semi) && !self.at(TokenKind::RBrace) {
            loop {
                members.push(self.parse_enum_constant(&name)?);
                if self.maybe(TokenKind::Comma) {
                    if self.at(TokenKind::Semi) || self.at(TokenKind::RBrace) {
                        break;
                    }
                    continue;
                }
                break;
            }
        }

        if self.maybe(TokenKind::Semi) {
            while !self.at(TokenKind::RBrace) {
                if self.maybe(TokenKind::Semi) {
                    continue;
                }
                members.extend(self.parse_member(&name)?);
            }
        }
        self.eat(TokenKind::RBrace)?;

        Ok(TyDecl {
            pos,
            modifiers,
            annotations,
            name,
            type_params: Vec::new(),
            superclass: None,
            interfaces,
            members,
            kind: TyDeclKind::Enum,
        })
    }

    fn parse_enum_constant(&mut self, enclosing_name: &str) -> Result<Member, ParseError> {
        let annotations = self.parse_annotations()?;
        let pos = self.pos;
        let name = self.eat_ident()?;

        if self.at(TokenKind::LParen) {
            // Constructor arguments carry no information a header compiler
            // needs and are full expressions (method calls, `new`, casts),
            // well outside the constant-expression grammar; lexically skip
            // them rather than parse them (§4.4).
            self.skip_balanced(TokenKind::LParen, TokenKind::RParen)?;
        }

        let mut modifiers = Modifiers::EMPTY
            .with(modifier::ACC_ENUM)
            .with(modifier::PUBLIC)
            .with(modifier::STATIC)
            .with(modifier::FINAL);

        if self.at(TokenKind::LBrace) {
            modifiers.insert(modifier::ENUM_IMPL);
            self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)?;
        }

        let ty = Type::Class(ClassTy {
            pos,
            enclosing: None,
            name: enclosing_name.to_string(),
            type_arguments: Vec::new(),
            annotations: Vec::new(),
        });
        Ok(Member::Field(VarDecl {
            pos,
            modifiers,
            annotations,
            ty,
            name,
            initializer: None,
        }))
    }

    // ------------------------------------------------------------ §4.6/4.7

    fn parse_member(&mut self, enclosing_name: &str) -> Result<Vec<Member>, ParseError> {
        let mut annotations = self.pending_annotations.take().unwrap_or_default();
        let pos = annotations.first().map(|a| a.pos).unwrap_or(self.pos);
        let (more, modifiers, is_annotation_type) = self.parse_modifiers_and_annotations()?;
        annotations.extend(more);

        if is_annotation_type {
            return Ok(vec![Member::Type(self.parse_annotation_type_decl(
                pos,
                modifiers,
                annotations,
            )?)]);
        }

        match self.token {
            TokenKind::Class => Ok(vec![Member::Type(self.parse_class_or_interface(
                pos,
                modifiers,
                annotations,
                TyDeclKind::Class,
            )?)]),
            TokenKind::Interface => Ok(vec![Member::Type(self.parse_class_or_interface(
                pos,
                modifiers,
                annotations,
                TyDeclKind::Interface,
            )?)]),
            TokenKind::Enum => Ok(vec![Member::Type(self.parse_enum_decl(
                pos, modifiers, annotations,
            )?)]),
            _ => self.parse_method_or_field(pos, modifiers, annotations, enclosing_name),
        }
    }

    fn parse_method_or_field(
        &mut self,
        pos: TextSize,
        modifiers: Modifiers,
        annotations: Vec<Anno>,
        enclosing_name: &str,
    ) -> Result<Vec<Member>, ParseError> {
        let type_params = self.parse_type_parameters()?;

        if self.at(TokenKind::Ident) && self.value == enclosing_name {
            let name_pos = self.pos;
            let saved_name = self.value.clone();
            self.bump();
            if self.at(TokenKind::LParen) {
                let member = self.parse_method_rest(
                    pos,
                    modifiers,
                    annotations,
                    type_params,
                    None,
                    MethDecl::CONSTRUCTOR_NAME.to_string(),
                )?;
                return Ok(vec![member]);
            }
            // A method or field literally named after the enclosing type,
            // e.g. `Foo Foo() {}`: the identifier we just ate is the return
            // type, not a constructor name.
            let return_type = Type::Class(ClassTy {
                pos: name_pos,
                enclosing: None,
                name: saved_name,
                type_arguments: Vec::new(),
                annotations: Vec::new(),
            });
            return self.parse_member_tail(pos, modifiers, annotations, type_params, return_type);
        }

        let return_type = if self.at(TokenKind::Void) {
            let vpos = self.pos;
            self.bump();
            Type::Void(VoidTy {
                pos: vpos,
                annotations: Vec::new(),
            })
        } else {
            self.parse_type()?
        };
        self.parse_member_tail(pos, modifiers, annotations, type_params, return_type)
    }

    fn parse_member_tail(
        &mut self,
        pos: TextSize,
        modifiers: Modifiers,
        annotations: Vec<Anno>,
        type_params: Vec<TyParam>,
        ty: Type,
    ) -> Result<Vec<Member>, ParseError> {
        let name_pos = self.pos;
        let name = self.eat_ident()?;
        if self.at(TokenKind::LParen) {
            let member = self.parse_method_rest(pos, modifiers, annotations, type_params, Some(ty), name)?;
            Ok(vec![member])
        } else {
            if !type_params.is_empty() {
                return Err(ParseError::GenericField { file: self.file, pos });
            }
            self.parse_field_rest(pos, modifiers, annotations, ty, name, name_pos)
        }
    }

    // ---------------------------------------------------------------- §4.8

    fn parse_method_rest(
        &mut self,
        pos: TextSize,
        modifiers: Modifiers,
        annotations: Vec<Anno>,
        type_params: Vec<TyParam>,
        return_type: Option<Type>,
        name: String,
    ) -> Result<Member, ParseError> {
        self.eat(TokenKind::LParen)?;
        let formals = self.parse_formal_parameters()?;
        self.eat(TokenKind::RParen)?;

        let mut return_type = return_type;
        while self.at(TokenKind::LBracket) {
            self.bump();
            self.eat(TokenKind::RBracket)?;
            return_type = return_type.map(|t| t.with_extra_dims(1));
        }

        let mut throws = Vec::new();
        if self.maybe(TokenKind::Throws) {
            throws.push(self.parse_class_type_only()?);
            while self.maybe(TokenKind::Comma) {
                throws.push(self.parse_class_type_only()?);
            }
        }

        let default_value = if self.maybe(TokenKind::Default) {
            let value = self.parse_default_value()?;
            self.eat(TokenKind::Semi)?;
            Some(value)
        } else {
            None
        };

        if default_value.is_none() {
            self.skip_method_body_or_semi()?;
        }

        Ok(Member::Method(MethDecl {
            pos,
            modifiers,
            annotations,
            type_params,
            return_type,
            name,
            formals,
            throws,
            default_value,
        }))
    }

    fn parse_default_value(&mut self) -> Result<DefaultValue, ParseError> {
        let value = self.parse_element_value()?;
        match value.kind {
            ExprKind::Annotation(anno) => Ok(DefaultValue::Annotation(*anno)),
            _ => Ok(DefaultValue::Expr(value)),
        }
    }

    fn skip_method_body_or_semi(&mut self) -> Result<(), ParseError> {
        if self.maybe(TokenKind::Semi) {
            return Ok(());
        }
        self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)
    }

    // --------------------------------------------------------------- §4.13

    /// Lexically skip a balanced `open ... close` group, tracking nesting so
    /// a `}` belonging to a nested block doesn't end the skip early. Used
    /// for method bodies, instance/static initializer blocks, and anonymous
    /// enum-constant bodies — never for field initializers, which are
    /// always parsed (§4.9), not skipped.
    fn skip_balanced(&mut self, open: TokenKind, close: TokenKind) -> Result<(), ParseError> {
        self.eat(open)?;
        let mut depth = 1u32;
        loop {
            if self.at(TokenKind::Eof) {
                return Err(self.unexpected());
            }
            if self.at(open) {
                depth += 1;
            } else if self.at(close) {
                depth -= 1;
                self.bump();
                if depth == 0 {
                    tracing::trace!(?open, ?close, "skipped balanced group");
                    return Ok(());
                }
                continue;
            }
            self.bump();
        }
    }

    // ---------------------------------------------------------------- §4.9

    fn parse_field_rest(
        &mut self,
        pos: TextSize,
        modifiers: Modifiers,
        annotations: Vec<Anno>,
        base_ty: Type,
        first_name: String,
        first_name_pos: TextSize,
    ) -> Result<Vec<Member>, ParseError> {
        let (declarators, tok, dpos, dval) =
            split_declarators(&mut self.lexer, self.token, self.pos, self.value.clone());
        self.token = tok;
        self.pos = dpos;
        self.value = dval;

        let mut fields = Vec::with_capacity(declarators.len());
        for (i, tokens) in declarators.into_iter().enumerate() {
            let explicit = if i == 0 {
                Some((first_name.clone(), first_name_pos))
            } else {
                None
            };
            let mut decl = Self::finish_declarator(&base_ty, explicit, tokens, self.file)?;
            decl.modifiers = modifiers;
            decl.annotations = annotations.clone();
            fields.push(Member::Field(decl));
        }

        self.eat(TokenKind::Semi)?;
        Ok(fields)
    }

    /// Parse one declarator's tail — C-style array dims plus an optional
    /// `= initializer` — by replaying the token list the splitter carved
    /// out for it. Free function in all but name: it never touches the
    /// live lexer, so a later declarator's initializer can't accidentally
    /// consume tokens meant for the next one.
    fn finish_declarator(
        base_ty: &Type,
        explicit_name: Option<(String, TextSize)>,
        tokens: Vec<SavedToken>,
        file: FileId,
    ) -> Result<VarDecl, ParseError> {
        let mut stream = SavedTokenStream::new(tokens);
        let mut tok = stream.next();

        let (name, name_pos) = match explicit_name {
            Some((name, pos)) => (name, pos),
            None => {
                if tok != TokenKind::Ident {
                    return Err(ParseError::MalformedDeclarator {
                        description: describe_token(tok, stream.string_value()),
                        file,
                        pos: stream.position(),
                    });
                }
                let name = stream.string_value().to_string();
                let pos = stream.position();
                tok = stream.next();
                (name, pos)
            }
        };

        let mut dims = 0u32;
        while tok == TokenKind::LBracket {
            tok = stream.next();
            if tok != TokenKind::RBracket {
                return Err(ParseError::ExpectedToken {
                    expected: TokenKind::RBracket,
                    found: tok,
                    file,
                    pos: stream.position(),
                });
            }
            tok = stream.next();
            dims += 1;
        }
        let ty = base_ty.clone().with_extra_dims(dims);

        let initializer = if tok == TokenKind::Eq {
            let eq_pos = stream.position();
            let first = stream.next();
            let first_pos = stream.position();
            let first_val = stream.string_value().to_string();
            let mut sub = ConstExprParser::new(&mut stream, first, first_pos, first_val, file);
            match sub.expression()? {
                // Array-initializer-shaped initializers are dropped: a
                // header compiler only needs the constant *value* of a
                // field's initializer (for constant folding and annotation
                // defaults), and an array has none (§4.9).
                Some(expr) if !expr.is_array_init() => Some(expr),
                Some(_) => None,
                None => {
                    return Err(ParseError::UnexpectedToken {
                        description: "expected an initializer expression".to_string(),
                        file,
                        pos: eq_pos,
                    })
                }
            }
        } else {
            None
        };

        Ok(VarDecl {
            pos: name_pos,
            modifiers: Modifiers::EMPTY,
            annotations: Vec::new(),
            ty,
            name,
            initializer,
        })
    }

    fn parse_constant_expression(&mut self) -> Result<Expression, ParseError> {
        let mut sub = ConstExprParser::new(&mut self.lexer, self.token, self.pos, self.value.clone(), self.file);
        let result = sub.expression()?;
        self.token = sub.token;
        self.pos = sub.pos();
        self.value = sub.value().to_string();
        result.ok_or_else(|| self.unexpected())
    }

    // --------------------------------------------------------------- §4.10

    fn parse_formal_parameters(&mut self) -> Result<Vec<VarDecl>, ParseError> {
        let mut formals = Vec::new();
        if self.at(TokenKind::RParen) {
            return Ok(formals);
        }
        loop {
            formals.push(self.parse_formal_parameter()?);
            if self.maybe(TokenKind::Comma) {
                continue;
            }
            break;
        }
        Ok(formals)
    }

    fn parse_formal_parameter(&mut self) -> Result<VarDecl, ParseError> {
        let pos = self.pos;
        let mut annotations = Vec::new();
        let mut modifiers = Modifiers::EMPTY;
        loop {
            if self.at(TokenKind::At) {
                annotations.push(self.parse_annotation()?);
                continue;
            }
            if self.token.is_modifier() {
                modifiers.insert(Self::modifier_bit(self.token));
                self.bump();
                continue;
            }
            break;
        }

        let ty = self.parse_type()?;

        // Receiver parameter (§4.10): `Type this`, `Type.this` (the dot
        // already swallowed by `parse_type`, leaving `this` current here),
        // or the doubly-qualified `Type Identifier.this` used by a method
        // of a nested class to name its enclosing instance.
        if self.at(TokenKind::This) {
            self.bump();
            return Ok(VarDecl {
                pos,
                modifiers,
                annotations,
                ty,
                name: "this".to_string(),
                initializer: None,
            });
        }

        let varargs = self.maybe(TokenKind::Ellipsis);
        if varargs {
            modifiers.insert(modifier::VARARGS);
        }

        if !varargs && self.at(TokenKind::Ident) {
            let ident = self.value.clone();
            self.bump();
            if self.maybe(TokenKind::Dot) {
                self.eat(TokenKind::This)?;
                return Ok(VarDecl {
                    pos,
                    modifiers,
                    annotations,
                    ty,
                    name: "this".to_string(),
                    initializer: None,
                });
            }
            return self.finish_formal_parameter(pos, modifiers, annotations, ty, ident, varargs);
        }

        let name = self.eat_ident()?;
        self.finish_formal_parameter(pos, modifiers, annotations, ty, name, varargs)
    }

    /// Trailing C-style array dims on an ordinary (non-receiver) formal
    /// parameter, e.g. `int xs[]`, plus wrapping a varargs parameter's type
    /// in one array dimension.
    fn finish_formal_parameter(
        &mut self,
        pos: TextSize,
        modifiers: Modifiers,
        annotations: Vec<Anno>,
        ty: Type,
        name: String,
        varargs: bool,
    ) -> Result<VarDecl, ParseError> {
        let mut dims = 0u32;
        while self.at(TokenKind::LBracket) {
            self.bump();
            self.eat(TokenKind::RBracket)?;
            dims += 1;
        }
        let ty = if varargs {
            Type::Array(ArrTy {
                pos: ty.pos(),
                annotations: Vec::new(),
                element: Box::new(ty),
            })
        } else {
            ty.with_extra_dims(dims)
        };

        Ok(VarDecl {
            pos,
            modifiers,
            annotations,
            ty,
            name,
            initializer: None,
        })
    }

    // --------------------------------------------------------------- §4.11

    fn primitive_kind(token: TokenKind) -> Option<PrimitiveKind> {
        Some(match token {
            TokenKind::Boolean => PrimitiveKind::Boolean,
            TokenKind::Byte => PrimitiveKind::Byte,
            TokenKind::Short => PrimitiveKind::Short,
            TokenKind::Int => PrimitiveKind::Int,
            TokenKind::Long => PrimitiveKind::Long,
            TokenKind::Char => PrimitiveKind::Char,
            TokenKind::Float => PrimitiveKind::Float,
            TokenKind::Double => PrimitiveKind::Double,
            _ => return None,
        })
    }

    fn parse_type(&mut self) -> Result<Type, ParseError> {
        let annotations = self.parse_annotations()?;
        let pos = annotations.first().map(|a| a.pos).unwrap_or(self.pos);

        let mut ty = if let Some(kind) = Self::primitive_kind(self.token) {
            self.bump();
            Type::Primitive(PrimTy { pos, annotations, kind })
        } else if self.at(TokenKind::Question) {
            self.parse_wildcard(pos, annotations)?
        } else {
            self.parse_class_type(pos, annotations)?
        };

        loop {
            let dim_pos = self.pos;
            let dim_annotations = self.parse_annotations()?;
            if self.at(TokenKind::LBracket) {
                self.bump();
                self.eat(TokenKind::RBracket)?;
                ty = Type::Array(ArrTy {
                    pos: dim_pos,
                    annotations: dim_annotations,
                    element: Box::new(ty),
                });
            } else {
                if !dim_annotations.is_empty() {
                    return Err(self.unexpected());
                }
                break;
            }
        }
        Ok(ty)
    }

    fn parse_wildcard(&mut self, pos: TextSize, annotations: Vec<Anno>) -> Result<Type, ParseError> {
        self.eat(TokenKind::Question)?;
        let mut upper = None;
        let mut lower = None;
        if self.maybe(TokenKind::Extends) {
            upper = Some(Box::new(self.parse_type()?));
        } else if self.maybe(TokenKind::Super) {
            lower = Some(Box::new(self.parse_type()?));
        }
        Ok(Type::Wildcard(WildTy {
            pos,
            annotations,
            upper,
            lower,
        }))
    }

    fn parse_class_type(&mut self, pos: TextSize, annotations: Vec<Anno>) -> Result<Type, ParseError> {
        let mut enclosing: Option<Box<ClassTy>> = None;
        loop {
            let is_outermost = enclosing.is_none();
            let seg_pos = self.pos;
            let name = self.eat_ident()?;
            let type_arguments = if self.at(TokenKind::Lt) {
                self.parse_type_arguments()?
            } else {
                Vec::new()
            };
            let cur = ClassTy {
                pos: if is_outermost { pos } else { seg_pos },
                enclosing: enclosing.take(),
                name,
                type_arguments,
                annotations: if is_outermost { annotations.clone() } else { Vec::new() },
            };

            if self.at(TokenKind::Dot) {
                self.bump();
                if self.at(TokenKind::Ident) {
                    enclosing = Some(Box::new(cur));
                    continue;
                }
                // The dot didn't introduce another qualified segment (e.g.
                // a formal parameter's `Outer.this`). It isn't part of the
                // type; leave it consumed and the following token current
                // for the caller to interpret.
                return Ok(Type::Class(cur));
            }
            return Ok(Type::Class(cur));
        }
    }

    fn parse_class_type_only(&mut self) -> Result<ClassTy, ParseError> {
        match self.parse_type()? {
            Type::Class(c) => Ok(c),
            other => Err(ParseError::UnexpectedToken {
                description: format!("expected a class type, found {other:?}"),
                file: self.file,
                pos: other.pos(),
            }),
        }
    }

    fn parse_type_arguments(&mut self) -> Result<Vec<Type>, ParseError> {
        self.eat(TokenKind::Lt)?;
        let mut args = Vec::new();
        if self.at_closing_angle() {
            self.eat_closing_angle()?; // diamond `<>`
            return Ok(args);
        }
        loop {
            args.push(self.parse_type_argument()?);
            if self.maybe(TokenKind::Comma) {
                continue;
            }
            break;
        }
        self.eat_closing_angle()?;
        Ok(args)
    }

    fn parse_type_argument(&mut self) -> Result<Type, ParseError> {
        self.parse_type()
    }

    fn parse_type_parameters(&mut self) -> Result<Vec<TyParam>, ParseError> {
        if !self.at(TokenKind::Lt) {
            return Ok(Vec::new());
        }
        self.bump();
        let mut params = Vec::new();
        loop {
            let annotations = self.parse_annotations()?;
            let pos = self.pos;
            let name = self.eat_ident()?;
            let mut bounds = Vec::new();
            if self.maybe(TokenKind::Extends) {
                bounds.push(self.parse_type()?);
                while self.maybe(TokenKind::Amp) {
                    bounds.push(self.parse_type()?);
                }
            }
            params.push(TyParam {
                pos,
                name,
                bounds,
                annotations,
            });
            if self.maybe(TokenKind::Comma) {
                continue;
            }
            break;
        }
        self.eat_closing_angle()?;
        Ok(params)
    }

    fn at_closing_angle(&self) -> bool {
        matches!(self.token, TokenKind::Gt | TokenKind::Shr | TokenKind::UShr)
    }

    /// Consume one level of `>`, splitting a merged `>>`/`>>>` shift token
    /// into one fewer `>` in place rather than re-lexing (§9 "angle-bracket
    /// merge rule").
    fn eat_closing_angle(&mut self) -> Result<(), ParseError> {
        match self.token {
            TokenKind::Gt => {
                self.bump();
                Ok(())
            }
            TokenKind::Shr => {
                tracing::trace!("splitting Shr into Gt");
                self.token = TokenKind::Gt;
                self.pos += TextSize::from(1);
                Ok(())
            }
            TokenKind::UShr => {
                tracing::trace!("splitting UShr into Shr");
                self.token = TokenKind::Shr;
                self.pos += TextSize::from(1);
                Ok(())
            }
            other => Err(ParseError::ExpectedToken {
                expected: TokenKind::Gt,
                found: other,
                file: self.file,
                pos: self.pos,
            }),
        }
    }

    // --------------------------------------------------------------- §4.12

    fn parse_annotations(&mut self) -> Result<Vec<Anno>, ParseError> {
        let mut out = Vec::new();
        while self.at(TokenKind::At) {
            out.push(self.parse_annotation()?);
        }
        Ok(out)
    }

    fn parse_annotation(&mut self) -> Result<Anno, ParseError> {
        let pos = self.pos;
        self.eat(TokenKind::At)?;
        self.parse_annotation_rest(pos)
    }

    fn parse_annotation_rest(&mut self, pos: TextSize) -> Result<Anno, ParseError> {
        let mut name = vec![self.eat_ident()?];
        while self.maybe(TokenKind::Dot) {
            name.push(self.eat_ident()?);
        }
        let mut arguments = Vec::new();
        if self.maybe(TokenKind::LParen) {
            if !self.at(TokenKind::RParen) {
                loop {
                    arguments.push(self.parse_annotation_argument()?);
                    if self.maybe(TokenKind::Comma) {
                        continue;
                    }
                    break;
                }
            }
            self.eat(TokenKind::RParen)?;
        }
        Ok(Anno { pos, name, arguments })
    }

    /// One annotation argument: either an element-value pair (`name =
    /// value`, whose name we don't retain — see `Anno::arguments`) or a
    /// bare value, which can itself be a qualified-name constant
    /// expression. The two can't be told apart without eating the leading
    /// identifier first.
    fn parse_annotation_argument(&mut self) -> Result<Expression, ParseError> {
        if self.at(TokenKind::Ident) {
            let ident_pos = self.pos;
            let ident_val = self.value.clone();
            self.bump();
            if self.maybe(TokenKind::Eq) {
                return self.parse_element_value();
            }
            return self.finish_name_expression(ident_pos, ident_val);
        }
        self.parse_element_value()
    }

    fn finish_name_expression(&mut self, pos: TextSize, first: String) -> Result<Expression, ParseError> {
        let mut segments = vec![first];
        while self.maybe(TokenKind::Dot) {
            segments.push(self.eat_ident()?);
        }
        Ok(Expression {
            pos,
            kind: ExprKind::Name(segments),
        })
    }

    /// An element value: a nested annotation, an array of element values,
    /// or a constant expression (§4.12).
    fn parse_element_value(&mut self) -> Result<Expression, ParseError> {
        let pos = self.pos;
        if self.at(TokenKind::At) {
            let anno = self.parse_annotation()?;
            return Ok(Expression {
                pos,
                kind: ExprKind::Annotation(Box::new(anno)),
            });
        }
        if self.at(TokenKind::LBrace) {
            self.bump();
            let mut elements = Vec::new();
            while !self.at(TokenKind::RBrace) {
                elements.push(self.parse_element_value()?);
                if self.maybe(TokenKind::Comma) {
                    continue;
                }
                break;
            }
            self.eat(TokenKind::RBrace)?;
            return Ok(Expression {
                pos,
                kind: ExprKind::ArrayInit(elements),
            });
        }
        self.parse_constant_expression()
    }
}
