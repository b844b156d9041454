//! The variable-initializer splitter (§4.9).
//!
//! A field declaration can name several declarators sharing one base type:
//!
//! ```java
//! int a = 1, b[] = {2, 3}, c;
//! ```
//!
//! Each declarator's tail (its C-style array brackets and optional
//! initializer) is independent, but they all sit in one comma-separated run
//! up to the terminating `;`. Rather than special-case the grammar inline,
//! the field-rest parser hands the live token stream to this module, which
//! slices the run into one token list per declarator at top-level commas —
//! tracking `(`/`[`/`{` nesting so a comma inside an array initializer or an
//! annotation argument list doesn't split early — and hands back the
//! now-current token (always `;` or EOF) without consuming it.
//!
//! Each resulting token list is replayed independently through a
//! [`SavedTokenStream`] and the constant-expression parser (see
//! `parser::field_rest`) so one declarator's initializer can't reach past
//! its own comma.

use text_size::TextSize;

use crate::lexer::{SavedToken, TokenKind, TokenSource};

/// Split the comma-separated declarator run starting at `token` into one
/// token list per declarator, stopping (without consuming) at the first
/// top-level `;` or at EOF.
///
/// Returns the per-declarator token lists and the caller's new current
/// token/position/value, exactly as if the caller had called
/// `stream.next()` however many times were needed to reach the stop token.
pub fn split_declarators<S: TokenSource>(
    stream: &mut S,
    token: TokenKind,
    pos: TextSize,
    value: String,
) -> (Vec<Vec<SavedToken>>, TokenKind, TextSize, String) {
    let mut declarators = Vec::new();
    let mut current = Vec::new();
    let mut depth: i32 = 0;

    let mut tok = token;
    let mut p = pos;
    let mut v = value;

    loop {
        match tok {
            TokenKind::Eof => break,
            TokenKind::Semi if depth == 0 => break,
            TokenKind::Comma if depth == 0 => {
                declarators.push(std::mem::take(&mut current));
                tok = stream.next();
                p = stream.position();
                v = stream.string_value().to_string();
                continue;
            }
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => depth -= 1,
            _ => {}
        }

        current.push(SavedToken {
            kind: tok,
            pos: p,
            value: v.clone(),
        });
        tok = stream.next();
        p = stream.position();
        v = stream.string_value().to_string();
    }

    declarators.push(current);
    (declarators, tok, p, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn split(src: &str) -> (Vec<Vec<TokenKind>>, TokenKind) {
        let mut lexer = Lexer::new(src);
        let first = lexer.next();
        let pos = lexer.position();
        let value = lexer.string_value().to_string();
        let (decls, tok, _, _) = split_declarators(&mut lexer, first, pos, value);
        (
            decls
                .into_iter()
                .map(|d| d.into_iter().map(|t| t.kind).collect())
                .collect(),
            tok,
        )
    }

    #[test]
    fn splits_simple_declarators() {
        let (decls, stop) = split("= 1, b = 2, c;");
        assert_eq!(stop, TokenKind::Semi);
        assert_eq!(decls.len(), 3);
        assert_eq!(decls[0], vec![TokenKind::Eq, TokenKind::IntLiteral]);
        assert_eq!(
            decls[1],
            vec![TokenKind::Ident, TokenKind::Eq, TokenKind::IntLiteral]
        );
        assert_eq!(decls[2], vec![TokenKind::Ident]);
    }

    #[test]
    fn does_not_split_inside_array_initializer() {
        let (decls, stop) = split("= {1, 2, 3};");
        assert_eq!(stop, TokenKind::Semi);
        assert_eq!(decls.len(), 1);
        assert_eq!(
            decls[0],
            vec![
                TokenKind::Eq,
                TokenKind::LBrace,
                TokenKind::IntLiteral,
                TokenKind::Comma,
                TokenKind::IntLiteral,
                TokenKind::Comma,
                TokenKind::IntLiteral,
                TokenKind::RBrace,
            ]
        );
    }

    #[test]
    fn does_not_split_inside_parenthesized_call_like_expression() {
        let (decls, stop) = split("= (1, 2);");
        assert_eq!(decls.len(), 1);
        assert_eq!(stop, TokenKind::Semi);
    }

    #[test]
    fn stops_before_semicolon_without_consuming_it() {
        let (_, stop) = split("c;");
        assert_eq!(stop, TokenKind::Semi);
    }
}
