//! The tokenizer (§2.3, §10.7) and the `TokenSource` abstraction that lets
//! the constant-expression sub-parser (`constant_expr.rs`) run identically
//! over the live token stream or over a pre-materialized list of tokens
//! produced by the variable-initializer splitter (`splitter.rs`).

mod token;
mod unicode_escape;

pub use token::TokenKind;

use text_size::TextSize;
use unicode_escape::Unescaped;

/// One token already read off some `TokenSource`, saved for replay.
///
/// The splitter accumulates these while scanning ahead for commas and the
/// terminating `;`; the constant-expression parser later replays them
/// through a [`SavedTokenStream`].
#[derive(Debug, Clone, PartialEq)]
pub struct SavedToken {
    pub kind: TokenKind,
    pub pos: TextSize,
    pub value: String,
}

/// The interface the parser's sub-components consume (§6, §9 "Sub-parser
/// handoff"). Implemented by the live [`Lexer`] and by [`SavedTokenStream`],
/// a cheap "forked" stream backed by an already-read token list.
pub trait TokenSource {
    /// Advance and return the new current token kind.
    fn next(&mut self) -> TokenKind;
    /// Byte offset (in the *original* source) of the current token.
    fn position(&self) -> TextSize;
    /// The semantic value of the current identifier/literal token.
    fn string_value(&self) -> &str;
}

/// The live lexer: tokenizes Unicode-escape-preprocessed source text.
pub struct Lexer {
    u: Unescaped,
    /// Byte offset into `u.text` just past the current token.
    cursor: usize,
    /// Byte offset into `u.text` where the current token starts.
    token_start: usize,
    value: String,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            u: Unescaped::new(source),
            cursor: 0,
            token_start: 0,
            value: String::new(),
        }
    }

    fn text(&self) -> &str {
        &self.u.text
    }

    fn peek_byte(&self) -> Option<u8> {
        self.text().as_bytes().get(self.cursor).copied()
    }

    fn peek_byte_at(&self, offset: usize) -> Option<u8> {
        self.text().as_bytes().get(self.cursor + offset).copied()
    }

    fn skip_trivia(&mut self) {
        let bytes = self.text().as_bytes();
        loop {
            match bytes.get(self.cursor) {
                Some(b) if b.is_ascii_whitespace() => self.cursor += 1,
                Some(b'/') if bytes.get(self.cursor + 1) == Some(&b'/') => {
                    while !matches!(bytes.get(self.cursor), None | Some(b'\n')) {
                        self.cursor += 1;
                    }
                }
                Some(b'/') if bytes.get(self.cursor + 1) == Some(&b'*') => {
                    self.cursor += 2;
                    while self.cursor < bytes.len() {
                        if bytes[self.cursor] == b'*' && bytes.get(self.cursor + 1) == Some(&b'/')
                        {
                            self.cursor += 2;
                            break;
                        }
                        self.cursor += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn starts_ident(ch: char) -> bool {
        unicode_ident::is_xid_start(ch) || ch == '_' || ch == '$'
    }

    fn continues_ident(ch: char) -> bool {
        unicode_ident::is_xid_continue(ch) || ch == '_' || ch == '$'
    }

    fn lex_one(&mut self) -> TokenKind {
        self.skip_trivia();
        self.token_start = self.cursor;
        self.value.clear();

        let Some(first) = self.peek_byte() else {
            return TokenKind::Eof;
        };

        if first.is_ascii_digit() {
            return self.lex_number();
        }

        // Identifiers and keywords (peek the full char before committing,
        // since a leading byte >= 0x80 may decode to a non-identifier char).
        let first_ch = self.text()[self.cursor..].chars().next().unwrap();
        if Self::starts_ident(first_ch) {
            let start = self.cursor;
            self.cursor += first_ch.len_utf8();
            while let Some(rest) = self.text()[self.cursor..].chars().next() {
                if Self::continues_ident(rest) {
                    self.cursor += rest.len_utf8();
                } else {
                    break;
                }
            }
            let text = &self.text()[start..self.cursor];
            if let Some(kw) = TokenKind::keyword_from_str(text) {
                return kw;
            }
            self.value.push_str(text);
            return TokenKind::Ident;
        }

        match first {
            b'"' => self.lex_string(),
            b'\'' => self.lex_char(),
            b'(' => self.single(TokenKind::LParen),
            b')' => self.single(TokenKind::RParen),
            b'{' => self.single(TokenKind::LBrace),
            b'}' => self.single(TokenKind::RBrace),
            b'[' => self.single(TokenKind::LBracket),
            b']' => self.single(TokenKind::RBracket),
            b';' => self.single(TokenKind::Semi),
            b',' => self.single(TokenKind::Comma),
            b'@' => self.single(TokenKind::At),
            b'?' => self.single(TokenKind::Question),
            b':' => self.single(TokenKind::Colon),
            b'~' => self.single(TokenKind::Tilde),
            b'.' => {
                if self.peek_byte_at(1) == Some(b'.') && self.peek_byte_at(2) == Some(b'.') {
                    self.cursor += 3;
                    TokenKind::Ellipsis
                } else {
                    self.single(TokenKind::Dot)
                }
            }
            b'=' => self.maybe_eq(TokenKind::Eq, TokenKind::EqEq),
            b'!' => self.maybe_eq(TokenKind::Bang, TokenKind::NotEq),
            b'*' => self.single(TokenKind::Star),
            b'/' => self.single(TokenKind::Slash),
            b'%' => self.single(TokenKind::Percent),
            b'+' => self.single(TokenKind::Plus),
            b'-' => self.single(TokenKind::Minus),
            b'^' => self.single(TokenKind::Caret),
            b'&' => {
                self.cursor += 1;
                if self.peek_byte() == Some(b'&') {
                    self.cursor += 1;
                    TokenKind::AmpAmp
                } else {
                    TokenKind::Amp
                }
            }
            b'|' => {
                self.cursor += 1;
                if self.peek_byte() == Some(b'|') {
                    self.cursor += 1;
                    TokenKind::PipePipe
                } else {
                    TokenKind::Pipe
                }
            }
            b'<' => {
                self.cursor += 1;
                if self.peek_byte() == Some(b'<') {
                    self.cursor += 1;
                    TokenKind::Shl
                } else if self.peek_byte() == Some(b'=') {
                    self.cursor += 1;
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }
            b'>' => {
                self.cursor += 1;
                if self.peek_byte() == Some(b'>') {
                    self.cursor += 1;
                    if self.peek_byte() == Some(b'>') {
                        self.cursor += 1;
                        TokenKind::UShr
                    } else {
                        TokenKind::Shr
                    }
                } else if self.peek_byte() == Some(b'=') {
                    self.cursor += 1;
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            _ => {
                // Unknown byte: consume it as an opaque single-byte token so
                // the parser can still fail with a position, rather than
                // looping forever.
                self.cursor += 1;
                TokenKind::Eof
            }
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.cursor += 1;
        kind
    }

    fn maybe_eq(&mut self, plain: TokenKind, with_eq: TokenKind) -> TokenKind {
        self.cursor += 1;
        if self.peek_byte() == Some(b'=') {
            self.cursor += 1;
            with_eq
        } else {
            plain
        }
    }

    fn lex_number(&mut self) -> TokenKind {
        let start = self.cursor;
        let bytes = self.text().as_bytes();
        let is_hex = bytes.get(start) == Some(&b'0')
            && matches!(bytes.get(start + 1), Some(b'x') | Some(b'X'));
        let is_bin = bytes.get(start) == Some(&b'0')
            && matches!(bytes.get(start + 1), Some(b'b') | Some(b'B'));

        if is_hex || is_bin {
            self.cursor += 2;
        }

        let mut is_float = false;
        while let Some(b) = self.peek_byte() {
            match b {
                b'0'..=b'9' | b'a'..=b'f' | b'A'..=b'F' | b'_' => self.cursor += 1,
                b'.' if !is_hex && !is_bin => {
                    is_float = true;
                    self.cursor += 1;
                }
                b'e' | b'E' if !is_hex && !is_bin => {
                    is_float = true;
                    self.cursor += 1;
                    if matches!(self.peek_byte(), Some(b'+') | Some(b'-')) {
                        self.cursor += 1;
                    }
                }
                _ => break,
            }
        }

        let kind = match self.peek_byte() {
            Some(b'l') | Some(b'L') => {
                self.cursor += 1;
                TokenKind::LongLiteral
            }
            Some(b'f') | Some(b'F') => {
                self.cursor += 1;
                TokenKind::FloatLiteral
            }
            Some(b'd') | Some(b'D') => {
                self.cursor += 1;
                TokenKind::DoubleLiteral
            }
            _ if is_float => TokenKind::DoubleLiteral,
            _ => TokenKind::IntLiteral,
        };

        self.value.push_str(&self.text()[start..self.cursor]);
        kind
    }

    fn lex_string(&mut self) -> TokenKind {
        let bytes = self.text().as_bytes();
        let is_text_block =
            bytes.get(self.cursor + 1) == Some(&b'"') && bytes.get(self.cursor + 2) == Some(&b'"');
        let start = self.cursor;
        if is_text_block {
            self.cursor += 3;
            while self.cursor < bytes.len() {
                if bytes[self.cursor] == b'"'
                    && bytes.get(self.cursor + 1) == Some(&b'"')
                    && bytes.get(self.cursor + 2) == Some(&b'"')
                {
                    self.cursor += 3;
                    break;
                }
                if bytes[self.cursor] == b'\\' {
                    self.cursor += 1;
                }
                self.cursor = next_char_boundary(self.text(), self.cursor);
            }
        } else {
            self.cursor += 1;
            while let Some(b) = bytes.get(self.cursor) {
                match b {
                    b'"' => {
                        self.cursor += 1;
                        break;
                    }
                    b'\\' => {
                        self.cursor += 1;
                        self.cursor = next_char_boundary(self.text(), self.cursor);
                    }
                    _ => self.cursor = next_char_boundary(self.text(), self.cursor),
                }
            }
        }
        self.value.push_str(&self.text()[start..self.cursor]);
        TokenKind::StringLiteral
    }

    fn lex_char(&mut self) -> TokenKind {
        let bytes = self.text().as_bytes();
        let start = self.cursor;
        self.cursor += 1;
        while let Some(b) = bytes.get(self.cursor) {
            match b {
                b'\'' => {
                    self.cursor += 1;
                    break;
                }
                b'\\' => {
                    self.cursor += 1;
                    self.cursor = next_char_boundary(self.text(), self.cursor);
                }
                _ => self.cursor = next_char_boundary(self.text(), self.cursor),
            }
        }
        self.value.push_str(&self.text()[start..self.cursor]);
        TokenKind::CharLiteral
    }
}

fn next_char_boundary(text: &str, from: usize) -> usize {
    match text[from..].chars().next() {
        Some(ch) => from + ch.len_utf8(),
        None => text.len(),
    }
}

impl TokenSource for Lexer {
    fn next(&mut self) -> TokenKind {
        self.lex_one()
    }

    fn position(&self) -> TextSize {
        TextSize::from(self.u.raw_offset(self.token_start as u32))
    }

    fn string_value(&self) -> &str {
        &self.value
    }
}

/// A "forked" lexer backed by a pre-saved list of tokens (§9 "Sub-parser
/// handoff"), used to replay the tail of one declarator slice produced by
/// the variable-initializer splitter through the constant-expression
/// parser.
pub struct SavedTokenStream {
    tokens: Vec<SavedToken>,
    idx: usize,
    current: SavedToken,
}

impl SavedTokenStream {
    pub fn new(tokens: Vec<SavedToken>) -> Self {
        let eof = SavedToken {
            kind: TokenKind::Eof,
            pos: tokens.last().map(|t| t.pos).unwrap_or_default(),
            value: String::new(),
        };
        Self {
            tokens,
            idx: 0,
            current: eof,
        }
    }
}

impl TokenSource for SavedTokenStream {
    fn next(&mut self) -> TokenKind {
        let tok = self.tokens.get(self.idx).cloned().unwrap_or(SavedToken {
            kind: TokenKind::Eof,
            pos: self.current.pos,
            value: String::new(),
        });
        if self.idx < self.tokens.len() {
            self.idx += 1;
        }
        self.current = tok;
        self.current.kind
    }

    fn position(&self) -> TextSize {
        self.current.pos
    }

    fn string_value(&self) -> &str {
        &self.current.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let k = lexer.next();
            if k == TokenKind::Eof {
                break;
            }
            out.push(k);
        }
        out
    }

    #[test]
    fn lexes_class_header() {
        assert_eq!(
            kinds("public class Foo<T> {}"),
            vec![
                TokenKind::Public,
                TokenKind::Class,
                TokenKind::Ident,
                TokenKind::Lt,
                TokenKind::Ident,
                TokenKind::Gt,
                TokenKind::LBrace,
                TokenKind::RBrace,
            ]
        );
    }

    #[test]
    fn merges_nested_close_angles() {
        assert_eq!(
            kinds("Map<K,List<V>>"),
            vec![
                TokenKind::Ident,
                TokenKind::Lt,
                TokenKind::Ident,
                TokenKind::Comma,
                TokenKind::Ident,
                TokenKind::Lt,
                TokenKind::Ident,
                TokenKind::Shr,
            ]
        );
        assert_eq!(
            kinds("Map<K,List<List<V>>>"),
            vec![
                TokenKind::Ident,
                TokenKind::Lt,
                TokenKind::Ident,
                TokenKind::Comma,
                TokenKind::Ident,
                TokenKind::Lt,
                TokenKind::Ident,
                TokenKind::Lt,
                TokenKind::Ident,
                TokenKind::UShr,
            ]
        );
    }

    #[test]
    fn skips_line_and_block_comments() {
        assert_eq!(
            kinds("int // trailing\n x /* inline */ ;"),
            vec![
                TokenKind::Int,
                TokenKind::Ident,
                TokenKind::Semi
            ]
        );
    }

    #[test]
    fn lexes_text_block_as_one_token() {
        let mut lexer = Lexer::new("\"\"\"\n hi \"\"\"");
        assert_eq!(lexer.next(), TokenKind::StringLiteral);
    }

    #[test]
    fn positions_account_for_unicode_escapes() {
        let mut lexer = Lexer::new("\\u0063lass C {}");
        assert_eq!(lexer.next(), TokenKind::Class);
        assert_eq!(u32::from(lexer.position()), 0);
    }
}
