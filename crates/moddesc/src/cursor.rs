use crate::lexer::{Token, TokenKind, TokenStream};

// ── TokenCursor ───────────────────────────────────────────────────────────

/// Buffered view of a [`TokenStream`] with one token of pushback.
///
/// The cursor has two consumption modes. Structural mode ([`next_raw`])
/// surfaces every token, comments included; document-root parsing uses it so
/// comments end up in the tree. Value-seeking mode ([`next`]/[`peek`]) skips
/// comments transparently, which is where they may legally occur between a
/// `=` and its value or inside an array.
///
/// [`next_raw`]: TokenCursor::next_raw
/// [`next`]: TokenCursor::next
/// [`peek`]: TokenCursor::peek
pub struct TokenCursor {
    stream: TokenStream,
    pushback: Option<Token>,
}

impl TokenCursor {
    pub fn new(stream: TokenStream) -> Self {
        Self { stream, pushback: None }
    }

    /// Consumes and returns the next token, comments included.
    pub fn next_raw(&mut self) -> Token {
        match self.pushback.take() {
            Some(tok) => tok,
            None => self.stream.recv(),
        }
    }

    /// Consumes and returns the next token, skipping comments.
    pub fn next(&mut self) -> Token {
        loop {
            let tok = self.next_raw();
            if tok.kind != TokenKind::Comment {
                return tok;
            }
        }
    }

    /// Returns the next value-seeking token without consuming it.
    pub fn peek(&mut self) -> Token {
        let tok = self.next();
        self.unread(tok.clone());
        tok
    }

    /// Pushes `tok` back so the next read returns it first.
    ///
    /// The grammar needs exactly one token of lookahead, so the slot must be
    /// empty; a second pushback is a parser bug.
    pub fn unread(&mut self, tok: Token) {
        assert!(self.pushback.is_none(), "token pushback exceeds one token of lookahead");
        self.pushback = Some(tok);
    }
}

// ── tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use std::io;

    fn cursor(src: &str) -> TokenCursor {
        TokenCursor::new(lex(io::Cursor::new(src.as_bytes().to_vec())))
    }

    #[test]
    fn peek_then_next_yields_the_same_token() {
        let mut cur = cursor(r#"name = "x""#);
        let peeked = cur.peek();
        let consumed = cur.next();
        assert_eq!(peeked, consumed);
        assert_eq!(consumed.kind, TokenKind::Key);
        // No residue: the following token is the definition, not a replay.
        assert_eq!(cur.next().kind, TokenKind::Definition);
    }

    #[test]
    fn unread_is_returned_first() {
        let mut cur = cursor(r#"name = "x""#);
        let first = cur.next();
        cur.unread(first.clone());
        assert_eq!(cur.next(), first);
    }

    #[test]
    fn value_seeking_mode_skips_comments() {
        let mut cur = cursor("# note\nname = \"x\"");
        assert_eq!(cur.next().kind, TokenKind::Key);
    }

    #[test]
    fn structural_mode_surfaces_comments() {
        let mut cur = cursor("# note\nname = \"x\"");
        let tok = cur.next_raw();
        assert_eq!(tok.kind, TokenKind::Comment);
        assert_eq!(tok.text, " note");
    }

    #[test]
    fn eof_repeats_after_the_stream_ends() {
        let mut cur = cursor("");
        assert_eq!(cur.next().kind, TokenKind::Eof);
        assert_eq!(cur.next().kind, TokenKind::Eof);
        assert_eq!(cur.next_raw().kind, TokenKind::Eof);
    }

    #[test]
    #[should_panic(expected = "one token of lookahead")]
    fn pushback_is_bounded() {
        let mut cur = cursor(r#"name = "x""#);
        let a = cur.next();
        let b = cur.next();
        cur.unread(a);
        cur.unread(b);
    }
}
