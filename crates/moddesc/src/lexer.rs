use std::fmt;
use std::io::{self, Read};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::{self, JoinHandle};

// ── Token ─────────────────────────────────────────────────────────────────

/// Lexical category of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `}`
    ArrayEnd,
    /// `{`
    ArrayStart,
    /// `# ...` up to the end of the line
    Comment,
    /// `=`
    Definition,
    /// End of the input stream; exactly one per well-formed token sequence.
    Eof,
    /// A stored lex error; terminal, the text is the message.
    Error,
    /// An identifier key: `name`, `version`, `tags`, ...
    Key,
    /// A single scalar. Quoted strings, bare paths, numbers, and version
    /// literals all lex to this kind; telling them apart is the binder's job.
    Value,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenKind::ArrayEnd => "end of array",
            TokenKind::ArrayStart => "start of array",
            TokenKind::Comment => "comment",
            TokenKind::Definition => "definition",
            TokenKind::Eof => "end of input",
            TokenKind::Error => "lex error",
            TokenKind::Key => "identifier key",
            TokenKind::Value => "value",
        })
    }
}

/// One lexical unit. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    fn eof() -> Self {
        Token { kind: TokenKind::Eof, text: String::new() }
    }
}

// ── Character input ───────────────────────────────────────────────────────

/// Incremental UTF-8 decoder over a byte stream. Reads one character at a
/// time so the lexer never materializes the input; after the first `None`
/// it keeps returning `None`.
struct Chars<R: Read> {
    input: R,
    eof: bool,
}

impl<R: Read> Chars<R> {
    fn new(input: R) -> Self {
        Self { input, eof: false }
    }

    fn next(&mut self) -> io::Result<Option<char>> {
        if self.eof {
            return Ok(None);
        }
        let mut buf = [0u8; 4];
        loop {
            match self.input.read(&mut buf[..1]) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(None);
                }
                Ok(_) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        let len = match buf[0] {
            0x00..=0x7f => return Ok(Some(buf[0] as char)),
            0xc2..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf4 => 4,
            _ => return Err(invalid_utf8()),
        };
        self.input.read_exact(&mut buf[1..len]).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof { invalid_utf8() } else { e }
        })?;
        match std::str::from_utf8(&buf[..len]) {
            Ok(s) => Ok(s.chars().next()),
            Err(_) => Err(invalid_utf8()),
        }
    }
}

fn invalid_utf8() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, "input is not valid UTF-8")
}

// ── Lexer ─────────────────────────────────────────────────────────────────

/// How many tokens the producer may run ahead of the parser before its next
/// `send` blocks.
const TOKEN_BUFFER: usize = 32;

/// Lexing stopped: the terminal token went out, or the consumer went away.
struct Halt;

type Scan = Result<(), Halt>;

/// State-machine scanner for one input stream. Emits tokens in document
/// order on `out` and terminates with exactly one `Eof` or one `Error`
/// token, then closes the channel by dropping the sender.
struct Lexer<R: Read> {
    input: Chars<R>,
    /// Running buffer for the current lexeme.
    buf: String,
    /// Single-character lookahead slot; see [`Lexer::unread`].
    pushback: Option<char>,
    out: SyncSender<Token>,
}

/// Characters that may appear in a bare (unquoted) scalar.
fn is_bare(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '"' | '{' | '}' | '=' | '#')
}

impl<R: Read> Lexer<R> {
    fn new(input: R, out: SyncSender<Token>) -> Self {
        Self {
            input: Chars::new(input),
            buf: String::new(),
            pushback: None,
            out,
        }
    }

    fn run(mut self) {
        log::trace!("lexer producer started");
        let halted = self.scan_root().is_err();
        log::trace!("lexer producer finished (halted early: {halted})");
    }

    // ── input plumbing ────────────────────────────────────────────────────

    fn next_char(&mut self) -> Result<Option<char>, Halt> {
        if let Some(c) = self.pushback.take() {
            return Ok(Some(c));
        }
        match self.input.next() {
            Ok(c) => Ok(c),
            Err(e) => Err(self.fail(format!("read error: {e}"))),
        }
    }

    /// Puts one character back; the next [`Lexer::next_char`] returns it.
    ///
    /// The grammar needs exactly one character of lookahead, so the slot
    /// must be empty; a second pushback is a scanner bug.
    fn unread(&mut self, c: char) {
        assert!(self.pushback.is_none(), "lexer pushback exceeds one character of lookahead");
        self.pushback = Some(c);
    }

    /// Consumes whitespace and returns the first character after it.
    fn next_nonblank(&mut self) -> Result<Option<char>, Halt> {
        loop {
            match self.next_char()? {
                Some(c) if c.is_whitespace() => continue,
                other => return Ok(other),
            }
        }
    }

    fn keep(&mut self, c: char) {
        self.buf.push(c);
    }

    /// Sends the buffered lexeme as a token of the given kind. Halts when
    /// the consumer has dropped its end of the channel.
    fn emit(&mut self, kind: TokenKind) -> Scan {
        let text = std::mem::take(&mut self.buf);
        self.out.send(Token { kind, text }).map_err(|_| Halt)
    }

    /// Sends a terminal `Error` token. Always halts.
    fn fail(&mut self, message: impl Into<String>) -> Halt {
        self.buf.clear();
        let _ = self.out.send(Token { kind: TokenKind::Error, text: message.into() });
        Halt
    }

    // ── states ────────────────────────────────────────────────────────────

    fn scan_root(&mut self) -> Scan {
        loop {
            match self.next_nonblank()? {
                None => return self.emit(TokenKind::Eof),
                Some('#') => self.scan_comment()?,
                Some('=') => {
                    return Err(self.fail("unexpected `=` with no identifier key before it"));
                }
                Some(c) if c.is_alphabetic() => {
                    self.keep(c);
                    self.scan_assignment()?;
                }
                Some(c) => return Err(self.fail(format!("unexpected character {c:?}"))),
            }
        }
    }

    /// Everything after `#` up to (not including) the newline. A comment cut
    /// short by end of input is still emitted, never dropped.
    fn scan_comment(&mut self) -> Scan {
        loop {
            match self.next_char()? {
                None | Some('\n') => return self.emit(TokenKind::Comment),
                Some(c) => self.keep(c),
            }
        }
    }

    /// Key, then `=`, then the value side. Entered from root with the key's
    /// first letter already in the buffer.
    fn scan_assignment(&mut self) -> Scan {
        loop {
            match self.next_char()? {
                Some(c) if c.is_alphanumeric() || c == '_' => self.keep(c),
                Some(c) => {
                    self.unread(c);
                    break;
                }
                None => break,
            }
        }
        self.emit(TokenKind::Key)?;

        match self.next_nonblank()? {
            Some('=') => {
                self.keep('=');
                self.emit(TokenKind::Definition)?;
            }
            // Not an assignment after all; hand the character back and let
            // the parser report the missing `=`.
            Some(c) => {
                self.unread(c);
                return Ok(());
            }
            None => return Ok(()),
        }
        self.scan_value()
    }

    /// The right-hand side of a definition: a quoted or bare scalar, or an
    /// array. End of input here is the parser's error, not ours.
    fn scan_value(&mut self) -> Scan {
        loop {
            match self.next_nonblank()? {
                None => {
                    self.emit(TokenKind::Eof)?;
                    return Err(Halt);
                }
                Some('#') => self.scan_comment()?,
                Some('"') => return self.scan_quoted(),
                Some('{') => {
                    self.keep('{');
                    self.emit(TokenKind::ArrayStart)?;
                    return self.scan_array();
                }
                Some(c) if is_bare(c) => {
                    self.keep(c);
                    return self.scan_bare();
                }
                Some(c) => {
                    return Err(self.fail(format!(
                        "unexpected character {c:?} when looking for a value"
                    )));
                }
            }
        }
    }

    /// Double-quoted scalar. No escape sequences; any character except `"`
    /// is literal, newlines included.
    fn scan_quoted(&mut self) -> Scan {
        loop {
            match self.next_char()? {
                None => return Err(self.fail("unterminated string")),
                Some('"') => return self.emit(TokenKind::Value),
                Some(c) => self.keep(c),
            }
        }
    }

    /// Unquoted scalar: a bare path, number, or version literal. Entered
    /// with the first character already in the buffer.
    fn scan_bare(&mut self) -> Scan {
        loop {
            match self.next_char()? {
                Some(c) if is_bare(c) => self.keep(c),
                Some(c) => {
                    self.unread(c);
                    break;
                }
                None => break,
            }
        }
        self.emit(TokenKind::Value)
    }

    /// Whitespace-separated scalars up to the closing `}`. Arrays are flat;
    /// a nested `{` is malformed input.
    fn scan_array(&mut self) -> Scan {
        loop {
            match self.next_nonblank()? {
                None => return Err(self.fail("unterminated array")),
                Some('}') => {
                    self.keep('}');
                    return self.emit(TokenKind::ArrayEnd);
                }
                Some('#') => self.scan_comment()?,
                Some('"') => self.scan_quoted()?,
                Some('{') => return Err(self.fail("unexpected `{`: arrays do not nest")),
                Some('=') => return Err(self.fail("unexpected `=` inside an array")),
                Some(c) => {
                    self.keep(c);
                    self.scan_bare()?;
                }
            }
        }
    }
}

// ── TokenStream ───────────────────────────────────────────────────────────

/// Receiving half of the lexer channel.
///
/// Dropping the stream cancels the producer: the channel disconnects, the
/// lexer's next `send` fails, and its thread stops scanning. Drop then joins
/// the thread, so an aborted parse never leaks a producer.
pub struct TokenStream {
    rx: Option<Receiver<Token>>,
    thread: Option<JoinHandle<()>>,
}

impl TokenStream {
    /// Next token in document order. Once the producer has terminated and
    /// the channel drained, yields `Eof` forever.
    pub(crate) fn recv(&mut self) -> Token {
        match self.rx.as_ref().and_then(|rx| rx.recv().ok()) {
            Some(tok) => tok,
            None => Token::eof(),
        }
    }
}

impl Drop for TokenStream {
    fn drop(&mut self) {
        // Disconnect first so a blocked producer wakes up, then reap it.
        drop(self.rx.take());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Spawns the lexer for `input` on its own thread and returns the token
/// stream. Tokens travel over a bounded single-producer/single-consumer
/// channel in strict emission order, so parsing can start before the input
/// has been fully scanned.
pub fn lex<R: Read + Send + 'static>(input: R) -> TokenStream {
    let (tx, rx) = mpsc::sync_channel(TOKEN_BUFFER);
    let thread = thread::spawn(move || Lexer::new(input, tx).run());
    TokenStream { rx: Some(rx), thread: Some(thread) }
}

// ── tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn source(src: &str) -> io::Cursor<Vec<u8>> {
        io::Cursor::new(src.as_bytes().to_vec())
    }

    /// Collects every token up to and including the terminal one.
    fn tokens(src: &str) -> Vec<Token> {
        let mut stream = lex(source(src));
        let mut out = Vec::new();
        loop {
            let tok = stream.recv();
            let terminal = matches!(tok.kind, TokenKind::Eof | TokenKind::Error);
            out.push(tok);
            if terminal {
                return out;
            }
        }
    }

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokens(src).iter().map(|t| t.kind).collect()
    }

    fn tok(kind: TokenKind, text: &str) -> Token {
        Token { kind, text: text.to_string() }
    }

    #[test]
    fn assignment_with_quoted_value() {
        assert_eq!(
            tokens(r#"name = "My Mod""#),
            vec![
                tok(TokenKind::Key, "name"),
                tok(TokenKind::Definition, "="),
                tok(TokenKind::Value, "My Mod"),
                tok(TokenKind::Eof, ""),
            ]
        );
    }

    #[test]
    fn whitespace_between_tokens_is_insignificant() {
        assert_eq!(
            tokens("name\t =\n  \"x\""),
            tokens(r#"name = "x""#),
        );
    }

    #[test]
    fn array_of_quoted_values() {
        assert_eq!(
            tokens(r#"tags = { "Fun" "Gameplay" }"#),
            vec![
                tok(TokenKind::Key, "tags"),
                tok(TokenKind::Definition, "="),
                tok(TokenKind::ArrayStart, "{"),
                tok(TokenKind::Value, "Fun"),
                tok(TokenKind::Value, "Gameplay"),
                tok(TokenKind::ArrayEnd, "}"),
                tok(TokenKind::Eof, ""),
            ]
        );
    }

    #[test]
    fn bare_scalars() {
        assert_eq!(
            tokens("remote_file_id = 2048354339"),
            vec![
                tok(TokenKind::Key, "remote_file_id"),
                tok(TokenKind::Definition, "="),
                tok(TokenKind::Value, "2048354339"),
                tok(TokenKind::Eof, ""),
            ]
        );
        assert_eq!(
            tokens("path = mod/ugc_123.mod"),
            vec![
                tok(TokenKind::Key, "path"),
                tok(TokenKind::Definition, "="),
                tok(TokenKind::Value, "mod/ugc_123.mod"),
                tok(TokenKind::Eof, ""),
            ]
        );
    }

    #[test]
    fn bare_scalar_stops_at_array_end() {
        assert_eq!(
            tokens("tags = { a b}"),
            vec![
                tok(TokenKind::Key, "tags"),
                tok(TokenKind::Definition, "="),
                tok(TokenKind::ArrayStart, "{"),
                tok(TokenKind::Value, "a"),
                tok(TokenKind::Value, "b"),
                tok(TokenKind::ArrayEnd, "}"),
                tok(TokenKind::Eof, ""),
            ]
        );
    }

    #[test]
    fn comment_body_excludes_newline() {
        assert_eq!(
            tokens("# a comment\nname = \"x\"")[0],
            tok(TokenKind::Comment, " a comment"),
        );
    }

    #[test]
    fn comment_at_eof_without_newline_is_kept() {
        assert_eq!(
            tokens("# trailing"),
            vec![tok(TokenKind::Comment, " trailing"), tok(TokenKind::Eof, "")]
        );
    }

    #[test]
    fn comment_in_value_position_is_lexed() {
        assert_eq!(
            kinds("version = # soon\n \"1.0.0\""),
            vec![
                TokenKind::Key,
                TokenKind::Definition,
                TokenKind::Comment,
                TokenKind::Value,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn key_may_contain_digits_and_underscores() {
        assert_eq!(tokens("supported_version2 = \"1.0.0\"")[0].text, "supported_version2");
    }

    #[test]
    fn empty_input_is_just_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn unterminated_string_is_a_terminal_error() {
        let toks = tokens("name = \"oops");
        let last = toks.last().unwrap();
        assert_eq!(last.kind, TokenKind::Error);
        assert_eq!(last.text, "unterminated string");
    }

    #[test]
    fn unterminated_array_is_a_terminal_error() {
        let toks = tokens(r#"tags = { "a" "b""#);
        let last = toks.last().unwrap();
        assert_eq!(last.kind, TokenKind::Error);
        assert_eq!(last.text, "unterminated array");
    }

    #[test]
    fn nested_array_is_an_error() {
        assert_eq!(tokens("tags = { { } }").last().unwrap().kind, TokenKind::Error);
    }

    #[test]
    fn definition_at_root_is_an_error() {
        assert_eq!(kinds("= \"x\""), vec![TokenKind::Error]);
    }

    #[test]
    fn digit_at_root_is_an_error() {
        assert_eq!(kinds("9lives = \"x\""), vec![TokenKind::Error]);
    }

    #[test]
    fn key_without_definition_returns_to_root() {
        // The lexer emits both keys; reporting the missing `=` is the
        // parser's job.
        assert_eq!(
            kinds("name version"),
            vec![TokenKind::Key, TokenKind::Key, TokenKind::Eof]
        );
    }

    #[test]
    fn exactly_one_terminal_token() {
        for src in ["", "name = \"x\"", "name = \"oops", "= x", "tags = {"] {
            let toks = tokens(src);
            let terminals = toks
                .iter()
                .filter(|t| matches!(t.kind, TokenKind::Eof | TokenKind::Error))
                .count();
            assert_eq!(terminals, 1, "input {src:?} produced {toks:?}");
        }
    }

    #[test]
    fn invalid_utf8_is_a_lex_error() {
        let mut stream = lex(io::Cursor::new(vec![b'n', 0xff, b'x']));
        loop {
            let tok = stream.recv();
            match tok.kind {
                TokenKind::Error => {
                    assert!(tok.text.contains("read error"), "got {:?}", tok.text);
                    return;
                }
                TokenKind::Eof => panic!("expected a read error"),
                _ => continue,
            }
        }
    }

    #[test]
    fn producer_terminates_when_stream_is_dropped() {
        // Enough tokens to overflow the channel buffer many times over; if
        // the producer ignored the disconnect, the join in Drop would hang.
        let src: String = (0..2000).map(|i| format!("key{i} = \"v\"\n")).collect();
        let mut stream = lex(source(&src));
        assert_eq!(stream.recv().kind, TokenKind::Key);
        drop(stream);
    }

    #[test]
    #[should_panic(expected = "one character of lookahead")]
    fn pushback_is_bounded() {
        let (tx, _rx) = mpsc::sync_channel(1);
        let mut lexer = Lexer::new(source(""), tx);
        lexer.unread('a');
        lexer.unread('b');
    }
}
