//! Token level of the RFC 3501 response grammar.
//!
//! Atoms borrow from the input; quoted strings and literals are copied out.

#![allow(clippy::missing_errors_doc)]

use crate::{Error, Result};

/// One lexical unit of a server response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Bare word, including `\`-prefixed flags and digit-led words.
    Atom(&'a str),
    /// `"..."` with escapes resolved.
    QuotedString(String),
    /// `{n}\r\n` followed by `n` raw bytes.
    Literal(Vec<u8>),
    /// Word made only of digits.
    Number(u32),
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// ` `
    Space,
    /// `*`
    Asterisk,
    /// `+`
    Plus,
    /// `NIL`, any case.
    Nil,
    /// `\r\n`
    Crlf,
    /// End of input.
    Eof,
}

/// Cursor over one response.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Starts at the beginning of `input`.
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Unconsumed input.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        self.input.get(self.pos..).unwrap_or_default()
    }

    /// True once everything is consumed.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// The next byte, unconsumed.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Consumes one byte.
    pub fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Consumes up to `n` bytes.
    pub fn skip(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n).min(self.input.len());
    }

    fn take_while(&mut self, keep: impl Fn(u8) -> bool) -> &'a [u8] {
        let input = self.input;
        let start = self.pos;
        while self.peek().is_some_and(&keep) {
            self.pos += 1;
        }
        &input[start..self.pos]
    }

    /// Lexes the next token.
    pub fn next_token(&mut self) -> Result<Token<'a>> {
        let Some(byte) = self.peek() else {
            return Ok(Token::Eof);
        };

        let single = match byte {
            b' ' => Some(Token::Space),
            b'(' => Some(Token::LParen),
            b')' => Some(Token::RParen),
            b'[' => Some(Token::LBracket),
            b']' => Some(Token::RBracket),
            b'*' => Some(Token::Asterisk),
            b'+' => Some(Token::Plus),
            _ => None,
        };
        if let Some(token) = single {
            self.pos += 1;
            return Ok(token);
        }

        match byte {
            b'\r' if self.remaining().starts_with(b"\r\n") => {
                self.pos += 2;
                Ok(Token::Crlf)
            }
            b'\r' => Err(self.error("CR without LF")),
            b'"' => self.quoted(),
            b'{' => self.literal(),
            _ if is_atom_char(byte) => self.word(),
            _ => Err(self.error(&format!("Unexpected byte {byte:#04x}"))),
        }
    }

    /// Atoms, numbers and NIL share one character class.
    fn word(&mut self) -> Result<Token<'a>> {
        let bytes = self.take_while(is_atom_char);
        let word = std::str::from_utf8(bytes).map_err(|_| self.error("Atom is not UTF-8"))?;

        if bytes.iter().all(u8::is_ascii_digit) {
            word.parse()
                .map(Token::Number)
                .map_err(|_| self.error("Number out of range"))
        } else if word.eq_ignore_ascii_case("NIL") {
            Ok(Token::Nil)
        } else {
            Ok(Token::Atom(word))
        }
    }

    /// Quoted strings may carry raw 8-bit text; invalid UTF-8 is replaced.
    fn quoted(&mut self) -> Result<Token<'a>> {
        self.pos += 1;
        let mut text = Vec::new();
        loop {
            match self.advance() {
                Some(b'"') => break,
                Some(b'\\') => {
                    let escaped = self
                        .advance()
                        .ok_or_else(|| self.error("Input ends inside an escape"))?;
                    text.push(escaped);
                }
                Some(b'\r' | b'\n') | None => return Err(self.error("Unterminated quoted string")),
                Some(byte) => text.push(byte),
            }
        }
        Ok(Token::QuotedString(String::from_utf8_lossy(&text).into_owned()))
    }

    /// `{n}` or non-synchronizing `{n+}`, CRLF, then `n` bytes.
    fn literal(&mut self) -> Result<Token<'a>> {
        self.pos += 1;
        let digits = self.take_while(|b| b.is_ascii_digit());
        let len: usize = std::str::from_utf8(digits)
            .ok()
            .and_then(|d| d.parse().ok())
            .ok_or_else(|| self.error("Bad literal length"))?;

        let rest = self.remaining();
        let header = if rest.starts_with(b"+}\r\n") {
            4
        } else if rest.starts_with(b"}\r\n") {
            3
        } else {
            return Err(self.error("Malformed literal header"));
        };
        self.pos += header;

        let data = self
            .remaining()
            .get(..len)
            .ok_or_else(|| self.error("Literal runs past the end of input"))?
            .to_vec();
        self.pos += len;
        Ok(Token::Literal(data))
    }

    /// A parse error at the current offset.
    pub(crate) fn error(&self, message: &str) -> Error {
        Error::Parse {
            position: self.pos,
            message: message.to_string(),
        }
    }

    /// Consumes a token of the same kind as `expected`.
    #[allow(clippy::needless_pass_by_value)]
    pub fn expect(&mut self, expected: Token<'_>) -> Result<()> {
        let token = self.next_token()?;
        if std::mem::discriminant(&token) == std::mem::discriminant(&expected) {
            Ok(())
        } else {
            Err(self.error(&format!("Expected {expected:?}, got {token:?}")))
        }
    }

    /// Consumes a single space.
    pub fn expect_space(&mut self) -> Result<()> {
        self.expect(Token::Space)
    }

    /// `astring`: atom, number, quoted string or literal.
    pub fn read_astring(&mut self) -> Result<String> {
        match self.next_token()? {
            Token::Atom(s) => Ok(s.to_string()),
            Token::Number(n) => Ok(n.to_string()),
            Token::QuotedString(s) => Ok(s),
            Token::Literal(data) => Ok(String::from_utf8_lossy(&data).into_owned()),
            token => Err(self.error(&format!("Expected astring, got {token:?}"))),
        }
    }

    /// `nstring` as text.
    pub fn read_nstring(&mut self) -> Result<Option<String>> {
        let bytes = self.read_nstring_bytes()?;
        Ok(bytes.map(|data| String::from_utf8_lossy(&data).into_owned()))
    }

    /// `nstring` as raw bytes: NIL, quoted string or literal.
    pub fn read_nstring_bytes(&mut self) -> Result<Option<Vec<u8>>> {
        match self.next_token()? {
            Token::Nil => Ok(None),
            Token::QuotedString(s) => Ok(Some(s.into_bytes())),
            Token::Literal(data) => Ok(Some(data)),
            token => Err(self.error(&format!("Expected nstring, got {token:?}"))),
        }
    }

    /// A `number`.
    pub fn read_number(&mut self) -> Result<u32> {
        match self.next_token()? {
            Token::Number(n) => Ok(n),
            token => Err(self.error(&format!("Expected number, got {token:?}"))),
        }
    }

    /// An atom, borrowed from the input.
    pub fn read_atom_string(&mut self) -> Result<&'a str> {
        match self.next_token()? {
            Token::Atom(s) => Ok(s),
            token => Err(self.error(&format!("Expected atom, got {token:?}"))),
        }
    }
}

/// `ATOM-CHAR` plus `\`, so system flags lex as one atom.
///
/// Excludes controls, space, `(){%*"]` and everything above 0x7E.
#[must_use]
pub const fn is_atom_char(b: u8) -> bool {
    b > b' '
        && b < 0x7F
        && !matches!(b, b'(' | b')' | b'{' | b'%' | b'*' | b'"' | b']' | b'[')
}
