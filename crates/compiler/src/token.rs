use alloc::string::String;
use alloc::vec::Vec;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Punct,
    Num,
    /// String literal; `text` holds the decoded contents.
    Str,
    /// Lexical or preprocessing failure; `text` holds the message.
    Error,
    Eof,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Value of a `Num` token.
    pub value: i64,
    pub line: u32,
    /// First token on its line.
    pub at_bol: bool,
    /// Preceded by whitespace.
    pub has_space: bool,
}

impl Token {
    pub fn error(message: &str, line: u32) -> Self {
        Self {
            kind: TokenKind::Error,
            text: String::from(message),
            value: 0,
            line,
            at_bol: false,
            has_space: false,
        }
    }

    pub fn eof(line: u32) -> Self {
        Self {
            kind: TokenKind::Eof,
            text: String::new(),
            value: 0,
            line,
            at_bol: true,
            has_space: false,
        }
    }

    /// True for an identifier or punctuator spelled `s`.
    pub fn is(&self, s: &str) -> bool {
        matches!(self.kind, TokenKind::Ident | TokenKind::Punct) && self.text == s
    }
}

/// Ordered tokens, always terminated by a single `Eof`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenStream {
    pub tokens: Vec<Token>,
}

impl TokenStream {
    pub fn has_error(&self) -> bool {
        self.first_error().is_some()
    }

    pub fn first_error(&self) -> Option<&Token> {
        self.tokens.iter().find(|t| t.kind == TokenKind::Error)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Token> {
        self.tokens.iter()
    }
}

const PUNCTS3: &[&str] = &["<<=", ">>=", "..."];
const PUNCTS2: &[&str] = &[
    "==", "!=", "<=", ">=", "&&", "||", "<<", ">>", "+=", "-=", "*=", "/=", "%=", "&=", "|=",
    "^=", "++", "--", "->", "##",
];

/// Splits C source into tokens.
///
/// Lexing stops at the first error: an `Error` token carrying the message is
/// appended, followed by `Eof`.
pub fn tokenize(src: &[u8]) -> TokenStream {
    let mut lexer = Lexer {
        src,
        pos: 0,
        line: 1,
        at_bol: true,
        has_space: false,
        out: Vec::new(),
    };
    lexer.run();
    let line = lexer.line;
    lexer.out.push(Token::eof(line));
    TokenStream { tokens: lexer.out }
}

struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: u32,
    at_bol: bool,
    has_space: bool,
    out: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn peek(&self, ahead: usize) -> u8 {
        self.src.get(self.pos + ahead).copied().unwrap_or(0)
    }

    fn starts_with(&self, s: &str) -> bool {
        self.src[self.pos..].starts_with(s.as_bytes())
    }

    fn push(&mut self, kind: TokenKind, text: String, value: i64) {
        self.out.push(Token {
            kind,
            text,
            value,
            line: self.line,
            at_bol: self.at_bol,
            has_space: self.has_space,
        });
        self.at_bol = false;
        self.has_space = false;
    }

    fn fail(&mut self, message: &str) {
        let mut tok = Token::error(message, self.line);
        tok.at_bol = self.at_bol;
        self.out.push(tok);
        self.pos = self.src.len();
    }

    fn run(&mut self) {
        while self.pos < self.src.len() {
            let c = self.src[self.pos];

            if c == b'\n' {
                self.pos += 1;
                self.line += 1;
                self.at_bol = true;
                self.has_space = false;
                continue;
            }
            if matches!(c, b' ' | b'\t' | b'\r' | 0x0b | 0x0c) {
                self.pos += 1;
                self.has_space = true;
                continue;
            }
            // Line continuation.
            if c == b'\\' && self.peek(1) == b'\n' {
                self.pos += 2;
                self.line += 1;
                continue;
            }
            if self.starts_with("//") {
                while self.pos < self.src.len() && self.src[self.pos] != b'\n' {
                    self.pos += 1;
                }
                self.has_space = true;
                continue;
            }
            if self.starts_with("/*") {
                self.block_comment();
                continue;
            }
            if c.is_ascii_digit() {
                self.number();
                continue;
            }
            if c == b'"' {
                self.string();
                continue;
            }
            if c == b'\'' {
                self.char_literal();
                continue;
            }
            if c.is_ascii_alphabetic() || c == b'_' {
                self.ident();
                continue;
            }
            if c.is_ascii_punctuation() {
                self.punct();
                continue;
            }
            self.fail("unexpected character");
        }
    }

    fn block_comment(&mut self) {
        let mut i = self.pos + 2;
        while i + 1 < self.src.len() {
            if self.src[i] == b'*' && self.src[i + 1] == b'/' {
                self.pos = i + 2;
                self.has_space = true;
                return;
            }
            if self.src[i] == b'\n' {
                self.line += 1;
            }
            i += 1;
        }
        self.fail("unterminated block comment");
    }

    fn ident(&mut self) {
        let start = self.pos;
        while self.peek(0).is_ascii_alphanumeric() || self.peek(0) == b'_' {
            self.pos += 1;
        }
        let text = ascii_string(&self.src[start..self.pos]);
        self.push(TokenKind::Ident, text, 0);
    }

    fn punct(&mut self) {
        let len = if PUNCTS3.iter().any(|p| self.starts_with(p)) {
            3
        } else if PUNCTS2.iter().any(|p| self.starts_with(p)) {
            2
        } else {
            1
        };
        let text = ascii_string(&self.src[self.pos..self.pos + len]);
        self.pos += len;
        self.push(TokenKind::Punct, text, 0);
    }

    fn number(&mut self) {
        let start = self.pos;
        let (radix, digits_from) = if self.peek(0) == b'0' && matches!(self.peek(1), b'x' | b'X') {
            (16, start + 2)
        } else if self.peek(0) == b'0' {
            (8, start)
        } else {
            (10, start)
        };
        self.pos = digits_from;

        let mut value: u64 = 0;
        let mut digits = 0;
        while let Some(d) = (self.peek(0) as char).to_digit(radix) {
            value = match value.checked_mul(radix as u64).and_then(|v| v.checked_add(d as u64)) {
                Some(v) if v <= u32::MAX as u64 => v,
                _ => return self.fail("integer literal is too large"),
            };
            digits += 1;
            self.pos += 1;
        }
        if radix == 16 && digits == 0 {
            return self.fail("invalid hexadecimal literal");
        }
        while matches!(self.peek(0), b'u' | b'U' | b'l' | b'L') {
            self.pos += 1;
        }
        if self.peek(0).is_ascii_alphanumeric() || self.peek(0) == b'_' || self.peek(0) == b'.' {
            return self.fail("invalid numeric literal");
        }
        let text = ascii_string(&self.src[start..self.pos]);
        self.push(TokenKind::Num, text, value as i64);
    }

    /// Reads one possibly escaped character inside a literal.
    fn literal_char(&mut self, quote: u8) -> Option<u8> {
        let c = self.peek(0);
        if self.pos >= self.src.len() || c == b'\n' {
            return None;
        }
        if c != b'\\' {
            self.pos += 1;
            return if c == quote || !c.is_ascii() { None } else { Some(c) };
        }
        let decoded = match self.peek(1) {
            b'n' => b'\n',
            b't' => b'\t',
            b'r' => b'\r',
            b'0' => 0,
            b'a' => 0x07,
            b'b' => 0x08,
            b'f' => 0x0c,
            b'v' => 0x0b,
            b'\\' => b'\\',
            b'\'' => b'\'',
            b'"' => b'"',
            b'?' => b'?',
            _ => return None,
        };
        self.pos += 2;
        Some(decoded)
    }

    fn string(&mut self) {
        self.pos += 1;
        let mut text = String::new();
        while self.peek(0) != b'"' {
            match self.literal_char(b'"') {
                Some(c) => text.push(c as char),
                None => return self.fail("unterminated string literal"),
            }
        }
        self.pos += 1;
        self.push(TokenKind::Str, text, 0);
    }

    fn char_literal(&mut self) {
        let start = self.pos;
        self.pos += 1;
        let Some(c) = self.literal_char(b'\'') else {
            return self.fail("invalid character literal");
        };
        if self.peek(0) != b'\'' {
            return self.fail("unterminated character literal");
        }
        self.pos += 1;
        let text = ascii_string(&self.src[start..self.pos]);
        self.push(TokenKind::Num, text, c as i64);
    }
}

fn ascii_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
