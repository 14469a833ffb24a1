//! Lexer for Lillian source text.
//!
//! Input is processed line by line. At each position the patterns are
//! tried in a fixed priority order and the first match wins:
//!
//!   whitespace, `#` comment, integer, string, boolean, operator,
//!   symbol, keyword, identifier
//!
//! Lexing is not interleaved with parsing: `tokenize` returns the
//! complete token sequence or the first error.

use std::fmt;

use tracing::debug;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Plus,         // +
    Minus,        // -
    Times,        // *
    Divide,       // /
    Modulo,       // %
    Assign,       // =
    Equal,        // ==
    NotEqual,     // !=
    Greater,      // >
    GreaterEqual, // >=
    Less,         // <
    LessEqual,    // <=
}

/// Operator lexemes, longest first so `=` never swallows half of `==`.
const OPERATORS: &[(&str, Operator)] = &[
    ("==", Operator::Equal),
    ("!=", Operator::NotEqual),
    (">=", Operator::GreaterEqual),
    ("<=", Operator::LessEqual),
    (">", Operator::Greater),
    ("<", Operator::Less),
    ("+", Operator::Plus),
    ("-", Operator::Minus),
    ("*", Operator::Times),
    ("/", Operator::Divide),
    ("%", Operator::Modulo),
    ("=", Operator::Assign),
];

impl Operator {
    pub fn lexeme(self) -> &'static str {
        OPERATORS
            .iter()
            .find_map(|(text, op)| (*op == self).then_some(*text))
            .unwrap_or("?")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    LParen, // (
    RParen, // )
    LBrace, // {
    RBrace, // }
    Comma,  // ,
    Semi,   // ;
}

impl Symbol {
    fn from_byte(ch: u8) -> Option<Symbol> {
        Some(match ch {
            b'(' => Symbol::LParen,
            b')' => Symbol::RParen,
            b'{' => Symbol::LBrace,
            b'}' => Symbol::RBrace,
            b',' => Symbol::Comma,
            b';' => Symbol::Semi,
            _ => return None,
        })
    }

    pub fn lexeme(self) -> &'static str {
        match self {
            Symbol::LParen => "(",
            Symbol::RParen => ")",
            Symbol::LBrace => "{",
            Symbol::RBrace => "}",
            Symbol::Comma => ",",
            Symbol::Semi => ";",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Let,
    Fun,
}

impl Keyword {
    pub fn lexeme(self) -> &'static str {
        match self {
            Keyword::Let => "let",
            Keyword::Fun => "fun",
        }
    }
}

/// Kind of a token, carrying the decoded value for literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Operator(Operator),
    Symbol(Symbol),
    Keyword(Keyword),
    Identifier(String),
    IntLiteral(i64),
    StringLiteral(String),
    BooleanLiteral(bool),
}

/// A single token and the 1-based line it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

impl Token {
    pub fn is_symbol(&self, symbol: Symbol) -> bool {
        self.kind == TokenKind::Symbol(symbol)
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Operator(op) => f.write_str(op.lexeme()),
            TokenKind::Symbol(sym) => f.write_str(sym.lexeme()),
            TokenKind::Keyword(kw) => f.write_str(kw.lexeme()),
            TokenKind::Identifier(name) => f.write_str(name),
            TokenKind::IntLiteral(value) => write!(f, "{value}"),
            TokenKind::StringLiteral(text) => write!(f, "'{text}'"),
            TokenKind::BooleanLiteral(value) => write!(f, "{value}"),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

/// Lex a source string into tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token>, CoreError> {
    let mut tokens = Vec::new();
    for (index, text) in source.lines().enumerate() {
        if text.trim().is_empty() {
            continue;
        }
        let mut lexer = LineLexer {
            line: index + 1,
            text,
            bytes: text.as_bytes(),
            index: 0,
        };
        lexer.run(&mut tokens)?;
    }
    debug!(count = tokens.len(), "tokenized source");
    Ok(tokens)
}

/// Print tokens back as source text: lexemes separated by spaces, one
/// output line per source line. Comments and original spacing are lost,
/// but lexing the result yields the same token kinds.
pub fn render_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut line = None;
    for token in tokens {
        match line {
            Some(current) if current == token.line => out.push(' '),
            Some(_) => out.push('\n'),
            None => {}
        }
        line = Some(token.line);
        out.push_str(&token.to_string());
    }
    out
}

struct LineLexer<'src> {
    line: usize,
    text: &'src str,
    bytes: &'src [u8],
    index: usize,
}

impl<'src> LineLexer<'src> {
    fn run(&mut self, tokens: &mut Vec<Token>) -> Result<(), CoreError> {
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_whitespace() {
                self.index += 1;
                continue;
            }
            if ch == b'#' {
                // comment runs to end of line
                break;
            }

            let kind = if let Some(kind) = self.lex_int()? {
                kind
            } else if let Some(kind) = self.lex_string()? {
                kind
            } else if let Some(kind) = self.lex_boolean() {
                kind
            } else if let Some(kind) = self.lex_operator() {
                kind
            } else if let Some(kind) = self.lex_symbol() {
                kind
            } else if let Some(kind) = self.lex_keyword() {
                kind
            } else if let Some(kind) = self.lex_identifier() {
                kind
            } else {
                return Err(self.error("unrecognized input"));
            };

            tokens.push(Token {
                kind,
                line: self.line,
            });
        }
        Ok(())
    }

    fn lex_int(&mut self) -> Result<Option<TokenKind>, CoreError> {
        let start = self.index;
        let mut end = start;
        if self.bytes.get(end) == Some(&b'-') {
            end += 1;
        }
        let digits_start = end;
        while self.bytes.get(end).is_some_and(u8::is_ascii_digit) {
            end += 1;
        }
        if end == digits_start {
            return Ok(None);
        }

        let value = self.text[start..end]
            .parse::<i64>()
            .map_err(|_| self.error("integer literal out of range"))?;
        self.index = end;
        Ok(Some(TokenKind::IntLiteral(value)))
    }

    fn lex_string(&mut self) -> Result<Option<TokenKind>, CoreError> {
        if self.peek_char() != Some(b'\'') {
            return Ok(None);
        }
        let content_start = self.index + 1;
        match self.text[content_start..].find('\'') {
            Some(len) => {
                let content = &self.text[content_start..content_start + len];
                self.index = content_start + len + 1;
                Ok(Some(TokenKind::StringLiteral(content.to_string())))
            }
            None => Err(self.error("unterminated string literal")),
        }
    }

    fn lex_boolean(&mut self) -> Option<TokenKind> {
        if self.eat_word("true") {
            Some(TokenKind::BooleanLiteral(true))
        } else if self.eat_word("false") {
            Some(TokenKind::BooleanLiteral(false))
        } else {
            None
        }
    }

    fn lex_operator(&mut self) -> Option<TokenKind> {
        let rest = self.rest();
        let (text, op) = OPERATORS.iter().find(|(text, _)| rest.starts_with(text))?;
        self.index += text.len();
        Some(TokenKind::Operator(*op))
    }

    fn lex_symbol(&mut self) -> Option<TokenKind> {
        let symbol = Symbol::from_byte(self.peek_char()?)?;
        self.index += 1;
        Some(TokenKind::Symbol(symbol))
    }

    fn lex_keyword(&mut self) -> Option<TokenKind> {
        [Keyword::Let, Keyword::Fun]
            .into_iter()
            .find(|kw| self.eat_word(kw.lexeme()))
            .map(TokenKind::Keyword)
    }

    fn lex_identifier(&mut self) -> Option<TokenKind> {
        let start = self.index;
        let first = self.peek_char()?;
        if !(first.is_ascii_lowercase() || first == b'_') {
            return None;
        }
        let mut end = start + 1;
        while self.bytes.get(end).copied().is_some_and(is_ident_continue) {
            end += 1;
        }
        self.index = end;
        Some(TokenKind::Identifier(self.text[start..end].to_string()))
    }

    /// Consume `word` only when it is not the prefix of a longer identifier.
    fn eat_word(&mut self, word: &str) -> bool {
        let end = self.index + word.len();
        let matches = self.rest().starts_with(word)
            && !self.bytes.get(end).copied().is_some_and(is_ident_continue);
        if matches {
            self.index = end;
        }
        matches
    }

    fn peek_char(&self) -> Option<u8> {
        self.bytes.get(self.index).copied()
    }

    fn rest(&self) -> &'src str {
        &self.text[self.index..]
    }

    fn error(&self, message: &str) -> CoreError {
        CoreError::LexError {
            line: self.line,
            message: message.to_string(),
            remainder: self.rest().to_string(),
        }
    }
}

fn is_ident_continue(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_'
}
