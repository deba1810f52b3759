//! Formula tokenizer
//!
//! Turns formula text into a flat token stream. A leading `-` is never part
//! of a number literal; the parser decides between subtraction and negation.

use pricer_core::LexError;
use std::fmt;

/// Arithmetic and comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Gt,
    Lt,
    Ge,
    Le,
    EqEq,
    Ne,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::Caret => "^",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::EqEq => "==",
            Operator::Ne => "!=",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Operator::Gt | Operator::Lt | Operator::Ge | Operator::Le | Operator::EqEq | Operator::Ne
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Ident(String),
    Op(Operator),
    LParen,
    RParen,
    Comma,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "{}", n),
            TokenKind::Ident(name) => f.write_str(name),
            TokenKind::Op(op) => f.write_str(op.symbol()),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Eof => f.write_str("end of formula"),
        }
    }
}

/// Token with the byte offset it starts at
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

#[derive(Clone)]
pub struct Tokenizer<'a> {
    input: &'a str,
    cursor: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, cursor: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.cursor..]
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.remaining().chars().nth(1)
    }

    fn advance(&mut self, n: usize) {
        self.cursor += n;
    }

    fn error(&self, character: char) -> LexError {
        LexError { position: self.cursor, character }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_ascii_whitespace() {
                self.advance(1);
            } else {
                break;
            }
        }
    }

    /// Next token; `Eof` once the input is exhausted
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        let position = self.cursor;
        let c = match self.peek_char() {
            Some(c) => c,
            None => return Ok(Token { kind: TokenKind::Eof, position }),
        };

        let kind = match c {
            '0'..='9' | '.' => return self.lex_number(),
            c if c.is_ascii_alphabetic() || c == '_' => return Ok(self.lex_ident()),
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            '+' => TokenKind::Op(Operator::Plus),
            '-' => TokenKind::Op(Operator::Minus),
            '*' => TokenKind::Op(Operator::Star),
            '/' => TokenKind::Op(Operator::Slash),
            '^' => TokenKind::Op(Operator::Caret),
            '>' | '<' | '=' | '!' => return self.lex_comparison(c),
            other => return Err(self.error(other)),
        };
        self.advance(1);
        Ok(Token { kind, position })
    }

    fn lex_number(&mut self) -> Result<Token, LexError> {
        let position = self.cursor;
        let rest = self.remaining();
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let mut len = int_len;
        if rest[len..].starts_with('.') {
            let frac_len = rest[len + 1..].bytes().take_while(u8::is_ascii_digit).count();
            // A bare "." is not a number
            if int_len == 0 && frac_len == 0 {
                return Err(self.error('.'));
            }
            len += 1 + frac_len;
        }
        let text = &rest[..len];
        let value: f64 = text.parse().map_err(|_| self.error(text.chars().next().unwrap_or('.')))?;
        self.advance(len);
        Ok(Token { kind: TokenKind::Number(value), position })
    }

    fn lex_ident(&mut self) -> Token {
        let position = self.cursor;
        let rest = self.remaining();
        let len = rest
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count();
        self.advance(len);
        Token { kind: TokenKind::Ident(rest[..len].to_string()), position }
    }

    fn lex_comparison(&mut self, first: char) -> Result<Token, LexError> {
        let position = self.cursor;
        let followed_by_eq = self.peek_second() == Some('=');
        let (op, len) = match (first, followed_by_eq) {
            ('>', true) => (Operator::Ge, 2),
            ('<', true) => (Operator::Le, 2),
            ('=', true) => (Operator::EqEq, 2),
            ('!', true) => (Operator::Ne, 2),
            ('>', false) => (Operator::Gt, 1),
            ('<', false) => (Operator::Lt, 1),
            // Lone '=' or '!'
            (other, _) => return Err(self.error(other)),
        };
        self.advance(len);
        Ok(Token { kind: TokenKind::Op(op), position })
    }

    /// Collect every token, ending with `Eof`
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    Tokenizer::new(input).tokenize()
}
