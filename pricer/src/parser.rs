//! Formula parser
//!
//! Recursive descent over the token stream. Precedence, lowest first:
//! comparison (first argument of `if` only), `+ -`, `* /`, unary minus,
//! `^` (right-associative), primary.

use crate::ast::{BinOp, CmpOp, Expr, UnaryOp};
use crate::lexer::{self, Operator, Token, TokenKind};
use pricer_core::ParseError;

/// Nesting limit applied when no other is configured
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Parse formula text into an AST
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    parse_with_limit(input, DEFAULT_MAX_DEPTH)
}

pub fn parse_with_limit(input: &str, max_depth: usize) -> Result<Expr, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let tokens = lexer::tokenize(input)?;
    check_balance(&tokens)?;

    let mut parser = Parser { tokens, pos: 0, depth: 0, max_depth };
    let expr = parser.parse_expression(false)?;
    if *parser.peek() != TokenKind::Eof {
        return Err(parser.unexpected());
    }
    // The descent bounds height loosely; this makes the cap exact
    if expr.depth() > max_depth {
        return Err(ParseError::TooDeep { max: max_depth });
    }
    Ok(expr)
}

/// Depth tracking over parentheses, before any descent
fn check_balance(tokens: &[Token]) -> Result<(), ParseError> {
    let mut open: Vec<usize> = Vec::new();
    for token in tokens {
        match token.kind {
            TokenKind::LParen => open.push(token.position),
            TokenKind::RParen => {
                if open.pop().is_none() {
                    return Err(ParseError::UnopenedParen { position: token.position });
                }
            }
            _ => {}
        }
    }
    match open.first() {
        Some(&position) => Err(ParseError::UnclosedParen { position }),
        None => Ok(()),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    fn peek(&self) -> &TokenKind {
        // The stream always ends with Eof and we never advance past it
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    fn position(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].position
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if kind != TokenKind::Eof {
            self.pos += 1;
        }
        kind
    }

    fn peek_op(&self) -> Option<Operator> {
        match self.peek() {
            TokenKind::Op(op) => Some(*op),
            _ => None,
        }
    }

    fn unexpected(&self) -> ParseError {
        match self.peek() {
            TokenKind::Eof => ParseError::UnexpectedEnd,
            other => ParseError::Unexpected { position: self.position(), found: other.to_string() },
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        if *self.peek() == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn parse_expression(&mut self, allow_comparison: bool) -> Result<Expr, ParseError> {
        let left = self.parse_additive()?;
        let op = match self.peek_op() {
            Some(op) if op.is_comparison() => op,
            _ => return Ok(left),
        };
        if !allow_comparison {
            return Err(ParseError::ComparisonOutsideIf { position: self.position() });
        }
        self.advance();
        let right = self.parse_additive()?;
        // No chained comparisons like a < b < c
        if matches!(self.peek_op(), Some(op) if op.is_comparison()) {
            return Err(self.unexpected());
        }
        Ok(Expr::Comparison(Box::new(left), comparison_op(op), Box::new(right)))
    }

    /// One more level of tree height; errors past the cap
    fn descend(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ParseError::TooDeep { max: self.max_depth });
        }
        Ok(())
    }

    // Each operator in a chain wraps `left` once more, so it counts as a level
    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let entry_depth = self.depth;
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_op() {
                Some(Operator::Plus) => BinOp::Add,
                Some(Operator::Minus) => BinOp::Sub,
                _ => break,
            };
            self.advance();
            self.descend()?;
            let right = self.parse_multiplicative()?;
            left = Expr::BinaryOp(Box::new(left), op, Box::new(right));
        }
        self.depth = entry_depth;
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let entry_depth = self.depth;
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_op() {
                Some(Operator::Star) => BinOp::Mul,
                Some(Operator::Slash) => BinOp::Div,
                _ => break,
            };
            self.advance();
            self.descend()?;
            let right = self.parse_unary()?;
            left = Expr::BinaryOp(Box::new(left), op, Box::new(right));
        }
        self.depth = entry_depth;
        Ok(left)
    }

    /// Parentheses, calls and unary minus all nest through here
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        self.descend()?;
        let result = if self.peek_op() == Some(Operator::Minus) {
            self.advance();
            self.parse_unary().map(|inner| Expr::UnaryOp(UnaryOp::Neg, Box::new(inner)))
        } else {
            self.parse_power()
        };
        self.depth -= 1;
        result
    }

    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_primary()?;
        if self.peek_op() == Some(Operator::Caret) {
            self.advance();
            // Right operand goes back through unary: 2^-1 and 2^3^2 = 2^(3^2)
            let exponent = self.parse_unary()?;
            return Ok(Expr::BinaryOp(Box::new(base), BinOp::Pow, Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.peek().clone() {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Number(n))
            }
            TokenKind::Ident(name) => {
                self.advance();
                if *self.peek() == TokenKind::LParen {
                    self.parse_call(name)
                } else {
                    Ok(Expr::Variable(name))
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression(false)?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_call(&mut self, name: String) -> Result<Expr, ParseError> {
        self.expect(TokenKind::LParen)?;
        let is_if = name.eq_ignore_ascii_case("if");
        let mut args = Vec::new();

        if *self.peek() == TokenKind::RParen {
            self.advance();
        } else {
            loop {
                let allow_comparison = is_if && args.is_empty();
                args.push(self.parse_expression(allow_comparison)?);
                match self.peek() {
                    TokenKind::Comma => {
                        self.advance();
                    }
                    TokenKind::RParen => {
                        self.advance();
                        break;
                    }
                    _ => return Err(self.unexpected()),
                }
            }
        }

        // Any other shape of if() is left for the validator to report
        if !is_if || !matches!(args.first(), Some(Expr::Comparison(..))) {
            return Ok(Expr::FunctionCall(name, args));
        }
        match <[Expr; 3]>::try_from(args) {
            Ok([condition, then, otherwise]) => Ok(Expr::Conditional {
                condition: Box::new(condition),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            }),
            Err(args) => Ok(Expr::FunctionCall(name, args)),
        }
    }
}

fn comparison_op(op: Operator) -> CmpOp {
    match op {
        Operator::Gt => CmpOp::Gt,
        Operator::Lt => CmpOp::Lt,
        Operator::Ge => CmpOp::Ge,
        Operator::Le => CmpOp::Le,
        Operator::EqEq => CmpOp::Eq,
        _ => CmpOp::Ne,
    }
}
