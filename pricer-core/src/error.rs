//! Error taxonomy
//!
//! Lexing and parsing errors are configuration problems and end up inside a
//! `ValidationResult`. Evaluation errors come from a bad combination of
//! runtime inputs and are returned to the caller as values.

use thiserror::Error;

/// Character the tokenizer does not accept
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected character '{character}' at position {position}")]
pub struct LexError {
    pub position: usize,
    pub character: char,
}

/// Syntax error in formula text
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("formula is empty")]
    Empty,

    #[error("unclosed parenthesis at position {position}")]
    UnclosedParen { position: usize },

    #[error("closing parenthesis without opening at position {position}")]
    UnopenedParen { position: usize },

    #[error("comparison not allowed outside if() at position {position}")]
    ComparisonOutsideIf { position: usize },

    #[error("unexpected '{found}' at position {position}")]
    Unexpected { position: usize, found: String },

    #[error("unexpected end of formula")]
    UnexpectedEnd,

    #[error("formula nesting exceeds {max} levels")]
    TooDeep { max: usize },
}

impl ParseError {
    /// True for either kind of unbalanced parentheses
    pub fn is_unbalanced(&self) -> bool {
        matches!(self, ParseError::UnclosedParen { .. } | ParseError::UnopenedParen { .. })
    }
}

/// Runtime evaluation failure
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("unknown function: {0}()")]
    UnknownFunction(String),

    #[error("wrong number of arguments for {function}(): expected {expected}, got {got}")]
    ArgumentCount { function: String, expected: usize, got: usize },
}

impl EvalError {
    pub fn invalid(details: impl Into<String>) -> Self {
        EvalError::InvalidOperation(details.into())
    }

    pub fn arg_count(function: &str, expected: usize, got: usize) -> Self {
        EvalError::ArgumentCount { function: function.to_string(), expected, got }
    }
}
