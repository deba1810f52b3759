//! Compiled formula

use crate::ast::Expr;
use crate::parser::{self, DEFAULT_MAX_DEPTH};
use pricer_core::ParseError;

/// Source text, its AST and the variables it reads
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
    variables: Vec<String>,
}

impl Formula {
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        Self::parse_with_limit(source, DEFAULT_MAX_DEPTH)
    }

    pub fn parse_with_limit(source: &str, max_depth: usize) -> Result<Self, ParseError> {
        let expr = parser::parse_with_limit(source, max_depth)?;
        let variables = expr.variables().into_iter().map(String::from).collect();
        Ok(Self { source: source.to_string(), expr, variables })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Distinct variable names in order of first appearance
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn references(&self, name: &str) -> bool {
        self.variables.iter().any(|v| v == name)
    }
}
