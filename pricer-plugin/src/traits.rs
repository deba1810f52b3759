//! Plugin traits

use pricer_core::EvalError;
use serde::Serialize;

/// Metadata about a function argument
#[derive(Debug, Clone, Serialize)]
pub struct ArgMeta {
    pub name: &'static str,
    pub description: &'static str,
}

impl ArgMeta {
    pub const fn new(name: &'static str, description: &'static str) -> Self {
        Self { name, description }
    }
}

/// Metadata for a whitelisted function
#[derive(Debug, Clone, Serialize)]
pub struct FunctionMeta {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub args: &'static [ArgMeta],
    pub returns: &'static str,
    pub examples: &'static [&'static str],
    pub category: &'static str,
    pub related: &'static [&'static str],
}

impl FunctionMeta {
    /// Fixed number of arguments; formulas have no variadic functions
    pub fn arity(&self) -> usize {
        self.args.len()
    }
}

/// Pure numeric function callable from a formula
pub trait FunctionPlugin: Send + Sync {
    fn meta(&self) -> FunctionMeta;
    fn call(&self, args: &[f64]) -> Result<f64, EvalError>;
}
