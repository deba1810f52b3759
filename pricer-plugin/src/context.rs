//! Evaluation Context

use crate::FunctionRegistry;
use std::collections::HashMap;
use std::sync::Arc;

/// Store product price, always available to formulas
pub const BASE_PRICE: &str = "base_price";

/// Ordered quantity, always available to formulas
pub const QUANTITY: &str = "quantity";

/// Names every formula may reference regardless of template fields
pub const SYSTEM_VARIABLES: [&str; 2] = [BASE_PRICE, QUANTITY];

pub fn is_system_variable(name: &str) -> bool {
    SYSTEM_VARIABLES.contains(&name)
}

/// Per-request values a formula is evaluated against
///
/// Built once per price calculation and only read during evaluation.
#[derive(Clone)]
pub struct EvalContext {
    pub variables: HashMap<String, f64>,
    pub registry: Arc<FunctionRegistry>,
}

impl EvalContext {
    pub fn new(registry: Arc<FunctionRegistry>) -> Self {
        Self {
            variables: HashMap::new(),
            registry,
        }
    }

    pub fn with_variables(mut self, vars: HashMap<String, f64>) -> Self {
        self.variables.extend(vars);
        self
    }

    pub fn with_base_price(mut self, price: f64) -> Self {
        self.variables.insert(BASE_PRICE.to_string(), price);
        self
    }

    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.variables.insert(QUANTITY.to_string(), quantity);
        self
    }

    pub fn get_var(&self, name: &str) -> Option<f64> {
        self.variables.get(name).copied()
    }

    /// Lenient lookup: a name with no value reads as zero
    pub fn value_of(&self, name: &str) -> f64 {
        match self.variables.get(name) {
            Some(v) => *v,
            None => {
                tracing::debug!(variable = name, "unbound variable resolved to 0");
                0.0
            }
        }
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: f64) {
        self.variables.insert(name.into(), value);
    }
}

impl std::fmt::Debug for EvalContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvalContext")
            .field("variables", &self.variables)
            .field("functions", &self.registry.names())
            .finish()
    }
}
