//! Pricer Standard Library
//!
//! The closed set of functions a pricing formula may call.

pub mod functions;

use pricer_plugin::FunctionRegistry;

/// Load the whitelist into registry
pub fn load_standard_library(registry: FunctionRegistry) -> FunctionRegistry {
    registry
        .with_function(functions::Floor)
        .with_function(functions::Ceil)
        .with_function(functions::Round)
        .with_function(functions::Abs)
        .with_function(functions::Sqrt)
        .with_function(functions::Pow)
        .with_function(functions::Min)
        .with_function(functions::Max)
        .with_special_form(functions::if_form())
}

/// Create registry with standard library
pub fn standard_registry() -> FunctionRegistry {
    load_standard_library(FunctionRegistry::new())
}
