//! Pricer Plugin System
//!
//! Provides the traits and registry behind the formula function whitelist,
//! and the per-request evaluation context.

mod traits;
mod registry;
mod context;

pub use traits::{ArgMeta, FunctionMeta, FunctionPlugin};
pub use registry::FunctionRegistry;
pub use context::{is_system_variable, EvalContext, BASE_PRICE, QUANTITY, SYSTEM_VARIABLES};

/// Re-export core types for plugin authors
pub mod prelude {
    pub use crate::{ArgMeta, EvalContext, FunctionMeta, FunctionPlugin, FunctionRegistry};
    pub use pricer_core::prelude::*;
}
