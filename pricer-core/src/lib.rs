//! Pricer Core - Fundamental types
//!
//! This crate provides the core types used throughout Pricer:
//! - `FieldDefinition`: template fields and the shopper inputs for them
//! - `LexError`, `ParseError`, `EvalError`: the error taxonomy
//! - `Diagnostic`, `ValidationResult`: what template validation returns

mod field;
mod error;
mod diagnostic;

pub use field::{FieldDefinition, FieldInput, FieldOption, FieldType, Template};
pub use error::{EvalError, LexError, ParseError};
pub use diagnostic::{codes, Diagnostic, Severity, ValidationResult};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Diagnostic, EvalError, FieldDefinition, FieldInput, FieldOption, FieldType, ParseError,
        Severity, ValidationResult,
    };
    pub use crate::diagnostic::codes;
}
