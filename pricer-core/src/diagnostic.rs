//! Structured validation diagnostics
//!
//! Every problem found while validating a formula becomes a `Diagnostic`.
//! The admin UI shows the plain message strings; the code and suggestion are
//! there for hosts that want more than text.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Standard diagnostic codes (machine-readable)
pub mod codes {
    pub const LEX_ERROR: &str = "LEX_ERROR";
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
    pub const UNKNOWN_VARIABLE: &str = "UNKNOWN_VARIABLE";
    pub const UNKNOWN_FUNCTION: &str = "UNKNOWN_FUNCTION";
    pub const ARG_COUNT: &str = "ARG_COUNT";
    pub const INVALID_CONDITION: &str = "INVALID_CONDITION";
    pub const UNUSED_FIELD: &str = "UNUSED_FIELD";
    pub const INVALID_FIELD_KEY: &str = "INVALID_FIELD_KEY";
    pub const DUPLICATE_FIELD_KEY: &str = "DUPLICATE_FIELD_KEY";
}

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Template may still be saved
    Warning,
    /// Template must not be saved
    Error,
}

/// One validation finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Machine-readable code
    pub code: String,

    /// Human-readable message
    pub message: String,

    /// Suggestion for fixing the problem
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    pub severity: Severity,
}

impl Diagnostic {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            suggestion: None,
            severity: Severity::Error,
        }
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            suggestion: None,
            severity: Severity::Warning,
        }
    }

    /// Builder: add suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    // ========== Common Constructors ==========

    pub fn syntax(err: &ParseError) -> Self {
        let code = match err {
            ParseError::Lex(_) => codes::LEX_ERROR,
            _ => codes::PARSE_ERROR,
        };
        let diag = Self::error(code, err.to_string());
        match err {
            ParseError::UnclosedParen { .. } => diag.with_suggestion("Add the missing ')'"),
            ParseError::UnopenedParen { .. } => diag.with_suggestion("Remove the extra ')' or add a matching '('"),
            ParseError::ComparisonOutsideIf { .. } => {
                diag.with_suggestion("Comparisons are only allowed as the first argument of if(cond, a, b)")
            }
            ParseError::Lex(_) => {
                diag.with_suggestion("Formulas may only contain numbers, field names, + - * / ^, comparisons, commas and parentheses")
            }
            _ => diag.with_suggestion("Check formula syntax"),
        }
    }

    pub fn unknown_variable(name: &str) -> Self {
        Self::error(codes::UNKNOWN_VARIABLE, format!("unknown variable: {}", name))
            .with_suggestion(format!("Add a field for '{}' or check spelling", name))
    }

    pub fn unknown_function(name: &str) -> Self {
        Self::error(codes::UNKNOWN_FUNCTION, format!("unknown function: {}()", name))
    }

    pub fn arg_count(name: &str, expected: usize, got: usize) -> Self {
        Self::error(
            codes::ARG_COUNT,
            format!("wrong number of arguments for {}(): expected {}, got {}", name, expected, got),
        )
    }

    pub fn invalid_condition() -> Self {
        Self::error(codes::INVALID_CONDITION, "first argument of if() must be a comparison")
            .with_suggestion("Use one of > < >= <= == != between two values")
    }

    pub fn unused_field(key: &str) -> Self {
        Self::warning(codes::UNUSED_FIELD, format!("field {} defined but unused", key))
    }

    pub fn invalid_field_key(key: &str) -> Self {
        Self::warning(
            codes::INVALID_FIELD_KEY,
            format!("field key '{}' is not a valid formula identifier", key),
        )
        .with_suggestion("Use letters, digits and underscores, not starting with a digit")
    }

    pub fn duplicate_field_key(key: &str) -> Self {
        Self::warning(codes::DUPLICATE_FIELD_KEY, format!("field key '{}' is defined more than once", key))
            .with_suggestion("Only the first field with this key is available to the formula")
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " (suggestion: {})", suggestion)?;
        }
        Ok(())
    }
}

impl From<&ParseError> for Diagnostic {
    fn from(err: &ParseError) -> Self {
        Self::syntax(err)
    }
}

/// Aggregate outcome of validating a formula against a field list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    pub fn from_diagnostics(diagnostics: Vec<Diagnostic>) -> Self {
        let (errors, warnings): (Vec<&Diagnostic>, Vec<&Diagnostic>) =
            diagnostics.iter().partition(|d| d.is_error());
        let errors: Vec<String> = errors.into_iter().map(|d| d.message.clone()).collect();
        let warnings = warnings.into_iter().map(|d| d.message.clone()).collect();
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
            diagnostics,
        }
    }

    /// True when some error message mentions `needle`
    pub fn has_error_containing(&self, needle: &str) -> bool {
        self.errors.iter().any(|e| e.contains(needle))
    }

    pub fn has_warning_containing(&self, needle: &str) -> bool {
        self.warnings.iter().any(|w| w.contains(needle))
    }
}
