//! Static formula validation
//!
//! Runs on template save. Every problem is collected in one pass and
//! returned as data; nothing here fails with an `Err`.

use crate::ast::Expr;
use crate::binder::{BinderNote, Bindings};
use crate::parser::{self, DEFAULT_MAX_DEPTH};
use pricer_core::{Diagnostic, FieldDefinition, ValidationResult};
use pricer_plugin::FunctionRegistry;
use std::collections::HashSet;
use std::sync::Arc;

pub struct Validator {
    registry: Arc<FunctionRegistry>,
    max_depth: usize,
}

impl Validator {
    pub fn new(registry: Arc<FunctionRegistry>) -> Self {
        Self { registry, max_depth: DEFAULT_MAX_DEPTH }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn validate(&self, formula: &str, fields: &[FieldDefinition]) -> ValidationResult {
        self.validate_with_bindings(formula, &Bindings::from_fields(fields))
    }

    pub fn validate_with_bindings(&self, formula: &str, bindings: &Bindings) -> ValidationResult {
        let mut diagnostics: Vec<Diagnostic> = bindings
            .notes()
            .iter()
            .map(|note| match note {
                BinderNote::InvalidKey(key) => Diagnostic::invalid_field_key(key),
                BinderNote::DuplicateKey(key) => Diagnostic::duplicate_field_key(key),
            })
            .collect();

        match parser::parse_with_limit(formula, self.max_depth) {
            Ok(expr) => {
                diagnostics.extend(self.check_expr(&expr, bindings));
                diagnostics.extend(Self::unused_fields(&expr, bindings));
            }
            Err(err) => {
                tracing::debug!(error = %err, "formula failed to parse");
                diagnostics.push(Diagnostic::syntax(&err));
            }
        }

        ValidationResult::from_diagnostics(dedup(diagnostics))
    }

    /// Semantic errors in a parsed formula, in tree order
    pub fn check_expr(&self, expr: &Expr, bindings: &Bindings) -> Vec<Diagnostic> {
        let mut diagnostics: Vec<Diagnostic> = expr
            .variables()
            .into_iter()
            .filter(|name| !bindings.is_known(name))
            .map(Diagnostic::unknown_variable)
            .collect();

        expr.walk(&mut |node| {
            if let Expr::FunctionCall(name, args) = node {
                if let Some(diag) = self.check_call(name, args) {
                    diagnostics.push(diag);
                }
            }
        });

        diagnostics
    }

    fn check_call(&self, name: &str, args: &[Expr]) -> Option<Diagnostic> {
        let expected = match self.registry.arity(name) {
            Some(arity) => arity,
            None => return Some(self.unknown_function(name)),
        };
        if args.len() != expected {
            return Some(Diagnostic::arg_count(name, expected, args.len()));
        }
        // A well-formed if() never reaches here as a plain call
        if self.registry.is_special_form(name) {
            return Some(Diagnostic::invalid_condition());
        }
        None
    }

    fn unknown_function(&self, name: &str) -> Diagnostic {
        let diag = Diagnostic::unknown_function(name);
        match self.registry.find_similar(name).first() {
            Some(similar) => diag.with_suggestion(format!("Did you mean {}()?", similar)),
            None => diag.with_suggestion(format!(
                "Available functions: {}",
                self.registry.names().join(", ")
            )),
        }
    }

    fn unused_fields(expr: &Expr, bindings: &Bindings) -> Vec<Diagnostic> {
        let referenced: HashSet<&str> = expr.variables().into_iter().collect();
        bindings
            .iter()
            .filter(|b| b.use_in_formula && !referenced.contains(b.variable.as_str()))
            .map(|b| Diagnostic::unused_field(b.field_key()))
            .collect()
    }
}

/// Drop repeated messages, keeping the first occurrence
fn dedup(diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
    let mut seen = HashSet::new();
    diagnostics
        .into_iter()
        .filter(|d| seen.insert(d.message.clone()))
        .collect()
}

/// One-shot validation against an explicit registry
pub fn validate(
    formula: &str,
    fields: &[FieldDefinition],
    registry: Arc<FunctionRegistry>,
    max_depth: usize,
) -> ValidationResult {
    Validator::new(registry).with_max_depth(max_depth).validate(formula, fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricer_core::{codes, FieldOption, FieldType};

    fn validator() -> Validator {
        Validator::new(Arc::new(pricer_std::standard_registry()))
    }

    fn width_field() -> FieldDefinition {
        FieldDefinition::new("width_cm", FieldType::Number).in_formula()
    }

    #[test]
    fn test_valid_formula() {
        let result = validator().validate("base_price + width_cm * 100", &[width_field()]);
        assert!(result.valid, "{:?}", result.errors);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_known_names_and_whitelisted_calls_validate() {
        let fields = vec![
            width_field(),
            FieldDefinition::new("qty", FieldType::QuantitySelector),
            FieldDefinition::new("extras", FieldType::Extras)
                .with_option(FieldOption::priced("gift", 5.0))
                .in_formula(),
        ];
        let formulas = [
            "width_cm * qty + extras_price",
            "max(base_price, min(width_cm, 10)) + qty + extras_price",
            "if(quantity >= 10, floor(width_cm) * qty, ceil(width_cm)) + extras_price",
            "POW(width_cm, 2) + Sqrt(qty) + abs(extras_price) + round(quantity)",
            "-width_cm ^ 2 + qty * extras_price / 2",
        ];
        for formula in formulas {
            let result = validator().validate(formula, &fields);
            assert!(result.valid, "{}: {:?}", formula, result.errors);
        }
    }

    #[test]
    fn test_unknown_variable_reported() {
        let result = validator().validate("base_price + unknown_field", &[]);
        assert!(!result.valid);
        assert!(result.has_error_containing("unknown_field"));
        assert_eq!(result.diagnostics[0].code, codes::UNKNOWN_VARIABLE);
    }

    #[test]
    fn test_every_unknown_variable_listed_once() {
        let result = validator().validate("a + b * a + width_cm + c", &[width_field()]);
        assert_eq!(
            result.errors,
            vec![
                "unknown variable: a".to_string(),
                "unknown variable: b".to_string(),
                "unknown variable: c".to_string(),
            ]
        );
    }

    #[test]
    fn test_unpriced_select_is_not_a_variable() {
        let color = FieldDefinition::new("color", FieldType::Select)
            .with_option(FieldOption::unpriced("red"))
            .in_formula();
        let result = validator().validate("base_price + color_price", &[color]);
        assert!(result.has_error_containing("color_price"));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_unknown_function_with_suggestion() {
        let result = validator().validate("flor(base_price)", &[]);
        assert_eq!(result.errors, vec!["unknown function: flor()".to_string()]);
        assert_eq!(result.diagnostics[0].suggestion.as_deref(), Some("Did you mean floor()?"));
    }

    #[test]
    fn test_unknown_function_lists_available() {
        let result = validator().validate("zzz(1)", &[]);
        let suggestion = result.diagnostics[0].suggestion.clone().unwrap_or_default();
        assert!(suggestion.starts_with("Available functions:"));
        assert!(suggestion.contains("sqrt"));
    }

    #[test]
    fn test_arity_errors() {
        let result = validator().validate("min(1) + floor(1, 2) + if(1 > 0, 2)", &[]);
        assert_eq!(
            result.errors,
            vec![
                "wrong number of arguments for min(): expected 2, got 1".to_string(),
                "wrong number of arguments for floor(): expected 1, got 2".to_string(),
                "wrong number of arguments for if(): expected 3, got 2".to_string(),
            ]
        );
    }

    #[test]
    fn test_if_requires_comparison() {
        let result = validator().validate("if(base_price, 1, 2)", &[]);
        assert!(!result.valid);
        assert!(result.has_error_containing("must be a comparison"));
    }

    #[test]
    fn test_nested_calls_checked() {
        let result = validator().validate("max(1, floor(nope(2)))", &[]);
        assert_eq!(result.errors, vec!["unknown function: nope()".to_string()]);
    }

    #[test]
    fn test_unclosed_paren() {
        let result = validator().validate("base_price + (width_cm * 2", &[width_field()]);
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert!(result.has_error_containing("unclosed parenthesis"));
        // No unused-field noise when the formula did not parse
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_lex_error_is_single_diagnostic() {
        let result = validator().validate("base_price $ 2", &[]);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, codes::LEX_ERROR);
    }

    #[test]
    fn test_unused_field_warning() {
        let fields = vec![
            width_field(),
            FieldDefinition::new("height_cm", FieldType::Number).in_formula(),
            FieldDefinition::new("depth_cm", FieldType::Number),
        ];
        let result = validator().validate("base_price + width_cm", &fields);
        assert!(result.valid);
        assert_eq!(result.warnings, vec!["field height_cm defined but unused".to_string()]);
    }

    #[test]
    fn test_unused_quantity_selector_warns() {
        let fields = vec![FieldDefinition::new("qty", FieldType::QuantitySelector)];
        let result = validator().validate("base_price", &fields);
        assert!(result.valid);
        assert!(result.has_warning_containing("qty"));
    }

    #[test]
    fn test_unused_extras_warns_by_field_key() {
        let extras = FieldDefinition::new("extras", FieldType::Extras)
            .with_option(FieldOption::priced("a", 1.0))
            .in_formula();
        let result = validator().validate("base_price", &[extras]);
        assert_eq!(result.warnings, vec!["field extras defined but unused".to_string()]);
    }

    #[test]
    fn test_binder_notes_become_warnings() {
        let fields = vec![
            width_field(),
            FieldDefinition::new("width_cm", FieldType::Number),
            FieldDefinition::new("9lives", FieldType::Number),
        ];
        let result = validator().validate("width_cm", &fields);
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 2);
        assert!(result.has_warning_containing("'width_cm' is defined more than once"));
        assert!(result.has_warning_containing("'9lives' is not a valid formula identifier"));
    }

    #[test]
    fn test_depth_limit_reported() {
        let formula = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        let strict = validator().with_max_depth(8);
        let result = strict.validate(&formula, &[]);
        assert!(!result.valid);
        assert!(validator().validate(&formula, &[]).valid);
    }

    #[test]
    fn test_long_operator_chain_is_invalid() {
        let fields = vec![FieldDefinition::new("w", FieldType::Number).in_formula()];
        let product = vec!["w"; 20_000].join(" * ");
        let result = validator().validate(&product, &fields);
        assert!(!result.valid);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, codes::PARSE_ERROR);
        assert!(result.has_error_containing("nesting exceeds 64 levels"));

        let sum = vec!["1"; 300_000].join(" + ");
        assert!(!validator().validate(&sum, &[]).valid);
    }

    #[test]
    fn test_free_function() {
        let registry = Arc::new(pricer_std::standard_registry());
        let result = validate("sqrt(base_price)", &[], registry, DEFAULT_MAX_DEPTH);
        assert!(result.valid);
    }

    #[test]
    fn test_result_serializes() {
        let result = validator().validate("nope", &[]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["errors"][0], "unknown variable: nope");
    }
}
