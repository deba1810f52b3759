//! Pricer - Pricing formulas for configurable product templates
//!
//! Admins attach a formula such as `base_price + width_cm * 100` to a
//! template. `Pricer` validates it when the template is saved and evaluates
//! it against a shopper's inputs at checkout.

mod lexer;
mod parser;
mod ast;
mod binder;
mod validator;
mod eval;
mod formula;
mod cache;
mod config;
mod render;

pub use lexer::{tokenize, Operator, Token, TokenKind, Tokenizer};
pub use parser::{parse, parse_with_limit, DEFAULT_MAX_DEPTH};
pub use ast::{BinOp, CmpOp, Expr, UnaryOp};
pub use binder::{is_identifier, BinderNote, Binding, Bindings, Rule};
pub use validator::{validate, Validator};
pub use eval::Evaluator;
pub use formula::Formula;
pub use cache::{AstCache, CacheStats};
pub use config::PricerConfig;
pub use render::{NumberFormat, Renderer};

pub use pricer_core::{
    Diagnostic, EvalError, FieldDefinition, FieldInput, FieldOption, FieldType, LexError,
    ParseError, Severity, Template, ValidationResult,
};
pub use pricer_plugin::{EvalContext, FunctionRegistry, BASE_PRICE, QUANTITY};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// A shopper's price request for one template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    /// Template the host believes it is pricing; empty skips the check
    #[serde(default)]
    pub template_id: String,
    /// Values already keyed by variable name; override resolved inputs
    #[serde(default)]
    pub field_values: HashMap<String, f64>,
    /// Raw answers keyed by field key
    #[serde(default)]
    pub field_inputs: HashMap<String, FieldInput>,
    #[serde(default)]
    pub quantity: Option<f64>,
    pub base_price: f64,
    #[serde(default)]
    pub is_express: Option<bool>,
}

impl CalculationRequest {
    pub fn new(base_price: f64) -> Self {
        Self {
            template_id: String::new(),
            field_values: HashMap::new(),
            field_inputs: HashMap::new(),
            quantity: None,
            base_price,
            is_express: None,
        }
    }

    pub fn for_template(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = template_id.into();
        self
    }

    pub fn with_value(mut self, variable: impl Into<String>, value: f64) -> Self {
        self.field_values.insert(variable.into(), value);
        self
    }

    pub fn with_input(mut self, field_key: impl Into<String>, input: impl Into<FieldInput>) -> Self {
        self.field_inputs.insert(field_key.into(), input.into());
        self
    }

    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn express(mut self) -> Self {
        self.is_express = Some(true);
        self
    }
}

/// One labelled value that went into a price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownLine {
    pub label: String,
    pub value: f64,
}

impl BreakdownLine {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self { label: label.into(), value }
    }
}

/// Result of a successful price calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub calculated_price: f64,
    pub breakdown: Vec<BreakdownLine>,
    pub currency: String,
    #[serde(default)]
    pub express: bool,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalculationError {
    /// The stored formula does not parse; the template needs fixing
    #[error("invalid formula: {0}")]
    Formula(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error("request is for template {requested} but template {actual} was given")]
    TemplateMismatch { requested: String, actual: String },
}

impl CalculationError {
    /// True when the template, not the shopper's input, is at fault
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, CalculationError::Formula(_) | CalculationError::TemplateMismatch { .. })
    }
}

/// Main pricing engine
pub struct Pricer {
    registry: Arc<FunctionRegistry>,
    config: PricerConfig,
    cache: AstCache,
    evaluator: Evaluator,
}

impl Pricer {
    pub fn new(registry: FunctionRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            config: PricerConfig::default(),
            cache: AstCache::new(),
            evaluator: Evaluator::new(),
        }
    }

    pub fn with_standard_library() -> Self {
        Self::new(pricer_std::standard_registry())
    }

    pub fn with_config(mut self, config: PricerConfig) -> Self {
        self.config = config;
        self.cache.clear();
        self
    }

    pub fn config(&self) -> &PricerConfig {
        &self.config
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    fn validator(&self) -> Validator {
        Validator::new(self.registry.clone()).with_max_depth(self.config.max_depth)
    }

    /// Check a formula against the fields it will be evaluated with
    pub fn validate(&self, formula: &str, fields: &[FieldDefinition]) -> ValidationResult {
        self.validator().validate(formula, fields)
    }

    pub fn validate_template(&self, template: &Template) -> ValidationResult {
        self.validate(&template.formula, &template.fields)
    }

    /// Parsed formula for a template, reused while its text is unchanged
    pub fn compile(&self, template_id: &str, formula: &str) -> Result<Arc<Formula>, ParseError> {
        let max_depth = self.config.max_depth;
        self.cache
            .get_or_compile(template_id, formula, |source| Formula::parse_with_limit(source, max_depth))
    }

    pub fn calculate(&self, template: &Template, request: &CalculationRequest) -> Result<Quote, CalculationError> {
        match self.quote(template, request) {
            Ok(quote) => {
                tracing::debug!(template_id = %template.id, price = quote.calculated_price, "calculated price");
                Ok(quote)
            }
            Err(err) => {
                tracing::warn!(template_id = %template.id, error = %err, "price calculation failed");
                Err(err)
            }
        }
    }

    fn quote(&self, template: &Template, request: &CalculationRequest) -> Result<Quote, CalculationError> {
        if !request.template_id.is_empty() && request.template_id != template.id {
            return Err(CalculationError::TemplateMismatch {
                requested: request.template_id.clone(),
                actual: template.id.clone(),
            });
        }

        let formula = self.compile(&template.id, &template.formula)?;
        let bindings = Bindings::from_fields(&template.fields);

        let mut values = bindings.resolve(&request.field_inputs);
        values.extend(request.field_values.iter().map(|(k, v)| (k.clone(), *v)));

        let ctx = EvalContext::new(self.registry.clone())
            .with_variables(values)
            .with_base_price(request.base_price)
            .with_quantity(request.quantity.unwrap_or(1.0));

        let price = finite(self.evaluator.evaluate(formula.expr(), &ctx)?)?;

        Ok(Quote {
            calculated_price: price,
            breakdown: Self::breakdown(&formula, &bindings, &ctx),
            currency: self.config.currency.clone(),
            express: request.is_express.unwrap_or(false),
        })
    }

    /// Base price first, then every variable the formula reads
    fn breakdown(formula: &Formula, bindings: &Bindings, ctx: &EvalContext) -> Vec<BreakdownLine> {
        let mut lines = vec![BreakdownLine::new("Base price", ctx.value_of(BASE_PRICE))];
        for name in formula.variables() {
            let label = match name.as_str() {
                BASE_PRICE => continue,
                QUANTITY => "Quantity",
                other => bindings.get(other).map(|b| b.label()).unwrap_or(other),
            };
            lines.push(BreakdownLine::new(label, ctx.value_of(name)));
        }
        lines
    }

    /// Parse and evaluate without the cache, for previews
    pub fn evaluate(&self, formula: &str, values: &HashMap<String, f64>) -> Result<f64, CalculationError> {
        let expr = parser::parse_with_limit(formula, self.config.max_depth)?;
        let ctx = EvalContext::new(self.registry.clone()).with_variables(values.clone());
        Ok(finite(self.evaluator.evaluate(&expr, &ctx)?)?)
    }

    pub fn render(&self, quote: &Quote) -> String {
        Renderer::new().render(quote)
    }

    pub fn help(&self, name: Option<&str>) -> JsonValue {
        self.registry.help(name)
    }

    pub fn list_functions(&self) -> JsonValue {
        self.registry.list_functions()
    }

    /// Forget the compiled formula of a template
    pub fn invalidate(&self, template_id: &str) -> bool {
        self.cache.invalidate(template_id)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl Default for Pricer {
    fn default() -> Self {
        Self::with_standard_library()
    }
}

fn finite(value: f64) -> Result<f64, EvalError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvalError::invalid("result is not a finite number"))
    }
}

/// Build a variable map: `values! { width_cm: 5, base_price: 1000 }`
#[macro_export]
macro_rules! values {
    {} => { std::collections::HashMap::<String, f64>::new() };
    { $($key:ident : $value:expr),* $(,)? } => {{
        let mut map = std::collections::HashMap::<String, f64>::new();
        $(
            map.insert(stringify!($key).to_string(), f64::from($value));
        )*
        map
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pricer() -> Pricer {
        Pricer::with_standard_library()
    }

    fn extras_template() -> Template {
        Template::new("tpl-extras", "base_price + extras_price").with_field(
            FieldDefinition::new("extras", FieldType::Extras)
                .with_label("Extras")
                .with_option(FieldOption::priced("a", 500.0))
                .with_option(FieldOption::priced("b", 300.0))
                .in_formula(),
        )
    }

    mod scenario_tests {
        use super::*;

        #[test]
        fn test_simple_product() {
            let template = Template::new("tpl-1", "base_price + width_cm * 100")
                .with_field(FieldDefinition::new("width_cm", FieldType::Number).with_label("Width (cm)").in_formula());
            assert!(pricer().validate_template(&template).valid);

            let request = CalculationRequest::new(1000.0).with_input("width_cm", 5.0);
            let quote = pricer().calculate(&template, &request).unwrap();
            assert_eq!(quote.calculated_price, 1500.0);
            assert_eq!(
                quote.breakdown,
                vec![BreakdownLine::new("Base price", 1000.0), BreakdownLine::new("Width (cm)", 5.0)]
            );
            assert_eq!(quote.currency, "USD");
        }

        #[test]
        fn test_unknown_variable() {
            let result = pricer().validate("base_price + unknown_field", &[]);
            assert!(!result.valid);
            assert!(result.errors.iter().any(|e| e.contains("unknown_field")));
        }

        #[test]
        fn test_extras_sum() {
            let request = CalculationRequest::new(1000.0).with_input("extras", vec!["a", "b"]);
            let quote = pricer().calculate(&extras_template(), &request).unwrap();
            assert_eq!(quote.calculated_price, 1800.0);
            assert!(quote.breakdown.contains(&BreakdownLine::new("Extras", 800.0)));
        }

        #[test]
        fn test_conditional_discount() {
            let template = Template::new("tpl-bulk", "if(quantity > 10, base_price * 0.9, base_price)");
            let request = CalculationRequest::new(1000.0).with_quantity(5.0);
            let quote = pricer().calculate(&template, &request).unwrap();
            assert_eq!(quote.calculated_price, 1000.0);
            assert!(quote.breakdown.contains(&BreakdownLine::new("Quantity", 5.0)));
        }

        #[test]
        fn test_unclosed_paren() {
            let fields = vec![FieldDefinition::new("width_cm", FieldType::Number)];
            let result = pricer().validate("base_price + (width_cm * 2", &fields);
            assert!(!result.valid);
            assert!(result.has_error_containing("unclosed parenthesis"));
        }

        #[test]
        fn test_whitelisted_functions() {
            let p = pricer();
            let cases = [
                ("pow(2, 3)", 8.0),
                ("floor(3.7)", 3.0),
                ("ceil(3.2)", 4.0),
                ("round(3.5)", 4.0),
                ("sqrt(16)", 4.0),
                ("abs(-5)", 5.0),
            ];
            for (formula, expected) in cases {
                assert_eq!(p.evaluate(formula, &values! {}), Ok(expected), "{}", formula);
            }
        }
    }

    mod calculate_tests {
        use super::*;

        #[test]
        fn test_quantity_defaults_to_one() {
            let template = Template::new("t", "base_price * quantity");
            let quote = pricer().calculate(&template, &CalculationRequest::new(250.0)).unwrap();
            assert_eq!(quote.calculated_price, 250.0);
        }

        #[test]
        fn test_field_values_override_inputs() {
            let request = CalculationRequest::new(1000.0)
                .with_input("extras", vec!["a"])
                .with_value("extras_price", 1.0);
            let quote = pricer().calculate(&extras_template(), &request).unwrap();
            assert_eq!(quote.calculated_price, 1001.0);
        }

        #[test]
        fn test_explicit_values_without_fields() {
            let template = Template::new("t", "base_price + surcharge");
            let request = CalculationRequest::new(10.0).with_value("surcharge", 2.5);
            let quote = pricer().calculate(&template, &request).unwrap();
            assert_eq!(quote.calculated_price, 12.5);
            assert_eq!(quote.breakdown[1], BreakdownLine::new("surcharge", 2.5));
        }

        #[test]
        fn test_express_flag_echoed() {
            let template = Template::new("t", "base_price");
            let quote = pricer().calculate(&template, &CalculationRequest::new(1.0).express()).unwrap();
            assert!(quote.express);
            assert_eq!(quote.calculated_price, 1.0);
        }

        #[test]
        fn test_currency_from_config() {
            let p = Pricer::default().with_config(PricerConfig::default().with_currency("EUR"));
            let quote = p.calculate(&Template::new("t", "base_price"), &CalculationRequest::new(3.0)).unwrap();
            assert_eq!(quote.currency, "EUR");
        }

        #[test]
        fn test_runtime_error_is_not_configuration() {
            let template = Template::new("t", "base_price / width").with_field(FieldDefinition::new("width", FieldType::Number));
            let err = pricer().calculate(&template, &CalculationRequest::new(1.0)).unwrap_err();
            assert_eq!(err, CalculationError::Eval(EvalError::DivisionByZero));
            assert!(!err.is_configuration_error());
        }

        #[test]
        fn test_parse_error_is_configuration() {
            let template = Template::new("t", "base_price +");
            let err = pricer().calculate(&template, &CalculationRequest::new(1.0)).unwrap_err();
            assert!(err.is_configuration_error());
            assert!(err.to_string().starts_with("invalid formula:"));
        }

        #[test]
        fn test_long_formula_is_rejected_not_evaluated() {
            let p = pricer();
            let formula = vec!["base_price"; 1000].join(" + ");
            let template = Template::new("t", formula.clone());
            assert!(!p.validate_template(&template).valid);
            let err = p.calculate(&template, &CalculationRequest::new(1.0)).unwrap_err();
            assert_eq!(err, CalculationError::Formula(ParseError::TooDeep { max: DEFAULT_MAX_DEPTH }));
            assert!(err.is_configuration_error());
            assert!(p.evaluate(&formula, &values! {}).is_err());
        }

        #[test]
        fn test_template_mismatch() {
            let request = CalculationRequest::new(1.0).for_template("other");
            let err = pricer().calculate(&extras_template(), &request).unwrap_err();
            assert!(matches!(err, CalculationError::TemplateMismatch { .. }));
            let ok = CalculationRequest::new(1.0).for_template("tpl-extras");
            assert!(pricer().calculate(&extras_template(), &ok).is_ok());
        }

        #[test]
        fn test_non_finite_result_rejected() {
            let p = pricer();
            assert_eq!(
                p.evaluate("x * x", &values! { x: 1e200 }),
                Err(CalculationError::Eval(EvalError::invalid("result is not a finite number")))
            );
        }

        #[test]
        fn test_request_from_host_json() {
            let json = r#"{
                "template_id": "tpl-extras",
                "field_inputs": {"extras": ["a", "b"]},
                "base_price": 1000,
                "is_express": true
            }"#;
            let request: CalculationRequest = serde_json::from_str(json).unwrap();
            let quote = pricer().calculate(&extras_template(), &request).unwrap();
            assert_eq!(quote.calculated_price, 1800.0);
            let out = serde_json::to_value(&quote).unwrap();
            assert_eq!(out["calculated_price"], 1800.0);
            assert_eq!(out["express"], true);
        }
    }

    mod cache_tests {
        use super::*;

        #[test]
        fn test_calculate_reuses_compiled_formula() {
            let p = pricer();
            let template = extras_template();
            for _ in 0..3 {
                p.calculate(&template, &CalculationRequest::new(1.0)).unwrap();
            }
            let stats = p.cache_stats();
            assert_eq!((stats.entries, stats.hits, stats.misses), (1, 2, 1));
        }

        #[test]
        fn test_edited_formula_recompiles() {
            let p = pricer();
            let mut template = Template::new("t", "base_price");
            assert_eq!(p.calculate(&template, &CalculationRequest::new(2.0)).unwrap().calculated_price, 2.0);
            template.formula = "base_price * 3".to_string();
            assert_eq!(p.calculate(&template, &CalculationRequest::new(2.0)).unwrap().calculated_price, 6.0);
            assert!(p.invalidate("t"));
            assert!(!p.invalidate("t"));
        }
    }

    #[test]
    fn test_pricer_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pricer>();
        assert_send_sync::<Formula>();
    }

    #[test]
    fn test_concurrent_calculations() {
        let p = Arc::new(pricer());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let p = Arc::clone(&p);
                std::thread::spawn(move || {
                    let request = CalculationRequest::new(100.0 * i as f64).with_input("extras", vec!["b"]);
                    p.calculate(&extras_template(), &request).unwrap().calculated_price
                })
            })
            .collect();
        let prices: Vec<f64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(prices, vec![300.0, 400.0, 500.0, 600.0]);
    }

    #[test]
    fn test_evaluate_with_values_macro() {
        let p = pricer();
        let vars = values! { width_cm: 5, base_price: 1000 };
        assert_eq!(p.evaluate("base_price + width_cm * 100", &vars), Ok(1500.0));
    }

    #[test]
    fn test_render_quote() {
        let p = pricer();
        let request = CalculationRequest::new(1000.0).with_input("extras", vec!["a", "b"]);
        let quote = p.calculate(&extras_template(), &request).unwrap();
        let md = p.render(&quote);
        assert!(md.contains("| Extras | 800.00 |"));
        assert!(md.contains("**1800.00 USD**"));
    }

    #[test]
    fn test_help() {
        let p = pricer();
        let help = p.help(Some("sqrt"));
        assert_eq!(help["name"], "sqrt");
        assert!(help.get("description").is_some());
        assert!(p.help(None)["functions"].is_object());
        assert!(p.help(Some("nope"))["error"].is_string());
    }

    #[test]
    fn test_list_functions() {
        let list = pricer().list_functions();
        let names: Vec<&str> = list.as_array().unwrap().iter().filter_map(|f| f["name"].as_str()).collect();
        assert_eq!(names, vec!["abs", "ceil", "floor", "if", "max", "min", "pow", "round", "sqrt"]);
    }
}
