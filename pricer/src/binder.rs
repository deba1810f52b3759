//! Variable binder
//!
//! Derives, from a template's field list, which variable names a formula
//! may reference and how each one is resolved to a number for a given set
//! of shopper inputs. The evaluator never sees field types.

use pricer_core::{FieldDefinition, FieldInput, FieldType};
use pricer_plugin::is_system_variable;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

fn identifier_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("identifier pattern is valid"))
}

pub fn is_identifier(name: &str) -> bool {
    identifier_pattern().is_match(name)
}

/// How a bound variable gets its value
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Numeric input, 0 when absent
    NumericInput,
    /// Chosen quantity, 0 when absent
    Quantity,
    /// Price of the single selected option
    SelectedPrice,
    /// Sum of the prices of every selected option
    SummedPrices,
}

impl Rule {
    fn resolve(&self, field: &FieldDefinition, input: Option<&FieldInput>) -> f64 {
        let input = match input {
            Some(input) => input,
            None => return 0.0,
        };
        let price = |value: &&str| field.option(value).map(|o| o.price_or_zero()).unwrap_or(0.0);
        match self {
            Rule::NumericInput | Rule::Quantity => input.as_number().unwrap_or(0.0),
            Rule::SelectedPrice => input.selections().first().map(price).unwrap_or(0.0),
            Rule::SummedPrices => input.selections().iter().map(price).sum(),
        }
    }
}

/// One row of the binding table
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub variable: String,
    pub field: FieldDefinition,
    pub rule: Rule,
    /// Whether the admin expects the formula to reference this field
    pub use_in_formula: bool,
}

impl Binding {
    pub fn field_key(&self) -> &str {
        &self.field.key
    }

    pub fn label(&self) -> &str {
        self.field.display_label()
    }

    pub fn field_type(&self) -> FieldType {
        self.field.field_type
    }

    pub fn resolve(&self, input: Option<&FieldInput>) -> f64 {
        self.rule.resolve(&self.field, input)
    }
}

/// Field problems noticed while binding; surfaced as validation warnings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinderNote {
    InvalidKey(String),
    DuplicateKey(String),
}

/// Variable name to resolution rule, derived from a field list
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    entries: Vec<Binding>,
    index: HashMap<String, usize>,
    notes: Vec<BinderNote>,
}

impl Bindings {
    pub fn from_fields(fields: &[FieldDefinition]) -> Self {
        let mut bindings = Bindings::default();
        let mut seen_keys: HashSet<&str> = HashSet::new();

        for field in fields {
            if !seen_keys.insert(field.key.as_str()) {
                bindings.notes.push(BinderNote::DuplicateKey(field.key.clone()));
                continue;
            }
            let (variable, rule) = match Self::variable_for(field) {
                Some(bound) => bound,
                None => continue,
            };
            if !is_identifier(&field.key) {
                bindings.notes.push(BinderNote::InvalidKey(field.key.clone()));
                continue;
            }
            if bindings.index.contains_key(&variable) || is_system_variable(&variable) {
                bindings.notes.push(BinderNote::DuplicateKey(variable));
                continue;
            }

            let use_in_formula = field.use_in_formula || field.field_type == FieldType::QuantitySelector;
            bindings.index.insert(variable.clone(), bindings.entries.len());
            bindings.entries.push(Binding {
                variable,
                field: field.clone(),
                rule,
                use_in_formula,
            });
        }

        bindings
    }

    /// The variable a single field contributes, if any
    pub fn variable_for(field: &FieldDefinition) -> Option<(String, Rule)> {
        let price_var = || format!("{}_price", field.key);
        match field.field_type {
            FieldType::Number => Some((field.key.clone(), Rule::NumericInput)),
            FieldType::QuantitySelector => Some((field.key.clone(), Rule::Quantity)),
            FieldType::Extras => Some((price_var(), Rule::SummedPrices)),
            // Plain choice fields only count once an option carries a price
            FieldType::Select | FieldType::Radio if !field.options.iter().any(|o| o.price_or_zero() > 0.0) => None,
            t if t.has_priced_options() => Some((price_var(), Rule::SelectedPrice)),
            _ => None,
        }
    }

    pub fn get(&self, variable: &str) -> Option<&Binding> {
        self.index.get(variable).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, variable: &str) -> bool {
        self.index.contains_key(variable)
    }

    /// In the table or a system variable
    pub fn is_known(&self, variable: &str) -> bool {
        self.contains(variable) || is_system_variable(variable)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|b| b.variable.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn notes(&self) -> &[BinderNote] {
        &self.notes
    }

    /// Apply every rule to the shopper's inputs, keyed by field key
    pub fn resolve(&self, inputs: &HashMap<String, FieldInput>) -> HashMap<String, f64> {
        self.entries
            .iter()
            .map(|b| (b.variable.clone(), b.resolve(inputs.get(b.field_key()))))
            .collect()
    }
}
