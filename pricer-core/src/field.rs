//! Template field definitions
//!
//! Fields are what an admin places in a template section. Only some field
//! types feed the pricing formula; the binder in `pricer` decides which.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of input a template field renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    Number,
    Text,
    Select,
    Radio,
    Checkbox,
    Textarea,
    File,
    ProductCard,
    DeliveryTime,
    Extras,
    GraphicSelect,
    QuantitySelector,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Number => "NUMBER",
            FieldType::Text => "TEXT",
            FieldType::Select => "SELECT",
            FieldType::Radio => "RADIO",
            FieldType::Checkbox => "CHECKBOX",
            FieldType::Textarea => "TEXTAREA",
            FieldType::File => "FILE",
            FieldType::ProductCard => "PRODUCT_CARD",
            FieldType::DeliveryTime => "DELIVERY_TIME",
            FieldType::Extras => "EXTRAS",
            FieldType::GraphicSelect => "GRAPHIC_SELECT",
            FieldType::QuantitySelector => "QUANTITY_SELECTOR",
        }
    }

    /// True for field types whose options carry a price
    pub fn has_priced_options(&self) -> bool {
        matches!(
            self,
            FieldType::Select
                | FieldType::Radio
                | FieldType::ProductCard
                | FieldType::DeliveryTime
                | FieldType::Extras
                | FieldType::GraphicSelect
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One selectable option of a choice field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl FieldOption {
    pub fn priced(value: impl Into<String>, price: f64) -> Self {
        Self { value: value.into(), price: Some(price) }
    }

    pub fn unpriced(value: impl Into<String>) -> Self {
        Self { value: value.into(), price: None }
    }

    pub fn price_or_zero(&self) -> f64 {
        self.price.unwrap_or(0.0)
    }
}

/// A field as stored on a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub options: Vec<FieldOption>,
    #[serde(default)]
    pub use_in_formula: bool,
}

impl FieldDefinition {
    pub fn new(key: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            key: key.into(),
            label: None,
            field_type,
            options: Vec::new(),
            use_in_formula: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_option(mut self, option: FieldOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn with_options(mut self, options: impl IntoIterator<Item = FieldOption>) -> Self {
        self.options.extend(options);
        self
    }

    pub fn in_formula(mut self) -> Self {
        self.use_in_formula = true;
        self
    }

    /// Label shown to shoppers, falling back to the key
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.key)
    }

    pub fn option(&self, value: &str) -> Option<&FieldOption> {
        self.options.iter().find(|o| o.value == value)
    }
}

/// A shopper's answer for one field
///
/// Untagged so hosts can send `5`, `"large"` or `["gift_wrap", "card"]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldInput {
    Number(f64),
    Choice(String),
    Choices(Vec<String>),
}

impl FieldInput {
    /// Numeric reading of the input; text is parsed leniently
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            FieldInput::Number(n) => Some(*n),
            FieldInput::Choice(s) => s.trim().parse().ok(),
            FieldInput::Choices(_) => None,
        };
        n.filter(|n| n.is_finite())
    }

    /// Selected option values, in the order given
    pub fn selections(&self) -> Vec<&str> {
        match self {
            FieldInput::Number(_) => Vec::new(),
            FieldInput::Choice(s) => vec![s.as_str()],
            FieldInput::Choices(list) => list.iter().map(String::as_str).collect(),
        }
    }
}

impl From<f64> for FieldInput {
    fn from(n: f64) -> Self {
        FieldInput::Number(n)
    }
}

impl From<&str> for FieldInput {
    fn from(s: &str) -> Self {
        FieldInput::Choice(s.to_string())
    }
}

impl From<Vec<&str>> for FieldInput {
    fn from(list: Vec<&str>) -> Self {
        FieldInput::Choices(list.into_iter().map(String::from).collect())
    }
}

/// The part of a persisted template the formula subsystem reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub formula: String,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl Template {
    pub fn new(id: impl Into<String>, formula: impl Into<String>) -> Self {
        Self { id: id.into(), formula: formula.into(), fields: Vec::new() }
    }

    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }
}
