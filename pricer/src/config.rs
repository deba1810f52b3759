//! Engine configuration

use crate::parser::DEFAULT_MAX_DEPTH;
use serde::{Deserialize, Serialize};
use std::env;

pub const CURRENCY_VAR: &str = "PRICER_CURRENCY";
pub const MAX_DEPTH_VAR: &str = "PRICER_MAX_DEPTH";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricerConfig {
    /// ISO code echoed on every quote
    pub currency: String,
    /// Deepest formula nesting the parser accepts
    pub max_depth: usize,
}

impl Default for PricerConfig {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl PricerConfig {
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Defaults overridden by `PRICER_CURRENCY` and `PRICER_MAX_DEPTH`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(currency) = lookup(CURRENCY_VAR).map(|c| c.trim().to_uppercase()).filter(|c| !c.is_empty()) {
            config.currency = currency;
        }
        if let Some(raw) = lookup(MAX_DEPTH_VAR) {
            match raw.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => config.max_depth = depth,
                _ => tracing::warn!(value = %raw, "ignoring invalid {}", MAX_DEPTH_VAR),
            }
        }
        config
    }
}
