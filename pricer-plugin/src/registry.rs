//! Function Registry
//!
//! The registry is the formula language's whitelist. Names are matched
//! case-insensitively. Special forms (`if`) are listed here so validation
//! and help know about them, but they are evaluated by the evaluator itself.

use crate::{FunctionMeta, FunctionPlugin};
use pricer_core::EvalError;
use serde_json::{json, Value as JsonValue};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Central function registry
pub struct FunctionRegistry {
    functions: BTreeMap<String, Arc<dyn FunctionPlugin>>,
    special_forms: BTreeMap<String, FunctionMeta>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self {
            functions: BTreeMap::new(),
            special_forms: BTreeMap::new(),
        }
    }

    pub fn with_function<F: FunctionPlugin + 'static>(mut self, f: F) -> Self {
        let name = f.meta().name.to_lowercase();
        self.functions.insert(name, Arc::new(f));
        self
    }

    pub fn with_special_form(mut self, meta: FunctionMeta) -> Self {
        self.special_forms.insert(meta.name.to_lowercase(), meta);
        self
    }

    pub fn get_function(&self, name: &str) -> Option<&dyn FunctionPlugin> {
        self.functions.get(&name.to_lowercase()).map(|f| f.as_ref())
    }

    /// Metadata for a function or special form
    pub fn meta(&self, name: &str) -> Option<FunctionMeta> {
        let key = name.to_lowercase();
        self.functions
            .get(&key)
            .map(|f| f.meta())
            .or_else(|| self.special_forms.get(&key).cloned())
    }

    pub fn is_known(&self, name: &str) -> bool {
        let key = name.to_lowercase();
        self.functions.contains_key(&key) || self.special_forms.contains_key(&key)
    }

    pub fn is_special_form(&self, name: &str) -> bool {
        self.special_forms.contains_key(&name.to_lowercase())
    }

    pub fn arity(&self, name: &str) -> Option<usize> {
        self.meta(name).map(|m| m.arity())
    }

    /// All whitelisted names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .functions
            .keys()
            .chain(self.special_forms.keys())
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn call_function(&self, name: &str, args: &[f64]) -> Result<f64, EvalError> {
        match self.get_function(name) {
            Some(f) => f.call(args),
            None if self.is_special_form(name) => Err(EvalError::invalid(format!(
                "{}() cannot be called as a plain function",
                name
            ))),
            None => Err(EvalError::UnknownFunction(name.to_string())),
        }
    }

    /// Whitelisted names similar to `name`, best match first
    pub fn find_similar(&self, name: &str) -> Vec<String> {
        let name_lower = name.to_lowercase();
        let mut matches: Vec<(String, usize)> = self
            .names()
            .into_iter()
            .filter_map(|candidate| {
                let score = Self::similarity_score(&name_lower, &candidate);
                if score > 0 {
                    Some((candidate, score))
                } else {
                    None
                }
            })
            .collect();

        // Stable sort keeps alphabetical order among equal scores
        matches.sort_by(|a, b| b.1.cmp(&a.1));
        matches.into_iter().map(|(name, _)| name).collect()
    }

    fn similarity_score(query: &str, candidate: &str) -> usize {
        let mut score = 0;

        if candidate.starts_with(query) || query.starts_with(candidate) {
            score += 100;
        } else if candidate.contains(query) || query.contains(candidate) {
            score += 50;
        }

        let query_chars: HashSet<char> = query.chars().collect();
        let candidate_chars: HashSet<char> = candidate.chars().collect();
        let common = query_chars.intersection(&candidate_chars).count();

        // Require most of the candidate's letters before calling it similar
        if score == 0 && common * 3 < candidate_chars.len() * 2 {
            return 0;
        }
        score += common * 2;

        let len_diff = query.len().abs_diff(candidate.len());
        if len_diff < 5 && score > 0 {
            score += 5 - len_diff;
        }

        score
    }

    pub fn help(&self, name: Option<&str>) -> JsonValue {
        match name {
            Some(n) => self.help_for(n),
            None => self.general_help(),
        }
    }

    fn help_for(&self, name: &str) -> JsonValue {
        match self.meta(name) {
            Some(meta) => Self::function_to_help(&meta),
            None => json!({
                "error": format!("No function named '{}'", name),
                "available": self.names(),
            }),
        }
    }

    fn general_help(&self) -> JsonValue {
        let mut by_category: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for f in self.functions.values() {
            let meta = f.meta();
            by_category.entry(meta.category).or_default().push(meta.name);
        }
        for meta in self.special_forms.values() {
            by_category.entry(meta.category).or_default().push(meta.name);
        }
        json!({
            "functions": by_category,
            "usage": "Call help('function_name') for detailed help.",
        })
    }

    fn function_to_help(meta: &FunctionMeta) -> JsonValue {
        json!({
            "name": meta.name,
            "type": "function",
            "description": meta.description,
            "usage": meta.usage,
            "returns": meta.returns,
            "category": meta.category,
            "arity": meta.arity(),
            "args": meta.args,
            "examples": meta.examples,
            "related": meta.related,
        })
    }

    pub fn list_functions(&self) -> JsonValue {
        let mut metas: Vec<FunctionMeta> = self.functions.values().map(|f| f.meta()).collect();
        metas.extend(self.special_forms.values().cloned());
        metas.sort_by(|a, b| a.name.cmp(b.name));
        JsonValue::Array(
            metas
                .iter()
                .map(|meta| {
                    json!({
                        "name": meta.name,
                        "description": meta.description,
                        "usage": meta.usage,
                        "category": meta.category,
                    })
                })
                .collect(),
        )
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
