//! Compiled formula cache
//!
//! One entry per template id. An entry is reused only while the template's
//! formula text is unchanged; any edit recompiles and replaces it.

use crate::formula::Formula;
use pricer_core::ParseError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use xxhash_rust::xxh3::xxh3_64;

#[derive(Debug, Clone)]
struct CacheEntry {
    hash: u64,
    formula: Arc<Formula>,
}

impl CacheEntry {
    fn matches(&self, hash: u64, source: &str) -> bool {
        self.hash == hash && self.formula.source() == source
    }
}

/// Hit and miss counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Default)]
pub struct AstCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl AstCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn formula_hash(source: &str) -> u64 {
        xxh3_64(source.as_bytes())
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached formula for `template_id`, if its text is still `source`
    pub fn get(&self, template_id: &str, source: &str) -> Option<Arc<Formula>> {
        let hash = Self::formula_hash(source);
        self.read()
            .get(template_id)
            .filter(|entry| entry.matches(hash, source))
            .map(|entry| entry.formula.clone())
    }

    pub fn get_or_compile<F>(&self, template_id: &str, source: &str, compile: F) -> Result<Arc<Formula>, ParseError>
    where
        F: FnOnce(&str) -> Result<Formula, ParseError>,
    {
        // Try read lock first
        if let Some(formula) = self.get(template_id, source) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(template_id, "formula cache hit");
            return Ok(formula);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(template_id, "formula cache miss");
        let formula = Arc::new(compile(source)?);
        self.insert(template_id, formula.clone());
        Ok(formula)
    }

    pub fn insert(&self, template_id: &str, formula: Arc<Formula>) {
        let hash = Self::formula_hash(formula.source());
        self.write().insert(template_id.to_string(), CacheEntry { hash, formula });
    }

    /// Drop the entry for a template; true if one existed
    pub fn invalidate(&self, template_id: &str) -> bool {
        self.write().remove(template_id).is_some()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
