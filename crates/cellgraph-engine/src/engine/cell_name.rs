//! Cell name validation and normalization.
//!
//! A string is a cell name iff, after normalization, it consists of one or more
//! ASCII letters followed by one or more digits *and* it satisfies the
//! caller-supplied validity predicate. The default rules accept every
//! letters-then-digits name and normalize by upper-casing, so `a15` and `A15`
//! name the same cell while `Z`, `X_` and `hello` are rejected.

use std::fmt;
use std::sync::Arc;

use super::tokenizer::is_variable;

type Validator = Arc<dyn Fn(&str) -> bool + Send + Sync>;
type Normalizer = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Pluggable name validity predicate and normalizer.
#[derive(Clone)]
pub struct NameRules {
    is_valid: Validator,
    normalize: Normalizer,
}

impl NameRules {
    pub fn new<V, N>(is_valid: V, normalize: N) -> NameRules
    where
        V: Fn(&str) -> bool + Send + Sync + 'static,
        N: Fn(&str) -> String + Send + Sync + 'static,
    {
        NameRules {
            is_valid: Arc::new(is_valid),
            normalize: Arc::new(normalize),
        }
    }

    /// Replace the validity predicate, keeping the normalizer.
    pub fn with_validator<V>(mut self, is_valid: V) -> NameRules
    where
        V: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.is_valid = Arc::new(is_valid);
        self
    }

    /// Replace the normalizer, keeping the validity predicate.
    pub fn with_normalizer<N>(mut self, normalize: N) -> NameRules
    where
        N: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.normalize = Arc::new(normalize);
        self
    }

    /// Apply the normalizer only.
    pub fn normalize(&self, name: &str) -> String {
        (self.normalize)(name.trim())
    }

    /// Normalize `name` and check it. Returns the normalized name, or `None` if
    /// it is not a cell name under these rules.
    pub fn resolve(&self, name: &str) -> Option<String> {
        let normalized = self.normalize(name);
        if is_variable(&normalized) && (self.is_valid)(&normalized) {
            Some(normalized)
        } else {
            None
        }
    }

    pub fn is_valid(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }
}

impl Default for NameRules {
    fn default() -> Self {
        NameRules::new(|_| true, |name| name.to_ascii_uppercase())
    }
}

impl fmt::Debug for NameRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameRules").finish_non_exhaustive()
    }
}
