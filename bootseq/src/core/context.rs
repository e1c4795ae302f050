//! Environment context shared by every step of a run.

use std::collections::BTreeMap;

/// Immutable configuration bag assembled before the sequence runs.
///
/// Steps only receive `&EnvContext`. Values a step wants to hand to later
/// steps travel back through `StepReport::exports` and are applied by the
/// sequencer between steps via [`EnvContext::with_exports`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvContext {
    values: BTreeMap<String, String>,
}

impl EnvContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a value, treating empty strings as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Return a new context with `exports` layered on top.
    pub fn with_exports(&self, exports: &[(String, String)]) -> Self {
        let mut values = self.values.clone();
        for (key, value) in exports {
            values.insert(key.clone(), value.clone());
        }
        Self { values }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}
