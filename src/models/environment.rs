//! Render-time environment lookups.
use std::collections::HashMap;

/// Source of environment variables consulted while building the home page.
pub trait Environment: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;

    /// Trimmed value of `key`, `None` when unset or blank.
    fn non_blank(&self, key: &str) -> Option<String> {
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        self.var(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// The live process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Fixed set of variables.
#[derive(Clone, Debug, Default)]
pub struct MapEnvironment(HashMap<String, String>);

impl MapEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }
}

impl Environment for MapEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}
