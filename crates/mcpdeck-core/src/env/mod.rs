//! Environment snapshots and template resolution.
//!
//! Nothing in this module reads or mutates the live process environment
//! except [`Environment::capture`]. Everything downstream works on the
//! snapshot so resolution and launching are reproducible in tests.

pub mod resolver;

use std::collections::{BTreeMap, HashMap};

pub use resolver::{Resolution, missing_inputs, referenced_variables, resolve, resolve_template};

/// An explicit snapshot of environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the current process environment. Non-UTF-8 entries are skipped.
    pub fn capture() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// True when the variable is set to a non-empty value.
    pub fn has_value(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_empty())
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Fill variables that are unset or empty from `fallback`.
    ///
    /// Existing non-empty values always win.
    pub fn fill_missing(&mut self, fallback: &HashMap<String, String>) {
        for (key, value) in fallback {
            if !self.has_value(key) {
                self.vars.insert(key.clone(), value.clone());
            }
        }
    }

    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
