//! Options store - key/value collaborator
//!
//! A small in-process key/value store with a per-key default-value hook.
//! The hook is a strategy closure registered explicitly on the store (not
//! ambient global state) and is consulted only while the key has no stored
//! value; its return takes precedence over a caller-supplied default.
//!
//! Values are [`serde_json::Value`], so structured data round-trips without
//! a separate serialization step.

use miette::Diagnostic;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

type DefaultHook = Box<dyn Fn() -> Value + Send + Sync>;

/// Outcome of [`OptionsStore::update`]. Distinct from failure: a caller can
/// tell "nothing changed because the value was identical" apart from an
/// invalid operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionWrite {
    Updated,
    Unchanged,
}

/// Errors returned by option writes.
#[derive(Debug, Error, Diagnostic)]
pub enum OptionError {
    #[error("option '{0}' already exists")]
    #[diagnostic(code(termstore::option_exists))]
    AlreadyExists(String),
}

/// In-process options store.
#[derive(Default)]
pub struct OptionsStore {
    values: HashMap<String, Value>,
    default_hooks: HashMap<String, DefaultHook>,
}

impl OptionsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored value, or the default hook's value while the key is
    /// absent.
    pub fn get(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.values.get(key) {
            return Some(value.clone());
        }
        self.default_hooks.get(key).map(|hook| hook())
    }

    /// Like [`get`](Self::get), falling back to `default` only when the key
    /// is absent and no default hook is registered for it.
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    /// Create an option. Fails when the key already holds a value.
    pub fn add(&mut self, key: &str, value: Value) -> Result<(), OptionError> {
        if self.values.contains_key(key) {
            return Err(OptionError::AlreadyExists(key.to_string()));
        }
        debug!(key, "added option");
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    /// Set an option, creating it when missing. Reports whether the stored
    /// value actually changed.
    pub fn update(&mut self, key: &str, value: Value) -> OptionWrite {
        if self.values.get(key) == Some(&value) {
            return OptionWrite::Unchanged;
        }
        debug!(key, "updated option");
        self.values.insert(key.to_string(), value);
        OptionWrite::Updated
    }

    /// Remove an option. Returns false when the key held no value.
    pub fn delete(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    /// Register the default-value hook for a key, replacing any previous
    /// one.
    pub fn set_default_hook<F>(&mut self, key: &str, hook: F)
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default_hooks.insert(key.to_string(), Box::new(hook));
    }

    /// Remove the default-value hook for a key.
    pub fn clear_default_hook(&mut self, key: &str) -> bool {
        self.default_hooks.remove(key).is_some()
    }
}

impl std::fmt::Debug for OptionsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionsStore")
            .field("values", &self.values.len())
            .field("default_hooks", &self.default_hooks.len())
            .finish()
    }
}
