//! Taxonomy registry - which classification schemes exist
//!
//! Every term operation is scoped to a registered taxonomy. The registry
//! records whether a taxonomy is hierarchical (supports parent/child
//! bindings), which object types it classifies, and whether assignment by
//! name may create missing terms on the fly.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Definition of a single taxonomy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyDef {
    /// Whether bindings may have parents.
    pub hierarchical: bool,
    /// Object types this taxonomy classifies (e.g., "post").
    pub object_types: Vec<String>,
    /// Whether `set_object_terms` may create terms referenced by name.
    pub allow_term_creation: bool,
}

impl TaxonomyDef {
    /// A flat, tag-like taxonomy with free-form term creation.
    pub fn flat(object_types: &[&str]) -> Self {
        Self {
            hierarchical: false,
            object_types: object_types.iter().map(|s| s.to_string()).collect(),
            allow_term_creation: true,
        }
    }

    /// A hierarchical, category-like taxonomy with free-form term creation.
    pub fn hierarchical(object_types: &[&str]) -> Self {
        Self {
            hierarchical: true,
            object_types: object_types.iter().map(|s| s.to_string()).collect(),
            allow_term_creation: true,
        }
    }

    /// Disable on-the-fly creation of terms referenced by name.
    pub fn closed(mut self) -> Self {
        self.allow_term_creation = false;
        self
    }
}

/// Registry of taxonomy definitions, keyed by taxonomy name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxonomyRegistry {
    taxonomies: HashMap<String, TaxonomyDef>,
}

impl TaxonomyRegistry {
    pub fn new() -> Self {
        Self {
            taxonomies: HashMap::new(),
        }
    }

    /// Register (or redefine) a taxonomy.
    pub fn register(&mut self, name: &str, def: TaxonomyDef) {
        self.taxonomies.insert(name.to_string(), def);
    }

    /// Remove a taxonomy definition. Existing term records are not touched;
    /// they simply become unreachable through the public operations.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.taxonomies.remove(name).is_some()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.taxonomies.contains_key(name)
    }

    pub fn is_hierarchical(&self, name: &str) -> bool {
        self.taxonomies
            .get(name)
            .map(|def| def.hierarchical)
            .unwrap_or(false)
    }

    pub fn allows_term_creation(&self, name: &str) -> bool {
        self.taxonomies
            .get(name)
            .map(|def| def.allow_term_creation)
            .unwrap_or(false)
    }

    pub fn supports_object_type(&self, name: &str, object_type: &str) -> bool {
        self.taxonomies
            .get(name)
            .map(|def| def.object_types.iter().any(|t| t == object_type))
            .unwrap_or(false)
    }

    /// Names of all taxonomies that classify the given object type.
    pub fn taxonomies_for(&self, object_type: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .taxonomies
            .iter()
            .filter(|(_, def)| def.object_types.iter().any(|t| t == object_type))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TaxonomyRegistry {
        let mut reg = TaxonomyRegistry::new();
        reg.register("category", TaxonomyDef::hierarchical(&["post"]));
        reg.register("post_tag", TaxonomyDef::flat(&["post"]));
        reg.register("shelf", TaxonomyDef::flat(&["book"]).closed());
        reg
    }

    #[test]
    fn test_registration_and_flags() {
        let reg = registry();
        assert!(reg.is_registered("category"));
        assert!(reg.is_hierarchical("category"));
        assert!(!reg.is_hierarchical("post_tag"));
        assert!(!reg.is_registered("made_up"));
        // Unknown taxonomies report false for every capability.
        assert!(!reg.is_hierarchical("made_up"));
        assert!(!reg.allows_term_creation("made_up"));
    }

    #[test]
    fn test_object_type_scoping() {
        let reg = registry();
        assert!(reg.supports_object_type("category", "post"));
        assert!(!reg.supports_object_type("category", "book"));
        assert_eq!(reg.taxonomies_for("post"), vec!["category", "post_tag"]);
    }

    #[test]
    fn test_closed_taxonomy() {
        let reg = registry();
        assert!(reg.allows_term_creation("post_tag"));
        assert!(!reg.allows_term_creation("shelf"));
    }

    #[test]
    fn test_unregister() {
        let mut reg = registry();
        assert!(reg.unregister("shelf"));
        assert!(!reg.unregister("shelf"));
        assert!(!reg.is_registered("shelf"));
    }
}
