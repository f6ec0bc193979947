//! Term and term-taxonomy record storage
//!
//! The store owns the raw records and the shared-name index that makes term
//! reuse across taxonomies explicit. It enforces exactly one invariant: a
//! `(term id, taxonomy)` pair binds at most once. Everything else (slug
//! uniqueness, counts, cascades) is maintained by the layers above.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::core::identity::{IdSequence, TermId, TermTaxonomyId};
use crate::taxonomy::error::TermError;

/// A named classification concept, potentially shared across taxonomies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: TermId,
    pub name: String,
    /// URL-safe identifier, unique within each taxonomy the term is bound to.
    pub slug: String,
    /// Opaque legacy grouping tag.
    pub group: u64,
}

/// Binding of a [`Term`] into a specific taxonomy - the unit objects attach to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermTaxonomy {
    pub id: TermTaxonomyId,
    pub term_id: TermId,
    pub taxonomy: String,
    /// Parent binding. Hierarchy is scoped per taxonomy, not per term.
    pub parent: Option<TermTaxonomyId>,
    pub description: String,
    /// Materialized number of objects associated with this binding.
    pub count: u64,
}

/// A term resolved for an object: the term record joined with its binding
/// and the assignment order on the relationship row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedTerm {
    pub term_id: TermId,
    pub term_taxonomy_id: TermTaxonomyId,
    pub taxonomy: String,
    pub name: String,
    pub slug: String,
    pub parent: Option<TermTaxonomyId>,
    pub description: String,
    pub count: u64,
    pub term_order: u32,
}

/// Record store for terms and their taxonomy bindings.
#[derive(Debug, Default)]
pub(crate) struct TermStore {
    terms: BTreeMap<TermId, Term>,
    bindings: BTreeMap<TermTaxonomyId, TermTaxonomy>,
    /// Shared-name index: term reuse across taxonomies is keyed by name.
    /// Several term ids may carry the same name once slugs have diverged.
    by_name: HashMap<String, Vec<TermId>>,
    term_ids: IdSequence,
    binding_ids: IdSequence,
}

impl TermStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn term(&self, id: TermId) -> Option<&Term> {
        self.terms.get(&id)
    }

    pub(crate) fn binding(&self, id: TermTaxonomyId) -> Option<&TermTaxonomy> {
        self.bindings.get(&id)
    }

    pub(crate) fn binding_mut(&mut self, id: TermTaxonomyId) -> Option<&mut TermTaxonomy> {
        self.bindings.get_mut(&id)
    }

    /// Allocate a fresh term record.
    pub(crate) fn create_term(&mut self, name: &str, slug: &str) -> TermId {
        let id = TermId(self.term_ids.next());
        self.terms.insert(
            id,
            Term {
                id,
                name: name.to_string(),
                slug: slug.to_string(),
                group: 0,
            },
        );
        self.by_name.entry(name.to_string()).or_default().push(id);
        id
    }

    /// Insert a term record with a caller-chosen id (used by the splitter to
    /// clone a term under a fresh id while controlling every field).
    pub(crate) fn insert_term_record(&mut self, term: Term) {
        self.by_name
            .entry(term.name.clone())
            .or_default()
            .push(term.id);
        self.terms.insert(term.id, term);
    }

    /// Allocate a fresh term id without creating a record.
    pub(crate) fn next_term_id(&mut self) -> TermId {
        TermId(self.term_ids.next())
    }

    /// Rename a term, keeping the shared-name index consistent.
    pub(crate) fn rename_term(&mut self, id: TermId, name: &str) {
        let Some(term) = self.terms.get_mut(&id) else {
            return;
        };
        let old = std::mem::replace(&mut term.name, name.to_string());
        if let Some(ids) = self.by_name.get_mut(&old) {
            ids.retain(|&t| t != id);
            if ids.is_empty() {
                self.by_name.remove(&old);
            }
        }
        self.by_name.entry(name.to_string()).or_default().push(id);
    }

    pub(crate) fn set_term_slug(&mut self, id: TermId, slug: &str) {
        if let Some(term) = self.terms.get_mut(&id) {
            term.slug = slug.to_string();
        }
    }

    /// Remove a term record entirely. Callers must already have removed
    /// every binding that references it.
    pub(crate) fn remove_term(&mut self, id: TermId) -> Option<Term> {
        let term = self.terms.remove(&id)?;
        if let Some(ids) = self.by_name.get_mut(&term.name) {
            ids.retain(|&t| t != id);
            if ids.is_empty() {
                self.by_name.remove(&term.name);
            }
        }
        Some(term)
    }

    /// Bind a term into a taxonomy. Fails when the pair is already bound.
    pub(crate) fn insert_binding(
        &mut self,
        term_id: TermId,
        taxonomy: &str,
        parent: Option<TermTaxonomyId>,
        description: &str,
    ) -> Result<TermTaxonomyId, TermError> {
        if self.binding_of(term_id, taxonomy).is_some() {
            return Err(TermError::DuplicateTermTaxonomy {
                term_id,
                taxonomy: taxonomy.to_string(),
            });
        }
        let id = TermTaxonomyId(self.binding_ids.next());
        self.bindings.insert(
            id,
            TermTaxonomy {
                id,
                term_id,
                taxonomy: taxonomy.to_string(),
                parent,
                description: description.to_string(),
                count: 0,
            },
        );
        Ok(id)
    }

    pub(crate) fn remove_binding(&mut self, id: TermTaxonomyId) -> Option<TermTaxonomy> {
        self.bindings.remove(&id)
    }

    pub(crate) fn bindings_in<'a, 'b>(
        &'a self,
        taxonomy: &'b str,
    ) -> impl Iterator<Item = &'a TermTaxonomy> + use<'a, 'b> {
        self.bindings.values().filter(move |b| b.taxonomy == taxonomy)
    }

    /// The binding of a term in a taxonomy, if any.
    pub(crate) fn binding_of(&self, term_id: TermId, taxonomy: &str) -> Option<&TermTaxonomy> {
        self.bindings
            .values()
            .find(|b| b.term_id == term_id && b.taxonomy == taxonomy)
    }

    /// First binding in the taxonomy whose term carries the given name.
    pub(crate) fn find_by_name(&self, taxonomy: &str, name: &str) -> Option<&TermTaxonomy> {
        let ids = self.by_name.get(name)?;
        ids.iter()
            .find_map(|&term_id| self.binding_of(term_id, taxonomy))
    }

    pub(crate) fn find_by_slug(&self, taxonomy: &str, slug: &str) -> Option<&TermTaxonomy> {
        self.bindings_in(taxonomy).find(|b| {
            self.terms
                .get(&b.term_id)
                .map(|t| t.slug == slug)
                .unwrap_or(false)
        })
    }

    /// Whether a slug is taken in a taxonomy, optionally ignoring one term
    /// (so an update does not collide with itself).
    pub(crate) fn slug_in_use(
        &self,
        taxonomy: &str,
        slug: &str,
        exclude: Option<TermId>,
    ) -> bool {
        self.bindings_in(taxonomy).any(|b| {
            if Some(b.term_id) == exclude {
                return false;
            }
            self.terms
                .get(&b.term_id)
                .map(|t| t.slug == slug)
                .unwrap_or(false)
        })
    }

    /// A term with this name that is not yet bound in the taxonomy, eligible
    /// for cross-taxonomy sharing.
    pub(crate) fn shared_candidate(&self, name: &str, taxonomy: &str) -> Option<TermId> {
        let ids = self.by_name.get(name)?;
        ids.iter()
            .copied()
            .find(|&term_id| self.binding_of(term_id, taxonomy).is_none())
    }

    /// Number of distinct taxonomies with a binding to this term.
    pub(crate) fn taxonomy_spread(&self, term_id: TermId) -> usize {
        let taxonomies: HashSet<&str> = self
            .bindings
            .values()
            .filter(|b| b.term_id == term_id)
            .map(|b| b.taxonomy.as_str())
            .collect();
        taxonomies.len()
    }

    /// Whether any binding (in any taxonomy) still references this term.
    pub(crate) fn term_in_use(&self, term_id: TermId) -> bool {
        self.bindings.values().any(|b| b.term_id == term_id)
    }

    pub(crate) fn count(&self, taxonomy: &str) -> usize {
        self.bindings_in(taxonomy).count()
    }

    /// Child bindings of a binding, within its own taxonomy.
    pub(crate) fn children_of(&self, id: TermTaxonomyId) -> Vec<TermTaxonomyId> {
        self.bindings
            .values()
            .filter(|b| b.parent == Some(id))
            .map(|b| b.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_term_and_bind() {
        let mut store = TermStore::new();
        let term = store.create_term("Rust", "rust");
        let tt = store.insert_binding(term, "post_tag", None, "").unwrap();

        assert_eq!(store.term(term).unwrap().name, "Rust");
        assert_eq!(store.binding(tt).unwrap().term_id, term);
        assert_eq!(store.count("post_tag"), 1);
        assert_eq!(store.count("category"), 0);
    }

    #[test]
    fn test_duplicate_binding_rejected() {
        let mut store = TermStore::new();
        let term = store.create_term("Rust", "rust");
        store.insert_binding(term, "post_tag", None, "").unwrap();

        let err = store.insert_binding(term, "post_tag", None, "").unwrap_err();
        assert!(matches!(err, TermError::DuplicateTermTaxonomy { .. }));

        // The same term may bind into a different taxonomy.
        store.insert_binding(term, "category", None, "").unwrap();
        assert_eq!(store.taxonomy_spread(term), 2);
    }

    #[test]
    fn test_shared_candidate_skips_bound_taxonomy() {
        let mut store = TermStore::new();
        let term = store.create_term("Initial", "initial");
        store.insert_binding(term, "category", None, "").unwrap();

        assert_eq!(store.shared_candidate("Initial", "post_tag"), Some(term));
        assert_eq!(store.shared_candidate("Initial", "category"), None);
        assert_eq!(store.shared_candidate("Missing", "post_tag"), None);
    }

    #[test]
    fn test_rename_keeps_name_index_consistent() {
        let mut store = TermStore::new();
        let term = store.create_term("Old", "old");
        store.insert_binding(term, "category", None, "").unwrap();

        store.rename_term(term, "New");
        assert!(store.find_by_name("category", "Old").is_none());
        assert_eq!(
            store.find_by_name("category", "New").unwrap().term_id,
            term
        );
    }

    #[test]
    fn test_remove_term_clears_name_index() {
        let mut store = TermStore::new();
        let term = store.create_term("Gone", "gone");
        store.remove_term(term);
        assert!(store.shared_candidate("Gone", "category").is_none());
        assert!(store.term(term).is_none());
    }

    #[test]
    fn test_find_by_slug_outlives_taxonomy_key() {
        let mut store = TermStore::new();
        let term = store.create_term("Rust", "rust");
        store.insert_binding(term, "post_tag", None, "").unwrap();

        // The returned binding borrows the store, not the lookup key.
        let found = {
            let taxonomy = String::from("post_tag");
            store.find_by_slug(&taxonomy, "rust")
        };
        assert_eq!(found.unwrap().term_id, term);
    }

    #[test]
    fn test_slug_in_use_respects_exclusion() {
        let mut store = TermStore::new();
        let term = store.create_term("Rust", "rust");
        store.insert_binding(term, "post_tag", None, "").unwrap();

        assert!(store.slug_in_use("post_tag", "rust", None));
        assert!(!store.slug_in_use("post_tag", "rust", Some(term)));
        assert!(!store.slug_in_use("category", "rust", None));
    }
}
