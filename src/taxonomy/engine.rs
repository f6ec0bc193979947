//! Taxonomy engine - the public operation surface
//!
//! [`TaxonomyEngine`] coordinates the record store, slug uniquifier,
//! shared-term splitter, relationship index, and relationship cache. All
//! state lives behind a single `RwLock`: reads take the read lock, every
//! mutator holds the write lock across its full side-effect set, so each
//! operation is atomic and writers to the same (object, taxonomy) key are
//! serialized. Notifications are emitted after the lock is released so
//! subscribers may call back into the engine.

use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashSet;
use tracing::debug;

use crate::core::events::{NotificationBus, TermDeleted, TermEvent, TermsChanged};
use crate::core::identity::{ObjectId, TermId, TermTaxonomyId};
use crate::taxonomy::cache::RelationshipCache;
use crate::taxonomy::error::TermError;
use crate::taxonomy::registry::{TaxonomyDef, TaxonomyRegistry};
use crate::taxonomy::relationships::RelationshipIndex;
use crate::taxonomy::slug::{slugify, unique_slug};
use crate::taxonomy::split::{needs_split, split_shared_term};
use crate::taxonomy::store::{AssignedTerm, Term, TermStore, TermTaxonomy};
use crate::taxonomy::{OrderBy, TermInsert, TermLookup, TermRef, TermUpdate};

#[derive(Debug, Default)]
struct EngineState {
    registry: TaxonomyRegistry,
    store: TermStore,
    relationships: RelationshipIndex,
    cache: RelationshipCache,
}

/// Hierarchical taxonomy and term management engine.
pub struct TaxonomyEngine {
    state: RwLock<EngineState>,
    bus: NotificationBus,
}

impl TaxonomyEngine {
    pub fn new(registry: TaxonomyRegistry) -> Self {
        Self {
            state: RwLock::new(EngineState {
                registry,
                ..EngineState::default()
            }),
            bus: NotificationBus::new(),
        }
    }

    /// Register (or redefine) a taxonomy after construction.
    pub fn register_taxonomy(&self, name: &str, def: TaxonomyDef) {
        self.state.write().registry.register(name, def);
    }

    /// Subscribe an observer to change notifications.
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: Fn(&TermEvent) + Send + Sync + 'static,
    {
        self.bus.subscribe(observer);
    }

    // ------------------------------------------------------------------
    // Term store operations
    // ------------------------------------------------------------------

    /// Insert a term into a taxonomy.
    ///
    /// Reuses an existing term record when one with the same name exists
    /// and is not yet bound in this taxonomy (shared term). Otherwise a new
    /// term is created with a collision-free slug. `parent` is honored only
    /// for hierarchical taxonomies.
    pub fn insert_term(
        &self,
        name: &str,
        taxonomy: &str,
        opts: TermInsert,
    ) -> Result<TermTaxonomy, TermError> {
        let mut state = self.state.write();
        if !state.registry.is_registered(taxonomy) {
            return Err(TermError::InvalidTaxonomy(taxonomy.to_string()));
        }
        let hierarchical = state.registry.is_hierarchical(taxonomy);
        let parent = if hierarchical { opts.parent } else { None };

        if let Some(p) = parent {
            let valid = state
                .store
                .binding(p)
                .map(|b| b.taxonomy == taxonomy)
                .unwrap_or(false);
            if !valid {
                return Err(TermError::NotFound(p));
            }
        }

        // An explicit slug that names a same-named term already bound here
        // is a duplicate, not a collision to disambiguate.
        if let Some(slug) = opts.slug.as_deref() {
            if let Some(existing) = state.store.find_by_slug(taxonomy, slug) {
                let same_name = state
                    .store
                    .term(existing.term_id)
                    .map(|t| t.name == name)
                    .unwrap_or(false);
                if same_name {
                    return Err(TermError::DuplicateTermTaxonomy {
                        term_id: existing.term_id,
                        taxonomy: taxonomy.to_string(),
                    });
                }
            }
        }

        let term_id = match state.store.shared_candidate(name, taxonomy) {
            // Shared reuse keeps the term's existing slug.
            Some(id) => id,
            None => {
                let mut candidate = opts
                    .slug
                    .clone()
                    .unwrap_or_else(|| slugify(name));
                if candidate.is_empty() {
                    candidate = name.to_string();
                }
                let slug = unique_slug(
                    &state.store,
                    &candidate,
                    taxonomy,
                    hierarchical,
                    parent,
                    None,
                );
                state.store.create_term(name, &slug)
            }
        };

        let description = opts.description.unwrap_or_default();
        let tt_id = state
            .store
            .insert_binding(term_id, taxonomy, parent, &description)?;

        debug!(%term_id, term_taxonomy = %tt_id, taxonomy, name, "inserted term");
        state
            .store
            .binding(tt_id)
            .cloned()
            .ok_or(TermError::NotFound(tt_id))
    }

    /// Apply a partial update to a binding and its term.
    ///
    /// When the term is shared across taxonomies and `name` or `slug`
    /// changes, the term is split first; the returned binding then carries
    /// a new term id. `parent` is honored only for hierarchical taxonomies
    /// and must not point into the binding's own descendant chain.
    pub fn update_term(
        &self,
        tt_id: TermTaxonomyId,
        update: TermUpdate,
    ) -> Result<TermTaxonomy, TermError> {
        let mut state = self.state.write();
        let binding = state
            .store
            .binding(tt_id)
            .cloned()
            .ok_or(TermError::NotFound(tt_id))?;
        let taxonomy = binding.taxonomy.clone();
        let hierarchical = state.registry.is_hierarchical(&taxonomy);

        let new_parent = match update.parent {
            Some(p) if hierarchical => {
                if let Some(parent) = p {
                    let valid = state
                        .store
                        .binding(parent)
                        .map(|b| b.taxonomy == taxonomy)
                        .unwrap_or(false);
                    if !valid {
                        return Err(TermError::NotFound(parent));
                    }
                    // The binding itself or any of its descendants would
                    // close a cycle.
                    if chain_contains(&state.store, parent, tt_id) {
                        return Err(TermError::HierarchyLoop {
                            term_taxonomy_id: tt_id,
                            parent,
                        });
                    }
                }
                p
            }
            // Flat taxonomies never carry parents; same rule as insertion.
            Some(_) => None,
            None => binding.parent,
        };

        let term = state
            .store
            .term(binding.term_id)
            .cloned()
            .ok_or(TermError::NotFound(tt_id))?;
        let name_changes = update
            .name
            .as_deref()
            .map(|n| n != term.name)
            .unwrap_or(false);
        let slug_changes = update
            .slug
            .as_deref()
            .map(|s| s != term.slug)
            .unwrap_or(false);

        let mut term_id = binding.term_id;
        if (name_changes || slug_changes) && needs_split(&state.store, term_id) {
            term_id = split_shared_term(&mut state.store, tt_id)
                .ok_or(TermError::NotFound(tt_id))?;
        }

        if let Some(name) = update.name.as_deref() {
            state.store.rename_term(term_id, name);
        }
        if let Some(slug) = update.slug.as_deref() {
            let unique = unique_slug(
                &state.store,
                slug,
                &taxonomy,
                hierarchical,
                new_parent,
                Some(term_id),
            );
            state.store.set_term_slug(term_id, &unique);
        }

        {
            let binding = state
                .store
                .binding_mut(tt_id)
                .ok_or(TermError::NotFound(tt_id))?;
            binding.parent = new_parent;
            if let Some(description) = update.description {
                binding.description = description;
            }
        }

        // Cached entries resolve name and slug; drop them for every object
        // attached to this binding.
        for object in state.relationships.objects_for(tt_id) {
            state.cache.invalidate(object, &taxonomy);
        }

        debug!(%term_id, term_taxonomy = %tt_id, taxonomy, "updated term");
        state
            .store
            .binding(tt_id)
            .cloned()
            .ok_or(TermError::NotFound(tt_id))
    }

    /// Delete a binding, cascading to its relationship rows.
    ///
    /// Child bindings are reparented to the deleted binding's parent. The
    /// term record itself is removed once no taxonomy references it. Emits
    /// a [`TermDeleted`] event carrying a pre-delete snapshot.
    pub fn delete_term(&self, tt_id: TermTaxonomyId) -> Result<(), TermError> {
        let event = {
            let mut state = self.state.write();
            let binding = state
                .store
                .binding(tt_id)
                .cloned()
                .ok_or(TermError::NotFound(tt_id))?;
            let snapshot = state
                .store
                .term(binding.term_id)
                .cloned()
                .ok_or(TermError::NotFound(tt_id))?;

            for child in state.store.children_of(tt_id) {
                if let Some(b) = state.store.binding_mut(child) {
                    b.parent = binding.parent;
                }
            }

            let affected = state.relationships.remove_binding(tt_id);
            for object in affected {
                state.cache.invalidate(object, &binding.taxonomy);
            }

            state.store.remove_binding(tt_id);
            if !state.store.term_in_use(binding.term_id) {
                state.store.remove_term(binding.term_id);
            }

            debug!(
                term = %binding.term_id,
                term_taxonomy = %tt_id,
                taxonomy = %binding.taxonomy,
                "deleted term"
            );
            TermDeleted {
                term_id: binding.term_id,
                term_taxonomy_id: tt_id,
                taxonomy: binding.taxonomy,
                term: snapshot,
                at: Utc::now(),
            }
        };

        self.bus.emit(&TermEvent::Deleted(event));
        Ok(())
    }

    /// Exact-match lookup, scoped to a taxonomy.
    pub fn find_term(&self, lookup: &TermLookup, taxonomy: &str) -> Option<TermTaxonomy> {
        let state = self.state.read();
        match lookup {
            TermLookup::Id(id) => state.store.binding_of(*id, taxonomy).cloned(),
            TermLookup::Name(name) => state.store.find_by_name(taxonomy, name).cloned(),
            TermLookup::Slug(slug) => state.store.find_by_slug(taxonomy, slug).cloned(),
        }
    }

    /// Raw term record access.
    pub fn term(&self, id: TermId) -> Option<Term> {
        self.state.read().store.term(id).cloned()
    }

    /// Number of bindings in a taxonomy.
    pub fn count_terms(&self, taxonomy: &str) -> Result<usize, TermError> {
        let state = self.state.read();
        if !state.registry.is_registered(taxonomy) {
            return Err(TermError::InvalidTaxonomy(taxonomy.to_string()));
        }
        Ok(state.store.count(taxonomy))
    }

    /// Whether `ancestor` appears on `descendant`'s parent chain.
    pub fn is_ancestor(&self, ancestor: TermTaxonomyId, descendant: TermTaxonomyId) -> bool {
        let state = self.state.read();
        let mut seen = HashSet::new();
        let mut current = state.store.binding(descendant).and_then(|b| b.parent);
        while let Some(tt) = current {
            if tt == ancestor {
                return true;
            }
            if !seen.insert(tt) {
                break;
            }
            current = state.store.binding(tt).and_then(|b| b.parent);
        }
        false
    }

    // ------------------------------------------------------------------
    // Object relationship operations
    // ------------------------------------------------------------------

    /// Assign terms to an object.
    ///
    /// Resolution is validated in full before any state changes, so a
    /// failing entry leaves the assignment untouched. With `append` false
    /// the given set replaces the object's assignment in the taxonomy;
    /// bindings present in both old and new sets keep their relationship
    /// row and order. Returns the bound term-taxonomy ids, deduplicated,
    /// in assignment order.
    pub fn set_object_terms(
        &self,
        object_id: ObjectId,
        taxonomy: &str,
        terms: &[TermRef],
        append: bool,
    ) -> Result<Vec<TermTaxonomyId>, TermError> {
        let event = {
            let mut state = self.state.write();
            if !state.registry.is_registered(taxonomy) {
                return Err(TermError::InvalidTaxonomy(taxonomy.to_string()));
            }
            let allow_creation = state.registry.allows_term_creation(taxonomy);
            let hierarchical = state.registry.is_hierarchical(taxonomy);

            // Resolve phase: no mutation until every entry is accounted for.
            enum Resolved {
                Existing(TermTaxonomyId),
                Create(String),
            }
            let mut resolved = Vec::with_capacity(terms.len());
            for term in terms {
                match term {
                    TermRef::Id(id) => match state.store.binding_of(*id, taxonomy) {
                        Some(b) => resolved.push(Resolved::Existing(b.id)),
                        None => {
                            return Err(TermError::TermNotFound {
                                reference: id.to_string(),
                                taxonomy: taxonomy.to_string(),
                            })
                        }
                    },
                    TermRef::Name(name) => {
                        let found = state
                            .store
                            .find_by_name(taxonomy, name)
                            .or_else(|| state.store.find_by_slug(taxonomy, &slugify(name)))
                            .map(|b| b.id);
                        match found {
                            Some(tt) => resolved.push(Resolved::Existing(tt)),
                            None if allow_creation => {
                                resolved.push(Resolved::Create(name.clone()))
                            }
                            None => {
                                return Err(TermError::TermNotFound {
                                    reference: name.clone(),
                                    taxonomy: taxonomy.to_string(),
                                })
                            }
                        }
                    }
                }
            }

            // Apply phase: create missing terms, then rewrite the rows.
            let mut assigned: Vec<TermTaxonomyId> = Vec::with_capacity(resolved.len());
            for entry in resolved {
                let tt = match entry {
                    Resolved::Existing(tt) => tt,
                    Resolved::Create(name) => {
                        // A duplicate name earlier in this call may have
                        // created the term already.
                        match state.store.find_by_name(taxonomy, &name) {
                            Some(b) => b.id,
                            None => {
                                let term_id = match state
                                    .store
                                    .shared_candidate(&name, taxonomy)
                                {
                                    Some(id) => id,
                                    None => {
                                        let mut candidate = slugify(&name);
                                        if candidate.is_empty() {
                                            candidate = name.clone();
                                        }
                                        let slug = unique_slug(
                                            &state.store,
                                            &candidate,
                                            taxonomy,
                                            hierarchical,
                                            None,
                                            None,
                                        );
                                        state.store.create_term(&name, &slug)
                                    }
                                };
                                state.store.insert_binding(term_id, taxonomy, None, "")?
                            }
                        }
                    }
                };
                if !assigned.contains(&tt) {
                    assigned.push(tt);
                }
            }

            let old: Vec<TermTaxonomyId> = state
                .relationships
                .rows_for_object(object_id)
                .filter(|r| {
                    state
                        .store
                        .binding(r.term_taxonomy_id)
                        .map(|b| b.taxonomy == taxonomy)
                        .unwrap_or(false)
                })
                .map(|r| r.term_taxonomy_id)
                .collect();

            let mut affected: Vec<TermTaxonomyId> = old.clone();
            if !append {
                for &tt in &old {
                    if !assigned.contains(&tt) {
                        state.relationships.remove(object_id, tt);
                    }
                }
            }

            let mut next_order = state
                .relationships
                .rows_for_object(object_id)
                .filter(|r| old.contains(&r.term_taxonomy_id))
                .map(|r| r.term_order + 1)
                .max()
                .unwrap_or(0);
            for &tt in &assigned {
                if !state.relationships.contains(object_id, tt) {
                    state.relationships.add(object_id, tt, next_order);
                    next_order += 1;
                }
                if !affected.contains(&tt) {
                    affected.push(tt);
                }
            }

            refresh_counts(&mut state, &affected);

            // Unconditional, even when the resulting set is unchanged.
            state.cache.invalidate(object_id, taxonomy);

            debug!(
                object = %object_id,
                taxonomy,
                terms = assigned.len(),
                append,
                "set object terms"
            );
            TermsChanged {
                object_id,
                taxonomy: taxonomy.to_string(),
                term_taxonomy_ids: assigned,
                at: Utc::now(),
            }
        };

        let assigned = event.term_taxonomy_ids.clone();
        self.bus.emit(&TermEvent::TermsChanged(event));
        Ok(assigned)
    }

    /// Resolved terms assigned to an object. Pure read; never touches the
    /// cache.
    pub fn object_terms(
        &self,
        object_id: ObjectId,
        taxonomy: &str,
        order_by: OrderBy,
    ) -> Result<Vec<AssignedTerm>, TermError> {
        let state = self.state.read();
        if !state.registry.is_registered(taxonomy) {
            return Err(TermError::InvalidTaxonomy(taxonomy.to_string()));
        }
        Ok(resolve_object_terms(&state, object_id, taxonomy, order_by))
    }

    /// Term ids assigned to an object, ascending by term id.
    pub fn object_term_ids(
        &self,
        object_id: ObjectId,
        taxonomy: &str,
    ) -> Result<Vec<TermId>, TermError> {
        Ok(self
            .object_terms(object_id, taxonomy, OrderBy::TermId)?
            .into_iter()
            .map(|t| t.term_id)
            .collect())
    }

    /// Term names assigned to an object, ascending by term id.
    pub fn object_term_names(
        &self,
        object_id: ObjectId,
        taxonomy: &str,
    ) -> Result<Vec<String>, TermError> {
        Ok(self
            .object_terms(object_id, taxonomy, OrderBy::TermId)?
            .into_iter()
            .map(|t| t.name)
            .collect())
    }

    /// Term slugs assigned to an object, ascending by term id.
    pub fn object_term_slugs(
        &self,
        object_id: ObjectId,
        taxonomy: &str,
    ) -> Result<Vec<String>, TermError> {
        Ok(self
            .object_terms(object_id, taxonomy, OrderBy::TermId)?
            .into_iter()
            .map(|t| t.slug)
            .collect())
    }

    /// Resolved terms for an object, priming the relationship cache as a
    /// side effect. Subsequent calls for the same key return the cached
    /// value until a write invalidates it.
    pub fn object_terms_primed(
        &self,
        object_id: ObjectId,
        taxonomy: &str,
    ) -> Result<Vec<AssignedTerm>, TermError> {
        let mut state = self.state.write();
        if !state.registry.is_registered(taxonomy) {
            return Err(TermError::InvalidTaxonomy(taxonomy.to_string()));
        }
        if let Some(cached) = state.cache.peek(object_id, taxonomy) {
            return Ok(cached.to_vec());
        }
        let terms = resolve_object_terms(&state, object_id, taxonomy, OrderBy::TermOrder);
        state.cache.prime(object_id, taxonomy, terms.clone());
        Ok(terms)
    }

    /// Cache absence probe: the cached entry for a key, if one exists.
    /// Never populates.
    pub fn cached_terms(&self, object_id: ObjectId, taxonomy: &str) -> Option<Vec<AssignedTerm>> {
        self.state
            .read()
            .cache
            .peek(object_id, taxonomy)
            .map(|t| t.to_vec())
    }

    /// Objects currently associated with a binding, ascending by object id.
    pub fn objects_in_term(&self, tt_id: TermTaxonomyId) -> Result<Vec<ObjectId>, TermError> {
        let state = self.state.read();
        if state.store.binding(tt_id).is_none() {
            return Err(TermError::NotFound(tt_id));
        }
        Ok(state.relationships.objects_for(tt_id))
    }
}

/// Recompute materialized counts from the relationship rows. Every mutation
/// path funnels through here so the counts cannot drift.
fn refresh_counts(state: &mut EngineState, tt_ids: &[TermTaxonomyId]) {
    for &tt in tt_ids {
        let count = state.relationships.object_count(tt);
        if let Some(binding) = state.store.binding_mut(tt) {
            binding.count = count;
        }
    }
}

/// Whether `target` appears on the parent chain starting at `start`,
/// inclusive of `start` itself.
fn chain_contains(store: &TermStore, start: TermTaxonomyId, target: TermTaxonomyId) -> bool {
    let mut seen = HashSet::new();
    let mut current = Some(start);
    while let Some(tt) = current {
        if tt == target {
            return true;
        }
        if !seen.insert(tt) {
            break;
        }
        current = store.binding(tt).and_then(|b| b.parent);
    }
    false
}

fn resolve_object_terms(
    state: &EngineState,
    object_id: ObjectId,
    taxonomy: &str,
    order_by: OrderBy,
) -> Vec<AssignedTerm> {
    let mut terms: Vec<AssignedTerm> = state
        .relationships
        .rows_for_object(object_id)
        .filter_map(|row| {
            let binding = state.store.binding(row.term_taxonomy_id)?;
            if binding.taxonomy != taxonomy {
                return None;
            }
            let term = state.store.term(binding.term_id)?;
            Some(AssignedTerm {
                term_id: term.id,
                term_taxonomy_id: binding.id,
                taxonomy: binding.taxonomy.clone(),
                name: term.name.clone(),
                slug: term.slug.clone(),
                parent: binding.parent,
                description: binding.description.clone(),
                count: binding.count,
                term_order: row.term_order,
            })
        })
        .collect();

    match order_by {
        OrderBy::TermId => terms.sort_by_key(|t| t.term_id),
        OrderBy::Name => terms.sort_by(|a, b| a.name.cmp(&b.name).then(a.term_id.cmp(&b.term_id))),
        OrderBy::Slug => terms.sort_by(|a, b| a.slug.cmp(&b.slug).then(a.term_id.cmp(&b.term_id))),
        OrderBy::TermOrder => terms.sort_by_key(|t| (t.term_order, t.term_id)),
    }
    terms
}
