//! Shared-term splitting
//!
//! A term referenced by bindings in more than one taxonomy must fork before
//! an identity field (name or slug) may diverge. The fork clones the
//! pre-update term under a fresh id and re-points only the binding being
//! updated. Relationship rows reference the binding id, not the term id, so
//! no relationship row changes; every other taxonomy keeps the original
//! term untouched.

use tracing::debug;

use crate::core::identity::{TermId, TermTaxonomyId};
use crate::taxonomy::store::{Term, TermStore};

/// Whether updating the given binding's term requires a fork first.
///
/// True when the term is bound in at least one other taxonomy.
pub(crate) fn needs_split(store: &TermStore, term_id: TermId) -> bool {
    store.taxonomy_spread(term_id) > 1
}

/// Fork a shared term for the given binding.
///
/// Clones the term as it currently stands, rebinds `tt_id` to the clone,
/// and returns the new term id. Callers apply the divergent update to the
/// clone afterwards.
pub(crate) fn split_shared_term(store: &mut TermStore, tt_id: TermTaxonomyId) -> Option<TermId> {
    let old_term_id = store.binding(tt_id)?.term_id;
    let original = store.term(old_term_id)?.clone();

    let new_id = store.next_term_id();
    store.insert_term_record(Term {
        id: new_id,
        name: original.name,
        slug: original.slug,
        group: original.group,
    });
    store.binding_mut(tt_id)?.term_id = new_id;

    debug!(
        old_term = %old_term_id,
        new_term = %new_id,
        term_taxonomy = %tt_id,
        "split shared term"
    );
    Some(new_id)
}
