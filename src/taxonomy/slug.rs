//! Slugification and hierarchy-aware slug disambiguation
//!
//! Collision resolution, in order:
//! 1. a free candidate is returned unchanged;
//! 2. a hierarchical term with a parent tries `{candidate}-{parent-slug}`;
//! 3. otherwise the first free numeric suffix `-2`, `-3`, ... is appended
//!    to the base from step 1 or 2.
//!
//! A flat-taxonomy collision never parent-suffixes, even when the colliding
//! terms are unrelated; it goes straight to numeric suffixing.

use crate::core::identity::{TermId, TermTaxonomyId};
use crate::taxonomy::store::TermStore;

/// Derive a URL-safe slug from a display name.
///
/// Lowercases, keeps alphanumerics, and collapses every other run of
/// characters into a single `-`. An all-symbol name slugs to the empty
/// string; callers fall back to the name as given.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            for lower in c.to_lowercase() {
                slug.push(lower);
            }
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Compute a collision-free slug for a term in a taxonomy.
///
/// `parent` is the prospective parent binding (hierarchical taxonomies
/// only). `exclude` ignores one term id during collision checks so a term
/// being updated does not collide with itself.
pub(crate) fn unique_slug(
    store: &TermStore,
    candidate: &str,
    taxonomy: &str,
    hierarchical: bool,
    parent: Option<TermTaxonomyId>,
    exclude: Option<TermId>,
) -> String {
    if !store.slug_in_use(taxonomy, candidate, exclude) {
        return candidate.to_string();
    }

    let base = if hierarchical {
        match parent.and_then(|p| parent_slug(store, p)) {
            Some(parent_slug) => {
                let suffixed = format!("{candidate}-{parent_slug}");
                if !store.slug_in_use(taxonomy, &suffixed, exclude) {
                    return suffixed;
                }
                suffixed
            }
            None => candidate.to_string(),
        }
    } else {
        candidate.to_string()
    };

    let mut n = 2u64;
    loop {
        let numbered = format!("{base}-{n}");
        if !store.slug_in_use(taxonomy, &numbered, exclude) {
            return numbered;
        }
        n += 1;
    }
}

fn parent_slug(store: &TermStore, parent: TermTaxonomyId) -> Option<String> {
    let binding = store.binding(parent)?;
    store.term(binding.term_id).map(|t| t.slug.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Rust"), "rust");
        assert_eq!(slugify("C++ & Friends"), "c-friends");
        assert_eq!(slugify("  spaced  out  "), "spaced-out");
    }

    #[test]
    fn test_slugify_keeps_digits() {
        assert_eq!(slugify("Top 10 Lists"), "top-10-lists");
    }

    #[test]
    fn test_slugify_symbols_only_is_empty() {
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_unique_slug_free_candidate_unchanged() {
        let store = TermStore::new();
        assert_eq!(
            unique_slug(&store, "unique-term", "category", true, None, None),
            "unique-term"
        );
    }

    #[test]
    fn test_flat_collision_gets_numeric_suffix() {
        let mut store = TermStore::new();
        let t = store.create_term("parent", "parent");
        store.insert_binding(t, "post_tag", None, "").unwrap();

        assert_eq!(
            unique_slug(&store, "parent", "post_tag", false, None, None),
            "parent-2"
        );
    }

    #[test]
    fn test_hierarchical_collision_suffixes_parent_slug() {
        let mut store = TermStore::new();
        let parent = store.create_term("neighbor", "neighbor");
        let parent_tt = store.insert_binding(parent, "category", None, "").unwrap();
        let child = store.create_term("child", "child");
        store.insert_binding(child, "category", None, "").unwrap();

        assert_eq!(
            unique_slug(&store, "child", "category", true, Some(parent_tt), None),
            "child-neighbor"
        );
    }

    #[test]
    fn test_hierarchical_double_collision_numbers_the_pair() {
        let mut store = TermStore::new();
        let parent = store.create_term("neighbor", "neighbor");
        let parent_tt = store.insert_binding(parent, "category", None, "").unwrap();
        let child = store.create_term("child", "child");
        store.insert_binding(child, "category", None, "").unwrap();
        let taken = store.create_term("child-neighbor", "child-neighbor");
        store.insert_binding(taken, "category", None, "").unwrap();

        assert_eq!(
            unique_slug(&store, "child", "category", true, Some(parent_tt), None),
            "child-neighbor-2"
        );
    }

    #[test]
    fn test_exclusion_prevents_self_collision() {
        let mut store = TermStore::new();
        let t = store.create_term("solo", "solo");
        store.insert_binding(t, "post_tag", None, "").unwrap();

        assert_eq!(
            unique_slug(&store, "solo", "post_tag", false, None, Some(t)),
            "solo"
        );
    }
}
