//! Object-term relationship rows
//!
//! Each row associates a content object with one term-taxonomy binding and
//! carries the assignment order. Rows are identity-stable: reassigning an
//! object keeps the row (and its order) for every binding present in both
//! the old and new sets.

use serde::{Deserialize, Serialize};

use crate::core::identity::{ObjectId, TermTaxonomyId};

/// Association of a content object with a term-taxonomy binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectTermRelationship {
    pub object_id: ObjectId,
    pub term_taxonomy_id: TermTaxonomyId,
    /// Assignment order within the object's (object, taxonomy) set.
    pub term_order: u32,
}

/// Flat index of relationship rows.
#[derive(Debug, Default)]
pub(crate) struct RelationshipIndex {
    rows: Vec<ObjectTermRelationship>,
}

impl RelationshipIndex {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn contains(&self, object_id: ObjectId, tt_id: TermTaxonomyId) -> bool {
        self.order_of(object_id, tt_id).is_some()
    }

    pub(crate) fn order_of(&self, object_id: ObjectId, tt_id: TermTaxonomyId) -> Option<u32> {
        self.rows
            .iter()
            .find(|r| r.object_id == object_id && r.term_taxonomy_id == tt_id)
            .map(|r| r.term_order)
    }

    /// Add a row. A row that already exists keeps its original order.
    pub(crate) fn add(&mut self, object_id: ObjectId, tt_id: TermTaxonomyId, term_order: u32) {
        if self.contains(object_id, tt_id) {
            return;
        }
        self.rows.push(ObjectTermRelationship {
            object_id,
            term_taxonomy_id: tt_id,
            term_order,
        });
    }

    pub(crate) fn remove(&mut self, object_id: ObjectId, tt_id: TermTaxonomyId) -> bool {
        let before = self.rows.len();
        self.rows
            .retain(|r| !(r.object_id == object_id && r.term_taxonomy_id == tt_id));
        self.rows.len() != before
    }

    /// Remove every row referencing a binding (delete cascade). Returns the
    /// objects that were associated, ascending and deduplicated.
    pub(crate) fn remove_binding(&mut self, tt_id: TermTaxonomyId) -> Vec<ObjectId> {
        let mut affected: Vec<ObjectId> = self
            .rows
            .iter()
            .filter(|r| r.term_taxonomy_id == tt_id)
            .map(|r| r.object_id)
            .collect();
        affected.sort();
        affected.dedup();
        self.rows.retain(|r| r.term_taxonomy_id != tt_id);
        affected
    }

    /// Objects associated with a binding, ascending by object id.
    pub(crate) fn objects_for(&self, tt_id: TermTaxonomyId) -> Vec<ObjectId> {
        let mut objects: Vec<ObjectId> = self
            .rows
            .iter()
            .filter(|r| r.term_taxonomy_id == tt_id)
            .map(|r| r.object_id)
            .collect();
        objects.sort();
        objects.dedup();
        objects
    }

    /// Number of distinct objects associated with a binding. This is the
    /// source of truth the materialized binding count is refreshed from.
    pub(crate) fn object_count(&self, tt_id: TermTaxonomyId) -> u64 {
        self.objects_for(tt_id).len() as u64
    }

    pub(crate) fn rows_for_object(
        &self,
        object_id: ObjectId,
    ) -> impl Iterator<Item = &ObjectTermRelationship> {
        self.rows.iter().filter(move |r| r.object_id == object_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent_and_order_stable() {
        let mut idx = RelationshipIndex::new();
        idx.add(ObjectId(1), TermTaxonomyId(10), 0);
        idx.add(ObjectId(1), TermTaxonomyId(10), 5);

        assert_eq!(idx.order_of(ObjectId(1), TermTaxonomyId(10)), Some(0));
        assert_eq!(idx.objects_for(TermTaxonomyId(10)), vec![ObjectId(1)]);
    }

    #[test]
    fn test_remove_binding_cascades_and_reports_objects() {
        let mut idx = RelationshipIndex::new();
        idx.add(ObjectId(3), TermTaxonomyId(10), 0);
        idx.add(ObjectId(1), TermTaxonomyId(10), 0);
        idx.add(ObjectId(2), TermTaxonomyId(11), 0);

        let affected = idx.remove_binding(TermTaxonomyId(10));
        assert_eq!(affected, vec![ObjectId(1), ObjectId(3)]);
        assert_eq!(idx.object_count(TermTaxonomyId(10)), 0);
        // Unrelated binding untouched.
        assert_eq!(idx.object_count(TermTaxonomyId(11)), 1);
    }

    #[test]
    fn test_objects_for_sorted_ascending() {
        let mut idx = RelationshipIndex::new();
        for object in [5u64, 2, 9, 1] {
            idx.add(ObjectId(object), TermTaxonomyId(7), 0);
        }
        assert_eq!(
            idx.objects_for(TermTaxonomyId(7)),
            vec![ObjectId(1), ObjectId(2), ObjectId(5), ObjectId(9)]
        );
    }

    #[test]
    fn test_remove_single_row() {
        let mut idx = RelationshipIndex::new();
        idx.add(ObjectId(1), TermTaxonomyId(10), 0);
        assert!(idx.remove(ObjectId(1), TermTaxonomyId(10)));
        assert!(!idx.remove(ObjectId(1), TermTaxonomyId(10)));
    }
}
