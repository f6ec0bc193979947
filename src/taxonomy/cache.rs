//! Relationship cache
//!
//! Process-local map of (object, taxonomy) to the object's resolved terms.
//! Entries are created only by priming reads and destroyed by every write
//! touching that key. The cache is never the source of truth: it is fully
//! rebuildable from the term store and relationship rows, and invalidation
//! is plain in-memory removal, so it cannot fail.

use std::collections::HashMap;

use tracing::trace;

use crate::core::identity::ObjectId;
use crate::taxonomy::store::AssignedTerm;

#[derive(Debug, Default)]
pub(crate) struct RelationshipCache {
    entries: HashMap<(ObjectId, String), Vec<AssignedTerm>>,
}

impl RelationshipCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Look up an entry without populating anything (absence probe).
    pub(crate) fn peek(&self, object_id: ObjectId, taxonomy: &str) -> Option<&[AssignedTerm]> {
        self.entries
            .get(&(object_id, taxonomy.to_string()))
            .map(|v| v.as_slice())
    }

    /// Store the resolved terms for a key.
    pub(crate) fn prime(&mut self, object_id: ObjectId, taxonomy: &str, terms: Vec<AssignedTerm>) {
        trace!(object = %object_id, taxonomy, "priming relationship cache");
        self.entries.insert((object_id, taxonomy.to_string()), terms);
    }

    /// Drop the entry for a key. Infallible; removing a missing entry is a
    /// no-op.
    pub(crate) fn invalidate(&mut self, object_id: ObjectId, taxonomy: &str) {
        if self
            .entries
            .remove(&(object_id, taxonomy.to_string()))
            .is_some()
        {
            trace!(object = %object_id, taxonomy, "invalidated relationship cache entry");
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_does_not_populate() {
        let cache = RelationshipCache::new();
        assert!(cache.peek(ObjectId(1), "category").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_prime_then_peek_then_invalidate() {
        let mut cache = RelationshipCache::new();
        cache.prime(ObjectId(1), "category", Vec::new());
        assert!(cache.peek(ObjectId(1), "category").is_some());
        // Key is (object, taxonomy), not object alone.
        assert!(cache.peek(ObjectId(1), "post_tag").is_none());
        assert!(cache.peek(ObjectId(2), "category").is_none());

        cache.invalidate(ObjectId(1), "category");
        assert!(cache.peek(ObjectId(1), "category").is_none());
    }

    #[test]
    fn test_invalidate_missing_is_noop() {
        let mut cache = RelationshipCache::new();
        cache.invalidate(ObjectId(42), "category");
        assert_eq!(cache.len(), 0);
    }
}
