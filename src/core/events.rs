//! Structured change notifications for taxonomy mutations
//!
//! Observers subscribe to a [`NotificationBus`] and receive event records
//! with named fields. Emission is fire-and-forget: the engine never depends
//! on subscriber behavior for correctness, and a subscriber cannot fail an
//! operation.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::identity::{ObjectId, TermId, TermTaxonomyId};
use crate::taxonomy::store::Term;

/// Emitted after a term-taxonomy binding has been deleted.
///
/// `term` is a snapshot of the term record as it was before the deletion,
/// so observers can see the name and slug even when the term row itself was
/// removed along with its last binding.
#[derive(Debug, Clone, Serialize)]
pub struct TermDeleted {
    pub term_id: TermId,
    pub term_taxonomy_id: TermTaxonomyId,
    pub taxonomy: String,
    pub term: Term,
    pub at: DateTime<Utc>,
}

/// Emitted after an object's term assignments in a taxonomy changed.
#[derive(Debug, Clone, Serialize)]
pub struct TermsChanged {
    pub object_id: ObjectId,
    pub taxonomy: String,
    /// The full assignment after the change, in assignment order.
    pub term_taxonomy_ids: Vec<TermTaxonomyId>,
    pub at: DateTime<Utc>,
}

/// All notifications the engine can emit.
#[derive(Debug, Clone, Serialize)]
pub enum TermEvent {
    Deleted(TermDeleted),
    TermsChanged(TermsChanged),
}

type Subscriber = Box<dyn Fn(&TermEvent) + Send + Sync>;

/// Fan-out bus for [`TermEvent`]s.
#[derive(Default)]
pub struct NotificationBus {
    subscribers: Vec<Subscriber>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Register an observer. Subscribers cannot be removed individually;
    /// drop the bus (or the engine owning it) to detach them.
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: Fn(&TermEvent) + Send + Sync + 'static,
    {
        self.subscribers.push(Box::new(observer));
    }

    /// Deliver an event to every subscriber.
    pub fn emit(&self, event: &TermEvent) {
        for subscriber in &self.subscribers {
            subscriber(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl std::fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn sample_event() -> TermEvent {
        TermEvent::TermsChanged(TermsChanged {
            object_id: ObjectId(1),
            taxonomy: "category".to_string(),
            term_taxonomy_ids: vec![TermTaxonomyId(3)],
            at: Utc::now(),
        })
    }

    #[test]
    fn test_emit_reaches_all_subscribers() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut bus = NotificationBus::new();
        for _ in 0..3 {
            let hits = Arc::clone(&hits);
            bus.subscribe(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        bus.emit(&sample_event());
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_emit_with_no_subscribers_is_noop() {
        let bus = NotificationBus::new();
        bus.emit(&sample_event());
        assert_eq!(bus.subscriber_count(), 0);
    }
}
