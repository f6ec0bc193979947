//! Core module - identity and notification primitives

pub mod events;
pub mod identity;

pub use events::{NotificationBus, TermDeleted, TermEvent, TermsChanged};
pub use identity::{IdParseError, IdSequence, ObjectId, TermId, TermTaxonomyId};
