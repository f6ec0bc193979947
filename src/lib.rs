//! termstore: hierarchical taxonomy and term management engine
//!
//! An in-process library for classifying content objects under named
//! taxonomies. Term records may be shared across taxonomies for storage
//! efficiency and are forked into independent copies when their identity
//! fields diverge. Object-term assignments are full-replace with stable
//! ordering, usage counts are materialized, and resolved assignments can be
//! cached per (object, taxonomy) with write-through invalidation.

pub mod core;
pub mod options;
pub mod taxonomy;

pub use crate::core::events::{NotificationBus, TermDeleted, TermEvent, TermsChanged};
pub use crate::core::identity::{ObjectId, TermId, TermTaxonomyId};
pub use crate::options::{OptionError, OptionWrite, OptionsStore};
pub use crate::taxonomy::engine::TaxonomyEngine;
pub use crate::taxonomy::error::TermError;
pub use crate::taxonomy::registry::{TaxonomyDef, TaxonomyRegistry};
pub use crate::taxonomy::store::{AssignedTerm, Term, TermTaxonomy};
pub use crate::taxonomy::{OrderBy, TermInsert, TermLookup, TermRef, TermUpdate};
