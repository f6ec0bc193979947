//! Error types for taxonomy operations

use miette::Diagnostic;
use thiserror::Error;

use crate::core::identity::{TermId, TermTaxonomyId};

/// Errors returned by the public taxonomy operations.
///
/// Every failure is an explicit result variant so callers can tell "the
/// input was invalid and nothing happened" apart from "the operation
/// succeeded as a no-op".
#[derive(Debug, Error, Diagnostic)]
pub enum TermError {
    #[error("taxonomy '{0}' is not registered")]
    #[diagnostic(code(termstore::invalid_taxonomy))]
    InvalidTaxonomy(String),

    #[error("term '{reference}' does not resolve in taxonomy '{taxonomy}'")]
    #[diagnostic(code(termstore::term_not_found))]
    TermNotFound {
        reference: String,
        taxonomy: String,
    },

    #[error("term {term_id} is already bound to taxonomy '{taxonomy}'")]
    #[diagnostic(code(termstore::duplicate_term_taxonomy))]
    DuplicateTermTaxonomy { term_id: TermId, taxonomy: String },

    #[error("term-taxonomy {term_taxonomy_id} cannot take {parent} as its parent: it is on its own descendant chain")]
    #[diagnostic(code(termstore::hierarchy_loop))]
    HierarchyLoop {
        term_taxonomy_id: TermTaxonomyId,
        parent: TermTaxonomyId,
    },

    #[error("term-taxonomy {0} does not exist")]
    #[diagnostic(code(termstore::not_found))]
    NotFound(TermTaxonomyId),
}
