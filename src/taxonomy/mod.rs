//! Hierarchical taxonomy engine
//!
//! Component layout, leaves first:
//! - [`registry`]: which taxonomies exist and what they support
//! - [`store`]: term and term-taxonomy records plus the shared-name index
//! - [`slug`]: slugification and hierarchy-aware slug disambiguation
//! - [`split`]: fork-on-divergent-write for shared terms
//! - [`relationships`]: object-term rows with stable ordering
//! - [`cache`]: process-local (object, taxonomy) -> resolved terms cache
//! - [`engine`]: the public facade tying the components together

pub mod cache;
pub mod engine;
pub mod error;
pub mod registry;
pub mod relationships;
pub mod slug;
pub mod split;
pub mod store;

use crate::core::identity::TermId;
use serde::{Deserialize, Serialize};

pub use engine::TaxonomyEngine;
pub use error::TermError;
pub use registry::{TaxonomyDef, TaxonomyRegistry};
pub use store::{AssignedTerm, Term, TermTaxonomy};

/// How a caller refers to a term when assigning it to an object.
///
/// Ids must already resolve in the target taxonomy. Names are matched
/// against term names first, then slugs, and are created on the fly when
/// the taxonomy allows term creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermRef {
    Id(TermId),
    Name(String),
}

impl From<TermId> for TermRef {
    fn from(id: TermId) -> Self {
        TermRef::Id(id)
    }
}

impl From<&str> for TermRef {
    fn from(name: &str) -> Self {
        TermRef::Name(name.to_string())
    }
}

impl From<String> for TermRef {
    fn from(name: String) -> Self {
        TermRef::Name(name)
    }
}

/// Exact-match lookup key for [`TaxonomyEngine::find_term`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermLookup {
    Id(TermId),
    Name(String),
    Slug(String),
}

/// Optional fields for term insertion.
#[derive(Debug, Clone, Default)]
pub struct TermInsert {
    /// Parent binding, for hierarchical taxonomies.
    pub parent: Option<crate::core::identity::TermTaxonomyId>,
    pub description: Option<String>,
    /// Explicit slug; uniquified before use.
    pub slug: Option<String>,
}

/// Partial update applied by [`TaxonomyEngine::update_term`].
///
/// `None` fields are left untouched. A `name` change alone does not
/// regenerate the slug.
#[derive(Debug, Clone, Default)]
pub struct TermUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub parent: Option<Option<crate::core::identity::TermTaxonomyId>>,
    pub description: Option<String>,
}

/// Ordering for object-term reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    /// Stable default: ascending term id.
    #[default]
    TermId,
    Name,
    Slug,
    /// Assignment order recorded on the relationship row.
    TermOrder,
}
