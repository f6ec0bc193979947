//! Record identity system using typed numeric ids
//!
//! Term ids, term-taxonomy ids, and object ids are all allocated from
//! independent sequences, so their numeric values overlap freely. The
//! newtypes keep them from being mixed up at call sites.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifier of a [`Term`](crate::taxonomy::store::Term) record.
///
/// A single term id may be referenced by bindings in several taxonomies
/// until the term is split.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TermId(pub u64);

/// Identifier of a [`TermTaxonomy`](crate::taxonomy::store::TermTaxonomy)
/// binding. Relationship rows reference this id, never the term id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TermTaxonomyId(pub u64);

/// Identifier of an opaque content object (e.g., a post).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

macro_rules! id_impls {
    ($ty:ident) => {
        impl $ty {
            /// Raw numeric value of the id.
            pub fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $ty {
            fn from(raw: u64) -> Self {
                $ty(raw)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $ty {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<u64>()
                    .map($ty)
                    .map_err(|_| IdParseError::NotNumeric(s.to_string()))
            }
        }
    };
}

id_impls!(TermId);
id_impls!(TermTaxonomyId);
id_impls!(ObjectId);

/// Allocator for a single id sequence, starting at 1 so that 0 can never
/// collide with a real record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdSequence {
    next: u64,
}

impl IdSequence {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Hand out the next raw id.
    pub fn next(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when parsing record ids
#[derive(Debug, Error)]
pub enum IdParseError {
    #[error("id is not a positive integer: '{0}'")]
    NotNumeric(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_starts_at_one() {
        let mut seq = IdSequence::new();
        assert_eq!(seq.next(), 1);
        assert_eq!(seq.next(), 2);
        assert_eq!(seq.next(), 3);
    }

    #[test]
    fn test_id_display_roundtrip() {
        let id = TermId(42);
        let parsed: TermId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_id_parse_rejects_garbage() {
        let err = "not-a-number".parse::<ObjectId>().unwrap_err();
        assert!(matches!(err, IdParseError::NotNumeric(_)));
    }

    #[test]
    fn test_ids_are_distinct_types() {
        // Same numeric value, different meaning.
        let term = TermId(7);
        let tt = TermTaxonomyId(7);
        assert_eq!(term.as_u64(), tt.as_u64());
    }
}
