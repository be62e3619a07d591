//! Error types produced by the ontology crate.
//!
//! Only (de)serialization can fail. Validation answers `bool` and evaluation
//! treats anything malformed as "no match", so neither surfaces an error.
use thiserror::Error;

use crate::value::ValueShape;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum OntologyError {
    /// The decoded value has a shape the tag type cannot hold, e.g. a
    /// `{start, end}` pair for a `number` tag.
    #[error("tag type `{type_name}` cannot hold a {shape} value")]
    ShapeMismatch {
        type_name: String,
        shape: ValueShape,
    },

    /// The raw wire value could not be decoded into any tag value shape.
    #[error("malformed tag value: {0}")]
    Malformed(String),
}
