//! Core types for the conversion graph.

pub mod key;
pub mod value;
pub mod edge;
pub mod failure;

pub use key::{TypeKey, Tag, TagSet, VariationKey};
pub use value::Value;
pub use edge::{BoxError, Cost, EdgeId, Conversion, ConversionEdge, EdgeSummary};
pub use failure::{RegistrationError, RevealerError, StepFailure, ConversionError};
