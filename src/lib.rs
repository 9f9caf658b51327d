//! # conversion-graph
//!
//! Cost-based conversion between values of arbitrary types.
//!
//! Register small conversion steps between types (optionally refined by
//! variation tags), then ask for any value to be converted to a type you
//! want. The engine finds the cheapest chain of registered steps and runs it.
//!
//! > I have this, how can I get that?
//!
//! ## Core Contract
//!
//! 1. Conversions are directed, costed edges between (type, tag-set) keys
//! 2. Revealers inspect the input value and contribute extra tags
//! 3. `convert` runs the cheapest chain; a step that fails at runtime is
//!    excluded and the next cheapest chain is tried
//!
//! ## Architecture
//!
//! ```text
//! Value → Revealers → start keys → PathSearch → Executor → Value
//!                                      ↑            │
//!                                  EdgeTable   exclude failed edge, retry
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same registry + same request → same route
//! - Ties break on edge count, then tags consumed, then tags produced,
//!   then registration order
//! - Registry fingerprints depend on edge shape and order only

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod policy;
pub mod store;
pub mod search;
pub mod executor;
pub mod trace;
pub mod conversions;
pub mod canonical;
pub mod builtins;
pub mod facade;

// Re-exports
pub use types::{
    TypeKey, Tag, TagSet, VariationKey, Value,
    BoxError, Cost, EdgeId, Conversion, ConversionEdge, EdgeSummary,
    RegistrationError, RevealerError, StepFailure, ConversionError,
};
pub use policy::{SearchPolicy, MatchPolicy};
pub use store::{EdgeStore, EdgeTable, Revealer, RevealerTable};
pub use search::{PathSearch, SearchRequest, SearchError, Path};
pub use executor::{Executor, Outcome};
pub use trace::{ConversionTrace, Attempt, AttemptOutcome};
pub use conversions::{Conversions, ConvertRequest};
pub use builtins::register_builtins;
pub use canonical::{to_canonical_bytes, canonical_hash, canonical_hash_hex};

/// Default search policy version identifier.
pub const DEFAULT_POLICY_VERSION: &str = "search_policy_v1";
