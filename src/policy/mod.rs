//! Search policy definitions.

pub mod search;
pub mod scoring;

pub use search::{SearchPolicy, MatchPolicy};
pub use scoring::{RouteScore, FrontierEntry};
