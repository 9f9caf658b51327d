//! SearchPolicy v1: goal matching and search budgets.
//!
//! The policy is plain data. It serializes with serde and has a stable
//! `params_hash` so traces can record exactly which settings produced a
//! route.

use serde::{Deserialize, Serialize};
use crate::canonical::canonical_hash_hex;
use crate::types::TagSet;
use crate::DEFAULT_POLICY_VERSION;

/// How a found key's tags are compared with the requested tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Found tags must contain every requested tag. A value with more
    /// context still satisfies a less specific request.
    #[default]
    Superset,
    /// Found tags must equal the requested tags.
    Exact,
}

impl MatchPolicy {
    /// Whether `have` satisfies `want`. `None` accepts any tags.
    pub fn accepts(&self, have: &TagSet, want: Option<&TagSet>) -> bool {
        match (self, want) {
            (_, None) => true,
            (Self::Superset, Some(want)) => have.is_superset(want),
            (Self::Exact, Some(want)) => have == want,
        }
    }
}

/// Search policy version 1.
///
/// ## Parameters
///
/// - `match_policy`: how requested tags are matched against found tags
/// - `max_expansions`: cap on states settled per search (`None` = unbounded)
/// - `max_attempts`: cap on routes tried per conversion (`None` = until the
///   graph runs out of routes). The first route is always tried, so `0`
///   behaves like `1`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPolicy {
    /// Policy version identifier.
    pub version: String,
    /// Tag matching rule for goals.
    pub match_policy: MatchPolicy,
    /// Maximum states settled by a single search.
    pub max_expansions: Option<usize>,
    /// Maximum routes executed by a single conversion.
    pub max_attempts: Option<usize>,
}

impl SearchPolicy {
    /// Create a new policy with custom parameters.
    pub fn new(
        match_policy: MatchPolicy,
        max_expansions: Option<usize>,
        max_attempts: Option<usize>,
    ) -> Self {
        Self {
            version: DEFAULT_POLICY_VERSION.to_string(),
            match_policy,
            max_expansions,
            max_attempts,
        }
    }

    /// Default policy with exact tag matching.
    pub fn exact() -> Self {
        Self {
            match_policy: MatchPolicy::Exact,
            ..Self::default()
        }
    }

    /// Get the policy ID.
    pub fn policy_id(&self) -> &str {
        &self.version
    }

    /// Deterministic hash of the policy parameters.
    pub fn params_hash(&self) -> String {
        canonical_hash_hex(self)
    }
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self::new(MatchPolicy::Superset, None, None)
    }
}
